use std::sync::{Arc, Mutex};
use std::time::Duration;

use mfvars_transport::ClientDataTransport;
use mfvars_wire::{
    encode_command, Command, FLOAT_SIZE, SIMVAR_DEFINITION_BASE, VARIABLES_AREA_SIZE,
};
use tracing::{debug, info, warn};

use crate::channel::{ChannelManager, ChannelSet};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::handshake::HandshakeConfig;
use crate::provider::{ChannelSetProvider, FixedChannels, NegotiatedChannels};
use crate::store::{lock, SimValue, VariableSlot, VariableStore};

/// Tuning for the synchronous read bridge.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Sleep between two polls of a slot.
    pub poll_interval: Duration,
    /// Number of sleeps before `get` gives up.
    pub poll_attempts: u32,
    /// Size of the variables area; bounds the number of slots.
    pub variables_area_size: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            poll_attempts: 50,
            variables_area_size: VARIABLES_AREA_SIZE,
        }
    }
}

/// Synchronous, timeout-bounded access to remote simulation variables.
///
/// The first `get` of a name allocates a slot, subscribes to it and asks the
/// remote module to report it. Values arrive asynchronously through the
/// [`Dispatcher`]; `get` polls the slot until a value shows up or the bound
/// is reached.
///
/// `get` must not be called concurrently for names that are still being
/// allocated.
pub struct VariableRequests<T: ?Sized> {
    manager: ChannelManager<T>,
    dispatcher: Arc<Dispatcher>,
    store: Arc<Mutex<VariableStore>>,
    channels: ChannelSet,
    config: RequestConfig,
}

impl<T: ClientDataTransport + ?Sized> VariableRequests<T> {
    /// Connect over the channel set produced by `provider`.
    ///
    /// Blocks while the provider negotiates.
    pub fn connect<P: ChannelSetProvider>(
        transport: Arc<T>,
        provider: P,
        config: RequestConfig,
    ) -> Result<Self> {
        let capacity = config.variables_area_size / FLOAT_SIZE;
        let store = Arc::new(Mutex::new(VariableStore::new(
            SIMVAR_DEFINITION_BASE,
            capacity,
        )));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            provider.negotiator(),
        ));
        transport.set_notification_handler(dispatcher.clone());

        let manager = ChannelManager::new(transport);
        let channels = provider.establish(&manager, &dispatcher)?;
        info!(
            client = %channels.client_name,
            transport = manager.transport().transport_name(),
            lifecycle = ?channels.lifecycle,
            "variable requests ready"
        );

        Ok(Self {
            manager,
            dispatcher,
            store,
            channels,
            config,
        })
    }

    /// Connect over the well-known channel set with default configuration.
    pub fn connect_fixed(transport: Arc<T>) -> Result<Self> {
        Self::connect(transport, FixedChannels::default(), RequestConfig::default())
    }

    /// Register as `client_name` and connect over the negotiated channel set.
    pub fn connect_negotiated(transport: Arc<T>, client_name: &str) -> Result<Self> {
        Self::connect(
            transport,
            NegotiatedChannels::new(HandshakeConfig::new(client_name)),
            RequestConfig::default(),
        )
    }

    /// Read a variable, waiting a bounded time for its first value.
    ///
    /// Returns [`SimValue::Unknown`] when the remote side never reported the
    /// variable within the bound.
    pub fn get(&self, name: &str) -> Result<SimValue> {
        let id = self.begin(name)?;
        let mut waited = 0;
        loop {
            if let Some(value) = self.poll(name, id, waited) {
                return Ok(value);
            }
            std::thread::sleep(self.config.poll_interval);
            waited += 1;
        }
    }

    /// Like [`get`](Self::get), yielding to the runtime between polls.
    #[cfg(feature = "async")]
    pub async fn get_async(&self, name: &str) -> Result<SimValue> {
        let id = self.begin(name)?;
        let mut waited = 0;
        loop {
            if let Some(value) = self.poll(name, id, waited) {
                return Ok(value);
            }
            tokio::time::sleep(self.config.poll_interval).await;
            waited += 1;
        }
    }

    /// Execute a write expression, e.g. `0 (>L:A32NX_COCKPIT_DOOR_LOCKED)`.
    ///
    /// Fire-and-forget; nothing is awaited.
    pub fn set(&self, expr: &str) -> Result<()> {
        debug!(expr, "set");
        self.manager
            .send_command(&self.channels, &Command::SetVariable(expr))
    }

    /// Forget every variable here and on the remote side.
    pub fn clear(&self) -> Result<()> {
        let dropped = {
            let mut store = lock(&self.store);
            let dropped = store.len();
            store.clear();
            dropped
        };
        info!(dropped, "clearing variables");
        self.manager
            .send_command(&self.channels, &Command::ClearVariables)
    }

    /// Ask the remote module to list its local variables on the response
    /// channel. Answers are logged as they arrive.
    pub fn list_lvars(&self) -> Result<()> {
        self.manager
            .send_command(&self.channels, &Command::ListLVars)
    }

    /// Cached value without waiting or subscribing.
    pub fn value(&self, name: &str) -> SimValue {
        lock(&self.store)
            .lookup(name)
            .map(|slot| slot.value)
            .unwrap_or_default()
    }

    /// Snapshot of every live slot in offset order.
    pub fn slots(&self) -> Vec<VariableSlot> {
        lock(&self.store).snapshot()
    }

    /// The channel set in use.
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// The notification handler installed on the transport.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Allocate the slot and, on first reference, subscribe and announce it.
    ///
    /// A slot whose setup fails is discarded, so the next `get` of the same
    /// name starts over.
    fn begin(&self, name: &str) -> Result<u32> {
        if let Some(slot) = lock(&self.store).lookup(name) {
            return Ok(slot.id);
        }
        let announce = encode_command(&Command::AddVariable(name))?;

        // The store lock is released before the transport is touched: a
        // subscription may deliver synchronously into the dispatcher.
        let allocation = lock(&self.store).allocate(name)?;
        if !allocation.is_new {
            return Ok(allocation.id);
        }
        debug!(
            name,
            definition_id = allocation.id,
            offset = allocation.offset,
            "new variable slot"
        );

        let setup = self
            .manager
            .track_variable(&self.channels, allocation.id, allocation.offset)
            .and_then(|()| self.manager.send_encoded(&self.channels, &announce));
        if let Err(err) = setup {
            warn!(
                name,
                definition_id = allocation.id,
                error = %err,
                "variable setup failed"
            );
            lock(&self.store).discard(allocation.id);
            return Err(err);
        }
        Ok(allocation.id)
    }

    /// One poll step. `Some` ends the wait.
    fn poll(&self, name: &str, id: u32, waited: u32) -> Option<SimValue> {
        let mut store = lock(&self.store);
        let (value, ready) = store
            .slot(id)
            .map(|slot| (slot.value, slot.ready))
            .unwrap_or((SimValue::Unknown, false));

        if value.is_known() {
            debug!(name, waited, %value, "get");
            return Some(value);
        }
        if waited < self.config.poll_attempts {
            return None;
        }

        let value = if ready {
            store.confirm_zero(id)
        } else {
            SimValue::Unknown
        };
        debug!(name, waited, %value, ready, "get timed out");
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use bytes::Bytes;
    use mfvars_transport::{
        ClientDataNotification, LoopbackTransport, NotificationHandler, TransportCall,
        TransportError,
    };
    use mfvars_wire::{encode_float, encode_string, WireError};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::channel::ChannelLifecycle;
    use crate::dispatch::Route;
    use crate::error::ClientError;

    const ALT: &str = "(A:PLANE ALTITUDE,Feet)";
    const HDG: &str = "(L:A32NX_AUTOPILOT_HEADING_SELECTED)";

    fn fast() -> RequestConfig {
        RequestConfig {
            poll_interval: Duration::from_millis(1),
            ..RequestConfig::default()
        }
    }

    fn fixed(transport: &Arc<LoopbackTransport>) -> VariableRequests<LoopbackTransport> {
        VariableRequests::connect(Arc::clone(transport), FixedChannels::default(), fast())
            .unwrap()
    }

    /// Accepts everything and never notifies.
    #[derive(Default)]
    struct SilentTransport {
        writes: Mutex<Vec<Bytes>>,
    }

    impl ClientDataTransport for SilentTransport {
        fn bind_area(&self, _area_name: &str, _area_id: u32) -> mfvars_transport::Result<()> {
            Ok(())
        }

        fn create_area(&self, _area_id: u32, _size: usize) -> mfvars_transport::Result<()> {
            Ok(())
        }

        fn define_range(
            &self,
            _definition_id: u32,
            _offset: u32,
            _size: usize,
        ) -> mfvars_transport::Result<()> {
            Ok(())
        }

        fn subscribe_changes(
            &self,
            _area_id: u32,
            _request_id: u32,
            _definition_id: u32,
        ) -> mfvars_transport::Result<()> {
            Ok(())
        }

        fn write_area(
            &self,
            _area_id: u32,
            _definition_id: u32,
            data: &[u8],
        ) -> mfvars_transport::Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push(Bytes::copy_from_slice(data));
            Ok(())
        }

        fn set_notification_handler(&self, _handler: Arc<dyn NotificationHandler>) {}

        fn transport_name(&self) -> &'static str {
            "silent"
        }
    }

    fn notify(engine: &VariableRequests<SilentTransport>, id: u32, value: f32) {
        engine.dispatcher().on_client_data(ClientDataNotification {
            request_id: id,
            definition_id: id,
            data: Bytes::copy_from_slice(&encode_float(value)),
        });
    }

    #[test]
    fn get_returns_reported_value() {
        let transport = Arc::new(LoopbackTransport::new().with_value(ALT, 1234.5));
        let engine = fixed(&transport);

        assert_eq!(engine.get(ALT).unwrap(), SimValue::Value(1234.5));
        assert_eq!(engine.value(ALT), SimValue::Value(1234.5));
        assert_eq!(transport.commands(), vec![format!("MF.SimVars.Add.{ALT}")]);
    }

    #[test]
    fn slots_get_dense_offsets_and_stable_ids() {
        let transport = Arc::new(LoopbackTransport::new().with_value(ALT, 1234.5));
        let engine = fixed(&transport);

        engine.get(ALT).unwrap();
        engine.get(HDG).unwrap();
        engine.get(ALT).unwrap();

        let slots = engine.slots();
        let layout: Vec<(&str, u32, u32)> = slots
            .iter()
            .map(|slot| (slot.name.as_str(), slot.id, slot.offset))
            .collect();
        assert_eq!(layout, vec![(ALT, 1000, 0), (HDG, 1001, 4)]);
        assert_eq!(transport.commands().len(), 2, "repeat get must not re-add");
    }

    #[test]
    fn fixed_variant_creates_areas_and_subscribes_each_slot() {
        let transport = Arc::new(LoopbackTransport::new());
        let engine = fixed(&transport);
        engine.get(ALT).unwrap();

        let calls = transport.calls();
        assert!(calls.contains(&TransportCall::CreateArea {
            area_id: 0,
            size: VARIABLES_AREA_SIZE
        }));
        assert!(calls.contains(&TransportCall::DefineRange {
            definition_id: 1000,
            offset: 0,
            size: FLOAT_SIZE
        }));
        assert!(calls.contains(&TransportCall::SubscribeChanges {
            area_id: 0,
            request_id: 1000,
            definition_id: 1000
        }));
    }

    #[test]
    fn zero_variable_resolves_to_confirmed_zero_after_bound() {
        let transport = Arc::new(LoopbackTransport::new());
        let engine = fixed(&transport);

        assert_eq!(engine.get(HDG).unwrap(), SimValue::ConfirmedZero);
        // Recorded, so the next read does not wait again.
        assert_eq!(engine.value(HDG), SimValue::ConfirmedZero);
    }

    #[test]
    fn pushed_updates_are_visible() {
        let transport = Arc::new(LoopbackTransport::new().with_value(ALT, 100.0));
        let engine = fixed(&transport);
        engine.get(ALT).unwrap();

        transport.set_value(ALT, 250.25);
        assert_eq!(engine.get(ALT).unwrap(), SimValue::Value(250.25));

        transport.set_value(ALT, 0.0);
        assert_eq!(engine.get(ALT).unwrap(), SimValue::ConfirmedZero);
    }

    #[test]
    fn never_reported_variable_is_unknown_within_bound() {
        let engine = VariableRequests::connect(
            Arc::new(SilentTransport::default()),
            FixedChannels::default(),
            fast(),
        )
        .unwrap();

        let started = Instant::now();
        assert_eq!(engine.get(ALT).unwrap(), SimValue::Unknown);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn default_bound_is_about_half_a_second() {
        let config = RequestConfig::default();
        assert_eq!(
            config.poll_interval * config.poll_attempts,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn clear_resets_slots_and_sends_clear_once() {
        let transport = Arc::new(SilentTransport::default());
        let engine =
            VariableRequests::connect(Arc::clone(&transport), FixedChannels::default(), fast())
                .unwrap();

        engine.get(ALT).unwrap();
        notify(&engine, 1000, 1234.5);
        engine.get(HDG).unwrap();
        assert_eq!(engine.get(ALT).unwrap(), SimValue::Value(1234.5));

        engine.clear().unwrap();
        assert!(engine.slots().is_empty());
        assert_eq!(engine.value(ALT), SimValue::Unknown);

        let clears = transport
            .writes
            .lock()
            .unwrap()
            .iter()
            .filter(|buf| buf.starts_with(b"MF.SimVars.Clear\0"))
            .count();
        assert_eq!(clears, 1);

        // A late sample for the cleared id is dropped.
        notify(&engine, 1000, 99.0);
        assert_eq!(engine.get(ALT).unwrap(), SimValue::Unknown);

        let slot = engine.slots().pop().unwrap();
        assert_eq!((slot.id, slot.offset), (1002, 0));

        notify(&engine, 1002, 1234.5);
        assert_eq!(engine.get(ALT).unwrap(), SimValue::Value(1234.5));
    }

    #[test]
    fn set_sends_command_without_waiting() {
        let transport = Arc::new(LoopbackTransport::new());
        let engine = fixed(&transport);

        engine.set("1 (>L:A32NX_COCKPIT_DOOR_LOCKED)").unwrap();

        assert_eq!(
            transport.commands(),
            vec!["MF.SimVars.Set.1 (>L:A32NX_COCKPIT_DOOR_LOCKED)"]
        );
        assert_eq!(transport.value("(L:A32NX_COCKPIT_DOOR_LOCKED)"), Some(1.0));
    }

    #[test]
    fn list_lvars_is_answered_on_response_channel() {
        let transport =
            Arc::new(LoopbackTransport::new().with_value("(L:A32NX_FMA_LATERAL_MODE)", 1.0));
        let engine = fixed(&transport);

        engine.list_lvars().unwrap();

        assert_eq!(transport.commands(), vec!["MF.LVars.List"]);
        // Answers are informational and never allocate slots.
        assert!(engine.slots().is_empty());
        let answer = encode_string("(L:A32NX_FMA_LATERAL_MODE)").unwrap();
        let route = engine.dispatcher().dispatch(&ClientDataNotification {
            request_id: 0,
            definition_id: 0,
            data: answer,
        });
        assert_eq!(
            route,
            Route::Response("(L:A32NX_FMA_LATERAL_MODE)".to_string())
        );
    }

    #[test]
    fn oversized_set_is_rejected() {
        let transport = Arc::new(LoopbackTransport::new());
        let engine = fixed(&transport);

        let result = engine.set(&"9".repeat(300));
        assert!(matches!(result, Err(ClientError::Wire(_))));
        assert!(transport.commands().is_empty());
    }

    #[test]
    fn unencodable_name_leaves_no_slot() {
        let transport = Arc::new(LoopbackTransport::new());
        let engine = fixed(&transport);
        let long_name = format!("(L:{})", "X".repeat(250));

        for _ in 0..2 {
            assert!(matches!(
                engine.get(&long_name),
                Err(ClientError::Wire(WireError::CommandTooLong { .. }))
            ));
        }
        assert!(matches!(
            engine.get("(L:HÖHE)"),
            Err(ClientError::Wire(WireError::NonAscii))
        ));

        assert!(engine.slots().is_empty());
        assert!(transport.commands().is_empty());
        assert!(!transport
            .calls()
            .iter()
            .any(|call| matches!(call, TransportCall::DefineRange { .. })));
    }

    #[test]
    fn failed_announce_is_retried_on_next_get() {
        let transport = Arc::new(
            LoopbackTransport::new()
                .with_value(ALT, 1234.5)
                .rejecting_writes(1),
        );
        let engine = fixed(&transport);

        assert!(matches!(
            engine.get(ALT),
            Err(ClientError::Transport(TransportError::Rejected(_)))
        ));
        assert!(engine.slots().is_empty());
        assert_eq!(engine.value(ALT), SimValue::Unknown);

        assert_eq!(engine.get(ALT).unwrap(), SimValue::Value(1234.5));
        let slot = engine.slots().pop().unwrap();
        assert_eq!((slot.id, slot.offset), (1001, 0));
        assert_eq!(transport.commands(), vec![format!("MF.SimVars.Add.{ALT}")]);
    }

    #[test]
    fn capacity_follows_area_size() {
        let engine = VariableRequests::connect(
            Arc::new(SilentTransport::default()),
            FixedChannels::default(),
            RequestConfig {
                poll_attempts: 0,
                variables_area_size: 2 * FLOAT_SIZE,
                ..fast()
            },
        )
        .unwrap();

        engine.get("(L:A)").unwrap();
        engine.get("(L:B)").unwrap();
        assert!(matches!(
            engine.get("(L:C)"),
            Err(ClientError::CapacityExceeded { capacity: 2, .. })
        ));
    }

    #[test]
    fn negotiated_variant_uses_private_channels() {
        let transport = Arc::new(LoopbackTransport::new().with_value(ALT, 1234.5));
        let engine = VariableRequests::connect(
            Arc::clone(&transport),
            NegotiatedChannels::new(HandshakeConfig::new("Cockpit")),
            fast(),
        )
        .unwrap();

        let channels = engine.channels();
        assert_eq!(channels.lifecycle, ChannelLifecycle::Negotiated);
        assert_eq!(channels.command.area_name, "Cockpit.Command");
        assert_eq!(channels.command.area_id, 4);

        assert_eq!(engine.get(ALT).unwrap(), SimValue::Value(1234.5));
        assert_eq!(transport.subscribed_variables("Cockpit"), vec![ALT]);
        assert!(transport.subscribed_variables("MobiFlight").is_empty());
        assert_eq!(
            transport.commands(),
            vec![
                "Do Nothing".to_string(),
                "MF.Clients.Add.Cockpit".to_string(),
                format!("MF.SimVars.Add.{ALT}"),
            ]
        );
    }

    #[test]
    fn negotiation_survives_dropped_first_command() {
        let transport = Arc::new(LoopbackTransport::new().with_first_command_dropped());
        let engine = VariableRequests::connect_negotiated(Arc::clone(&transport), "Cockpit");
        assert!(engine.is_ok());
    }

    #[test]
    fn negotiation_times_out_against_silent_module() {
        let transport = Arc::new(LoopbackTransport::new().unresponsive());
        let config = HandshakeConfig {
            timeout: Some(Duration::from_millis(50)),
            ..HandshakeConfig::new("Cockpit")
        };

        let result = VariableRequests::connect(transport, NegotiatedChannels::new(config), fast());
        assert!(matches!(result, Err(ClientError::Timeout(_))));
    }

    #[test]
    fn negotiation_can_be_cancelled() {
        let transport = Arc::new(LoopbackTransport::new().unresponsive());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let config = HandshakeConfig {
            timeout: None,
            cancel,
            ..HandshakeConfig::new("Cockpit")
        };

        let result = VariableRequests::connect(transport, NegotiatedChannels::new(config), fast());
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }

    #[test]
    fn negotiation_rejects_invalid_client_name() {
        let transport = Arc::new(LoopbackTransport::new());
        let result = VariableRequests::connect_negotiated(transport, "two words");
        assert!(matches!(result, Err(ClientError::HandshakeFailed(_))));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn get_async_returns_reported_value() {
        let transport = Arc::new(LoopbackTransport::new().with_value(ALT, 42.0));
        let engine = fixed(&transport);

        assert_eq!(engine.get_async(ALT).await.unwrap(), SimValue::Value(42.0));
        assert_eq!(engine.get_async(HDG).await.unwrap(), SimValue::ConfirmedZero);
    }
}
