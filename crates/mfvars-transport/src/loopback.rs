use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use mfvars_wire::{
    area_name, client_area_name, decode_string, encode_float, encode_string, AreaKind, Command, DATA_STRING_SIZE,
    FLOAT_SIZE, INIT_CLIENT_NAME, INIT_COMMAND_AREA, INIT_RESPONSE_AREA, INIT_VARIABLES_AREA,
    VARIABLES_AREA_SIZE,
};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{ClientDataNotification, ClientDataTransport, NotificationHandler};

/// First area id suggested to newly registered clients.
const FIRST_CLIENT_AREA_ID: u32 = 3;

/// One call made against a [`LoopbackTransport`], recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    BindArea {
        area_name: String,
        area_id: u32,
    },
    CreateArea {
        area_id: u32,
        size: usize,
    },
    DefineRange {
        definition_id: u32,
        offset: u32,
        size: usize,
    },
    SubscribeChanges {
        area_id: u32,
        request_id: u32,
        definition_id: u32,
    },
    WriteArea {
        area_id: u32,
        definition_id: u32,
        data: Bytes,
    },
}

/// In-process transport emulating the remote module.
///
/// Areas, definitions and subscriptions behave like the simulation
/// interface: a subscription delivers the current range content once, then
/// only when the bytes change. Commands written to any `*.Command` area are
/// interpreted the way the module does, including client registration.
///
/// Notifications are delivered synchronously on the writing thread after the
/// internal lock is released.
pub struct LoopbackTransport {
    state: Mutex<ModuleState>,
    handler: Mutex<Option<Arc<dyn NotificationHandler>>>,
}

struct Subscription {
    area: String,
    request_id: u32,
    definition_id: u32,
    offset: usize,
    size: usize,
    last: Option<Vec<u8>>,
}

struct EmulatedClient {
    name: String,
    area_ids: [u32; 3],
    variables: Vec<String>,
}

struct ModuleState {
    bindings: HashMap<u32, String>,
    areas: HashMap<String, Vec<u8>>,
    definitions: HashMap<u32, (u32, usize)>,
    subscriptions: Vec<Subscription>,
    clients: Vec<EmulatedClient>,
    values: HashMap<String, f32>,
    next_area_id: u32,
    drop_next_command: bool,
    unresponsive: bool,
    rejected_writes: u32,
    calls: Vec<TransportCall>,
    pending: Vec<ClientDataNotification>,
}

impl LoopbackTransport {
    /// Create a loopback with the well-known `MobiFlight.*` areas in place.
    pub fn new() -> Self {
        let mut state = ModuleState {
            bindings: HashMap::new(),
            areas: HashMap::new(),
            definitions: HashMap::new(),
            subscriptions: Vec::new(),
            clients: Vec::new(),
            values: HashMap::new(),
            next_area_id: FIRST_CLIENT_AREA_ID,
            drop_next_command: false,
            unresponsive: false,
            rejected_writes: 0,
            calls: Vec::new(),
            pending: Vec::new(),
        };
        state.create_client_areas(INIT_CLIENT_NAME);
        state.clients.push(EmulatedClient {
            name: INIT_CLIENT_NAME.to_string(),
            area_ids: [INIT_VARIABLES_AREA, INIT_COMMAND_AREA, INIT_RESPONSE_AREA],
            variables: Vec::new(),
        });

        Self {
            state: Mutex::new(state),
            handler: Mutex::new(None),
        }
    }

    /// Seed an emulated simulation value.
    pub fn with_value(self, expr: &str, value: f32) -> Self {
        self.lock().values.insert(expr.to_string(), value);
        self
    }

    /// Ignore the first command written after construction.
    pub fn with_first_command_dropped(self) -> Self {
        self.lock().drop_next_command = true;
        self
    }

    /// Accept writes but never act on commands.
    pub fn unresponsive(self) -> Self {
        self.lock().unresponsive = true;
        self
    }

    /// Refuse the next `count` writes with [`TransportError::Rejected`].
    ///
    /// Refused writes are not recorded in [`calls`](Self::calls).
    pub fn rejecting_writes(self, count: u32) -> Self {
        self.lock().rejected_writes = count;
        self
    }

    /// Change an emulated simulation value and push it to every subscriber.
    pub fn set_value(&self, expr: &str, value: f32) {
        let pending = {
            let mut state = self.lock();
            state.set_value(expr, value);
            std::mem::take(&mut state.pending)
        };
        self.deliver(pending);
    }

    /// Current emulated simulation value.
    pub fn value(&self, expr: &str) -> Option<f32> {
        self.lock().values.get(expr).copied()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    /// Decoded text of every write into a command area, in order.
    pub fn commands(&self) -> Vec<String> {
        let state = self.lock();
        state
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::WriteArea { area_id, data, .. }
                    if state
                        .bindings
                        .get(area_id)
                        .is_some_and(|name| name.ends_with(AreaKind::Command.suffix())) =>
                {
                    decode_string(data).ok()
                }
                _ => None,
            })
            .collect()
    }

    /// Expressions the module currently reports for a client, in offset order.
    pub fn subscribed_variables(&self, client_name: &str) -> Vec<String> {
        self.lock()
            .clients
            .iter()
            .find(|client| client.name == client_name)
            .map(|client| client.variables.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, ModuleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, pending: Vec<ClientDataNotification>) {
        if pending.is_empty() {
            return;
        }
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => {
                for notification in pending {
                    handler.on_client_data(notification);
                }
            }
            None => debug!(count = pending.len(), "no notification handler; dropping"),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ModuleState) -> Result<T>) -> Result<T> {
        let (result, pending) = {
            let mut state = self.lock();
            let result = f(&mut state);
            (result, std::mem::take(&mut state.pending))
        };
        self.deliver(pending);
        result
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientDataTransport for LoopbackTransport {
    fn bind_area(&self, area_name: &str, area_id: u32) -> Result<()> {
        self.with_state(|state| {
            state.calls.push(TransportCall::BindArea {
                area_name: area_name.to_string(),
                area_id,
            });
            state.bindings.insert(area_id, area_name.to_string());
            Ok(())
        })
    }

    fn create_area(&self, area_id: u32, size: usize) -> Result<()> {
        self.with_state(|state| {
            state.calls.push(TransportCall::CreateArea { area_id, size });
            let name = state.bound_name(area_id)?;
            if state.areas.contains_key(&name) {
                debug!(%name, "area already exists");
            } else {
                state.areas.insert(name, vec![0; size]);
            }
            Ok(())
        })
    }

    fn define_range(&self, definition_id: u32, offset: u32, size: usize) -> Result<()> {
        self.with_state(|state| {
            state.calls.push(TransportCall::DefineRange {
                definition_id,
                offset,
                size,
            });
            match state.definitions.get(&definition_id) {
                Some(&existing) if existing != (offset, size) => {
                    Err(TransportError::DefinitionConflict {
                        definition_id,
                        offset: existing.0,
                        size: existing.1,
                    })
                }
                _ => {
                    state.definitions.insert(definition_id, (offset, size));
                    Ok(())
                }
            }
        })
    }

    fn subscribe_changes(&self, area_id: u32, request_id: u32, definition_id: u32) -> Result<()> {
        self.with_state(|state| {
            state.calls.push(TransportCall::SubscribeChanges {
                area_id,
                request_id,
                definition_id,
            });
            let (name, offset, size) = state.resolve(area_id, definition_id)?;
            state
                .subscriptions
                .retain(|sub| !(sub.area == name && sub.request_id == request_id));
            state.subscriptions.push(Subscription {
                area: name,
                request_id,
                definition_id,
                offset,
                size,
                last: None,
            });
            state.collect_changes();
            Ok(())
        })
    }

    fn write_area(&self, area_id: u32, definition_id: u32, data: &[u8]) -> Result<()> {
        self.with_state(|state| {
            if state.rejected_writes > 0 {
                state.rejected_writes -= 1;
                return Err(TransportError::Rejected(format!(
                    "write to client data area {area_id} refused"
                )));
            }
            state.calls.push(TransportCall::WriteArea {
                area_id,
                definition_id,
                data: Bytes::copy_from_slice(data),
            });
            let (name, offset, size) = state.resolve(area_id, definition_id)?;
            if data.len() != size {
                return Err(TransportError::SizeMismatch {
                    definition_id,
                    expected: size,
                    actual: data.len(),
                });
            }
            state.write_range(&name, offset, data);
            if let Some(client) = name.strip_suffix(AreaKind::Command.suffix()) {
                let client = client.trim_end_matches('.').to_string();
                state.handle_command(&client);
            }
            Ok(())
        })
    }

    fn set_notification_handler(&self, handler: Arc<dyn NotificationHandler>) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn transport_name(&self) -> &'static str {
        "loopback"
    }
}

impl ModuleState {
    fn bound_name(&self, area_id: u32) -> Result<String> {
        self.bindings
            .get(&area_id)
            .cloned()
            .ok_or(TransportError::UnknownArea(area_id))
    }

    /// Resolve an area id and definition to `(area name, offset, size)`.
    fn resolve(&self, area_id: u32, definition_id: u32) -> Result<(String, usize, usize)> {
        let name = self.bound_name(area_id)?;
        let area = self
            .areas
            .get(&name)
            .ok_or_else(|| TransportError::AreaNotCreated(name.clone()))?;
        let &(offset, size) = self
            .definitions
            .get(&definition_id)
            .ok_or(TransportError::UnknownDefinition(definition_id))?;
        if offset as usize + size > area.len() {
            return Err(TransportError::OutOfBounds {
                area_id,
                offset,
                size,
                capacity: area.len(),
            });
        }
        Ok((name, offset as usize, size))
    }

    fn create_client_areas(&mut self, client: &str) {
        for (kind, size) in [
            (AreaKind::Variables, VARIABLES_AREA_SIZE),
            (AreaKind::Command, DATA_STRING_SIZE),
            (AreaKind::Response, DATA_STRING_SIZE),
        ] {
            self.areas
                .entry(module_area_name(client, kind))
                .or_insert_with(|| vec![0; size]);
        }
    }

    fn write_range(&mut self, area: &str, offset: usize, data: &[u8]) {
        let Some(buf) = self.areas.get_mut(area) else {
            warn!(area, "write to missing area");
            return;
        };
        let Some(range) = buf.get_mut(offset..offset + data.len()) else {
            warn!(area, offset, len = data.len(), "write outside area");
            return;
        };
        range.copy_from_slice(data);
        self.collect_changes();
    }

    fn collect_changes(&mut self) {
        for sub in &mut self.subscriptions {
            let Some(current) = self
                .areas
                .get(&sub.area)
                .and_then(|buf| buf.get(sub.offset..sub.offset + sub.size))
            else {
                continue;
            };
            if sub.last.as_deref() == Some(current) {
                continue;
            }
            sub.last = Some(current.to_vec());
            self.pending.push(ClientDataNotification {
                request_id: sub.request_id,
                definition_id: sub.definition_id,
                data: Bytes::copy_from_slice(current),
            });
        }
    }

    fn handle_command(&mut self, client: &str) {
        let area = module_area_name(client, AreaKind::Command);
        let text = match self.areas.get(&area).map(|buf| decode_string(buf)) {
            Some(Ok(text)) => text,
            Some(Err(err)) => {
                warn!(%area, %err, "undecodable command");
                return;
            }
            None => return,
        };
        if self.unresponsive {
            debug!(%text, "unresponsive module ignores command");
            return;
        }
        if self.drop_next_command {
            self.drop_next_command = false;
            debug!(%text, "dropping first command");
            return;
        }

        match Command::parse(&text) {
            Command::RegisterClient(name) => self.register_client(name),
            Command::AddVariable(expr) => self.add_variable(client, expr),
            Command::SetVariable(expr) => match parse_set_expression(expr) {
                Some((target, value)) => self.set_value(&target, value),
                None => debug!(expr, "set expression not emulated"),
            },
            Command::ClearVariables => {
                if let Some(entry) = self.client_mut(client) {
                    entry.variables.clear();
                }
            }
            Command::ListLVars => self.list_lvars(client),
            Command::Noop | Command::Other(_) => debug!(%text, "command ignored"),
        }
    }

    fn client_mut(&mut self, name: &str) -> Option<&mut EmulatedClient> {
        self.clients.iter_mut().find(|client| client.name == name)
    }

    fn register_client(&mut self, name: &str) {
        if name.is_empty() {
            warn!("refusing to register an unnamed client");
            return;
        }
        let existing = self
            .clients
            .iter()
            .find(|client| client.name == name)
            .map(|client| client.area_ids);
        let area_ids = match existing {
            Some(ids) => ids,
            None => {
                let ids = [
                    self.next_free_area_id(),
                    self.next_free_area_id(),
                    self.next_free_area_id(),
                ];
                self.create_client_areas(name);
                self.clients.push(EmulatedClient {
                    name: name.to_string(),
                    area_ids: ids,
                    variables: Vec::new(),
                });
                info!(client = name, ?ids, "registered client");
                ids
            }
        };
        let payload = serde_json::json!({
            "Name": name,
            "SimVars": area_ids[0],
            "Command": area_ids[1],
            "Response": area_ids[2],
        });
        self.respond(INIT_CLIENT_NAME, &payload.to_string());
    }

    fn next_free_area_id(&mut self) -> u32 {
        while self.bindings.contains_key(&self.next_area_id) {
            self.next_area_id += 1;
        }
        let id = self.next_area_id;
        self.next_area_id += 1;
        id
    }

    fn add_variable(&mut self, client: &str, expr: &str) {
        let value = self.values.get(expr).copied().unwrap_or(0.0);
        let Some(entry) = self.client_mut(client) else {
            warn!(client, "add for unknown client");
            return;
        };
        entry.variables.push(expr.to_string());
        let index = entry.variables.len() - 1;
        self.write_value(client, index, value);
    }

    fn set_value(&mut self, expr: &str, value: f32) {
        self.values.insert(expr.to_string(), value);
        let targets: Vec<(String, usize)> = self
            .clients
            .iter()
            .flat_map(|client| {
                client
                    .variables
                    .iter()
                    .enumerate()
                    .filter(|(_, var)| var.as_str() == expr)
                    .map(|(index, _)| (client.name.clone(), index))
            })
            .collect();
        for (client, index) in targets {
            self.write_value(&client, index, value);
        }
    }

    fn write_value(&mut self, client: &str, index: usize, value: f32) {
        let area = module_area_name(client, AreaKind::Variables);
        self.write_range(&area, index * FLOAT_SIZE, &encode_float(value));
    }

    fn list_lvars(&mut self, client: &str) {
        let mut names: Vec<String> = self
            .values
            .keys()
            .filter(|name| name.starts_with("(L:"))
            .cloned()
            .collect();
        names.sort();
        for name in names {
            self.respond(client, &name);
        }
    }

    fn respond(&mut self, client: &str, text: &str) {
        match encode_string(text) {
            Ok(buf) => {
                let area = module_area_name(client, AreaKind::Response);
                self.write_range(&area, 0, &buf);
            }
            Err(err) => warn!(client, %err, "response does not fit"),
        }
    }
}

/// Area names as the module spells them for a client.
fn module_area_name(client: &str, kind: AreaKind) -> String {
    if client == INIT_CLIENT_NAME {
        area_name(client, kind)
    } else {
        client_area_name(client, kind)
    }
}

/// Parse `"<value> (>X:NAME)"` into the read expression `(X:NAME)` and value.
fn parse_set_expression(expr: &str) -> Option<(String, f32)> {
    let (value, target) = expr.trim().split_once(' ')?;
    let value: f32 = value.parse().ok()?;
    let name = target.trim().strip_prefix("(>")?.strip_suffix(')')?;
    Some((format!("({name})"), value))
}

#[cfg(test)]
mod tests {
    use mfvars_wire::{
        decode_float, encode_command, INIT_STRING_DEFINITION_ID, SIMVAR_DEFINITION_BASE,
    };

    use super::*;

    fn recording(transport: &LoopbackTransport) -> Arc<Mutex<Vec<ClientDataNotification>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        transport.set_notification_handler(Arc::new(move |n: ClientDataNotification| {
            sink.lock().unwrap().push(n)
        }));
        seen
    }

    fn init_channels(transport: &LoopbackTransport) {
        for kind in [AreaKind::Variables, AreaKind::Command, AreaKind::Response] {
            let id = match kind {
                AreaKind::Variables => INIT_VARIABLES_AREA,
                AreaKind::Command => INIT_COMMAND_AREA,
                AreaKind::Response => INIT_RESPONSE_AREA,
            };
            transport
                .bind_area(&area_name(INIT_CLIENT_NAME, kind), id)
                .unwrap();
        }
        transport
            .define_range(INIT_STRING_DEFINITION_ID, 0, DATA_STRING_SIZE)
            .unwrap();
        transport
            .subscribe_changes(
                INIT_RESPONSE_AREA,
                INIT_STRING_DEFINITION_ID,
                INIT_STRING_DEFINITION_ID,
            )
            .unwrap();
    }

    fn send(transport: &LoopbackTransport, command: Command<'_>) {
        let buf = encode_command(&command).unwrap();
        transport
            .write_area(INIT_COMMAND_AREA, INIT_STRING_DEFINITION_ID, &buf)
            .unwrap();
    }

    #[test]
    fn subscription_delivers_initial_content_once() {
        let transport = LoopbackTransport::new();
        let seen = recording(&transport);
        init_channels(&transport);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].definition_id, INIT_STRING_DEFINITION_ID);
        assert_eq!(decode_string(&seen[0].data).unwrap(), "");
    }

    #[test]
    fn register_client_answers_with_area_ids() {
        let transport = LoopbackTransport::new();
        let seen = recording(&transport);
        init_channels(&transport);

        send(&transport, Command::RegisterClient("Cockpit"));

        let seen = seen.lock().unwrap();
        let response = decode_string(&seen.last().unwrap().data).unwrap();
        let json: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(json["Name"], "Cockpit");
        assert_eq!(json["SimVars"], 3);
        assert_eq!(json["Command"], 4);
        assert_eq!(json["Response"], 5);
    }

    #[test]
    fn added_variable_is_pushed_and_refreshed_on_change() {
        let transport = LoopbackTransport::new().with_value("(A:PLANE ALTITUDE,Feet)", 1234.5);
        let seen = recording(&transport);
        init_channels(&transport);

        transport
            .define_range(SIMVAR_DEFINITION_BASE, 0, FLOAT_SIZE)
            .unwrap();
        transport
            .subscribe_changes(
                INIT_VARIABLES_AREA,
                SIMVAR_DEFINITION_BASE,
                SIMVAR_DEFINITION_BASE,
            )
            .unwrap();
        send(&transport, Command::AddVariable("(A:PLANE ALTITUDE,Feet)"));

        let values: Vec<f32> = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.definition_id == SIMVAR_DEFINITION_BASE)
            .map(|n| decode_float(&n.data).unwrap())
            .collect();
        assert_eq!(values, vec![0.0, 1234.5]);

        transport.set_value("(A:PLANE ALTITUDE,Feet)", 1234.5);
        transport.set_value("(A:PLANE ALTITUDE,Feet)", 2000.0);
        let count = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.definition_id == SIMVAR_DEFINITION_BASE)
            .count();
        assert_eq!(count, 3, "unchanged value must not be redelivered");
    }

    #[test]
    fn set_command_updates_emulated_value() {
        let transport = LoopbackTransport::new();
        init_channels(&transport);

        send(
            &transport,
            Command::SetVariable("1 (>L:A32NX_COCKPIT_DOOR_LOCKED)"),
        );

        assert_eq!(transport.value("(L:A32NX_COCKPIT_DOOR_LOCKED)"), Some(1.0));
    }

    #[test]
    fn clear_drops_client_variables() {
        let transport = LoopbackTransport::new();
        init_channels(&transport);

        send(&transport, Command::AddVariable("(L:A)"));
        assert_eq!(transport.subscribed_variables(INIT_CLIENT_NAME), vec!["(L:A)"]);

        send(&transport, Command::ClearVariables);
        assert!(transport.subscribed_variables(INIT_CLIENT_NAME).is_empty());
        assert_eq!(
            transport.commands(),
            vec!["MF.SimVars.Add.(L:A)", "MF.SimVars.Clear"]
        );
    }

    #[test]
    fn first_command_can_be_dropped() {
        let transport = LoopbackTransport::new().with_first_command_dropped();
        init_channels(&transport);

        send(&transport, Command::AddVariable("(L:A)"));
        send(&transport, Command::AddVariable("(L:B)"));

        assert_eq!(transport.subscribed_variables(INIT_CLIENT_NAME), vec!["(L:B)"]);
    }

    #[test]
    fn rejected_writes_fail_and_are_not_applied() {
        let transport = LoopbackTransport::new().rejecting_writes(1);
        init_channels(&transport);

        let buf = encode_command(&Command::AddVariable("(L:A)")).unwrap();
        let result = transport.write_area(INIT_COMMAND_AREA, INIT_STRING_DEFINITION_ID, &buf);
        assert!(matches!(result, Err(TransportError::Rejected(_))));
        assert!(transport.subscribed_variables(INIT_CLIENT_NAME).is_empty());
        assert!(transport.commands().is_empty());

        send(&transport, Command::AddVariable("(L:A)"));
        assert_eq!(transport.subscribed_variables(INIT_CLIENT_NAME), vec!["(L:A)"]);
    }

    #[test]
    fn registered_client_areas_use_private_spelling() {
        let transport = LoopbackTransport::new();
        init_channels(&transport);
        send(&transport, Command::RegisterClient("Cockpit"));

        transport.bind_area("Cockpit.Lvars", 3).unwrap();
        transport.define_range(SIMVAR_DEFINITION_BASE, 0, FLOAT_SIZE).unwrap();
        transport
            .subscribe_changes(3, SIMVAR_DEFINITION_BASE, SIMVAR_DEFINITION_BASE)
            .unwrap();

        transport.bind_area("Cockpit.LVars", 9).unwrap();
        let result = transport.subscribe_changes(9, SIMVAR_DEFINITION_BASE, SIMVAR_DEFINITION_BASE);
        assert!(matches!(result, Err(TransportError::AreaNotCreated(_))));
    }

    #[test]
    fn unresponsive_module_ignores_commands() {
        let transport = LoopbackTransport::new().unresponsive();
        let seen = recording(&transport);
        init_channels(&transport);

        send(&transport, Command::RegisterClient("Cockpit"));

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn list_lvars_answers_on_response_area() {
        let transport = LoopbackTransport::new()
            .with_value("(L:B)", 1.0)
            .with_value("(L:A)", 2.0)
            .with_value("(A:GROUND ALTITUDE,Meters)", 3.0);
        let seen = recording(&transport);
        init_channels(&transport);

        send(&transport, Command::ListLVars);

        let responses: Vec<String> = seen
            .lock()
            .unwrap()
            .iter()
            .skip(1)
            .map(|n| decode_string(&n.data).unwrap())
            .collect();
        assert_eq!(responses, vec!["(L:A)", "(L:B)"]);
    }

    #[test]
    fn write_to_unbound_area_fails() {
        let transport = LoopbackTransport::new();
        let result = transport.write_area(42, 0, &[0; 4]);
        assert!(matches!(result, Err(TransportError::UnknownArea(42))));
    }

    #[test]
    fn write_size_must_match_definition() {
        let transport = LoopbackTransport::new();
        init_channels(&transport);

        let result = transport.write_area(INIT_COMMAND_AREA, INIT_STRING_DEFINITION_ID, b"short");
        assert!(matches!(result, Err(TransportError::SizeMismatch { .. })));
    }

    #[test]
    fn conflicting_definition_is_rejected() {
        let transport = LoopbackTransport::new();
        transport.define_range(1000, 0, 4).unwrap();
        transport.define_range(1000, 0, 4).unwrap();

        let result = transport.define_range(1000, 4, 4);
        assert!(matches!(
            result,
            Err(TransportError::DefinitionConflict { .. })
        ));
    }

    #[test]
    fn parse_set_expression_extracts_target() {
        assert_eq!(
            parse_set_expression("0 (>L:A32NX_COCKPIT_DOOR_LOCKED)"),
            Some(("(L:A32NX_COCKPIT_DOOR_LOCKED)".to_string(), 0.0))
        );
        assert_eq!(parse_set_expression("(>K:TOGGLE)"), None);
        assert_eq!(parse_set_expression("x (>L:A)"), None);
    }
}
