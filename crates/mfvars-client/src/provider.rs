//! Sources of the channel set an engine talks over.

use std::sync::Arc;

use mfvars_transport::ClientDataTransport;
use mfvars_wire::{Command, VARIABLES_AREA_SIZE};
use tracing::info;

use crate::channel::{ChannelManager, ChannelSet};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::handshake::{validate_client_name, HandshakeConfig, Negotiator};

/// Produces a ready channel set for an engine.
pub trait ChannelSetProvider {
    /// Negotiator the dispatcher should feed handshake payloads to.
    fn negotiator(&self) -> Option<Arc<Negotiator>> {
        None
    }

    /// Bind, define and subscribe everything needed, returning the set the
    /// engine should use for variables and commands.
    fn establish<T: ClientDataTransport + ?Sized>(
        &self,
        manager: &ChannelManager<T>,
        dispatcher: &Dispatcher,
    ) -> Result<ChannelSet>;
}

/// Well-known identifiers; the client creates the areas itself.
#[derive(Debug, Clone)]
pub struct FixedChannels {
    set: ChannelSet,
    variables_area_size: usize,
}

impl FixedChannels {
    pub fn new(set: ChannelSet, variables_area_size: usize) -> Self {
        Self {
            set,
            variables_area_size,
        }
    }
}

impl Default for FixedChannels {
    fn default() -> Self {
        Self::new(ChannelSet::well_known(), VARIABLES_AREA_SIZE)
    }
}

impl ChannelSetProvider for FixedChannels {
    fn establish<T: ClientDataTransport + ?Sized>(
        &self,
        manager: &ChannelManager<T>,
        dispatcher: &Dispatcher,
    ) -> Result<ChannelSet> {
        dispatcher.watch_response(self.set.response.definition_id);
        manager.initialize_created(&self.set, self.variables_area_size)?;
        Ok(self.set.clone())
    }
}

/// Private identifiers obtained through the registration handshake.
#[derive(Debug)]
pub struct NegotiatedChannels {
    config: HandshakeConfig,
    negotiator: Arc<Negotiator>,
}

impl NegotiatedChannels {
    pub fn new(config: HandshakeConfig) -> Self {
        let negotiator = Arc::new(Negotiator::new(config.client_name.clone()));
        Self { config, negotiator }
    }
}

impl ChannelSetProvider for NegotiatedChannels {
    fn negotiator(&self) -> Option<Arc<Negotiator>> {
        Some(Arc::clone(&self.negotiator))
    }

    fn establish<T: ClientDataTransport + ?Sized>(
        &self,
        manager: &ChannelManager<T>,
        dispatcher: &Dispatcher,
    ) -> Result<ChannelSet> {
        let name = self.config.client_name.as_str();
        validate_client_name(name)?;

        let init = ChannelSet::well_known();
        dispatcher.watch_response(init.response.definition_id);
        manager.initialize(&init)?;

        info!(client = name, "registering client");
        // The first command after a fresh connection may be dropped.
        manager.send_command(&init, &Command::Noop)?;
        manager.send_command(&init, &Command::RegisterClient(name))?;

        let ids = self
            .negotiator
            .wait_ready(self.config.timeout, &self.config.cancel)?;

        let set = ChannelSet::negotiated(name, ids);
        dispatcher.watch_response(set.response.definition_id);
        manager.initialize(&set)?;
        Ok(set)
    }
}
