use std::sync::Arc;

use mfvars_transport::ClientDataTransport;
use mfvars_wire::{
    area_name, client_area_name, encode_command, AreaKind, Command, CLIENT_STRING_DEFINITION_ID,
    DATA_STRING_OFFSET, DATA_STRING_SIZE, FLOAT_SIZE, INIT_CLIENT_NAME, INIT_COMMAND_AREA,
    INIT_RESPONSE_AREA, INIT_STRING_DEFINITION_ID, INIT_VARIABLES_AREA, SIMVAR_DEFINITION_BASE,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;

/// A logical channel bound to a client data area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelBinding {
    /// Symbolic area name, e.g. `MobiFlight.Command`.
    pub area_name: String,
    /// Numeric area id the transport understands.
    pub area_id: u32,
    /// Definition id of the channel's own layout.
    pub definition_id: u32,
}

/// Where the identifiers of a channel set come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLifecycle {
    /// Well-known constants agreed out of band.
    Fixed,
    /// Received from the remote side during the handshake.
    Negotiated,
}

/// Area ids of a private channel set, as announced by the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelIds {
    pub variables: u32,
    pub command: u32,
    pub response: u32,
}

/// The Variables, Command and Response channels of one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSet {
    pub client_name: String,
    pub variables: ChannelBinding,
    pub command: ChannelBinding,
    pub response: ChannelBinding,
    pub lifecycle: ChannelLifecycle,
}

impl ChannelSet {
    /// The well-known `MobiFlight.*` set.
    pub fn well_known() -> Self {
        Self::build(
            INIT_CLIENT_NAME,
            ChannelIds {
                variables: INIT_VARIABLES_AREA,
                command: INIT_COMMAND_AREA,
                response: INIT_RESPONSE_AREA,
            },
            INIT_STRING_DEFINITION_ID,
            ChannelLifecycle::Fixed,
        )
    }

    /// A private set for `client_name` using ids received in the handshake.
    pub fn negotiated(client_name: &str, ids: ChannelIds) -> Self {
        Self::build(
            client_name,
            ids,
            CLIENT_STRING_DEFINITION_ID,
            ChannelLifecycle::Negotiated,
        )
    }

    fn build(
        client_name: &str,
        ids: ChannelIds,
        string_definition_id: u32,
        lifecycle: ChannelLifecycle,
    ) -> Self {
        let name_of: fn(&str, AreaKind) -> String = match lifecycle {
            ChannelLifecycle::Fixed => area_name,
            ChannelLifecycle::Negotiated => client_area_name,
        };
        let binding = |kind: AreaKind, area_id: u32, definition_id: u32| ChannelBinding {
            area_name: name_of(client_name, kind),
            area_id,
            definition_id,
        };
        Self {
            client_name: client_name.to_string(),
            variables: binding(AreaKind::Variables, ids.variables, SIMVAR_DEFINITION_BASE),
            command: binding(AreaKind::Command, ids.command, string_definition_id),
            response: binding(AreaKind::Response, ids.response, string_definition_id),
            lifecycle,
        }
    }

    /// All three bindings, Variables first.
    pub fn bindings(&self) -> [&ChannelBinding; 3] {
        [&self.variables, &self.command, &self.response]
    }
}

/// Sequences channel operations over a transport.
pub struct ChannelManager<T: ?Sized> {
    transport: Arc<T>,
}

impl<T: ClientDataTransport + ?Sized> ChannelManager<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Map a channel's area name to its area id.
    pub fn bind(&self, binding: &ChannelBinding) -> Result<()> {
        debug!(area = %binding.area_name, area_id = binding.area_id, "bind area");
        self.transport
            .bind_area(&binding.area_name, binding.area_id)?;
        Ok(())
    }

    /// Register a byte range definition.
    pub fn define(&self, definition_id: u32, offset: u32, size: usize) -> Result<()> {
        debug!(definition_id, offset, size, "define range");
        self.transport.define_range(definition_id, offset, size)?;
        Ok(())
    }

    /// Subscribe to changes of a defined range in a channel's area.
    pub fn subscribe(
        &self,
        binding: &ChannelBinding,
        request_id: u32,
        definition_id: u32,
    ) -> Result<()> {
        debug!(
            area_id = binding.area_id,
            request_id, definition_id, "subscribe to changes"
        );
        self.transport
            .subscribe_changes(binding.area_id, request_id, definition_id)?;
        Ok(())
    }

    /// Write bytes into a channel's area.
    pub fn publish(&self, binding: &ChannelBinding, definition_id: u32, data: &[u8]) -> Result<()> {
        self.transport
            .write_area(binding.area_id, definition_id, data)?;
        Ok(())
    }

    /// Bind all three channels, define the response string and subscribe to it.
    pub fn initialize(&self, set: &ChannelSet) -> Result<()> {
        self.initialize_inner(set, None)
    }

    /// Like [`initialize`](Self::initialize), creating the areas after binding.
    pub fn initialize_created(&self, set: &ChannelSet, variables_area_size: usize) -> Result<()> {
        self.initialize_inner(set, Some(variables_area_size))
    }

    fn initialize_inner(&self, set: &ChannelSet, create: Option<usize>) -> Result<()> {
        info!(client = %set.client_name, lifecycle = ?set.lifecycle, "initializing channels");
        for binding in set.bindings() {
            self.bind(binding)?;
            if let Some(variables_area_size) = create {
                let size = if binding == &set.variables {
                    variables_area_size
                } else {
                    DATA_STRING_SIZE
                };
                self.transport.create_area(binding.area_id, size)?;
            }
        }

        let string_id = set.response.definition_id;
        self.define(string_id, DATA_STRING_OFFSET, DATA_STRING_SIZE)?;
        self.subscribe(&set.response, string_id, string_id)?;
        Ok(())
    }

    /// Encode a command and write it into the set's command area.
    pub fn send_command(&self, set: &ChannelSet, command: &Command<'_>) -> Result<()> {
        let buf = encode_command(command)?;
        debug!(client = %set.client_name, %command, "send command");
        self.send_encoded(set, &buf)
    }

    /// Write an already encoded command buffer into the set's command area.
    pub fn send_encoded(&self, set: &ChannelSet, buf: &[u8]) -> Result<()> {
        self.publish(&set.command, set.command.definition_id, buf)
    }

    /// Define a variable's 4-byte range and subscribe to its changes.
    pub fn track_variable(&self, set: &ChannelSet, definition_id: u32, offset: u32) -> Result<()> {
        self.define(definition_id, offset, FLOAT_SIZE)?;
        self.subscribe(&set.variables, definition_id, definition_id)
    }
}
