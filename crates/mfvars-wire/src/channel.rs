//! Well-known client data area identifiers and layout constants.
//!
//! Definition ids 0-999 are reserved for channel string layouts.
//! Definition ids from [`SIMVAR_DEFINITION_BASE`] upward belong to variable slots.

/// Size of every command and response string buffer.
pub const DATA_STRING_SIZE: usize = 256;

/// Longest text that fits a string buffer; the module reads up to the first zero byte.
pub const MAX_STRING_LEN: usize = DATA_STRING_SIZE - 1;

/// Offset of the string inside the command and response areas.
pub const DATA_STRING_OFFSET: u32 = 0;

/// Width of one variable value (IEEE-754 single precision).
pub const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// Default size of a variables area. Bounds the slot count to 1024.
pub const VARIABLES_AREA_SIZE: usize = 4096;

/// First definition id handed to variable slots.
pub const SIMVAR_DEFINITION_BASE: u32 = 1000;

/// Client name of the well-known initialization channel set.
pub const INIT_CLIENT_NAME: &str = "MobiFlight";

/// Area id of the well-known variables area.
pub const INIT_VARIABLES_AREA: u32 = 0;

/// Area id of the well-known command area.
pub const INIT_COMMAND_AREA: u32 = 1;

/// Area id of the well-known response area.
pub const INIT_RESPONSE_AREA: u32 = 2;

/// String definition id used by the well-known channel set.
pub const INIT_STRING_DEFINITION_ID: u32 = 0;

/// String definition id used by a negotiated (private) channel set.
pub const CLIENT_STRING_DEFINITION_ID: u32 = 1;

/// The three logical channels of a channel set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    /// Float values written by the remote module.
    Variables,
    /// Command strings written by the client.
    Command,
    /// Response strings written by the remote module.
    Response,
}

impl AreaKind {
    /// Suffix appended to the client name to form the area name.
    pub fn suffix(self) -> &'static str {
        match self {
            AreaKind::Variables => "LVars",
            AreaKind::Command => "Command",
            AreaKind::Response => "Response",
        }
    }
}

/// Suffix of the variables area inside a negotiated channel set.
pub const CLIENT_VARIABLES_SUFFIX: &str = "Lvars";

/// Returns the symbolic area name for a client, e.g. `MobiFlight.Command`.
pub fn area_name(client_name: &str, kind: AreaKind) -> String {
    format!("{client_name}.{}", kind.suffix())
}

/// Area name inside a negotiated channel set.
///
/// The module creates private variables areas as `<client>.Lvars`, unlike the
/// well-known `MobiFlight.LVars`.
pub fn client_area_name(client_name: &str, kind: AreaKind) -> String {
    match kind {
        AreaKind::Variables => format!("{client_name}.{CLIENT_VARIABLES_SUFFIX}"),
        AreaKind::Command | AreaKind::Response => area_name(client_name, kind),
    }
}

/// Returns true if the definition id belongs to the variable slot range.
pub fn is_variable_definition(definition_id: u32) -> bool {
    definition_id >= SIMVAR_DEFINITION_BASE
}
