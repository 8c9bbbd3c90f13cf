//! Textual command grammar understood by the remote module.

use std::fmt;

/// Prefix for registering a new client and requesting private channels.
pub const CLIENTS_ADD: &str = "MF.Clients.Add.";

/// Prefix for subscribing to a variable expression.
pub const SIMVARS_ADD: &str = "MF.SimVars.Add.";

/// Prefix for executing a write expression.
pub const SIMVARS_SET: &str = "MF.SimVars.Set.";

/// Drops every subscribed variable of the client.
pub const SIMVARS_CLEAR: &str = "MF.SimVars.Clear";

/// Asks the module to list known local variables on the response channel.
pub const LVARS_LIST: &str = "MF.LVars.List";

/// Throwaway command; the first command after a fresh connection may be lost.
pub const NOOP: &str = "Do Nothing";

/// A command addressed to the remote module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `MF.Clients.Add.<name>`
    RegisterClient(&'a str),
    /// `MF.SimVars.Add.<expr>`
    AddVariable(&'a str),
    /// `MF.SimVars.Set.<expr>`
    SetVariable(&'a str),
    /// `MF.SimVars.Clear`
    ClearVariables,
    /// `MF.LVars.List`
    ListLVars,
    /// The no-op placeholder.
    Noop,
    /// Anything the grammar does not recognize.
    Other(&'a str),
}

impl<'a> Command<'a> {
    /// Parse command text as written into a command area.
    pub fn parse(text: &'a str) -> Self {
        if let Some(name) = text.strip_prefix(CLIENTS_ADD) {
            Command::RegisterClient(name)
        } else if let Some(expr) = text.strip_prefix(SIMVARS_ADD) {
            Command::AddVariable(expr)
        } else if let Some(expr) = text.strip_prefix(SIMVARS_SET) {
            Command::SetVariable(expr)
        } else if text == SIMVARS_CLEAR {
            Command::ClearVariables
        } else if text == LVARS_LIST {
            Command::ListLVars
        } else if text == NOOP {
            Command::Noop
        } else {
            Command::Other(text)
        }
    }
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::RegisterClient(name) => write!(f, "{CLIENTS_ADD}{name}"),
            Command::AddVariable(expr) => write!(f, "{SIMVARS_ADD}{expr}"),
            Command::SetVariable(expr) => write!(f, "{SIMVARS_SET}{expr}"),
            Command::ClearVariables => f.write_str(SIMVARS_CLEAR),
            Command::ListLVars => f.write_str(LVARS_LIST),
            Command::Noop => f.write_str(NOOP),
            Command::Other(text) => f.write_str(text),
        }
    }
}
