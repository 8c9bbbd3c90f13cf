//! Command grammar and payload codecs for MobiFlight client data areas.
//!
//! Three payload shapes cross the client data areas:
//! - Command strings: exactly 256 bytes, ASCII, zero-padded, always terminated
//! - Response strings: zero-terminated ASCII inside a 256-byte buffer
//! - Variable values: 4-byte little-endian IEEE-754 single precision
//!
//! Oversized commands are rejected, never truncated.

pub mod channel;
pub mod codec;
pub mod command;
pub mod error;

pub use channel::{
    area_name, client_area_name, is_variable_definition, AreaKind, CLIENT_STRING_DEFINITION_ID,
    CLIENT_VARIABLES_SUFFIX, DATA_STRING_OFFSET, DATA_STRING_SIZE, FLOAT_SIZE, INIT_CLIENT_NAME,
    INIT_COMMAND_AREA, INIT_RESPONSE_AREA, INIT_STRING_DEFINITION_ID, INIT_VARIABLES_AREA,
    MAX_STRING_LEN, SIMVAR_DEFINITION_BASE, VARIABLES_AREA_SIZE,
};
pub use codec::{
    decode_float, decode_string, encode_command, encode_float, encode_string, round_value,
    VALUE_PRECISION,
};
pub use command::Command;
pub use error::{Result, WireError};
