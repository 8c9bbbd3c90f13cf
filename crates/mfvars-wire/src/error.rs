/// Errors that can occur while encoding commands or decoding payloads.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    /// The command text does not fit the fixed command buffer.
    #[error("command too long ({len} bytes, max {max})")]
    CommandTooLong { len: usize, max: usize },

    /// The command or response text contains non-ASCII bytes.
    #[error("text is not ASCII")]
    NonAscii,

    /// A string payload has no terminating zero byte.
    #[error("string payload of {len} bytes has no terminating zero byte")]
    Unterminated { len: usize },

    /// A fixed-size payload arrived with the wrong length.
    #[error("payload size mismatch (expected {expected} bytes, got {actual})")]
    PayloadSize { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, WireError>;
