use std::time::Duration;

/// Errors that can occur in variable request operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] mfvars_transport::TransportError),

    /// Command encoding or payload decoding error.
    #[error("wire error: {0}")]
    Wire(#[from] mfvars_wire::WireError),

    /// Handshake failed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// Handshake did not complete in time.
    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),

    /// Handshake wait was cancelled.
    #[error("handshake cancelled")]
    Cancelled,

    /// The variables area has no room for another slot.
    #[error("variable capacity exceeded ({requested} slots requested, capacity {capacity})")]
    CapacityExceeded { requested: usize, capacity: usize },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
