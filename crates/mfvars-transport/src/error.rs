/// Errors that can occur in client data area transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No area name is bound to the identifier.
    #[error("client data area {0} is not bound")]
    UnknownArea(u32),

    /// The area name is bound but the area itself does not exist.
    #[error("client data area '{0}' has not been created")]
    AreaNotCreated(String),

    /// The definition id was never registered.
    #[error("client data definition {0} is not registered")]
    UnknownDefinition(u32),

    /// The definition id is already registered with a different layout.
    #[error("client data definition {definition_id} already registered at {offset}+{size}")]
    DefinitionConflict {
        definition_id: u32,
        offset: u32,
        size: usize,
    },

    /// A byte range falls outside the area it addresses.
    #[error("range {offset}+{size} exceeds area {area_id} ({capacity} bytes)")]
    OutOfBounds {
        area_id: u32,
        offset: u32,
        size: usize,
        capacity: usize,
    },

    /// Written data does not match the definition size.
    #[error("payload size mismatch for definition {definition_id} (expected {expected}, got {actual})")]
    SizeMismatch {
        definition_id: u32,
        expected: usize,
        actual: usize,
    },

    /// The underlying simulation interface refused the request.
    #[error("transport request rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
