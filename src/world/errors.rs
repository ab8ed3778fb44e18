use thiserror::Error;

/// Errors that can arise while reading or writing the world store.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, seed files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A room number supplied as text was not a positive integer.
    #[error("invalid room number: {0:?} (positive integer expected)")]
    InvalidRoomNumber(String),

    /// A room reference supplied as text was not `AREA:NUMBER`.
    #[error("invalid room reference: {0:?} (AREA:NUMBER expected)")]
    InvalidRoomRef(String),

    /// A stored field could not be interpreted (e.g. a non-integer `size`).
    #[error("invalid value {value:?} for field {field} of {key}")]
    InvalidField {
        key: String,
        field: &'static str,
        value: String,
    },

    /// A stored value is not in the layout the store writes.
    #[error("corrupt record at {0}")]
    Corrupt(String),

    /// Returned when adding a room to an area that has no record.
    #[error("area not found: {0}")]
    AreaNotFound(String),

    /// Seed file could not be parsed.
    #[error("seed error: {0}")]
    Seed(String),
}
