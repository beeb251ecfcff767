use entgraph_types::TypeError;

/// Errors from entity storage and snapshot import/export.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An imported entity's stored type name disagrees with its key.
    #[error("type name mismatch for {key}: stored `{stored}`")]
    TypeNameMismatch { key: String, stored: String },

    /// A snapshot entry could not be decoded.
    #[error(transparent)]
    Value(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
