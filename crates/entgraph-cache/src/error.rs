use entgraph_policy::PolicyError;
use entgraph_store::StoreError;
use entgraph_types::TypeError;

/// Errors from cache operations.
///
/// A missing field on read is not an error; reads return `Ok(None)`. A
/// structural-merge type mismatch is a `tracing::warn!` diagnostic, not an
/// error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Two writes produced the same identity key with different type names.
    ///
    /// Fatal for the write: nothing from the transaction is published.
    #[error("identity conflict at {key}: entity is `{existing}`, write says `{incoming}`")]
    IdentityConflict {
        key: String,
        existing: String,
        incoming: String,
    },

    /// A write carried data the engine cannot store.
    #[error("invalid write at field `{field}`: {reason}")]
    InvalidWrite { field: String, reason: String },

    /// A top-level write object had no type name to store under.
    #[error("top-level write requires a type name")]
    MissingTypeName,

    /// Policy registration or storage-key derivation failure.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Snapshot import/export failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Value conversion failure.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
