/// Errors from policy registration and storage-key derivation.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A key-argument spec referenced a malformed argument path.
    ///
    /// Raised at registration time, never deferred to first use.
    #[error("invalid key-argument spec for {type_name}.{field}: {reason}")]
    InvalidKeySpec {
        type_name: String,
        field: String,
        reason: String,
    },

    /// A type policy declared malformed key fields.
    #[error("invalid key fields for type {type_name}: {reason}")]
    InvalidKeyFields { type_name: String, reason: String },

    /// Storage-key derivation failed (unrepresentable argument value, or a
    /// custom key function returned a malformed argument path).
    #[error("cannot derive storage key for field {field}: {reason}")]
    KeyDerivation { field: String, reason: String },
}

/// Result alias for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
