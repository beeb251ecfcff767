/// Errors from value conversion and key parsing.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// An entity key string did not have the `Type:key` shape.
    #[error("malformed entity key `{0}`: expected `Type:key`")]
    InvalidEntityKey(String),

    /// A non-finite float has no canonical JSON representation.
    #[error("non-finite float cannot be encoded")]
    NonFiniteFloat,

    /// An inline object used a field name reserved by the engine.
    #[error("field name `{0}` is reserved")]
    ReservedField(String),

    /// A JSON value could not be decoded into a stored value.
    #[error("cannot decode value: {0}")]
    Decode(String),
}
