use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Canonical identity of a normalized entity.
///
/// An `EntityKey` has the shape `TypeName:local-key`, e.g. `Book:abc123` for
/// a type identified by a single id field, or `Book:{"isbn":"12"}` for a
/// declared key-field set. Two objects with the same key are the same
/// logical entity. Keys are stable for the lifetime of the entity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    /// Build a key from a type name and a local key part.
    pub fn new(type_name: &str, local: &str) -> Self {
        Self(format!("{type_name}:{local}"))
    }

    /// Parse a raw key string, validating the `Type:key` shape.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        match raw.split_once(':') {
            Some((type_name, local)) if !type_name.is_empty() && !local.is_empty() => {
                Ok(Self(raw.to_string()))
            }
            _ => Err(TypeError::InvalidEntityKey(raw.to_string())),
        }
    }

    /// The type-name prefix of the key.
    pub fn type_name(&self) -> &str {
        // Constructors guarantee the separator is present.
        self.0.split_once(':').map(|(t, _)| t).unwrap_or(&self.0)
    }

    /// The local key part (everything after the type name).
    pub fn local(&self) -> &str {
        self.0.split_once(':').map(|(_, l)| l).unwrap_or("")
    }

    /// The full key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({})", self.0)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.0
    }
}
