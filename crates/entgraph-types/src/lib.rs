//! Foundation types for entgraph.
//!
//! This crate provides the stored-value model, entity identity keys, and the
//! canonical rendering used to derive field storage keys. Every other
//! entgraph crate depends on `entgraph-types`.
//!
//! # Key Types
//!
//! - [`Value`] — A stored value: scalar, list, inline object, or reference
//! - [`FieldObject`] — An inline (non-normalized) object's field map
//! - [`EntityKey`] — Canonical identity of a normalized entity
//! - [`Args`] — Argument and variable bags passed to field policies

pub mod canonical;
pub mod error;
pub mod key;
pub mod value;

pub use canonical::{canonical_args, canonical_value};
pub use error::TypeError;
pub use key::EntityKey;
pub use value::{Args, FieldObject, Value, REF_FIELD, TYPENAME_FIELD};
