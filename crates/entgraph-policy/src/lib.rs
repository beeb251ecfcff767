//! Field and type policies for entgraph.
//!
//! A policy controls, per (type name, field name), how a field's stored
//! variants are keyed ([`KeySpec`]), how values are read back
//! ([`FieldPolicy::read`]), and how incoming data merges into existing data
//! ([`MergeSpec`]). Policies are registered once at configuration time into
//! a [`PolicyRegistry`] and are read-only afterwards.
//!
//! # Key Types
//!
//! - [`KeySpec`] / [`KeyResult`] — Which arguments distinguish stored variants
//! - [`FieldPolicy`] / [`TypePolicy`] — Per-field and per-type configuration
//! - [`PolicyRegistry`] — Lookup by exact (type, field) match with defaults
//! - [`FieldHelpers`] — Helper surface handed to read/merge callbacks

pub mod error;
pub mod helpers;
pub mod keys;
pub mod policy;
pub mod registry;
pub mod spec;

pub use error::{PolicyError, Result};
pub use helpers::FieldHelpers;
pub use keys::{field_name_of, storage_key};
pub use policy::{FieldPolicy, KeyFields, KeyFn, MergeFn, MergeSpec, ReadFn, TypePolicy};
pub use registry::PolicyRegistry;
pub use spec::{KeyContext, KeyResult, KeySpec};
