//! Normalized entity storage for entgraph.
//!
//! An [`EntityMap`] maps identity keys to field maps (field storage key →
//! stored value). It is the state every other component operates on: the
//! engine holds one behind a lock, write transactions build overlays against
//! it, and [`Snapshot`] is its export/import shape with references encoded
//! as tagged pointer values.

pub mod entities;
pub mod error;
pub mod snapshot;

pub use entities::{EntityMap, FieldMap};
pub use error::{StoreError, StoreResult};
pub use snapshot::Snapshot;
