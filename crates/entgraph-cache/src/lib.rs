//! The entgraph engine: a normalized object-graph cache with a per-field
//! policy layer.
//!
//! Typed object graphs written into the cache are flattened into a table of
//! entities keyed by identity; nested identifiable objects become
//! references, so every entity is stored exactly once and updates propagate
//! to everything that references it. Per-field policies control how stored
//! variants are keyed by arguments, how values read back, and how incoming
//! data merges into existing data.
//!
//! # Example
//!
//! ```
//! use entgraph_cache::{Cache, CacheConfig, WriteObject};
//! use entgraph_types::{Args, EntityKey, Value};
//!
//! let cache = Cache::new(CacheConfig::new());
//! let book = WriteObject::new("Book")
//!     .field("id", "b1")
//!     .field("title", "Dune")
//!     .field("author", WriteObject::new("Author").field("id", "a1").field("name", "Frank"));
//! cache.write("Book", &book)?;
//!
//! // The author was normalized out and is shared by reference.
//! let stored = cache.read(&EntityKey::new("Book", "b1"), "author", &Args::new())?;
//! assert_eq!(stored, Some(Value::Ref(EntityKey::new("Author", "a1"))));
//! # Ok::<(), entgraph_cache::CacheError>(())
//! ```
//!
//! # Concurrency
//!
//! Reads share a lock; writes are exclusive, so a write transaction sees a
//! stable store and publishes atomically. Policy callbacks cannot re-enter
//! the cache: they only receive the helper surface
//! ([`FieldHelpers`](entgraph_policy::FieldHelpers)), which operates within
//! the calling transaction.

pub mod cache;
pub mod error;
pub mod write;

mod context;
mod identity;
mod read;

pub use cache::{Cache, CacheConfig};
pub use error::{CacheError, CacheResult};
pub use write::{WriteField, WriteObject, WriteValue};

pub use entgraph_policy::{
    FieldHelpers, FieldPolicy, KeyContext, KeyFields, KeyResult, KeySpec, MergeSpec,
    PolicyRegistry, TypePolicy,
};
pub use entgraph_store::Snapshot;
pub use entgraph_types::{Args, EntityKey, FieldObject, Value};
