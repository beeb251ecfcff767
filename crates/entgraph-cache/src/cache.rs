//! The public cache surface.
//!
//! A [`Cache`] owns the normalized entity store behind a read/write lock,
//! the policy registry, and the per-policy scratch areas. Writes are
//! transactions: the whole write is staged against a snapshot of the store
//! and published atomically, so a failed write changes nothing.

use std::collections::BTreeSet;
use std::sync::{Mutex, RwLock};

use entgraph_policy::{FieldPolicy, PolicyRegistry, TypePolicy};
use entgraph_store::{EntityMap, Snapshot};
use entgraph_types::{Args, EntityKey, Value};

use crate::context::{Exec, Overlay, ScratchMap, EMPTY_ARGS};
use crate::error::CacheResult;
use crate::write::WriteObject;

/// Cache configuration: the policy registry, built before the cache exists.
///
/// Policies are fixed for the cache's lifetime; malformed specs fail here,
/// at configuration time.
#[derive(Debug, Default)]
pub struct CacheConfig {
    registry: PolicyRegistry,
}

impl CacheConfig {
    /// An empty configuration: every type and field gets the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type policy.
    pub fn type_policy(mut self, type_name: &str, policy: TypePolicy) -> CacheResult<Self> {
        self.registry.register_type(type_name, policy)?;
        Ok(self)
    }

    /// Register a field policy.
    pub fn field_policy(
        mut self,
        type_name: &str,
        field_name: &str,
        policy: FieldPolicy,
    ) -> CacheResult<Self> {
        self.registry.register_field(type_name, field_name, policy)?;
        Ok(self)
    }
}

/// A normalized object-graph cache.
///
/// Thread-safe: reads take a shared lock, writes an exclusive one, so a
/// write observes no concurrent mutation mid-transaction. Callbacks run
/// inside the operation that invoked them and cannot re-enter the cache
/// through its public surface; everything they may do goes through the
/// helper surface they are handed.
pub struct Cache {
    registry: PolicyRegistry,
    entities: RwLock<EntityMap>,
    scratch: Mutex<ScratchMap>,
}

impl Cache {
    /// Create an empty cache from a configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            registry: config.registry,
            entities: RwLock::new(EntityMap::new()),
            scratch: Mutex::new(ScratchMap::new()),
        }
    }

    /// Write a typed object graph into the cache.
    ///
    /// Returns the set of entity keys the write touched. On error nothing
    /// is published.
    pub fn write(&self, type_name: &str, data: &WriteObject) -> CacheResult<BTreeSet<EntityKey>> {
        self.write_with_variables(type_name, data, &EMPTY_ARGS)
    }

    /// [`Cache::write`] with operation-level variables visible to key
    /// functions and callbacks.
    pub fn write_with_variables(
        &self,
        type_name: &str,
        data: &WriteObject,
        variables: &Args,
    ) -> CacheResult<BTreeSet<EntityKey>> {
        let mut guard = self.entities.write().expect("lock poisoned");
        let overlay = {
            let mut exec = Exec {
                registry: &self.registry,
                base: &guard,
                overlay: Some(Overlay::default()),
                scratch: &self.scratch,
                variables,
            };
            exec.write_object(Some(type_name), data, true)?;
            exec.overlay.take().expect("overlay present for the whole write")
        };
        guard.apply(overlay.pending);
        tracing::debug!(type_name, touched = overlay.touched.len(), "write applied");
        Ok(overlay.touched)
    }

    /// Read one field of an entity.
    ///
    /// `Ok(None)` means the field is missing (and has no read function to
    /// synthesize it); a missing field is not an error. Errors come from
    /// storage-key derivation.
    pub fn read(
        &self,
        key: &EntityKey,
        field_name: &str,
        args: &Args,
    ) -> CacheResult<Option<Value>> {
        self.read_with_variables(key, field_name, args, &EMPTY_ARGS)
    }

    /// [`Cache::read`] with operation-level variables visible to key
    /// functions and callbacks.
    pub fn read_with_variables(
        &self,
        key: &EntityKey,
        field_name: &str,
        args: &Args,
        variables: &Args,
    ) -> CacheResult<Option<Value>> {
        let guard = self.entities.read().expect("lock poisoned");
        let mut exec = Exec {
            registry: &self.registry,
            base: &guard,
            overlay: None,
            scratch: &self.scratch,
            variables,
        };
        exec.read_entity_field(key, field_name, args)
    }

    /// Returns `true` if an entity exists at the key.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.read().expect("lock poisoned").contains(key)
    }

    /// Sorted list of all entity keys.
    pub fn entity_keys(&self) -> Vec<EntityKey> {
        self.entities.read().expect("lock poisoned").entity_keys()
    }

    /// Number of entities currently stored.
    pub fn len(&self) -> usize {
        self.entities.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the cache holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.read().expect("lock poisoned").is_empty()
    }

    /// Export the full cache state.
    pub fn export(&self) -> CacheResult<Snapshot> {
        Ok(self.entities.read().expect("lock poisoned").export()?)
    }

    /// Replace the cache state with a snapshot's.
    ///
    /// Validates the snapshot first; a malformed snapshot leaves the
    /// current state untouched. Scratch areas survive an import.
    pub fn import(&self, snapshot: &Snapshot) -> CacheResult<()> {
        let imported = EntityMap::import(snapshot)?;
        *self.entities.write().expect("lock poisoned") = imported;
        Ok(())
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("entities", &*self.entities.read().expect("lock poisoned"))
            .finish_non_exhaustive()
    }
}
