use std::collections::HashMap;

use entgraph_types::{EntityKey, Value, TYPENAME_FIELD};

/// One entity's fields: field storage key → stored value.
///
/// A `BTreeMap` so snapshots and iteration are deterministic. The entity's
/// type name is recorded under the reserved `__typename` storage key.
pub type FieldMap = std::collections::BTreeMap<String, Value>;

/// The normalized entity store: identity key → field map.
///
/// Entities are created on the first write that normalizes to a new key and
/// updated field-by-field on subsequent writes. The map never deletes
/// entities itself; eviction is a caller concern.
#[derive(Clone, Default, PartialEq)]
pub struct EntityMap {
    entities: HashMap<EntityKey, FieldMap>,
}

impl EntityMap {
    /// Create an empty entity map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entity's field map.
    pub fn get(&self, key: &EntityKey) -> Option<&FieldMap> {
        self.entities.get(key)
    }

    /// Look up one stored value by entity key and field storage key.
    pub fn field(&self, key: &EntityKey, storage_key: &str) -> Option<&Value> {
        self.entities.get(key).and_then(|fields| fields.get(storage_key))
    }

    /// Returns `true` if an entity exists at the key.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    /// The stored type name of an entity, if present.
    pub fn type_name_of(&self, key: &EntityKey) -> Option<&str> {
        self.field(key, TYPENAME_FIELD).and_then(Value::as_str)
    }

    /// Apply a write transaction's overlay.
    ///
    /// Each overlay entry's fields are inserted into the corresponding
    /// entity, creating it if absent. Fields not named by the overlay are
    /// left untouched.
    pub fn apply(&mut self, overlay: HashMap<EntityKey, FieldMap>) {
        for (key, fields) in overlay {
            self.entities.entry(key).or_default().extend(fields);
        }
    }

    /// Insert a complete field map, replacing any existing entity.
    ///
    /// Used by snapshot import; writes go through [`EntityMap::apply`].
    pub fn insert(&mut self, key: EntityKey, fields: FieldMap) {
        self.entities.insert(key, fields);
    }

    /// Number of entities currently stored.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entities are stored.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Sorted list of all entity keys.
    pub fn entity_keys(&self) -> Vec<EntityKey> {
        let mut keys: Vec<EntityKey> = self.entities.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Iterate over all entities.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &FieldMap)> {
        self.entities.iter()
    }
}

impl std::fmt::Debug for EntityMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMap")
            .field("entity_count", &self.entities.len())
            .finish()
    }
}
