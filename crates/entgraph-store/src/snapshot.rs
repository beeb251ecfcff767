//! Snapshot export/import.
//!
//! A [`Snapshot`] is the persisted shape of an [`EntityMap`]: identity key →
//! field storage key → canonical JSON value, with references encoded as the
//! tagged `{"__ref": "<key>"}` object so re-import can distinguish them from
//! ordinary structured data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use entgraph_types::{EntityKey, Value, TYPENAME_FIELD};

use crate::entities::{EntityMap, FieldMap};
use crate::error::{StoreError, StoreResult};

/// Exported store state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, BTreeMap<String, serde_json::Value>>);

impl Snapshot {
    /// Number of entities in the snapshot.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the snapshot holds no entities.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up an entity's exported fields.
    pub fn entity(&self, key: &str) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.0.get(key)
    }

    /// Insert an entity's fields, replacing any existing entry.
    pub fn insert(&mut self, key: String, fields: BTreeMap<String, serde_json::Value>) {
        self.0.insert(key, fields);
    }
}

impl EntityMap {
    /// Export the full store state.
    pub fn export(&self) -> StoreResult<Snapshot> {
        let mut snapshot = Snapshot::default();
        for (key, fields) in self.iter() {
            let mut exported = BTreeMap::new();
            for (storage_key, value) in fields {
                exported.insert(storage_key.clone(), value.to_json()?);
            }
            snapshot.insert(key.as_str().to_string(), exported);
        }
        Ok(snapshot)
    }

    /// Rebuild an entity map from a snapshot.
    ///
    /// Re-tags `{"__ref": …}` values as references and validates that each
    /// entity's stored type name agrees with its key's type prefix; a
    /// mismatch would be an identity conflict and fails the whole import.
    pub fn import(snapshot: &Snapshot) -> StoreResult<Self> {
        let mut map = EntityMap::new();
        for (raw_key, exported) in &snapshot.0 {
            let key = EntityKey::parse(raw_key)?;
            let mut fields = FieldMap::new();
            for (storage_key, json) in exported {
                fields.insert(storage_key.clone(), Value::from_json(json)?);
            }
            if let Some(Value::String(stored)) = fields.get(TYPENAME_FIELD) {
                if stored != key.type_name() {
                    return Err(StoreError::TypeNameMismatch {
                        key: raw_key.clone(),
                        stored: stored.clone(),
                    });
                }
            }
            map.insert(key, fields);
        }
        Ok(map)
    }
}
