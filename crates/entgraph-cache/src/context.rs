//! Execution context shared by the read and write paths.
//!
//! An [`Exec`] is one operation's view of the world: the base entity map
//! (under the cache's lock), the write transaction's pending overlay (write
//! path only), the policy registry, and the scratch areas. [`FieldContext`]
//! wraps an `Exec` for one field-policy invocation and implements the
//! [`FieldHelpers`] surface handed to user callbacks.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use entgraph_policy::{FieldHelpers, PolicyRegistry};
use entgraph_store::{EntityMap, FieldMap};
use entgraph_types::{Args, EntityKey, FieldObject, Value, TYPENAME_FIELD};

use crate::error::CacheResult;
use crate::identity::identify_object;

/// Nested reads inside callbacks treat errors as "missing" with a warning;
/// the top-level read surface propagates them instead.
fn flatten_nested(result: CacheResult<Option<Value>>, field: &str) -> Option<Value> {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(field, error = %e, "nested read failed");
            None
        }
    }
}

/// Empty argument bag for nested policy invocations.
pub(crate) static EMPTY_ARGS: Args = Args::new();

/// Scratch areas, one per (type name, field name) policy instance.
pub(crate) type ScratchMap = HashMap<(String, String), BTreeMap<String, Value>>;

/// A write transaction's accumulated state.
///
/// All changes land here first; the cache applies the overlay to the base
/// map only when the whole write succeeds.
#[derive(Debug, Default)]
pub(crate) struct Overlay {
    pub pending: HashMap<EntityKey, FieldMap>,
    pub touched: BTreeSet<EntityKey>,
}

/// One operation's execution context.
pub(crate) struct Exec<'a> {
    pub registry: &'a PolicyRegistry,
    pub base: &'a EntityMap,
    /// `Some` during a write transaction, `None` during reads.
    pub overlay: Option<Overlay>,
    pub scratch: &'a Mutex<ScratchMap>,
    pub variables: &'a Args,
}

impl<'a> Exec<'a> {
    /// Look up a stored value, pending overlay first, then the base map.
    pub(crate) fn lookup_field(&self, key: &EntityKey, storage_key: &str) -> Option<Value> {
        if let Some(overlay) = &self.overlay {
            if let Some(value) = overlay.pending.get(key).and_then(|f| f.get(storage_key)) {
                return Some(value.clone());
            }
        }
        self.base.field(key, storage_key).cloned()
    }

    /// Entity presence in the current view.
    pub(crate) fn contains_entity(&self, key: &EntityKey) -> bool {
        if let Some(overlay) = &self.overlay {
            if overlay.pending.contains_key(key) {
                return true;
            }
        }
        self.base.contains(key)
    }

    /// The type name currently recorded for an entity, if any.
    pub(crate) fn entity_type_name(&self, key: &EntityKey) -> Option<String> {
        if let Some(overlay) = &self.overlay {
            if let Some(Value::String(t)) =
                overlay.pending.get(key).and_then(|f| f.get(TYPENAME_FIELD))
            {
                return Some(t.clone());
            }
        }
        self.base.type_name_of(key).map(str::to_string)
    }

    /// Stage a field value in the transaction overlay.
    pub(crate) fn insert_field(&mut self, key: &EntityKey, storage_key: String, value: Value) {
        self.overlay_mut()
            .pending
            .entry(key.clone())
            .or_default()
            .insert(storage_key, value);
    }

    pub(crate) fn overlay_mut(&mut self) -> &mut Overlay {
        self.overlay
            .as_mut()
            .expect("write operation outside a transaction")
    }
}

/// Where the currently executing field policy is attached.
pub(crate) enum ParentScope {
    /// Nested level with no normalized parent (inside inline-object merges).
    None,
    /// A field of a normalized entity.
    Entity(EntityKey),
    /// A field of an explicit inline object (nested reads).
    Object(FieldObject),
}

/// One field-policy invocation's helper surface.
pub(crate) struct FieldContext<'c, 'a> {
    pub exec: &'c mut Exec<'a>,
    /// Type under which the field policy was looked up; scratch areas are
    /// keyed by (this, field name).
    pub type_name: &'c str,
    pub field_name: &'c str,
    pub args: &'c Args,
    pub parent: ParentScope,
}

impl FieldHelpers for FieldContext<'_, '_> {
    fn field_name(&self) -> &str {
        self.field_name
    }

    fn args(&self) -> &Args {
        self.args
    }

    fn variables(&self) -> &Args {
        self.exec.variables
    }

    fn is_reference(&self, value: &Value) -> bool {
        value.is_ref()
    }

    fn to_reference(&mut self, value: &Value, persist: bool) -> Option<EntityKey> {
        match value {
            Value::Ref(key) => Some(key.clone()),
            Value::String(raw) => EntityKey::parse(raw).ok(),
            Value::Object(obj) => {
                let key = match identify_object(self.exec.registry, obj) {
                    Ok(Some(key)) => key,
                    Ok(None) => return None,
                    Err(e) => {
                        tracing::warn!(error = %e, "to_reference failed to identify object");
                        return None;
                    }
                };
                if persist && self.exec.overlay.is_some() {
                    if let Err(e) = self.exec.persist_object(&key, obj) {
                        tracing::warn!(key = %key, error = %e, "to_reference failed to persist");
                        return None;
                    }
                }
                Some(key)
            }
            _ => None,
        }
    }

    fn can_read(&self, value: &Value) -> bool {
        match value {
            Value::Object(_) => true,
            Value::Ref(key) => self.exec.contains_entity(key),
            _ => false,
        }
    }

    fn read_field(&mut self, name: &str) -> Option<Value> {
        let result = match &self.parent {
            ParentScope::Entity(key) => {
                let key = key.clone();
                self.exec.read_entity_field(&key, name, &EMPTY_ARGS)
            }
            ParentScope::Object(obj) => {
                let obj = obj.clone();
                self.exec.read_object_field(&obj, name, &EMPTY_ARGS)
            }
            ParentScope::None => return None,
        };
        flatten_nested(result, name)
    }

    fn read_field_from(&mut self, name: &str, target: &Value) -> Option<Value> {
        let result = match target {
            Value::Ref(key) => self.exec.read_entity_field(key, name, &EMPTY_ARGS),
            Value::Object(obj) => self.exec.read_object_field(obj, name, &EMPTY_ARGS),
            _ => return None,
        };
        flatten_nested(result, name)
    }

    fn merge_objects(&mut self, existing: Option<&Value>, incoming: &Value) -> Value {
        self.exec.merge_objects(existing, incoming)
    }

    fn scratch_get(&self, key: &str) -> Option<Value> {
        let scratch = self.exec.scratch.lock().expect("lock poisoned");
        scratch
            .get(&(self.type_name.to_string(), self.field_name.to_string()))
            .and_then(|area| area.get(key))
            .cloned()
    }

    fn scratch_put(&mut self, key: &str, value: Value) {
        let mut scratch = self.exec.scratch.lock().expect("lock poisoned");
        scratch
            .entry((self.type_name.to_string(), self.field_name.to_string()))
            .or_default()
            .insert(key.to_string(), value);
    }
}
