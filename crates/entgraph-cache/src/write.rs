//! The write path: input model and merge executor.
//!
//! A write is a transaction. The caller submits a typed, possibly nested
//! [`WriteObject`]; the engine classifies each nested object as an entity
//! (stored by reference) or inline data, derives every field's storage key,
//! and combines existing and incoming values under each field's merge
//! policy. All changes accumulate in the transaction overlay and are
//! published atomically by the cache; an error publishes nothing.

use entgraph_policy::{
    field_name_of, storage_key, FieldPolicy, KeyContext, MergeSpec,
};
use entgraph_policy::spec::validate_field_name;
use entgraph_types::{Args, EntityKey, FieldObject, Value, TYPENAME_FIELD};

use crate::context::{Exec, FieldContext, ParentScope, EMPTY_ARGS};
use crate::error::{CacheError, CacheResult};
use crate::identity::identify_write;

/// A typed, possibly nested object submitted to [`Cache::write`].
///
/// [`Cache::write`]: crate::cache::Cache::write
#[derive(Clone, Debug, Default)]
pub struct WriteObject {
    /// Type name of the object, if known.
    pub type_name: Option<String>,
    /// Fields in submission order. The same field name may appear more than
    /// once with different arguments (distinct stored variants).
    pub fields: Vec<WriteField>,
}

impl WriteObject {
    /// An object of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            fields: Vec::new(),
        }
    }

    /// An object with no type name (always stored inline).
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add an argument-free field.
    pub fn field(self, name: impl Into<String>, value: impl Into<WriteValue>) -> Self {
        self.field_with_args(name, Args::new(), value)
    }

    /// Add a field with arguments.
    pub fn field_with_args(
        mut self,
        name: impl Into<String>,
        args: Args,
        value: impl Into<WriteValue>,
    ) -> Self {
        self.fields.push(WriteField {
            name: name.into(),
            args,
            value: value.into(),
        });
        self
    }
}

/// One field of a [`WriteObject`].
#[derive(Clone, Debug)]
pub struct WriteField {
    pub name: String,
    pub args: Args,
    pub value: WriteValue,
}

/// A field's incoming value.
#[derive(Clone, Debug)]
pub enum WriteValue {
    /// A plain value, stored as given.
    Scalar(Value),
    /// A list; elements are processed recursively.
    List(Vec<WriteValue>),
    /// A nested object, normalized if identity-bearing.
    Object(WriteObject),
}

impl From<Value> for WriteValue {
    fn from(value: Value) -> Self {
        WriteValue::Scalar(value)
    }
}

impl From<WriteObject> for WriteValue {
    fn from(obj: WriteObject) -> Self {
        WriteValue::Object(obj)
    }
}

impl From<Vec<WriteValue>> for WriteValue {
    fn from(items: Vec<WriteValue>) -> Self {
        WriteValue::List(items)
    }
}

impl From<bool> for WriteValue {
    fn from(b: bool) -> Self {
        WriteValue::Scalar(Value::Bool(b))
    }
}

impl From<i64> for WriteValue {
    fn from(n: i64) -> Self {
        WriteValue::Scalar(Value::Int(n))
    }
}

impl From<f64> for WriteValue {
    fn from(f: f64) -> Self {
        WriteValue::Scalar(Value::Float(f))
    }
}

impl From<&str> for WriteValue {
    fn from(s: &str) -> Self {
        WriteValue::Scalar(Value::from(s))
    }
}

impl From<String> for WriteValue {
    fn from(s: String) -> Self {
        WriteValue::Scalar(Value::String(s))
    }
}

impl<'a> Exec<'a> {
    /// Process one write object: normalize it into the overlay (returning a
    /// reference) or build its inline value.
    ///
    /// At the top level a non-identifiable object is stored under the
    /// singleton key `Type:@root`, so root-level fields (queries without an
    /// id of their own) have a place to live.
    pub(crate) fn write_object(
        &mut self,
        type_hint: Option<&str>,
        obj: &WriteObject,
        top_level: bool,
    ) -> CacheResult<Value> {
        if let (Some(declared), Some(own)) = (type_hint, obj.type_name.as_deref()) {
            if declared != own {
                tracing::warn!(
                    declared,
                    object = own,
                    "declared type name differs from the object's own; using the object's"
                );
            }
        }
        let Some(type_name) = obj.type_name.as_deref().or(type_hint) else {
            if top_level {
                return Err(CacheError::MissingTypeName);
            }
            return self.inline_object(None, obj);
        };
        if let Some(key) = identify_write(self.registry, Some(type_name), obj)? {
            self.merge_entity(&key, type_name, obj)?;
            return Ok(Value::Ref(key));
        }
        if top_level {
            let key = EntityKey::new(type_name, "@root");
            self.merge_entity(&key, type_name, obj)?;
            return Ok(Value::Ref(key));
        }
        self.inline_object(Some(type_name), obj)
    }

    /// Merge a write object's fields into an entity in the overlay.
    fn merge_entity(
        &mut self,
        key: &EntityKey,
        type_name: &str,
        obj: &WriteObject,
    ) -> CacheResult<()> {
        if let Some(stored) = self.entity_type_name(key) {
            if stored != type_name {
                return Err(CacheError::IdentityConflict {
                    key: key.to_string(),
                    existing: stored,
                    incoming: type_name.to_string(),
                });
            }
        }
        self.overlay_mut().touched.insert(key.clone());
        self.insert_field(key, TYPENAME_FIELD.to_string(), Value::from(type_name));

        let registry = self.registry;
        let variables = self.variables;
        for field in &obj.fields {
            validate_field_name(&field.name).map_err(|reason| CacheError::InvalidWrite {
                field: field.name.clone(),
                reason,
            })?;
            let policy = registry.field_policy(type_name, &field.name);
            let kctx = KeyContext {
                type_name,
                field_name: &field.name,
                variables,
            };
            let skey = storage_key(&field.name, &field.args, &policy.key, &kctx)?;
            let incoming = self.process_value(&field.value)?;
            let existing = self.lookup_field(key, &skey);
            let merged = self.apply_merge(
                type_name,
                &field.name,
                &field.args,
                ParentScope::Entity(key.clone()),
                policy,
                existing.as_ref(),
                &incoming,
            );
            self.insert_field(key, skey, merged);
        }
        Ok(())
    }

    /// Build the inline value of a non-normalizable object.
    ///
    /// Fields are keyed and nested values processed, but no merging happens
    /// here: an inline object merges (or replaces) as a whole at the field
    /// it is attached to.
    fn inline_object(
        &mut self,
        type_name: Option<&str>,
        obj: &WriteObject,
    ) -> CacheResult<Value> {
        let registry = self.registry;
        let variables = self.variables;
        let mut out = FieldObject {
            type_name: type_name.map(str::to_string),
            fields: Default::default(),
        };
        let policy_type = type_name.unwrap_or("");
        for field in &obj.fields {
            validate_field_name(&field.name).map_err(|reason| CacheError::InvalidWrite {
                field: field.name.clone(),
                reason,
            })?;
            let policy = registry.field_policy(policy_type, &field.name);
            let kctx = KeyContext {
                type_name: policy_type,
                field_name: &field.name,
                variables,
            };
            let skey = storage_key(&field.name, &field.args, &policy.key, &kctx)?;
            let value = self.process_value(&field.value)?;
            out.fields.insert(skey, value);
        }
        Ok(Value::Object(out))
    }

    /// Recursively process an incoming value, normalizing nested objects.
    fn process_value(&mut self, value: &WriteValue) -> CacheResult<Value> {
        match value {
            WriteValue::Scalar(v) => Ok(v.clone()),
            WriteValue::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.process_value(item))
                    .collect::<CacheResult<_>>()?,
            )),
            WriteValue::Object(obj) => self.write_object(None, obj, false),
        }
    }

    /// Combine existing and incoming under a field's merge policy.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn apply_merge(
        &mut self,
        type_name: &str,
        field_name: &str,
        args: &Args,
        parent: ParentScope,
        policy: &FieldPolicy,
        existing: Option<&Value>,
        incoming: &Value,
    ) -> Value {
        match &policy.merge {
            MergeSpec::Fn(f) => {
                let f = f.clone();
                let mut ctx = FieldContext {
                    exec: self,
                    type_name,
                    field_name,
                    args,
                    parent,
                };
                (*f)(existing, incoming, &mut ctx)
            }
            MergeSpec::Structural => self.merge_objects(existing, incoming),
            MergeSpec::Replace => {
                // Type-level `merge: true` applies wherever an object of
                // that type lands.
                if let Value::Object(obj) = incoming {
                    if let Some(t) = &obj.type_name {
                        if self.registry.type_policy(t).merge {
                            return self.merge_objects(existing, incoming);
                        }
                    }
                }
                incoming.clone()
            }
        }
    }

    /// Structural merge of two same-typed objects, field by field.
    ///
    /// Fields present only in `existing` are retained; every incoming field
    /// is merged under its own field policy. Differing type names lose the
    /// existing data deliberately: the engine cannot assume the two objects
    /// describe the same logical thing.
    pub(crate) fn merge_objects(
        &mut self,
        existing: Option<&Value>,
        incoming: &Value,
    ) -> Value {
        let (e, i) = match (existing, incoming) {
            (Some(Value::Object(e)), Value::Object(i)) => (e, i),
            _ => return incoming.clone(),
        };
        if let (Some(et), Some(it)) = (&e.type_name, &i.type_name) {
            if et != it {
                tracing::warn!(
                    existing = %et,
                    incoming = %it,
                    "structural merge type mismatch, replacing"
                );
                return incoming.clone();
            }
        }

        let type_name = i
            .type_name
            .clone()
            .or_else(|| e.type_name.clone())
            .unwrap_or_default();
        let registry = self.registry;
        let mut merged = e.fields.clone();
        for (skey, ivalue) in &i.fields {
            let field_name = field_name_of(skey).to_string();
            let policy = registry.field_policy(&type_name, &field_name);
            let evalue = merged.get(skey).cloned();
            let value = self.apply_merge(
                &type_name,
                &field_name,
                &EMPTY_ARGS,
                ParentScope::None,
                policy,
                evalue.as_ref(),
                ivalue,
            );
            merged.insert(skey.clone(), value);
        }
        Value::Object(FieldObject {
            type_name: i.type_name.clone().or_else(|| e.type_name.clone()),
            fields: merged,
        })
    }

    /// Merge an already-keyed inline object's fields into an entity
    /// (the `to_reference(persist = true)` path).
    pub(crate) fn persist_object(
        &mut self,
        key: &EntityKey,
        obj: &FieldObject,
    ) -> CacheResult<()> {
        // Same reserved-name guard as the write path, checked before any
        // field is staged so a rejected object leaves no partial state.
        for skey in obj.fields.keys() {
            let field_name = field_name_of(skey);
            validate_field_name(field_name).map_err(|reason| CacheError::InvalidWrite {
                field: field_name.to_string(),
                reason,
            })?;
        }
        let type_name = obj
            .type_name
            .clone()
            .unwrap_or_else(|| key.type_name().to_string());
        if let Some(stored) = self.entity_type_name(key) {
            if stored != type_name {
                return Err(CacheError::IdentityConflict {
                    key: key.to_string(),
                    existing: stored,
                    incoming: type_name,
                });
            }
        }
        self.overlay_mut().touched.insert(key.clone());
        self.insert_field(key, TYPENAME_FIELD.to_string(), Value::from(type_name.as_str()));

        let registry = self.registry;
        for (skey, value) in &obj.fields {
            let field_name = field_name_of(skey).to_string();
            let policy = registry.field_policy(&type_name, &field_name);
            let existing = self.lookup_field(key, skey);
            let merged = self.apply_merge(
                &type_name,
                &field_name,
                &EMPTY_ARGS,
                ParentScope::Entity(key.clone()),
                policy,
                existing.as_ref(),
                value,
            );
            self.insert_field(key, skey.clone(), merged);
        }
        Ok(())
    }
}
