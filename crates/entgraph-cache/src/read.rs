//! The read path.
//!
//! Reading a field looks up its stored value under the derived storage key
//! and, when the field has a read function, passes that raw value through
//! it. A read function may synthesize a value for a field that was never
//! written; a missing field without one reads as `Ok(None)`.

use entgraph_policy::{storage_key, KeyContext};
use entgraph_types::{Args, EntityKey, FieldObject, Value};

use crate::context::{Exec, FieldContext, ParentScope};
use crate::error::CacheResult;

impl<'a> Exec<'a> {
    /// Read one field of a normalized entity.
    pub(crate) fn read_entity_field(
        &mut self,
        key: &EntityKey,
        field_name: &str,
        args: &Args,
    ) -> CacheResult<Option<Value>> {
        let type_name = self
            .entity_type_name(key)
            .unwrap_or_else(|| key.type_name().to_string());
        let registry = self.registry;
        let variables = self.variables;
        let policy = registry.field_policy(&type_name, field_name);
        let kctx = KeyContext {
            type_name: &type_name,
            field_name,
            variables,
        };
        let skey = storage_key(field_name, args, &policy.key, &kctx)?;
        let raw = self.lookup_field(key, &skey);
        Ok(match &policy.read {
            Some(read) => {
                let read = read.clone();
                let mut ctx = FieldContext {
                    exec: self,
                    type_name: &type_name,
                    field_name,
                    args,
                    parent: ParentScope::Entity(key.clone()),
                };
                (*read)(raw.as_ref(), &mut ctx)
            }
            None => raw,
        })
    }

    /// Read one field of an inline object.
    pub(crate) fn read_object_field(
        &mut self,
        obj: &FieldObject,
        field_name: &str,
        args: &Args,
    ) -> CacheResult<Option<Value>> {
        let type_name = obj.type_name.clone().unwrap_or_default();
        let registry = self.registry;
        let variables = self.variables;
        let policy = registry.field_policy(&type_name, field_name);
        let kctx = KeyContext {
            type_name: &type_name,
            field_name,
            variables,
        };
        let skey = storage_key(field_name, args, &policy.key, &kctx)?;
        let raw = obj.fields.get(&skey).cloned();
        Ok(match &policy.read {
            Some(read) => {
                let read = read.clone();
                let mut ctx = FieldContext {
                    exec: self,
                    type_name: &type_name,
                    field_name,
                    args,
                    parent: ParentScope::Object(obj.clone()),
                };
                (*read)(raw.as_ref(), &mut ctx)
            }
            None => raw,
        })
    }
}
