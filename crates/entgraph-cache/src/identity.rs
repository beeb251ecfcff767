//! Identity resolution.
//!
//! Given a typed object, computes its canonical identity key or determines
//! it is non-normalizable. Identity requires a type name plus a complete
//! set of declared key fields; by default a single `id`-like field (`id`,
//! then `_id`). Objects missing any key field are stored inline inside
//! their parent.

use entgraph_policy::{KeyFields, PolicyRegistry};
use entgraph_types::{canonical_value, EntityKey, FieldObject, Value};

use crate::error::CacheResult;
use crate::write::{WriteObject, WriteValue};

/// Resolve the identity of a write object. `Ok(None)` means inline.
pub(crate) fn identify_write(
    registry: &PolicyRegistry,
    type_name: Option<&str>,
    obj: &WriteObject,
) -> CacheResult<Option<EntityKey>> {
    identify_with(registry, type_name, &|name| plain_write_field(obj, name))
}

/// Resolve the identity of an inline object value. `Ok(None)` means inline.
pub(crate) fn identify_object(
    registry: &PolicyRegistry,
    obj: &FieldObject,
) -> CacheResult<Option<EntityKey>> {
    identify_with(registry, obj.type_name.as_deref(), &|name| {
        obj.get(name).filter(|v| !matches!(v, Value::Null))
    })
}

fn identify_with<'v>(
    registry: &PolicyRegistry,
    type_name: Option<&str>,
    get: &dyn Fn(&str) -> Option<&'v Value>,
) -> CacheResult<Option<EntityKey>> {
    let Some(type_name) = type_name else {
        return Ok(None);
    };
    match &registry.type_policy(type_name).key_fields {
        KeyFields::None => Ok(None),
        KeyFields::Default => {
            for candidate in ["id", "_id"] {
                if let Some(value) = get(candidate) {
                    return Ok(Some(EntityKey::new(type_name, &render_id(value)?)));
                }
            }
            Ok(None)
        }
        KeyFields::Fields(names) => {
            let mut local = String::from("{");
            for (i, name) in names.iter().enumerate() {
                let Some(value) = get(name) else {
                    // Incomplete key-field data: cannot identify.
                    return Ok(None);
                };
                if i > 0 {
                    local.push(',');
                }
                local.push('"');
                local.push_str(name);
                local.push_str("\":");
                local.push_str(&canonical_value(value)?);
            }
            local.push('}');
            Ok(Some(EntityKey::new(type_name, &local)))
        }
    }
}

/// Render a single `id`-like value: strings verbatim, everything else in
/// canonical form.
fn render_id(value: &Value) -> CacheResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(canonical_value(other)?),
    }
}

/// A bare-named, argument-free, non-null scalar field of a write object.
fn plain_write_field<'o>(obj: &'o WriteObject, name: &str) -> Option<&'o Value> {
    obj.fields
        .iter()
        .find(|f| f.name == name && f.args.is_empty())
        .and_then(|f| match &f.value {
            WriteValue::Scalar(v) if !matches!(v, Value::Null) => Some(v),
            _ => None,
        })
}
