use std::collections::BTreeMap;

use crate::error::TypeError;
use crate::key::EntityKey;

/// Reserved field name carrying an inline object's type name in JSON form.
pub const TYPENAME_FIELD: &str = "__typename";

/// Reserved single-key object shape tagging a reference in JSON form.
pub const REF_FIELD: &str = "__ref";

/// Argument and variable bags passed to field policies.
///
/// A `BTreeMap` so iteration (and therefore canonical rendering) is always
/// sorted by argument name.
pub type Args = BTreeMap<String, Value>;

/// A stored value.
///
/// Values are what the cache holds at each field storage key and what user
/// read/merge callbacks see. Callbacks only ever receive `&Value`, so the
/// `existing` side of a merge cannot be mutated in place; callbacks return
/// new owned values.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Ordered list of stored values.
    List(Vec<Value>),
    /// Inline (non-normalized) structured object.
    Object(FieldObject),
    /// Non-owning pointer to a normalized entity.
    Ref(EntityKey),
}

impl Value {
    /// Returns `true` for [`Value::Ref`].
    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    /// The referenced entity key, if this is a reference.
    pub fn as_ref_key(&self) -> Option<&EntityKey> {
        match self {
            Value::Ref(key) => Some(key),
            _ => None,
        }
    }

    /// The inline object, if this is one.
    pub fn as_object(&self) -> Option<&FieldObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The list elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean contents, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer contents, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert to the canonical JSON representation.
    ///
    /// References encode as the single-key object `{"__ref": "<key>"}`;
    /// inline objects carry their type name under `"__typename"`. Fails on
    /// non-finite floats and on inline objects that use a reserved field
    /// name, both of which would not survive a round-trip.
    pub fn to_json(&self) -> Result<serde_json::Value, TypeError> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or(TypeError::NonFiniteFloat)?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<_, _>>()?,
            ),
            Value::Object(obj) => {
                let mut map = serde_json::Map::new();
                if let Some(type_name) = &obj.type_name {
                    map.insert(
                        TYPENAME_FIELD.to_string(),
                        serde_json::Value::String(type_name.clone()),
                    );
                }
                for (name, value) in &obj.fields {
                    if name == TYPENAME_FIELD || name == REF_FIELD {
                        return Err(TypeError::ReservedField(name.clone()));
                    }
                    map.insert(name.clone(), value.to_json()?);
                }
                serde_json::Value::Object(map)
            }
            Value::Ref(key) => {
                let mut map = serde_json::Map::new();
                map.insert(
                    REF_FIELD.to_string(),
                    serde_json::Value::String(key.as_str().to_string()),
                );
                serde_json::Value::Object(map)
            }
        })
    }

    /// Decode from the canonical JSON representation.
    ///
    /// A JSON object is a reference if and only if it has exactly one key,
    /// `"__ref"`, holding a string; anything else decodes as an inline
    /// object.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, TypeError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err(TypeError::Decode(format!("unrepresentable number {n}")));
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect::<Result<_, _>>()?)
            }
            serde_json::Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(serde_json::Value::String(raw)) = map.get(REF_FIELD) {
                        return Ok(Value::Ref(EntityKey::parse(raw)?));
                    }
                }
                let mut obj = FieldObject::new();
                for (name, value) in map {
                    if name == TYPENAME_FIELD {
                        match value {
                            serde_json::Value::String(t) => obj.type_name = Some(t.clone()),
                            other => {
                                return Err(TypeError::Decode(format!(
                                    "__typename must be a string, got {other}"
                                )))
                            }
                        }
                    } else {
                        obj.fields.insert(name.clone(), Value::from_json(value)?);
                    }
                }
                Value::Object(obj)
            }
        })
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<EntityKey> for Value {
    fn from(key: EntityKey) -> Self {
        Value::Ref(key)
    }
}

impl From<FieldObject> for Value {
    fn from(obj: FieldObject) -> Self {
        Value::Object(obj)
    }
}

/// An inline (non-normalized) object: optional type name plus an ordered
/// map from field storage key to stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldObject {
    /// Type name of the object, if known.
    pub type_name: Option<String>,
    /// Field storage key → stored value, sorted for determinism.
    pub fields: BTreeMap<String, Value>,
}

impl FieldObject {
    /// Create an empty object with no type name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty object with a type name.
    pub fn with_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Insert a field, returning `self` for chaining.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field by storage key.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
