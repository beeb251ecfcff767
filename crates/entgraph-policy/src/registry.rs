use std::collections::HashMap;

use crate::error::{PolicyError, Result};
use crate::policy::{FieldPolicy, KeyFields, TypePolicy};
use crate::spec::{validate_field_name, validate_key_paths, KeySpec};

/// Registry mapping (type name, field name) to field policies and type
/// names to type policies.
///
/// Populated at configuration time; read-only thereafter. Lookup is by
/// exact match, with the permissive default policy for anything
/// unregistered. Malformed specs are rejected at registration, never
/// deferred to first use.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    types: HashMap<String, TypePolicy>,
    fields: HashMap<String, HashMap<String, FieldPolicy>>,
    default_type: TypePolicy,
    default_field: FieldPolicy,
}

impl PolicyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type policy, validating its key fields.
    pub fn register_type(&mut self, type_name: &str, policy: TypePolicy) -> Result<()> {
        validate_field_name(type_name).map_err(|reason| PolicyError::InvalidKeyFields {
            type_name: type_name.to_string(),
            reason: format!("type name: {reason}"),
        })?;
        if let KeyFields::Fields(names) = &policy.key_fields {
            if names.is_empty() {
                return Err(PolicyError::InvalidKeyFields {
                    type_name: type_name.to_string(),
                    reason: "declared key-field list must not be empty".into(),
                });
            }
            for (i, name) in names.iter().enumerate() {
                validate_field_name(name).map_err(|reason| PolicyError::InvalidKeyFields {
                    type_name: type_name.to_string(),
                    reason: format!("`{name}`: {reason}"),
                })?;
                if names[..i].contains(name) {
                    return Err(PolicyError::InvalidKeyFields {
                        type_name: type_name.to_string(),
                        reason: format!("duplicate key field `{name}`"),
                    });
                }
            }
        }
        self.types.insert(type_name.to_string(), policy);
        Ok(())
    }

    /// Register a field policy, validating its key-argument spec.
    pub fn register_field(
        &mut self,
        type_name: &str,
        field_name: &str,
        policy: FieldPolicy,
    ) -> Result<()> {
        validate_field_name(field_name).map_err(|reason| PolicyError::InvalidKeySpec {
            type_name: type_name.to_string(),
            field: field_name.to_string(),
            reason: format!("field name: {reason}"),
        })?;
        if let KeySpec::Args(paths) = &policy.key {
            validate_key_paths(paths).map_err(|reason| PolicyError::InvalidKeySpec {
                type_name: type_name.to_string(),
                field: field_name.to_string(),
                reason,
            })?;
        }
        self.fields
            .entry(type_name.to_string())
            .or_default()
            .insert(field_name.to_string(), policy);
        Ok(())
    }

    /// Look up a type policy, falling back to the default.
    pub fn type_policy(&self, type_name: &str) -> &TypePolicy {
        self.types.get(type_name).unwrap_or(&self.default_type)
    }

    /// Look up a field policy by exact (type, field) match, falling back to
    /// the default. No inheritance.
    pub fn field_policy(&self, type_name: &str, field_name: &str) -> &FieldPolicy {
        self.fields
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .unwrap_or(&self.default_field)
    }

    /// Returns `true` if a field policy is registered for (type, field).
    pub fn has_field_policy(&self, type_name: &str, field_name: &str) -> bool {
        self.fields
            .get(type_name)
            .is_some_and(|fields| fields.contains_key(field_name))
    }
}
