//! Storage-key derivation.
//!
//! A field's storage key is derived from its name and the subset of its
//! arguments selected by the field's [`KeySpec`]. Two calls with the same
//! field name and the same participating argument values always produce the
//! same key; differing values produce different keys.
//!
//! Key shapes:
//! - no participating arguments → `field`
//! - participating arguments → `field({"a":1,"b":"x"})`
//! - custom key function returning a string → `field:<suffix>`

use entgraph_types::{canonical_args, canonical_value, Args, Value};

use crate::error::{PolicyError, Result};
use crate::spec::{validate_key_path, KeyContext, KeyResult, KeySpec};

/// Derive the storage key for one field access.
pub fn storage_key(
    field_name: &str,
    args: &Args,
    spec: &KeySpec,
    ctx: &KeyContext<'_>,
) -> Result<String> {
    match spec {
        KeySpec::AllArgs => all_args_key(field_name, args),
        KeySpec::Disabled => Ok(field_name.to_string()),
        KeySpec::Args(paths) => picked_key(field_name, args, paths),
        KeySpec::Custom(f) => match (**f)(args, ctx) {
            KeyResult::Key(suffix) => Ok(format!("{field_name}:{suffix}")),
            KeyResult::Args(paths) => picked_key(field_name, args, &paths),
            KeyResult::Default => all_args_key(field_name, args),
        },
    }
}

/// Recover the field name from a storage key.
///
/// The field name is the prefix up to the first `(` (argument block) or `:`
/// (custom suffix).
pub fn field_name_of(storage_key: &str) -> &str {
    match storage_key.find(['(', ':']) {
        Some(pos) => &storage_key[..pos],
        None => storage_key,
    }
}

fn all_args_key(field_name: &str, args: &Args) -> Result<String> {
    if args.is_empty() {
        return Ok(field_name.to_string());
    }
    let rendered = canonical_args(args).map_err(|e| PolicyError::KeyDerivation {
        field: field_name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(format!("{field_name}({rendered})"))
}

/// Key from an explicit argument-path list, in the given order.
///
/// Paths whose argument is absent are skipped. An empty selection (empty
/// list, or no path present) collapses to the bare field name.
fn picked_key(field_name: &str, args: &Args, paths: &[String]) -> Result<String> {
    let mut picked = Vec::new();
    for path in paths {
        // Static lists are validated at registration; custom key functions
        // can return arbitrary lists, so paths are checked again here.
        validate_key_path(path).map_err(|reason| PolicyError::KeyDerivation {
            field: field_name.to_string(),
            reason: format!("`{path}`: {reason}"),
        })?;
        if let Some(value) = lookup_path(args, path) {
            picked.push((path.as_str(), value));
        }
    }
    if picked.is_empty() {
        return Ok(field_name.to_string());
    }

    let mut rendered = String::from("{");
    for (i, (path, value)) in picked.iter().enumerate() {
        if i > 0 {
            rendered.push(',');
        }
        rendered.push('"');
        rendered.push_str(path);
        rendered.push_str("\":");
        let canon = canonical_value(value).map_err(|e| PolicyError::KeyDerivation {
            field: field_name.to_string(),
            reason: e.to_string(),
        })?;
        rendered.push_str(&canon);
    }
    rendered.push('}');
    Ok(format!("{field_name}({rendered})"))
}

/// Resolve a dotted argument path against an argument bag.
fn lookup_path<'a>(args: &'a Args, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = args.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
