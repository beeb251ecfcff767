//! Key-argument specifications.
//!
//! A [`KeySpec`] declares which of a field's arguments participate in its
//! storage key. Argument names may be dotted paths (`"input.id"`) reaching
//! into object-valued arguments.
//!
//! Valid argument paths:
//! - Must be non-empty
//! - Must not contain whitespace
//! - Must not contain `(`, `)`, `{`, `}`, `"`, `:` (storage-key syntax)
//! - Segments between dots must be non-empty

use std::fmt;
use std::sync::Arc;

use entgraph_types::Args;

/// Characters that are forbidden anywhere in an argument path.
const FORBIDDEN_CHARS: &[char] =
    &[' ', '\t', '\n', '\r', '(', ')', '{', '}', '"', ':'];

/// Result of a custom key function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyResult {
    /// Use this string verbatim as the key suffix (`field:<suffix>`).
    Key(String),
    /// Use the named arguments, as if they were a static [`KeySpec::Args`]
    /// list. An **empty** list collapses to the bare field name, exactly
    /// like [`KeySpec::Disabled`].
    Args(Vec<String>),
    /// Abstain: fall back to the all-arguments behavior of
    /// [`KeySpec::AllArgs`].
    Default,
}

/// Context passed to custom key functions.
#[derive(Debug)]
pub struct KeyContext<'a> {
    /// Type name the field belongs to.
    pub type_name: &'a str,
    /// Name of the field being keyed.
    pub field_name: &'a str,
    /// Operation-level variables.
    pub variables: &'a Args,
}

/// A custom key function: `(args, context) -> KeyResult`.
pub type KeyFn = Arc<dyn Fn(&Args, &KeyContext<'_>) -> KeyResult + Send + Sync>;

/// Which arguments distinguish stored variants of a field.
#[derive(Clone, Default)]
pub enum KeySpec {
    /// Every argument participates, serialized sorted by name.
    #[default]
    AllArgs,
    /// Only the named arguments participate, in the given order. Names may
    /// be dotted paths into object-valued arguments. Arguments absent from
    /// a call are skipped.
    Args(Vec<String>),
    /// The bare field name is the key; all argument combinations collapse
    /// onto one stored value.
    Disabled,
    /// Computed per call by a user function.
    Custom(KeyFn),
}

impl fmt::Debug for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllArgs => write!(f, "KeySpec::AllArgs"),
            Self::Args(names) => f.debug_tuple("KeySpec::Args").field(names).finish(),
            Self::Disabled => write!(f, "KeySpec::Disabled"),
            Self::Custom(_) => write!(f, "KeySpec::Custom(..)"),
        }
    }
}

/// Validate a single key-argument path, returning the reason on failure.
pub fn validate_key_path(path: &str) -> std::result::Result<(), String> {
    if path.is_empty() {
        return Err("argument path must not be empty".into());
    }
    for ch in FORBIDDEN_CHARS {
        if path.contains(*ch) {
            return Err(format!("contains forbidden character: {ch:?}"));
        }
    }
    if path.starts_with('.') || path.ends_with('.') {
        return Err("must not start or end with '.'".into());
    }
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err("path segments must not be empty".into());
        }
    }
    Ok(())
}

/// Validate a static key-argument list: well-formed paths, no duplicates.
pub fn validate_key_paths(paths: &[String]) -> std::result::Result<(), String> {
    for (i, path) in paths.iter().enumerate() {
        validate_key_path(path).map_err(|reason| format!("`{path}`: {reason}"))?;
        if paths[..i].contains(path) {
            return Err(format!("duplicate argument `{path}`"));
        }
    }
    Ok(())
}

/// Validate a plain field name (key fields, registered field names).
pub fn validate_field_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("field name must not be empty".into());
    }
    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(format!("contains forbidden character: {ch:?}"));
        }
    }
    if name.contains('.') {
        return Err("field name must not contain '.'".into());
    }
    if name.starts_with("__") {
        return Err("names starting with '__' are reserved".into());
    }
    Ok(())
}
