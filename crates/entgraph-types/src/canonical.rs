//! Canonical rendering of values and argument maps.
//!
//! Storage keys embed argument values, so the rendering must be
//! deterministic: sorted member order for maps, canonical JSON for scalars.
//! Two argument bags with equal contents always render identically,
//! regardless of how they were built.

use crate::error::TypeError;
use crate::value::{Args, Value};

/// Render a single value canonically.
///
/// Delegates to the canonical JSON form of [`Value`], which sorts object
/// members (the underlying maps are `BTreeMap`s).
pub fn canonical_value(value: &Value) -> Result<String, TypeError> {
    let json = value.to_json()?;
    serde_json::to_string(&json).map_err(|e| TypeError::Decode(e.to_string()))
}

/// Render an argument bag canonically, sorted by argument name.
///
/// Returns `{}` for an empty bag.
pub fn canonical_args(args: &Args) -> Result<String, TypeError> {
    let mut out = String::from("{");
    for (i, (name, value)) in args.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(name);
        out.push_str("\":");
        out.push_str(&canonical_value(value)?);
    }
    out.push('}');
    Ok(out)
}
