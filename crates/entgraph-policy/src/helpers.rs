use entgraph_types::{Args, EntityKey, Value};

/// Helper surface available inside read and merge callbacks.
///
/// Implemented by the engine over its live view of the store: the base store
/// during reads, the transaction overlay during writes. All implementations
/// must satisfy these invariants:
/// - Values handed out are snapshots; nothing a callback receives aliases
///   mutable store state.
/// - Nested reads (`read_field`) go through the target field's own read
///   function, never around it.
/// - No operation here can start a new write; `to_reference` with
///   `persist = true` only adds to the current write transaction, and is a
///   no-op during reads.
pub trait FieldHelpers {
    /// Name of the field whose policy is currently executing.
    fn field_name(&self) -> &str;

    /// Arguments of the current field access.
    fn args(&self) -> &Args;

    /// Operation-level variables.
    fn variables(&self) -> &Args;

    /// Returns `true` if the value is a reference to a normalized entity.
    fn is_reference(&self, value: &Value) -> bool;

    /// Construct a reference from a value.
    ///
    /// A reference passes through unchanged; a string holding a raw identity
    /// key wraps directly; an identity-bearing object resolves through the
    /// identity rules. With `persist = true` inside a write, the object's
    /// fields are merged into the store so the reference is guaranteed
    /// non-dangling. Returns `None` for non-normalizable input.
    fn to_reference(&mut self, value: &Value, persist: bool) -> Option<EntityKey>;

    /// Returns `true` for inline objects and for references whose entity is
    /// present in the current view. Scalars and dangling references are not
    /// readable.
    fn can_read(&self, value: &Value) -> bool;

    /// Read a field of the current object, applying its read policy.
    fn read_field(&mut self, name: &str) -> Option<Value>;

    /// Read a field of an explicit target (inline object or reference),
    /// applying its read policy.
    fn read_field_from(&mut self, name: &str, target: &Value) -> Option<Value>;

    /// Structural merge: combine two same-typed objects field by field,
    /// respecting each field's own merge policy. See the engine
    /// documentation for the mismatch and replacement rules.
    fn merge_objects(&mut self, existing: Option<&Value>, incoming: &Value) -> Value;

    /// Read from the per-field-policy scratch area.
    ///
    /// The scratch area persists across invocations of the same field policy
    /// and has no eviction. One area exists per (type name, field name): it
    /// is shared by every entity of the type, not scoped to the entity whose
    /// field is currently executing.
    fn scratch_get(&self, key: &str) -> Option<Value>;

    /// Write to the per-field-policy scratch area.
    fn scratch_put(&mut self, key: &str, value: Value);
}
