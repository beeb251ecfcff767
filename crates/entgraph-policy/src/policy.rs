use std::fmt;
use std::sync::Arc;

use entgraph_types::Value;

use crate::helpers::FieldHelpers;
use crate::spec::KeySpec;

pub use crate::spec::KeyFn;

/// A read function: `(existing, helpers) -> value or missing`.
///
/// The return value is the read result even if it differs in shape from the
/// stored representation; `None` means the field is not resolvable.
pub type ReadFn =
    Arc<dyn Fn(Option<&Value>, &mut dyn FieldHelpers) -> Option<Value> + Send + Sync>;

/// A merge function: `(existing, incoming, helpers) -> new value`.
///
/// `existing` is a read-only snapshot; the function must return a new value
/// and never rely on mutating what it was given.
pub type MergeFn =
    Arc<dyn Fn(Option<&Value>, &Value, &mut dyn FieldHelpers) -> Value + Send + Sync>;

/// How incoming data combines with existing data at a field.
#[derive(Clone, Default)]
pub enum MergeSpec {
    /// Incoming replaces existing (the default).
    #[default]
    Replace,
    /// Shorthand for the structural merge helper (`merge: true`).
    Structural,
    /// User-supplied merge function.
    Fn(MergeFn),
}

impl fmt::Debug for MergeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "MergeSpec::Replace"),
            Self::Structural => write!(f, "MergeSpec::Structural"),
            Self::Fn(_) => write!(f, "MergeSpec::Fn(..)"),
        }
    }
}

/// Per-field configuration: key arguments, read behavior, merge behavior.
///
/// The default policy (used for unregistered fields) has no key-argument
/// restriction, no read function, and replacement merge.
#[derive(Clone, Default)]
pub struct FieldPolicy {
    /// Which arguments distinguish stored variants of this field.
    pub key: KeySpec,
    /// Optional read function invoked on every read of this field.
    pub read: Option<ReadFn>,
    /// How incoming data merges into existing data.
    pub merge: MergeSpec,
}

impl FieldPolicy {
    /// The default policy: all arguments key, raw reads, replacement merge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key-argument spec.
    pub fn key(mut self, key: KeySpec) -> Self {
        self.key = key;
        self
    }

    /// Restrict the storage key to the named arguments, in order.
    pub fn key_args<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.key = KeySpec::Args(names.into_iter().map(Into::into).collect());
        self
    }

    /// Collapse all argument combinations onto the bare field name.
    pub fn no_key_args(mut self) -> Self {
        self.key = KeySpec::Disabled;
        self
    }

    /// Install a read function.
    pub fn read(
        mut self,
        f: impl Fn(Option<&Value>, &mut dyn FieldHelpers) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.read = Some(Arc::new(f));
        self
    }

    /// Install a merge function.
    pub fn merge_fn(
        mut self,
        f: impl Fn(Option<&Value>, &Value, &mut dyn FieldHelpers) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.merge = MergeSpec::Fn(Arc::new(f));
        self
    }

    /// Use the structural merge helper for this field (`merge: true`).
    pub fn merge_structural(mut self) -> Self {
        self.merge = MergeSpec::Structural;
        self
    }
}

impl fmt::Debug for FieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPolicy")
            .field("key", &self.key)
            .field("read", &self.read.as_ref().map(|_| "Fn(..)"))
            .field("merge", &self.merge)
            .finish()
    }
}

/// Which fields identify an entity of a type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyFields {
    /// An `id`-like field identifies the entity (`id`, then `_id`).
    #[default]
    Default,
    /// The declared fields, all of which must be present.
    Fields(Vec<String>),
    /// The type is never normalized; its objects are stored inline.
    None,
}

/// Per-type configuration: identity key fields and the structural-merge
/// shorthand.
#[derive(Clone, Debug, Default)]
pub struct TypePolicy {
    /// Which fields identify entities of this type.
    pub key_fields: KeyFields,
    /// When `true`, any field holding an object of this type merges
    /// structurally instead of replacing.
    pub merge: bool,
}

impl TypePolicy {
    /// The default policy: `id`-like key field, replacement merge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identify entities by the declared fields.
    pub fn key_fields<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.key_fields = KeyFields::Fields(names.into_iter().map(Into::into).collect());
        self
    }

    /// Never normalize this type; store its objects inline.
    pub fn never_normalize(mut self) -> Self {
        self.key_fields = KeyFields::None;
        self
    }

    /// Merge objects of this type structurally wherever they appear.
    pub fn merge_structural(mut self) -> Self {
        self.merge = true;
        self
    }
}
