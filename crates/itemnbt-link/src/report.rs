use std::fmt;

use itemnbt_codec::CodecError;
use itemnbt_tree::TagKind;

/// Which way a link pass moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// Tree → instance.
    Forward,
    /// Instance → tree.
    Backward,
}

impl fmt::Display for LinkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Backward => f.write_str("backward"),
        }
    }
}

/// Why a single field could not be linked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldFailureReason {
    /// The field cannot be read (backward) or written (forward).
    #[error("field access denied")]
    AccessDenied,

    /// The field holds no value at synchronization time.
    #[error("field holds no value")]
    NullValue,

    /// The tree has no tag at the field's key.
    #[error("key missing from tree")]
    MissingKey,

    /// A composite key holds something other than a sub-tree.
    #[error("expected compound, found {0}")]
    NotACompound(TagKind),

    /// The value could not be converted.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A failed field, identified by its dotted key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// Key path in the tree, e.g. `stats.kills` for a nested field.
    pub key: String,
    /// Declared field name.
    pub field: &'static str,
    pub direction: LinkDirection,
    pub reason: FieldFailureReason,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} link of `{}` ({}): {}",
            self.direction, self.key, self.field, self.reason
        )
    }
}

/// Outcome of one link pass.
///
/// A pass always runs to completion; `failures` lists every field that was
/// skipped. An empty failure list means the tree and the instance agree on
/// every linked key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    linked: usize,
    failures: Vec<FieldFailure>,
}

impl LinkReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields transferred successfully (nested fields included).
    pub fn linked(&self) -> usize {
        self.linked
    }

    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    /// Returns `true` if no field failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Key paths of all failed fields.
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.key.as_str()).collect()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: LinkReport) {
        self.linked += other.linked;
        self.failures.extend(other.failures);
    }

    pub(crate) fn record_linked(&mut self) {
        self.linked += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: FieldFailure) {
        self.failures.push(failure);
    }
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} linked, {} failed", self.linked, self.failures.len())
    }
}
