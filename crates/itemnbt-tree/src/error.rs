use crate::tag::TagKind;

/// Errors from tree and host item operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A key or category name was empty or blank.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// A tag exists at `key` but has the wrong kind.
    #[error("type mismatch at {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: TagKind,
        found: TagKind,
    },

    /// JSON encoding or decoding of a host item failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while loading or saving a host item.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Reject blank keys before they reach the tree.
pub(crate) fn validate_key(key: &str) -> TreeResult<()> {
    if key.trim().is_empty() {
        return Err(TreeError::InvalidKey(key.to_string()));
    }
    Ok(())
}
