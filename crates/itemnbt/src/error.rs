use itemnbt_codec::CodecError;
use itemnbt_link::{FieldFailure, LinkError};
use itemnbt_tree::TreeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Some fields failed to link while `strict_fields` is enabled.
    #[error("partial link in category {category:?}: {} field(s) failed", failures.len())]
    PartialLink {
        category: String,
        failures: Vec<FieldFailure>,
    },

    #[error("link error: {0}")]
    Link(#[from] LinkError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("config error: {0}")]
    Config(String),
}

pub type DataResult<T> = Result<T, DataError>;

/// Reject blank categories before they reach the host item.
pub(crate) fn validate_category(category: &str) -> DataResult<()> {
    if category.trim().is_empty() {
        return Err(DataError::InvalidArgument(format!(
            "blank category {category:?}"
        )));
    }
    Ok(())
}
