use itemnbt_tree::TagKind;

/// Errors from codec registration and value conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A codec for this type has already been registered.
    #[error("codec already registered for {type_name}")]
    DuplicateRegistration { type_name: &'static str },

    /// No codec is registered for this type.
    #[error("no codec registered for {type_name}")]
    UnsupportedType { type_name: &'static str },

    /// The tag has the wrong kind for the target type.
    #[error("tag mismatch: expected {expected}, found {found}")]
    TagMismatch { expected: TagKind, found: TagKind },

    /// A numeric tag does not fit in the target type.
    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    /// The tag has the right kind but a malformed payload.
    #[error("invalid {target} payload: {reason}")]
    InvalidPayload { target: &'static str, reason: String },

    /// A type-erased value handed to a codec was not of the codec's type.
    #[error("value is not a {expected}")]
    ValueTypeMismatch { expected: &'static str },

    /// A blank key was used with a typed compound.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
