/// Errors raised while building link descriptors.
///
/// These are fatal for the descriptor being built. Failures during a link
/// pass are per-field and reported through
/// [`LinkReport`](crate::report::LinkReport) instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// A required input was blank or missing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The shape does not provide a factory for new instances.
    #[error("no usable constructor for {type_name}")]
    NoUsableConstructor { type_name: &'static str },

    /// A field's type has no codec and cannot be linked as a nested object.
    #[error("field `{field}` has unsupported type {type_name}")]
    UnsupportedType {
        field: &'static str,
        type_name: &'static str,
    },

    /// Two fields of the same kind map to one key.
    #[error("duplicate key {key:?} in {type_name}")]
    DuplicateKey { key: String, type_name: &'static str },

    /// One key is mapped as both a scalar and a composite field.
    #[error("key {key:?} in {type_name} is both scalar and composite")]
    KeyCollision { key: String, type_name: &'static str },

    /// A composite field (transitively) contains its own type.
    #[error("cyclic composite: {}", chain.join(" -> "))]
    CyclicComposite { chain: Vec<&'static str> },
}

/// Result alias for descriptor construction.
pub type LinkResult<T> = Result<T, LinkError>;
