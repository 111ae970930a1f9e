//! Error types for sitecheck-types crate.

use thiserror::Error;

/// Errors raised while building or reading state types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// A resource address did not have the `type.name` shape.
    #[error("invalid resource address: {0:?}")]
    InvalidAddress(String),

    /// A required attribute was absent from an attribute store.
    #[error("missing attribute: {attribute}")]
    MissingAttribute { attribute: String },

    /// A required attribute was present but empty.
    #[error("empty attribute: {attribute}")]
    EmptyAttribute { attribute: String },
}

/// Result type for state type operations.
pub type TypesResult<T> = Result<T, TypesError>;
