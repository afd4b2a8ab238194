//! Error types

mod expression;
mod metadata;
mod not_found;
mod usage;

pub use expression::*;
pub use metadata::*;
pub use not_found::*;
pub use usage::*;

/// Top-level error returned by every fallible operation in this crate.
///
/// The variants are distinguished kinds so callers can implement
/// ignore/continue policies (for example "ignore resource not found")
/// without matching on message text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The fluent chain violates a usage contract.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// A collection, property, function or action name could not be resolved.
    #[error(transparent)]
    NotFound(#[from] UnresolvableObjectError),

    /// A filter expression could not be formatted.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// The schema could not be loaded.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The service root or a request URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this is an unresolvable-object error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is a usage/contract violation.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Returns the offending identifier of an unresolvable-object error.
    pub fn unresolved_name(&self) -> Option<&str> {
        match self {
            Self::NotFound(e) => Some(e.name()),
            _ => None,
        }
    }
}
