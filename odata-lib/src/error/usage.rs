//! Usage (contract violation) errors

/// Errors raised when a fluent chain describes an impossible command.
///
/// These are programming errors: they are never retried and the caller must
/// fix the chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// A key lookup and a filter predicate were both set on one command.
    #[error("OData filter and key may not be combined")]
    KeyAndFilter,

    /// A function and an action were both set on one command.
    #[error("OData function and action may not be combined")]
    FunctionAndAction,

    /// `top` was called with a value other than 1 while a key is set.
    #[error("Top count may only be 1 when a key is set, got {count}")]
    TopWithKey { count: u64 },

    /// A key was set with no values.
    #[error("Key must contain at least one value")]
    EmptyKey,

    /// The operation requires a key but none is set.
    #[error("Operation {operation} requires a key")]
    MissingKey { operation: &'static str },

    /// The operation must not carry a key.
    #[error("Operation {operation} does not accept a key")]
    UnexpectedKey { operation: &'static str },

    /// The command names no collection, link, function or action.
    #[error("Command has no target collection, link, function or action")]
    MissingTarget,

    /// A navigation link was set on a command without a parent.
    #[error("Navigation '{link}' requires a parent command")]
    NavigationWithoutParent { link: String },

    /// A navigation followed a command whose text carries query clauses.
    #[error("Navigation '{link}' cannot follow a command with query options")]
    NavigationFromQuery { link: String },

    /// A terminal operation was called on a batch placeholder command.
    #[error("Command is not attached to a session")]
    Detached,

    /// A typed value could not be destructured into a field map.
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },
}

impl UsageError {
    /// Creates a new invalid payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}
