//! Filter expression formatting errors

/// A filter expression that could not be turned into an OData predicate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// A logical operator with no operands.
    #[error("Empty '{operator}' expression")]
    EmptyOperands { operator: &'static str },

    /// A value that has no URI literal form.
    #[error("Value of type {type_name} cannot be used as a literal")]
    UnsupportedLiteral { type_name: &'static str },

    /// A value that does not parse as its property's declared type.
    #[error("'{value}' is not a valid {type_name} value")]
    InvalidLiteral { type_name: String, value: String },
}
