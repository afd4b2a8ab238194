//! Unresolvable metadata reference errors

use std::fmt;

/// The kind of schema object a name was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// An entity set or entity type used as a collection.
    EntityCollection,
    /// An entity type derived from a collection's type.
    DerivedCollection,
    /// A structural (non-navigation) property.
    StructuralProperty,
    /// A navigation property.
    NavigationProperty,
    /// Any property, structural or navigation.
    Property,
    /// A function import or bound function.
    Function,
    /// An action import or bound action.
    Action,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EntityCollection => "Entity collection",
            Self::DerivedCollection => "Derived entity collection",
            Self::StructuralProperty => "Structural property",
            Self::NavigationProperty => "Navigation property",
            Self::Property => "Property",
            Self::Function => "Function",
            Self::Action => "Action",
        };
        f.write_str(name)
    }
}

/// A name that matched no object in the schema.
///
/// Carries the offending identifier and, for member lookups, the collection
/// that was searched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{name}' not found{}", context_suffix(.context))]
pub struct UnresolvableObjectError {
    kind: ObjectKind,
    name: String,
    context: Option<String>,
}

impl UnresolvableObjectError {
    /// Creates a new error for a top-level object.
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            context: None,
        }
    }

    /// Creates a new error for a member of a collection.
    pub fn in_collection(kind: ObjectKind, name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            context: Some(collection.into()),
        }
    }

    /// Returns the kind of object that was looked up.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Returns the name that could not be resolved.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collection searched, if any.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

fn context_suffix(context: &Option<String>) -> String {
    match context {
        Some(collection) => format!(" in '{}'", collection),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_with_context() {
        let err = UnresolvableObjectError::in_collection(ObjectKind::StructuralProperty, "Price", "Products");
        assert_eq!(err.to_string(), "Structural property 'Price' not found in 'Products'");
        assert_eq!(err.name(), "Price");
        assert_eq!(err.context(), Some("Products"));
    }

    #[test]
    fn test_message_without_context() {
        let err = UnresolvableObjectError::new(ObjectKind::EntityCollection, "Gadgets");
        assert_eq!(err.to_string(), "Entity collection 'Gadgets' not found");
    }
}
