//! Two-phase fields: concrete values or symbolic references.

use crate::model::ODataEntity;

/// A command field holding either a concrete value or a symbolic reference
/// that still has to be bound against metadata.
///
/// Resolution consumes every symbolic variant on a private copy of the
/// command state, leaving only concrete values for the formatter.
#[derive(Debug, Clone)]
pub enum Staged<T, S> {
    /// A concrete value.
    Value(T),
    /// A symbolic reference bound at resolve time.
    Symbolic(S),
}

impl<T, S> Staged<T, S> {
    /// Returns the concrete value, if bound.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Symbolic(_) => None,
        }
    }

    /// Returns `true` if the field still holds a symbolic reference.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic(_))
    }

    /// Binds the field, evaluating a symbolic reference with `bind`.
    pub fn resolve(self, bind: impl FnOnce(S) -> T) -> T {
        match self {
            Self::Value(v) => v,
            Self::Symbolic(s) => bind(s),
        }
    }

    /// Binds the field with a fallible `bind`.
    pub fn try_resolve<E>(self, bind: impl FnOnce(S) -> Result<T, E>) -> Result<T, E> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Symbolic(s) => bind(s),
        }
    }
}

/// A reference to an entity type by its Rust binding.
///
/// Resolved to an exact collection, derived type or navigation property
/// name when the command is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    name: &'static str,
}

impl TypeRef {
    /// Creates a reference to the entity type bound to `T`.
    pub fn of<T: ODataEntity>() -> Self {
        Self { name: T::TYPE_NAME }
    }

    /// Returns the approximate type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Product;

    impl ODataEntity for Product {
        const TYPE_NAME: &'static str = "Product";
    }

    #[test]
    fn test_resolve_value_skips_binding() {
        let staged: Staged<String, TypeRef> = Staged::Value("Products".to_string());
        let resolved: Result<String, ()> = staged.try_resolve(|_| Err(()));
        assert_eq!(resolved, Ok("Products".to_string()));
    }

    #[test]
    fn test_resolve_symbolic_binds() {
        let staged: Staged<String, TypeRef> = Staged::Symbolic(TypeRef::of::<Product>());
        assert!(staged.is_symbolic());
        assert_eq!(staged.resolve(|t| format!("{}s", t.name())), "Products");
    }
}
