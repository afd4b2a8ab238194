//! Metadata contract used to resolve approximate names
//!
//! The command formatter never inspects a schema directly. It asks a
//! [`MetadataProvider`] to turn user-supplied names into exact schema
//! identifiers and to describe keys and navigation targets.
//!
//! [`Schema`] is an in-memory entity data model implementing the contract;
//! [`SchemaSource`] loaders produce one for a [`Session`](crate::Session).
//!
//! # Example
//!
//! ```
//! use odata_lib::metadata::{EntityType, MetadataProvider, Schema};
//!
//! let schema = Schema::new("NorthwindModel")
//!     .entity_type(
//!         EntityType::new("Product")
//!             .key(["ProductID"])
//!             .property("ProductID")
//!             .property("ProductName"),
//!     )
//!     .entity_set("Products", "Product");
//!
//! assert_eq!(schema.entity_collection_exact_name("products").unwrap(), "Products");
//! ```

mod name_match;
mod schema;
mod source;

pub use name_match::NameMatchPolicy;
pub use schema::*;
pub use source::*;

use crate::error::Error;

/// A collection of entities the formatter can address.
///
/// Either an entity set (or contained entity type) or a type narrowing of
/// one, in which case `base` refers to the collection being narrowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCollection {
    name: String,
    entity_type: String,
    base: Option<Box<EntityCollection>>,
}

impl EntityCollection {
    /// Creates a collection with no base.
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            base: None,
        }
    }

    /// Creates a collection narrowing `base` to a derived entity type.
    pub fn derived(base: EntityCollection, entity_type: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self {
            name: entity_type.clone(),
            entity_type,
            base: Some(Box::new(base)),
        }
    }

    /// Returns the canonical collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the collection's entity type.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the collection this one narrows, if any.
    pub fn base(&self) -> Option<&EntityCollection> {
        self.base.as_deref()
    }

    /// Returns the outermost collection in the base chain.
    pub fn root(&self) -> &EntityCollection {
        let mut current = self;
        while let Some(base) = &current.base {
            current = base;
        }
        current
    }
}

/// Resolves approximate names against an entity data model.
///
/// `collection` arguments accept an entity set name or an entity type name.
/// Every name lookup applies the provider's name-match policy and fails with
/// an [`UnresolvableObjectError`](crate::error::UnresolvableObjectError) when
/// nothing matches.
pub trait MetadataProvider: Send + Sync {
    /// Resolves a collection by name.
    fn entity_collection(&self, name: &str) -> Result<EntityCollection, Error>;

    /// Resolves a type narrowing of `base` by derived type name.
    fn derived_entity_collection(&self, base: &EntityCollection, name: &str) -> Result<EntityCollection, Error>;

    /// Returns the declared key property names in schema order.
    fn declared_key_property_names(&self, collection: &str) -> Result<Vec<String>, Error>;

    /// Returns the exact name of a navigation property.
    fn navigation_property_exact_name(&self, collection: &str, name: &str) -> Result<String, Error>;

    /// Returns the entity type a navigation property points to.
    fn navigation_property_partner_name(&self, collection: &str, name: &str) -> Result<String, Error>;

    /// Returns `true` if the navigation property targets many entities.
    fn is_navigation_property_collection(&self, collection: &str, name: &str) -> Result<bool, Error>;

    /// Returns `true` if `name` resolves to a navigation property.
    fn has_navigation_property(&self, collection: &str, name: &str) -> bool;

    /// Returns the exact name of a structural property.
    fn structural_property_exact_name(&self, collection: &str, name: &str) -> Result<String, Error>;

    /// Returns the declared EDM type of a structural property.
    fn structural_property_type_name(&self, collection: &str, name: &str) -> Result<String, Error>;

    /// Returns `true` if `name` resolves to a structural property.
    fn has_structural_property(&self, collection: &str, name: &str) -> bool;

    /// Returns the canonical collection name.
    fn entity_collection_exact_name(&self, collection: &str) -> Result<String, Error>;

    /// Returns the namespace of the collection's entity type.
    fn entity_collection_type_namespace(&self, collection: &str) -> Result<String, Error>;

    /// Returns the exact name of the collection's entity type.
    fn entity_collection_type_name(&self, collection: &str) -> Result<String, Error>;

    /// Returns the name of a function as it appears in a resource path.
    fn function_full_name(&self, name: &str) -> Result<String, Error>;

    /// Returns the name of an action as it appears in a resource path.
    fn action_full_name(&self, name: &str) -> Result<String, Error>;
}
