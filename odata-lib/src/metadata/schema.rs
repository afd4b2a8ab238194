//! In-memory entity data model

use serde::Deserialize;
use serde::Serialize;

use super::EntityCollection;
use super::MetadataProvider;
use super::NameMatchPolicy;
use crate::error::Error;
use crate::error::ObjectKind;
use crate::error::UnresolvableObjectError;

/// An entity data model: entity types, the sets exposing them, and the
/// functions and actions a service declares.
///
/// Schemas deserialize from JSON (camelCase field names) and can be built
/// in code:
///
/// ```
/// use odata_lib::metadata::{EntityType, Schema};
///
/// let schema = Schema::new("NorthwindModel")
///     .entity_type(
///         EntityType::new("Order")
///             .key(["OrderID"])
///             .property("OrderID")
///             .reference("Customer", "Customer"),
///     )
///     .entity_type(EntityType::new("Customer").key(["CustomerID"]).property("CustomerID"))
///     .entity_set("Orders", "Order")
///     .entity_set("Customers", "Customer");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Default namespace of the entity types.
    pub namespace: String,

    /// Declared entity types.
    #[serde(default)]
    pub entity_types: Vec<EntityType>,

    /// Entity sets exposing the entity types.
    #[serde(default)]
    pub entity_sets: Vec<EntitySet>,

    /// Declared functions.
    #[serde(default)]
    pub functions: Vec<Operation>,

    /// Declared actions.
    #[serde(default)]
    pub actions: Vec<Operation>,

    /// Policy used to match approximate names.
    #[serde(default)]
    pub name_match: NameMatchPolicy,
}

/// An entity type declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityType {
    /// Type name without namespace.
    pub name: String,

    /// Namespace, when it differs from the schema namespace.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Name of the base type, optionally namespace-qualified.
    #[serde(default)]
    pub base_type: Option<String>,

    /// Key property names in declaration order.
    #[serde(default)]
    pub key: Vec<String>,

    /// Structural properties.
    #[serde(default)]
    pub properties: Vec<Property>,

    /// Navigation properties.
    #[serde(default)]
    pub navigation_properties: Vec<NavigationProperty>,
}

/// A structural property declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Property name.
    pub name: String,

    /// EDM type name (e.g. `Edm.Int32`).
    #[serde(default = "default_property_type")]
    pub type_name: String,
}

/// A navigation property declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationProperty {
    /// Property name.
    pub name: String,

    /// Target entity type, optionally namespace-qualified.
    pub target_type: String,

    /// Whether the property targets many entities.
    #[serde(default)]
    pub is_collection: bool,

    /// Name of the navigation property on the other side, if declared.
    #[serde(default)]
    pub partner: Option<String>,
}

/// An entity set declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySet {
    /// Set name as it appears in resource paths.
    pub name: String,

    /// Entity type of the set's members, optionally namespace-qualified.
    pub entity_type: String,
}

/// A function or action declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation name.
    pub name: String,

    /// Bound operations are addressed by their namespace-qualified name.
    #[serde(default)]
    pub is_bound: bool,
}

fn default_property_type() -> String {
    "Edm.String".to_string()
}

/// Strips a namespace qualifier from a type name.
fn local_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, local)| local)
}

impl Schema {
    /// Creates an empty schema with the given namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Parses a schema from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let schema = serde_json::from_str(json).map_err(crate::error::MetadataError::from)?;
        Ok(schema)
    }

    /// Adds an entity type.
    pub fn entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_types.push(entity_type);
        self
    }

    /// Adds an entity set.
    pub fn entity_set(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.entity_sets.push(EntitySet {
            name: name.into(),
            entity_type: entity_type.into(),
        });
        self
    }

    /// Adds an unbound function.
    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.functions.push(Operation {
            name: name.into(),
            is_bound: false,
        });
        self
    }

    /// Adds a bound function.
    pub fn bound_function(mut self, name: impl Into<String>) -> Self {
        self.functions.push(Operation {
            name: name.into(),
            is_bound: true,
        });
        self
    }

    /// Adds an unbound action.
    pub fn action(mut self, name: impl Into<String>) -> Self {
        self.actions.push(Operation {
            name: name.into(),
            is_bound: false,
        });
        self
    }

    /// Adds a bound action.
    pub fn bound_action(mut self, name: impl Into<String>) -> Self {
        self.actions.push(Operation {
            name: name.into(),
            is_bound: true,
        });
        self
    }

    /// Sets the name-match policy.
    pub fn with_name_match(mut self, policy: NameMatchPolicy) -> Self {
        self.name_match = policy;
        self
    }

    fn find_type(&self, name: &str) -> Option<&EntityType> {
        let name = local_name(name);
        self.entity_types.iter().find(|t| t.name == name)
    }

    fn namespace_of<'a>(&'a self, entity_type: &'a EntityType) -> &'a str {
        entity_type.namespace.as_deref().unwrap_or(&self.namespace)
    }

    /// Returns the type and its base types, most derived first.
    fn type_chain<'a>(&'a self, entity_type: &'a EntityType) -> Vec<&'a EntityType> {
        let mut chain = vec![entity_type];
        let mut current = entity_type;
        while let Some(base) = current.base_type.as_deref().and_then(|b| self.find_type(b)) {
            // Guard against cyclic declarations
            if chain.iter().any(|t| t.name == base.name) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    /// Resolves a collection name to its set (if any) and entity type.
    fn resolve(&self, name: &str) -> Result<(Option<&EntitySet>, &EntityType), Error> {
        let policy = self.name_match;
        let by_set = policy.best_match(self.entity_sets.iter().map(|s| s.name.as_str()), name);
        let by_type = policy.best_match(self.entity_types.iter().map(|t| t.name.as_str()), local_name(name));

        let not_found = || UnresolvableObjectError::new(ObjectKind::EntityCollection, name);

        match (by_set, by_type) {
            (Some((set_index, set_tier)), type_match)
                if type_match.is_none_or(|(_, type_tier)| set_tier <= type_tier) =>
            {
                let set = &self.entity_sets[set_index];
                let entity_type = self.find_type(&set.entity_type).ok_or_else(not_found)?;
                Ok((Some(set), entity_type))
            }
            (_, Some((type_index, _))) => {
                let entity_type = &self.entity_types[type_index];
                let set = self
                    .entity_sets
                    .iter()
                    .find(|s| local_name(&s.entity_type) == entity_type.name);
                Ok((set, entity_type))
            }
            _ => Err(not_found().into()),
        }
    }

    fn resolve_type(&self, collection: &str) -> Result<&EntityType, Error> {
        self.resolve(collection).map(|(_, entity_type)| entity_type)
    }

    fn find_navigation(&self, collection: &str, name: &str) -> Result<&NavigationProperty, Error> {
        let entity_type = self.resolve_type(collection)?;
        let navigations: Vec<&NavigationProperty> = self
            .type_chain(entity_type)
            .into_iter()
            .flat_map(|t| t.navigation_properties.iter())
            .collect();
        self.name_match
            .best_match(navigations.iter().map(|n| n.name.as_str()), name)
            .map(|(index, _)| navigations[index])
            .ok_or_else(|| {
                UnresolvableObjectError::in_collection(ObjectKind::NavigationProperty, name, collection).into()
            })
    }

    fn find_property(&self, collection: &str, name: &str) -> Result<&Property, Error> {
        let entity_type = self.resolve_type(collection)?;
        let properties: Vec<&Property> = self
            .type_chain(entity_type)
            .into_iter()
            .flat_map(|t| t.properties.iter())
            .collect();
        self.name_match
            .best_match(properties.iter().map(|p| p.name.as_str()), name)
            .map(|(index, _)| properties[index])
            .ok_or_else(|| {
                UnresolvableObjectError::in_collection(ObjectKind::StructuralProperty, name, collection).into()
            })
    }

    fn operation_full_name(&self, operations: &[Operation], name: &str, kind: ObjectKind) -> Result<String, Error> {
        let (index, _) = self
            .name_match
            .best_match(operations.iter().map(|o| o.name.as_str()), name)
            .ok_or_else(|| UnresolvableObjectError::new(kind, name))?;
        let operation = &operations[index];
        if operation.is_bound {
            Ok(format!("{}.{}", self.namespace, operation.name))
        } else {
            Ok(operation.name.clone())
        }
    }
}

impl MetadataProvider for Schema {
    fn entity_collection(&self, name: &str) -> Result<EntityCollection, Error> {
        let (set, entity_type) = self.resolve(name)?;
        let collection_name = set.map_or(entity_type.name.as_str(), |s| s.name.as_str());
        Ok(EntityCollection::new(collection_name, entity_type.name.as_str()))
    }

    fn derived_entity_collection(&self, base: &EntityCollection, name: &str) -> Result<EntityCollection, Error> {
        let base_type = local_name(base.entity_type());
        let derived: Vec<&EntityType> = self
            .entity_types
            .iter()
            .filter(|t| t.name != base_type)
            .filter(|t| self.type_chain(t).iter().any(|c| c.name == base_type))
            .collect();
        let (index, _) = self
            .name_match
            .best_match(derived.iter().map(|t| t.name.as_str()), local_name(name))
            .ok_or_else(|| UnresolvableObjectError::in_collection(ObjectKind::DerivedCollection, name, base.name()))?;
        Ok(EntityCollection::derived(base.clone(), derived[index].name.as_str()))
    }

    fn declared_key_property_names(&self, collection: &str) -> Result<Vec<String>, Error> {
        let entity_type = self.resolve_type(collection)?;
        Ok(self
            .type_chain(entity_type)
            .into_iter()
            .find(|t| !t.key.is_empty())
            .map(|t| t.key.clone())
            .unwrap_or_default())
    }

    fn navigation_property_exact_name(&self, collection: &str, name: &str) -> Result<String, Error> {
        Ok(self.find_navigation(collection, name)?.name.clone())
    }

    fn navigation_property_partner_name(&self, collection: &str, name: &str) -> Result<String, Error> {
        let navigation = self.find_navigation(collection, name)?;
        Ok(local_name(&navigation.target_type).to_string())
    }

    fn is_navigation_property_collection(&self, collection: &str, name: &str) -> Result<bool, Error> {
        Ok(self.find_navigation(collection, name)?.is_collection)
    }

    fn has_navigation_property(&self, collection: &str, name: &str) -> bool {
        self.find_navigation(collection, name).is_ok()
    }

    fn structural_property_exact_name(&self, collection: &str, name: &str) -> Result<String, Error> {
        Ok(self.find_property(collection, name)?.name.clone())
    }

    fn structural_property_type_name(&self, collection: &str, name: &str) -> Result<String, Error> {
        Ok(self.find_property(collection, name)?.type_name.clone())
    }

    fn has_structural_property(&self, collection: &str, name: &str) -> bool {
        self.find_property(collection, name).is_ok()
    }

    fn entity_collection_exact_name(&self, collection: &str) -> Result<String, Error> {
        Ok(self.entity_collection(collection)?.name().to_string())
    }

    fn entity_collection_type_namespace(&self, collection: &str) -> Result<String, Error> {
        let entity_type = self.resolve_type(collection)?;
        Ok(self.namespace_of(entity_type).to_string())
    }

    fn entity_collection_type_name(&self, collection: &str) -> Result<String, Error> {
        Ok(self.resolve_type(collection)?.name.clone())
    }

    fn function_full_name(&self, name: &str) -> Result<String, Error> {
        self.operation_full_name(&self.functions, name, ObjectKind::Function)
    }

    fn action_full_name(&self, name: &str) -> Result<String, Error> {
        self.operation_full_name(&self.actions, name, ObjectKind::Action)
    }
}

impl EntityType {
    /// Creates an entity type with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the base type.
    pub fn base(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    /// Sets the key property names.
    pub fn key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key = names.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a structural property of type `Edm.String`.
    pub fn property(self, name: impl Into<String>) -> Self {
        self.typed_property(name, default_property_type())
    }

    /// Adds a structural property of the given EDM type.
    pub fn typed_property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push(Property {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Adds a single-valued navigation property.
    pub fn reference(mut self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.navigation_properties.push(NavigationProperty {
            name: name.into(),
            target_type: target_type.into(),
            is_collection: false,
            partner: None,
        });
        self
    }

    /// Adds a collection-valued navigation property.
    pub fn collection(mut self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.navigation_properties.push(NavigationProperty {
            name: name.into(),
            target_type: target_type.into(),
            is_collection: true,
            partner: None,
        });
        self
    }
}
