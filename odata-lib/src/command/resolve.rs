//! Binding of symbolic command fields against metadata.

use std::sync::Arc;

use log::debug;

use super::CommandState;
use super::ExpandAssociation;
use super::KeyValues;
use super::OrderByColumn;
use super::Staged;
use super::TypeRef;
use crate::ProtocolVersion;
use crate::error::Error;
use crate::error::UsageError;
use crate::metadata::MetadataProvider;
use crate::model::Entry;
use crate::model::Value;
use crate::query::FilterExpression;
use crate::query::FormatContext;

/// A command whose collection, derived type, link and filter are bound to
/// exact schema names.
///
/// Produced by [`FluentCommand::resolve`](super::FluentCommand::resolve) on a
/// private copy of the command state; the fluent chain itself is untouched.
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    pub(crate) collection: Option<String>,
    pub(crate) derived_type: Option<String>,
    pub(crate) link: Option<String>,
    pub(crate) key: Option<KeyValues>,
    pub(crate) filter: Option<String>,
    pub(crate) skip: Option<u64>,
    pub(crate) top: Option<u64>,
    pub(crate) expand: Vec<ExpandAssociation>,
    pub(crate) select: Vec<String>,
    pub(crate) order_by: Vec<OrderByColumn>,
    pub(crate) compute_count: bool,
    pub(crate) include_count: bool,
    pub(crate) function: Option<String>,
    pub(crate) action: Option<String>,
    pub(crate) entry: Entry,
    pub(crate) query_options: Vec<String>,
    /// Collection the key and the link apply to.
    pub(crate) base_target: Option<String>,
    /// Collection names of clauses resolve against (derived type if any).
    pub(crate) target: Option<String>,
    pub(crate) parent: Option<Arc<ResolvedCommand>>,
}

impl ResolvedCommand {
    /// Returns the canonical collection name, if the command starts at one.
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Returns the exact derived type name of a type cast.
    pub fn derived_type(&self) -> Option<&str> {
        self.derived_type.as_deref()
    }

    /// Returns the exact navigation property name of a navigation.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Returns the key, including one collapsed from an equality filter.
    pub fn key(&self) -> Option<&KeyValues> {
        self.key.as_ref()
    }

    /// Returns the formatted filter predicate.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Returns the top count.
    pub fn top(&self) -> Option<u64> {
        self.top
    }

    /// Returns the collection clause names are resolved against.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Returns the resolved parent of a navigation.
    pub fn parent(&self) -> Option<&ResolvedCommand> {
        self.parent.as_deref()
    }
}

/// Resolves `state` against `metadata`.
///
/// `parent` must be the resolved parent command when `state` traverses a
/// navigation link.
pub(crate) fn resolve(
    state: &CommandState,
    parent: Option<Arc<ResolvedCommand>>,
    metadata: &dyn MetadataProvider,
    protocol: ProtocolVersion,
) -> Result<ResolvedCommand, Error> {
    let collection = state
        .collection
        .clone()
        .map(|c| metadata.entity_collection_exact_name(&staged_name(c)))
        .transpose()?;

    let (link, link_target) = match state.link.clone() {
        Some(link) => {
            let name = staged_name(link);
            let Some(parent_target) = parent.as_ref().and_then(|p| p.target.clone()) else {
                return Err(UsageError::NavigationWithoutParent { link: name }.into());
            };
            let exact = metadata.navigation_property_exact_name(&parent_target, &name)?;
            let partner = metadata.navigation_property_partner_name(&parent_target, &name)?;
            (Some(exact), Some(partner))
        }
        None => (None, None),
    };

    let base_target = link_target.or_else(|| collection.clone());

    let derived_type = match (state.derived_collection.clone(), &base_target) {
        (Some(derived), Some(base)) => {
            let base = metadata.entity_collection(base)?;
            let derived = metadata.derived_entity_collection(&base, &staged_name(derived))?;
            Some(derived.entity_type().to_string())
        }
        (Some(_), None) => return Err(UsageError::MissingTarget.into()),
        (None, _) => None,
    };

    let target = derived_type.clone().or_else(|| base_target.clone());

    let mut key = state.key.clone();
    let mut top = state.top;
    let filter = match state.filter.clone() {
        None => None,
        Some(Staged::Value(text)) => Some(text),
        Some(Staged::Symbolic(_)) if key.is_some() => return Err(UsageError::KeyAndFilter.into()),
        Some(Staged::Symbolic(expr)) => {
            let target = target.as_deref().ok_or(UsageError::MissingTarget)?;
            match key_from_filter(expr.as_ref(), target, metadata)? {
                Some(named) => {
                    debug!("Filter on {} collapsed into key lookup", target);
                    key = Some(KeyValues::Named(named));
                    top = None;
                    None
                }
                None => Some(expr.format(&FormatContext::new(metadata, target, protocol))?),
            }
        }
    };

    Ok(ResolvedCommand {
        collection,
        derived_type,
        link,
        key,
        filter,
        skip: state.skip,
        top,
        expand: state.expand.clone(),
        select: state.select.clone(),
        order_by: state.order_by.clone(),
        compute_count: state.compute_count,
        include_count: state.include_count,
        function: state.function.clone(),
        action: state.action.clone(),
        entry: state.entry.clone(),
        query_options: state.query_options.clone(),
        base_target,
        target,
        parent,
    })
}

fn staged_name(staged: Staged<String, TypeRef>) -> String {
    staged.resolve(|t| t.name().to_string())
}

/// Interprets a pure equality conjunction covering exactly the declared key
/// properties as a key, in declared order.
fn key_from_filter(
    expr: &dyn FilterExpression,
    collection: &str,
    metadata: &dyn MetadataProvider,
) -> Result<Option<Entry>, Error> {
    let Some(pairs) = expr.equalities() else {
        return Ok(None);
    };

    let mut resolved: Vec<(String, Value)> = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        let Ok(exact) = metadata.structural_property_exact_name(collection, &name) else {
            return Ok(None);
        };
        match resolved.iter().find(|(n, _)| *n == exact) {
            Some((_, existing)) if *existing == value => {}
            // Conflicting values for one property are not a key
            Some(_) => return Ok(None),
            None => resolved.push((exact, value)),
        }
    }

    let declared = metadata.declared_key_property_names(collection)?;
    if declared.is_empty()
        || declared.len() != resolved.len()
        || !declared.iter().all(|k| resolved.iter().any(|(n, _)| n == k))
    {
        return Ok(None);
    }

    Ok(Some(
        declared
            .iter()
            .filter_map(|k| resolved.iter().find(|(n, _)| n == k).cloned())
            .collect(),
    ))
}
