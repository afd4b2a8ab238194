//! Command text formatting.

use log::trace;

use super::KeyValues;
use super::ResolvedCommand;
use super::expansion::format_clauses;
use crate::ProtocolVersion;
use crate::error::Error;
use crate::error::UsageError;
use crate::metadata::MetadataProvider;
use crate::model::Value;
use crate::query::url::escape_data;
use crate::query::url::format_pairs;
use crate::query::url::value_literal;

/// Formats a resolved command into a relative URI: resource path plus query.
pub(crate) fn command_text(
    command: &ResolvedCommand,
    metadata: &dyn MetadataProvider,
    protocol: ProtocolVersion,
) -> Result<String, Error> {
    let mut text = resource_path(command, metadata, protocol)?;
    if command.compute_count {
        text.push_str("/$count");
    }

    let clauses = query_clauses(command, metadata, protocol)?;
    if !clauses.is_empty() {
        text.push('?');
        text.push_str(&clauses.join("&"));
    }

    trace!("Formatted command text: {}", text);
    Ok(text)
}

/// Formats the resource path: root, key, type cast and operation segments.
pub(crate) fn resource_path(
    command: &ResolvedCommand,
    metadata: &dyn MetadataProvider,
    protocol: ProtocolVersion,
) -> Result<String, Error> {
    if command.function.is_some() && command.action.is_some() {
        return Err(UsageError::FunctionAndAction.into());
    }
    if command.key.is_some() && command.filter.is_some() {
        return Err(UsageError::KeyAndFilter.into());
    }

    let mut path = match (&command.link, &command.collection) {
        (Some(link), _) => {
            let parent = command
                .parent
                .as_deref()
                .ok_or_else(|| UsageError::NavigationWithoutParent { link: link.clone() })?;
            if parent.compute_count || !query_clauses(parent, metadata, protocol)?.is_empty() {
                return Err(UsageError::NavigationFromQuery { link: link.clone() }.into());
            }
            format!("{}/{}", resource_path(parent, metadata, protocol)?, link)
        }
        (None, Some(collection)) => collection.clone(),
        (None, None) => String::new(),
    };

    if let Some(key) = &command.key {
        let collection = command.base_target.as_deref().ok_or(UsageError::MissingTarget)?;
        path.push_str(&key_segment(key, collection, metadata, protocol)?);
    }

    if let Some(derived) = &command.derived_type {
        let namespace = metadata.entity_collection_type_namespace(derived)?;
        path.push_str(&format!("/{}.{}", namespace, derived));
    }

    let operation = match (&command.function, &command.action) {
        (Some(function), _) => Some(metadata.function_full_name(function)?),
        (None, Some(action)) => Some(metadata.action_full_name(action)?),
        (None, None) => None,
    };
    if let Some(operation) = operation {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&operation);
        if command.function.is_some() && parameters_in_path(command, protocol) {
            path.push_str(&format_pairs(&entry_pairs(command), false, protocol)?);
        }
    }

    if path.is_empty() {
        return Err(UsageError::MissingTarget.into());
    }
    Ok(path)
}

/// Under V4 function parameters fold into the path unless a key occupies it.
fn parameters_in_path(command: &ResolvedCommand, protocol: ProtocolVersion) -> bool {
    protocol.is_v4() && command.key.is_none()
}

fn entry_pairs(command: &ResolvedCommand) -> Vec<(String, Value)> {
    command
        .entry
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Renders a key as `(value)` or `(Name=value,...)` in declared key order.
///
/// Values with no matching declared key property are skipped. The rest are
/// coerced to their property's declared type.
fn key_segment(
    key: &KeyValues,
    collection: &str,
    metadata: &dyn MetadataProvider,
    protocol: ProtocolVersion,
) -> Result<String, Error> {
    let declared = metadata.declared_key_property_names(collection)?;
    let pairs: Vec<(String, Value)> = match key {
        KeyValues::Positional(values) if declared.is_empty() && values.len() == 1 => {
            vec![(String::new(), values[0].clone())]
        }
        KeyValues::Positional(values) => declared.iter().cloned().zip(values.iter().cloned()).collect(),
        KeyValues::Named(entry) => {
            let mut named = Vec::with_capacity(entry.len());
            for (name, value) in entry.iter() {
                named.push((metadata.structural_property_exact_name(collection, name)?, value.clone()));
            }
            declared
                .iter()
                .filter_map(|k| named.iter().find(|(n, _)| n == k).cloned())
                .collect()
        }
    };

    if pairs.is_empty() {
        return Err(UsageError::EmptyKey.into());
    }
    let pairs = pairs
        .into_iter()
        .map(|(name, value)| {
            if name.is_empty() {
                return Ok((name, value));
            }
            let edm_type = metadata.structural_property_type_name(collection, &name)?;
            Ok((name, value.coerce(&edm_type)?))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(format_pairs(&pairs, declared.len() <= 1, protocol)?)
}

fn query_clauses(
    command: &ResolvedCommand,
    metadata: &dyn MetadataProvider,
    protocol: ProtocolVersion,
) -> Result<Vec<String>, Error> {
    let mut clauses = Vec::new();

    if command.function.is_some() && !parameters_in_path(command, protocol) {
        for (name, value) in command.entry.iter() {
            let literal = value_literal(value, protocol)?;
            clauses.push(format!("{}={}", name, escape_data(&literal)));
        }
    }
    if let Some(filter) = &command.filter {
        clauses.push(format!("$filter={}", escape_data(filter)));
    }
    if let Some(skip) = command.skip {
        clauses.push(format!("$skip={}", skip));
    }
    if let (Some(top), None) = (command.top, &command.key) {
        clauses.push(format!("$top={}", top));
    }

    if let Some(target) = command.target.as_deref() {
        let formatted = format_clauses(
            metadata,
            target,
            protocol,
            &command.expand,
            &command.select,
            &command.order_by,
        )?;
        if let Some(expand) = formatted.expand {
            clauses.push(format!("$expand={}", expand));
        }
        if let Some(order_by) = formatted.order_by {
            clauses.push(format!("$orderby={}", order_by));
        }
        if let Some(select) = formatted.select {
            clauses.push(format!("$select={}", select));
        }
    } else if !command.expand.is_empty() || !command.select.is_empty() || !command.order_by.is_empty() {
        return Err(UsageError::MissingTarget.into());
    }

    if command.include_count {
        if protocol.is_v4() {
            clauses.push("$count=true".to_string());
        } else {
            clauses.push("$inlinecount=allpages".to_string());
        }
    }
    clauses.extend(command.query_options.iter().cloned());
    Ok(clauses)
}
