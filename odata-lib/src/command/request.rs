//! Request descriptions handed to a transport.

use std::fmt;

use url::Url;

use super::ResolvedCommand;
use super::format::command_text;
use crate::ProtocolVersion;
use crate::error::Error;
use crate::error::ObjectKind;
use crate::error::UnresolvableObjectError;
use crate::error::UsageError;
use crate::metadata::MetadataProvider;

/// The operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Read entities.
    Find,
    /// Read the number of matching entities.
    FindCount,
    /// Create an entity from the staged entry.
    Insert,
    /// Update the keyed entity with the staged entry.
    Update,
    /// Delete the keyed entity.
    Delete,
    /// Call the staged function or action.
    Invoke,
}

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    /// Returns the method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transport needs to execute one command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    /// HTTP method.
    pub method: Method,
    /// Relative command text.
    pub command_text: String,
    /// Absolute request URL.
    pub url: Url,
    /// JSON body for inserts, updates and actions.
    pub payload: Option<serde_json::Value>,
}

pub(crate) fn build_request(
    command: &ResolvedCommand,
    kind: RequestKind,
    base_url: &Url,
    metadata: &dyn MetadataProvider,
    protocol: ProtocolVersion,
) -> Result<CommandRequest, Error> {
    let (method, payload) = match kind {
        RequestKind::Find | RequestKind::FindCount => (Method::Get, None),
        RequestKind::Insert => {
            if command.key.is_some() {
                return Err(UsageError::UnexpectedKey { operation: "insert" }.into());
            }
            (Method::Post, Some(entity_payload(command, metadata)?))
        }
        RequestKind::Update => {
            if command.key.is_none() {
                return Err(UsageError::MissingKey { operation: "update" }.into());
            }
            (Method::Patch, Some(entity_payload(command, metadata)?))
        }
        RequestKind::Delete => {
            if command.key.is_none() {
                return Err(UsageError::MissingKey { operation: "delete" }.into());
            }
            (Method::Delete, None)
        }
        RequestKind::Invoke => match (&command.function, &command.action) {
            (Some(_), None) => (Method::Get, None),
            (None, Some(_)) => (Method::Post, Some(command.entry.to_json()?)),
            (Some(_), Some(_)) => return Err(UsageError::FunctionAndAction.into()),
            (None, None) => return Err(UsageError::MissingTarget.into()),
        },
    };

    let command_text = if kind == RequestKind::FindCount && !command.compute_count {
        let mut counted = command.clone();
        counted.compute_count = true;
        command_text(&counted, metadata, protocol)?
    } else {
        command_text(command, metadata, protocol)?
    };
    let url = base_url.join(&command_text)?;

    Ok(CommandRequest {
        method,
        command_text,
        url,
        payload,
    })
}

/// Serializes the entry with property names resolved against the target.
fn entity_payload(command: &ResolvedCommand, metadata: &dyn MetadataProvider) -> Result<serde_json::Value, Error> {
    let target = command.target.as_deref().ok_or(UsageError::MissingTarget)?;
    let mut object = serde_json::Map::with_capacity(command.entry.len());
    for (name, value) in command.entry.iter() {
        let (exact, value) = if metadata.has_structural_property(target, name) {
            let edm_type = metadata.structural_property_type_name(target, name)?;
            (
                metadata.structural_property_exact_name(target, name)?,
                value.clone().coerce(&edm_type)?,
            )
        } else if metadata.has_navigation_property(target, name) {
            (metadata.navigation_property_exact_name(target, name)?, value.clone())
        } else {
            return Err(UnresolvableObjectError::in_collection(ObjectKind::Property, name, target).into());
        };
        let value = serde_json::to_value(&value).map_err(|e| UsageError::invalid_payload(e.to_string()))?;
        object.insert(exact, value);
    }
    Ok(serde_json::Value::Object(object))
}
