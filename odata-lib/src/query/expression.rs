//! Metadata-aware filter expression formatting.

use std::fmt;

use super::Comparison;
use super::Filter;
use super::PropertyPath;
use super::TextMatch;
use super::url::escape_string;
use super::url::value_literal;
use crate::ProtocolVersion;
use crate::error::Error;
use crate::error::ExpressionError;
use crate::error::ObjectKind;
use crate::error::UnresolvableObjectError;
use crate::metadata::MetadataProvider;
use crate::model::Value;

/// Everything a filter expression needs to format itself.
pub struct FormatContext<'a> {
    /// Metadata used to resolve property names.
    pub metadata: &'a dyn MetadataProvider,
    /// Collection (entity set or type) the predicate applies to.
    pub collection: &'a str,
    /// Protocol version of the generated text.
    pub protocol: ProtocolVersion,
}

impl<'a> FormatContext<'a> {
    /// Creates a new context.
    pub fn new(metadata: &'a dyn MetadataProvider, collection: &'a str, protocol: ProtocolVersion) -> Self {
        Self {
            metadata,
            collection,
            protocol,
        }
    }

    /// Resolves a `/`-separated property path to exact schema names.
    ///
    /// Leading segments must be navigation properties; the last segment may
    /// be structural or navigation.
    pub fn property_path(&self, path: &str) -> Result<String, Error> {
        Ok(self.resolve_path(&PropertyPath::parse(path))?.0)
    }

    /// Resolves a path and, when it ends in a structural property, returns
    /// that property's EDM type.
    fn resolve_path(&self, path: &PropertyPath) -> Result<(String, Option<String>), Error> {
        let Some((last, leading)) = path.segments().split_last() else {
            return Err(
                UnresolvableObjectError::in_collection(ObjectKind::Property, path.to_string(), self.collection).into(),
            );
        };

        let mut collection = self.collection.to_string();
        let mut resolved = Vec::with_capacity(leading.len() + 1);
        for segment in leading {
            resolved.push(self.metadata.navigation_property_exact_name(&collection, segment)?);
            collection = self.metadata.navigation_property_partner_name(&collection, segment)?;
        }

        let edm_type = if self.metadata.has_structural_property(&collection, last) {
            resolved.push(self.metadata.structural_property_exact_name(&collection, last)?);
            Some(self.metadata.structural_property_type_name(&collection, last)?)
        } else if self.metadata.has_navigation_property(&collection, last) {
            resolved.push(self.metadata.navigation_property_exact_name(&collection, last)?);
            None
        } else {
            return Err(UnresolvableObjectError::in_collection(ObjectKind::Property, last.as_str(), collection).into());
        };
        Ok((resolved.join("/"), edm_type))
    }

    fn comparison(&self, path: &PropertyPath, comparison: Comparison, value: &Value) -> Result<String, Error> {
        let (path, edm_type) = self.resolve_path(path)?;
        let value = match edm_type {
            Some(edm_type) => value.clone().coerce(&edm_type)?,
            None => value.clone(),
        };
        Ok(format!(
            "{} {} {}",
            path,
            comparison.operator(),
            value_literal(&value, self.protocol)?
        ))
    }
}

/// A deferred predicate that formats into an OData `$filter` string.
///
/// Implement this to plug a custom expression language into
/// [`FluentCommand::filter_expr`](crate::command::FluentCommand::filter_expr).
pub trait FilterExpression: fmt::Debug + Send + Sync {
    /// Formats the predicate against the context's collection.
    fn format(&self, context: &FormatContext<'_>) -> Result<String, Error>;

    /// Returns the `(property, value)` pairs if the predicate is a pure
    /// conjunction of equality comparisons, `None` otherwise.
    fn equalities(&self) -> Option<Vec<(String, Value)>> {
        None
    }
}

impl FilterExpression for Filter {
    fn format(&self, context: &FormatContext<'_>) -> Result<String, Error> {
        match self {
            Filter::Compare(path, comparison, value) => context.comparison(path, *comparison, value),
            Filter::Text(path, function, text) => {
                let path = context.resolve_path(path)?.0;
                let text = escape_string(text);
                Ok(match function {
                    TextMatch::Contains if context.protocol.is_v4() => format!("contains({},{})", path, text),
                    TextMatch::Contains => format!("substringof({},{})", text, path),
                    TextMatch::StartsWith => format!("startswith({},{})", path, text),
                    TextMatch::EndsWith => format!("endswith({},{})", path, text),
                })
            }
            Filter::And(filters) => join(filters, "and", context),
            Filter::Or(filters) => join(filters, "or", context),
            Filter::Not(inner) => Ok(format!("not ({})", inner.format(context)?)),
            Filter::Raw(raw) => Ok(raw.clone()),
        }
    }

    fn equalities(&self) -> Option<Vec<(String, Value)>> {
        self.key_equalities().map(|pairs| {
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect()
        })
    }
}

/// Joins operands with a logical operator.
///
/// Disjunctions nested in a conjunction are parenthesized to keep their
/// grouping.
fn join(filters: &[Filter], operator: &'static str, context: &FormatContext<'_>) -> Result<String, Error> {
    if filters.is_empty() {
        return Err(ExpressionError::EmptyOperands { operator }.into());
    }
    let parts = filters
        .iter()
        .map(|f| {
            let text = f.format(context)?;
            let grouped = operator == "and" && matches!(f, Filter::Or(inner) if inner.len() > 1);
            Ok(if grouped { format!("({})", text) } else { text })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(parts.join(&format!(" {} ", operator)))
}
