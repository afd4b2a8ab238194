//! Symbolic filter predicates over approximate property paths

use std::fmt;

use crate::model::Value;

/// A `/`-separated path of approximate property names.
///
/// Leading segments walk navigation properties; the last names the property
/// being compared. Names are matched against metadata only when the command
/// is formatted, so `"category/categoryname"` is as good as the exact form.
/// Empty segments (`"A//B"`, a trailing `/`) are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Splits a path into segments.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the single segment of a path that stays on the target entity.
    pub fn as_local(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [name] => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for PropertyPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

/// A binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    /// Returns the OData operator keyword.
    pub fn operator(self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
            Comparison::Gt => "gt",
            Comparison::Ge => "ge",
            Comparison::Lt => "lt",
            Comparison::Le => "le",
        }
    }
}

/// A string-matching function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// `contains` (V4) or `substringof` (V3).
    Contains,
    StartsWith,
    EndsWith,
}

/// A symbolic filter predicate.
///
/// A conjunction of equalities on properties of the target entity itself is
/// a key lookup candidate (see [`Filter::key_equalities`]); when it covers
/// exactly the declared key it is formatted as `Collection(key)` instead of
/// a `$filter`.
///
/// # Example
///
/// ```
/// use odata_lib::query::Filter;
///
/// let by_key = Filter::eq("OrderID", 10248).and_also(Filter::eq("ProductID", 11));
/// assert_eq!(by_key.key_equalities().map(|pairs| pairs.len()), Some(2));
///
/// let by_category = Filter::eq("Category/CategoryName", "Beverages")
///     .and_also(Filter::gt("UnitPrice", 20.0));
/// assert!(by_category.key_equalities().is_none());
///
/// let active = Filter::eq("Discontinued", true).not();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `path op value`
    Compare(PropertyPath, Comparison, Value),
    /// `fn(path,'text')`
    Text(PropertyPath, TextMatch, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// `not (filter)`
    Not(Box<Filter>),
    /// Predicate text passed through without name resolution.
    Raw(String),
}

impl Filter {
    /// Compares a property path with a value.
    pub fn compare(path: impl Into<PropertyPath>, comparison: Comparison, value: impl Into<Value>) -> Self {
        Filter::Compare(path.into(), comparison, value.into())
    }

    pub fn eq(path: impl Into<PropertyPath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Comparison::Eq, value)
    }

    pub fn ne(path: impl Into<PropertyPath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Comparison::Ne, value)
    }

    pub fn gt(path: impl Into<PropertyPath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Comparison::Gt, value)
    }

    pub fn ge(path: impl Into<PropertyPath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Comparison::Ge, value)
    }

    pub fn lt(path: impl Into<PropertyPath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Comparison::Lt, value)
    }

    pub fn le(path: impl Into<PropertyPath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Comparison::Le, value)
    }

    /// `path eq null`. Never part of a key lookup.
    pub fn is_null(path: impl Into<PropertyPath>) -> Self {
        Self::compare(path, Comparison::Eq, Value::Null)
    }

    /// `path ne null`.
    pub fn is_not_null(path: impl Into<PropertyPath>) -> Self {
        Self::compare(path, Comparison::Ne, Value::Null)
    }

    pub fn contains(path: impl Into<PropertyPath>, text: impl Into<String>) -> Self {
        Filter::Text(path.into(), TextMatch::Contains, text.into())
    }

    pub fn starts_with(path: impl Into<PropertyPath>, text: impl Into<String>) -> Self {
        Filter::Text(path.into(), TextMatch::StartsWith, text.into())
    }

    pub fn ends_with(path: impl Into<PropertyPath>, text: impl Into<String>) -> Self {
        Filter::Text(path.into(), TextMatch::EndsWith, text.into())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn raw(filter: impl Into<String>) -> Self {
        Filter::Raw(filter.into())
    }

    /// Adds an operand to a conjunction, flattening nested `And`s.
    pub fn and_also(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                left.push(other);
                Filter::And(left)
            }
            (this, other) => Filter::And(vec![this, other]),
        }
    }

    /// Adds an operand to a disjunction, flattening nested `Or`s.
    pub fn or_else(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), other) => {
                left.push(other);
                Filter::Or(left)
            }
            (this, other) => Filter::Or(vec![this, other]),
        }
    }

    /// Negates the predicate. Double negation cancels out.
    pub fn not(self) -> Self {
        match self {
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }

    /// Returns the `(name, value)` pairs if the predicate is a conjunction of
    /// non-null equalities on single-segment paths, `None` otherwise.
    ///
    /// Only such predicates can address an entity by key: a path through a
    /// navigation property names a property of another entity.
    pub fn key_equalities(&self) -> Option<Vec<(&str, &Value)>> {
        match self {
            Filter::Compare(path, Comparison::Eq, value) if !value.is_null() => {
                path.as_local().map(|name| vec![(name, value)])
            }
            Filter::And(filters) if !filters.is_empty() => {
                let mut pairs = Vec::new();
                for filter in filters {
                    pairs.extend(filter.key_equalities()?);
                }
                Some(pairs)
            }
            _ => None,
        }
    }
}
