//! Command state accumulated by a fluent chain.

use std::sync::Arc;

use super::ExpandAssociation;
use super::ExpandOptions;
use super::KeyValues;
use super::OrderByColumn;
use super::Staged;
use super::TypeRef;
use super::clause::split_paths;
use crate::error::UsageError;
use crate::model::Entry;
use crate::query::Direction;
use crate::query::FilterExpression;

/// A filter staged as raw text or as a deferred predicate.
pub type StagedFilter = Staged<String, Arc<dyn FilterExpression>>;

/// Every facet a fluent chain node has set.
///
/// Key and filter are not cleared by each other; a command carrying both is
/// rejected when it is formatted. Function and action likewise.
#[derive(Debug, Clone, Default)]
pub struct CommandState {
    pub(crate) collection: Option<Staged<String, TypeRef>>,
    pub(crate) derived_collection: Option<Staged<String, TypeRef>>,
    pub(crate) key: Option<KeyValues>,
    pub(crate) filter: Option<StagedFilter>,
    pub(crate) skip: Option<u64>,
    pub(crate) top: Option<u64>,
    pub(crate) expand: Vec<ExpandAssociation>,
    pub(crate) select: Vec<String>,
    pub(crate) order_by: Vec<OrderByColumn>,
    pub(crate) compute_count: bool,
    pub(crate) include_count: bool,
    pub(crate) link: Option<Staged<String, TypeRef>>,
    pub(crate) function: Option<String>,
    pub(crate) action: Option<String>,
    pub(crate) entry: Entry,
    pub(crate) query_options: Vec<String>,
}

impl CommandState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state traversing a navigation link of its parent.
    pub(crate) fn with_link(link: Staged<String, TypeRef>) -> Self {
        Self {
            link: Some(link),
            ..Self::default()
        }
    }

    /// Sets the target collection; `"A/B"` also narrows to derived type `B`.
    pub(crate) fn set_collection(&mut self, name: &str) {
        match name.split_once('/') {
            Some((collection, derived)) => {
                self.collection = Some(Staged::Value(collection.to_string()));
                self.derived_collection = Some(Staged::Value(derived.to_string()));
            }
            None => self.collection = Some(Staged::Value(name.to_string())),
        }
    }

    pub(crate) fn set_collection_type(&mut self, type_ref: TypeRef) {
        self.collection = Some(Staged::Symbolic(type_ref));
    }

    pub(crate) fn set_derived(&mut self, derived: Staged<String, TypeRef>) {
        self.derived_collection = Some(derived);
    }

    pub(crate) fn set_key(&mut self, key: KeyValues) {
        self.key = Some(key);
    }

    pub(crate) fn set_filter(&mut self, filter: StagedFilter) {
        self.filter = Some(filter);
    }

    pub(crate) fn set_skip(&mut self, count: u64) {
        self.skip = Some(count);
    }

    /// Sets the top count; under a key only `1` is accepted.
    pub(crate) fn set_top(&mut self, count: u64) -> Result<(), UsageError> {
        if self.key.is_some() && count != 1 {
            return Err(UsageError::TopWithKey { count });
        }
        self.top = Some(count);
        Ok(())
    }

    pub(crate) fn add_expand<I, S>(&mut self, items: I, options: ExpandOptions)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.expand.extend(
            split_paths(items)
                .into_iter()
                .map(|path| ExpandAssociation { path, options }),
        );
    }

    pub(crate) fn add_select<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.select.extend(split_paths(items));
    }

    pub(crate) fn add_order_by<I, S>(&mut self, items: I, direction: Direction)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.order_by.extend(
            split_paths(items)
                .into_iter()
                .map(|path| OrderByColumn { path, direction }),
        );
    }

    pub(crate) fn set_compute_count(&mut self) {
        self.compute_count = true;
    }

    pub(crate) fn set_include_count(&mut self) {
        self.include_count = true;
    }

    pub(crate) fn set_function(&mut self, name: &str) {
        self.function = Some(name.to_string());
    }

    pub(crate) fn set_action(&mut self, name: &str) {
        self.action = Some(name.to_string());
    }

    pub(crate) fn set_entry(&mut self, entry: Entry) {
        self.entry = entry;
    }

    pub(crate) fn add_query_options(&mut self, options: &str) {
        let options = options.trim_start_matches(['?', '&']);
        if !options.is_empty() {
            self.query_options.push(options.to_string());
        }
    }

    /// Returns `true` if a key is set.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Returns `true` if a filter is set.
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Returns the payload staged for insert, update or operation calls.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }
}
