//! The fluent command builder.

use std::sync::Arc;
use std::sync::OnceLock;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::CommandRequest;
use super::CommandState;
use super::ExpandOptions;
use super::KeyValues;
use super::RequestKind;
use super::ResolvedCommand;
use super::Staged;
use super::TypeRef;
use super::format;
use super::request;
use super::resolve::resolve;
use crate::ProtocolVersion;
use crate::Session;
use crate::error::Error;
use crate::error::MetadataError;
use crate::error::UsageError;
use crate::metadata::MetadataProvider;
use crate::metadata::Schema;
use crate::model::Entry;
use crate::model::ODataEntity;
use crate::model::ToEntry;
use crate::model::Value;
use crate::query::Direction;
use crate::query::FilterExpression;

/// A fluent description of one OData operation.
///
/// Every call consumes the command and returns an updated one, so branches
/// taken from a clone never affect each other:
///
/// ```
/// use odata_lib::Session;
/// use odata_lib::metadata::{EntityType, Schema};
/// use odata_lib::query::Filter;
///
/// let schema = Schema::new("NorthwindModel")
///     .entity_type(
///         EntityType::new("Product")
///             .key(["ProductID"])
///             .property("ProductID")
///             .property("ProductName"),
///     )
///     .entity_set("Products", "Product");
/// let session = Session::builder().url("https://example.com/odata").schema(schema).build()?;
///
/// let products = session.for_collection("Products");
/// let one = products.clone().filter_expr(Filter::eq("productid", 1));
/// let named = products.clone().filter_expr(Filter::eq("ProductName", "Chai"));
///
/// assert_eq!(one.command_text()?, "Products(1)");
/// assert_eq!(named.command_text()?, "Products?$filter=ProductName%20eq%20'Chai'");
/// assert_eq!(products.command_text()?, "Products");
/// # Ok::<(), odata_lib::error::Error>(())
/// ```
///
/// A command built with [`detached`](FluentCommand::detached) has no session:
/// every builder call is a no-op and terminal calls fail with
/// [`UsageError::Detached`].
#[derive(Debug, Clone)]
pub struct FluentCommand {
    session: Option<Session>,
    parent: Option<Arc<FluentCommand>>,
    state: CommandState,
    resolved: Arc<OnceLock<Arc<ResolvedCommand>>>,
}

impl FluentCommand {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session: Some(session),
            parent: None,
            state: CommandState::new(),
            resolved: Arc::default(),
        }
    }

    /// Creates a placeholder command with no session, as used for
    /// operations queued in a batch.
    pub fn detached() -> Self {
        Self {
            session: None,
            parent: None,
            state: CommandState::new(),
            resolved: Arc::default(),
        }
    }

    /// Returns `true` if the command has no session.
    pub fn is_detached(&self) -> bool {
        self.session.is_none()
    }

    /// Returns the accumulated state.
    pub fn state(&self) -> &CommandState {
        &self.state
    }

    fn update(self, mutate: impl FnOnce(&mut CommandState)) -> Self {
        if self.session.is_none() {
            return self;
        }
        let mut state = self.state;
        mutate(&mut state);
        Self {
            session: self.session,
            parent: self.parent,
            state,
            resolved: Arc::default(),
        }
    }

    fn try_update(self, mutate: impl FnOnce(&mut CommandState) -> Result<(), UsageError>) -> Result<Self, Error> {
        if self.session.is_none() {
            return Ok(self);
        }
        let mut state = self.state;
        mutate(&mut state)?;
        Ok(Self {
            session: self.session,
            parent: self.parent,
            state,
            resolved: Arc::default(),
        })
    }

    /// Targets a collection; `"A/B"` also narrows to derived type `B`.
    pub fn for_collection(self, name: &str) -> Self {
        self.update(|s| s.set_collection(name))
    }

    /// Targets the collection of entity type `T`.
    pub fn for_entity<T: ODataEntity>(self) -> Self {
        self.update(|s| s.set_collection_type(TypeRef::of::<T>()))
    }

    /// Narrows the collection to a derived entity type.
    pub fn as_derived(self, name: &str) -> Self {
        self.update(|s| s.set_derived(Staged::Value(name.to_string())))
    }

    /// Narrows the collection to the derived entity type `T`.
    pub fn as_entity<T: ODataEntity>(self) -> Self {
        self.update(|s| s.set_derived(Staged::Symbolic(TypeRef::of::<T>())))
    }

    /// Sets a single key value.
    pub fn key(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.update(|s| s.set_key(KeyValues::Positional(vec![value])))
    }

    /// Sets key values matched to the declared key properties by position.
    pub fn key_values<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.update(|s| s.set_key(KeyValues::Positional(values)))
    }

    /// Sets key values by property name.
    pub fn key_named<E: ToEntry + ?Sized>(self, values: &E) -> Self {
        self.key_entry(values.to_entry())
    }

    /// Sets key values from an entry.
    pub fn key_entry(self, entry: Entry) -> Self {
        self.update(|s| s.set_key(KeyValues::Named(entry)))
    }

    /// Sets key values from the fields of a serializable value.
    pub fn key_typed<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, Error> {
        if self.is_detached() {
            return Ok(self);
        }
        let entry = Entry::from_serialize(value)?;
        Ok(self.key_entry(entry))
    }

    /// Sets a raw `$filter` predicate.
    pub fn filter(self, filter: &str) -> Self {
        self.update(|s| s.set_filter(Staged::Value(filter.to_string())))
    }

    /// Sets a predicate resolved against metadata when the command is
    /// formatted. A conjunction of equalities covering exactly the key
    /// properties becomes a key lookup.
    pub fn filter_expr<F: FilterExpression + 'static>(self, filter: F) -> Self {
        self.update(|s| s.set_filter(Staged::Symbolic(Arc::new(filter))))
    }

    /// Skips `count` entities.
    pub fn skip(self, count: u64) -> Self {
        self.update(|s| s.set_skip(count))
    }

    /// Limits the result to `count` entities.
    ///
    /// Fails with [`UsageError::TopWithKey`] if a key is set and `count` is
    /// not 1.
    pub fn top(self, count: u64) -> Result<Self, Error> {
        self.try_update(|s| s.set_top(count))
    }

    /// Expands navigation properties. Items may be comma-separated and
    /// `/`-nested.
    pub fn expand<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.expand_with(items, ExpandOptions::default())
    }

    /// Expands navigation properties with options.
    pub fn expand_with<I, S>(self, items: I, options: ExpandOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update(|s| s.add_expand(items, options))
    }

    /// Selects properties.
    pub fn select<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update(|s| s.add_select(items))
    }

    /// Orders by properties, ascending.
    pub fn order_by<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update(|s| s.add_order_by(items, Direction::Asc))
    }

    /// Adds ascending sort properties.
    pub fn then_by<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.order_by(items)
    }

    /// Orders by properties, descending.
    pub fn order_by_descending<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update(|s| s.add_order_by(items, Direction::Desc))
    }

    /// Adds descending sort properties.
    pub fn then_by_descending<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.order_by_descending(items)
    }

    /// Requests the number of matching entities (`/$count`).
    pub fn count(self) -> Self {
        self.update(CommandState::set_compute_count)
    }

    /// Requests the total count alongside the results.
    pub fn with_count(self) -> Self {
        self.update(CommandState::set_include_count)
    }

    /// Stages the entry payload.
    pub fn set<E: ToEntry + ?Sized>(self, values: &E) -> Self {
        self.set_entry(values.to_entry())
    }

    /// Stages the entry payload from an entry.
    pub fn set_entry(self, entry: Entry) -> Self {
        self.update(|s| s.set_entry(entry))
    }

    /// Stages the entry payload from the fields of a serializable value.
    pub fn set_typed<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, Error> {
        if self.is_detached() {
            return Ok(self);
        }
        let entry = Entry::from_serialize(value)?;
        Ok(self.set_entry(entry))
    }

    /// Calls a function; the staged entry holds its parameters.
    pub fn function(self, name: &str) -> Self {
        self.update(|s| s.set_function(name))
    }

    /// Calls an action; the staged entry holds its parameters.
    pub fn action(self, name: &str) -> Self {
        self.update(|s| s.set_action(name))
    }

    /// Navigates to a related collection or entity of this command.
    pub fn navigate_to(self, name: &str) -> Self {
        self.navigate(Staged::Value(name.to_string()))
    }

    /// Navigates to the related entities of type `T`.
    pub fn navigate_to_entity<T: ODataEntity>(self) -> Self {
        self.navigate(Staged::Symbolic(TypeRef::of::<T>()))
    }

    fn navigate(self, link: Staged<String, TypeRef>) -> Self {
        if self.session.is_none() {
            return self;
        }
        Self {
            session: self.session.clone(),
            parent: Some(Arc::new(self)),
            state: CommandState::with_link(link),
            resolved: Arc::default(),
        }
    }

    /// Appends custom query options, e.g. `"debug=true"`.
    pub fn query_options(self, options: &str) -> Self {
        self.update(|s| s.add_query_options(options))
    }

    fn session(&self) -> Result<&Session, Error> {
        self.session.as_ref().ok_or_else(|| UsageError::Detached.into())
    }

    fn loaded_schema(&self) -> Result<(&Session, Arc<Schema>), Error> {
        let session = self.session()?;
        let schema = session.loaded_metadata().ok_or(MetadataError::NotLoaded)?;
        Ok((session, schema))
    }

    async fn fetched_schema(&self, cancel: &CancellationToken) -> Result<(&Session, Arc<Schema>), Error> {
        let session = self.session()?;
        let schema = session.metadata(cancel).await?;
        Ok((session, schema))
    }

    /// Resolves the command against the session's loaded schema.
    ///
    /// The result is memoized per command; fails with
    /// [`MetadataError::NotLoaded`] if the schema has not been loaded yet.
    pub fn resolve(&self) -> Result<Arc<ResolvedCommand>, Error> {
        let (session, schema) = self.loaded_schema()?;
        self.resolve_with(schema.as_ref(), session.settings().protocol)
    }

    /// Resolves the command, loading the schema first if needed.
    pub async fn resolve_async(&self, cancel: &CancellationToken) -> Result<Arc<ResolvedCommand>, Error> {
        let (session, schema) = self.fetched_schema(cancel).await?;
        self.resolve_with(schema.as_ref(), session.settings().protocol)
    }

    fn resolve_with(
        &self,
        metadata: &dyn MetadataProvider,
        protocol: ProtocolVersion,
    ) -> Result<Arc<ResolvedCommand>, Error> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved.clone());
        }
        let parent = self
            .parent
            .as_ref()
            .map(|p| p.resolve_with(metadata, protocol))
            .transpose()?;
        let resolved = Arc::new(resolve(&self.state, parent, metadata, protocol)?);
        Ok(self.resolved.get_or_init(|| resolved).clone())
    }

    /// Formats the command text against the session's loaded schema.
    pub fn command_text(&self) -> Result<String, Error> {
        let (session, schema) = self.loaded_schema()?;
        let protocol = session.settings().protocol;
        let resolved = self.resolve_with(schema.as_ref(), protocol)?;
        format::command_text(&resolved, schema.as_ref(), protocol)
    }

    /// Formats the command text, loading the schema first if needed.
    pub async fn command_text_async(&self, cancel: &CancellationToken) -> Result<String, Error> {
        let (session, schema) = self.fetched_schema(cancel).await?;
        let protocol = session.settings().protocol;
        let resolved = self.resolve_with(schema.as_ref(), protocol)?;
        format::command_text(&resolved, schema.as_ref(), protocol)
    }

    /// Describes the request performing `kind` with this command.
    pub fn build_request(&self, kind: RequestKind) -> Result<CommandRequest, Error> {
        let (session, schema) = self.loaded_schema()?;
        let protocol = session.settings().protocol;
        let resolved = self.resolve_with(schema.as_ref(), protocol)?;
        request::build_request(&resolved, kind, session.base_url(), schema.as_ref(), protocol)
    }

    /// Describes the request performing `kind`, loading the schema first if
    /// needed.
    pub async fn build_request_async(
        &self,
        kind: RequestKind,
        cancel: &CancellationToken,
    ) -> Result<CommandRequest, Error> {
        let (session, schema) = self.fetched_schema(cancel).await?;
        let protocol = session.settings().protocol;
        let resolved = self.resolve_with(schema.as_ref(), protocol)?;
        request::build_request(&resolved, kind, session.base_url(), schema.as_ref(), protocol)
    }
}
