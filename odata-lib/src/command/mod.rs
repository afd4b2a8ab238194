//! Fluent commands and their translation into OData command text.
//!
//! - [`FluentCommand`] - immutable-update builder accumulating a [`CommandState`]
//! - [`ResolvedCommand`] - the state with every symbolic field bound to schema names
//! - [`CommandRequest`] - method, URL and payload a transport executes
//!
//! Formatting follows a fixed order: resource path (collection or parent
//! navigation), key, type cast, function or action, `/$count`, then the
//! query clauses `$filter`, `$skip`, `$top`, `$expand`, `$orderby`,
//! `$select` and the inline count.

mod clause;
mod expansion;
mod fluent;
mod format;
mod request;
mod resolve;
mod staged;
mod state;

pub use clause::ExpandAssociation;
pub use clause::ExpandLevels;
pub use clause::ExpandOptions;
pub use clause::KeyValues;
pub use clause::OrderByColumn;
pub use fluent::FluentCommand;
pub use request::CommandRequest;
pub use request::Method;
pub use request::RequestKind;
pub use resolve::ResolvedCommand;
pub use staged::Staged;
pub use staged::TypeRef;
pub use state::CommandState;
pub use state::StagedFilter;
