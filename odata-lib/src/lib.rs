//! Fluent OData command library
//!
//! Translates chained builder calls into OData command text (resource path
//! plus query string) and request descriptions, resolving loosely spelled
//! collection, property and navigation names against the service schema.
//!
//! - [`Session`] - service root, settings and the memoized schema
//! - [`command`] - the fluent builder, resolver and formatter
//! - [`query`] - filter predicates and URI literal formatting
//! - [`metadata`] - the schema model and name matching
//! - [`model`] - values, payload entries and typed entity bindings
//! - [`cache`] - schema caching shared between sessions

pub mod cache;
pub mod command;
pub mod error;
pub mod metadata;
pub mod model;
pub mod query;

mod session;
mod settings;

pub use session::*;
pub use settings::*;
