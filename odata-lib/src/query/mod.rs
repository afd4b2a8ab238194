//! Filter predicates and their formatting.
//!
//! - [`Filter`] - symbolic predicates over approximate [`PropertyPath`]s
//! - [`FilterExpression`] - the formatter seam deferred filters go through
//! - [`url`] - URI literal formatting and escaping

mod expression;
mod filter;
mod order;
pub mod url;

pub use expression::FilterExpression;
pub use expression::FormatContext;
pub use filter::Comparison;
pub use filter::Filter;
pub use filter::PropertyPath;
pub use filter::TextMatch;
pub use order::Direction;
