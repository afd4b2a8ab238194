//! Values, payload entries and typed entity bindings

mod entity;
mod entry;
mod value;

pub use entity::*;
pub use entry::*;
pub use value::*;
