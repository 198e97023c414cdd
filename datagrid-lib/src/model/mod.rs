//! Row data model
//!
//! - [`Value`] - a dynamic field value
//! - [`Row`] - an opaque record keyed by field name

mod row;
mod value;

pub use row::*;
pub use value::*;
