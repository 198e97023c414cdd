//! Column schema types
//!
//! - [`ColumnDef`] - one column's key, label, behavior flags and render rule
//! - [`Alignment`] - horizontal alignment of cell content
//! - [`FilterDescriptor`] - drives filter UI and selects match semantics
//! - [`TableStyle`] - table-wide styling persisted beside the columns

mod definition;
mod filter;
mod style;

pub use definition::*;
pub use filter::*;
pub use style::*;
