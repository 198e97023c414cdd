//! Export adapter pipeline.
//!
//! Exporting is two steps:
//!
//! 1. [`prepare_export`] picks the rows for an [`ExportScope`], renders each
//!    visible column's [`CellNode`](crate::cell::CellNode) and lowers it to
//!    markup and plain text. The result is an owned [`ExportPayload`].
//! 2. An [`Encoder`] turns the payload into one [`ExportFormat`].
//!    [`Exporter`] runs encoders on a blocking thread and cancels superseded
//!    runs.
//!
//! Column inclusion and the fixed alignment rule live in [`export_columns`]
//! and [`export_alignments`].

mod align;
mod encode;
mod format;
mod lower;
mod payload;
mod prepare;
mod runner;
mod scope;

pub use align::*;
pub use encode::*;
pub use format::*;
pub use lower::*;
pub use payload::*;
pub use prepare::*;
pub use runner::*;
pub use scope::*;
