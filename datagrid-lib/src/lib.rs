//! Generic data-grid engine
//!
//! Turns an in-memory row set plus a declarative column schema into a
//! searchable, filterable, sortable, paginated and exportable table, with
//! per-table column customization persisted through a key-value store.
//!
//! - [`state::DataGrid`] - the controller owning one table's live state
//! - [`query`] - filter, search, sort and pagination
//! - [`settings`] - persisted column order, visibility and styling
//! - [`export`] - cell lowering and the six export encoders
//! - [`selection`] - row selection across pages

pub mod cell;
pub mod column;
pub mod config;
pub mod contrast;
pub mod error;
pub mod events;
pub mod export;
pub mod model;
pub mod query;
pub mod selection;
pub mod settings;
pub mod state;

pub use state::DataGrid;
