//! Typed notifications between a grid and the widgets around it.
//!
//! A [`DataGrid`](crate::state::DataGrid) publishes a [`GridEvent`] after every
//! state change. Sibling components (a filter panel, a column-settings dialog,
//! a toolbar) subscribe to the same [`EventBus`] instead of listening on a
//! global channel.

use tokio::sync::broadcast;

use crate::export::ExportScope;
use crate::query::Direction;

const DEFAULT_CAPACITY: usize = 64;

/// A state change on one table.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// The row set was replaced.
    RowsReplaced { table_id: String, total: usize },
    /// Search text or filters changed. `visible` is the filtered count.
    QueryChanged { table_id: String, visible: usize },
    SortChanged {
        table_id: String,
        column: Option<String>,
        direction: Direction,
    },
    PageChanged {
        table_id: String,
        page: usize,
        page_size: usize,
    },
    /// Column order, visibility or color changed, or columns were reset.
    ColumnsChanged { table_id: String },
    StyleChanged { table_id: String },
    SelectionChanged { table_id: String, selected: usize },
    /// Asks the owner of a table to reload its rows.
    RefreshRequested { table_id: String },
    /// An export finished.
    Exported {
        table_id: String,
        scope: ExportScope,
        records: usize,
    },
}

impl GridEvent {
    /// Returns the table the event belongs to.
    pub fn table_id(&self) -> &str {
        match self {
            GridEvent::RowsReplaced { table_id, .. }
            | GridEvent::QueryChanged { table_id, .. }
            | GridEvent::SortChanged { table_id, .. }
            | GridEvent::PageChanged { table_id, .. }
            | GridEvent::ColumnsChanged { table_id }
            | GridEvent::StyleChanged { table_id }
            | GridEvent::SelectionChanged { table_id, .. }
            | GridEvent::RefreshRequested { table_id }
            | GridEvent::Exported { table_id, .. } => table_id,
        }
    }
}

/// Broadcast channel for [`GridEvent`]s.
///
/// Cloning the bus shares the channel. Publishing never blocks and never
/// fails; events sent with no subscriber are dropped, and a slow subscriber
/// sees `RecvError::Lagged` rather than stalling the grid.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GridEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: GridEvent) {
        log::trace!("grid event: {:?}", event);
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.tx.subscribe()
    }

    /// Ask whoever owns `table_id` to reload its rows.
    pub fn request_refresh(&self, table_id: impl Into<String>) {
        self.publish(GridEvent::RefreshRequested {
            table_id: table_id.into(),
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
