//! Persisted column configuration.
//!
//! Column order, visibility and background colors are stored per table under
//! `{namespace}-columns-{table_id}` as a JSON array; table styling under
//! `{namespace}-style-{table_id}` as a JSON object. Both keys are optional:
//! their absence is the first-run state.
//!
//! Reads never fail. Corrupt JSON or a backend error falls back to the live
//! schema (or the default style) and is only logged. Writes return their
//! error to callers that await them; the `spawn_*` variants queue the write
//! on a background writer and log failures instead, so a UI change is never
//! blocked on persistence. Queued writes of one store apply in the order they
//! were made. Separate sessions writing the same table id race with
//! last-write-wins semantics.

mod backend;
mod memory;
mod sqlite;

pub use backend::KeyValueStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use log::debug;
use log::warn;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::column::ColumnDef;
use crate::column::TableStyle;
use crate::config::DEFAULT_NAMESPACE;
use crate::error::StoreError;

/// One column's persisted customization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedColumn {
    pub key: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub order: usize,
}

/// Captures the customizable state of `columns`, ordered by position.
pub fn to_persisted(columns: &[ColumnDef]) -> Vec<PersistedColumn> {
    columns
        .iter()
        .enumerate()
        .map(|(order, column)| PersistedColumn {
            key: column.key.clone(),
            hidden: column.hidden,
            background_color: column.background_color.clone(),
            order,
        })
        .collect()
}

/// Merges persisted settings over the live schema.
///
/// - Persisted entries are applied in `order`; keys missing from the schema
///   are dropped.
/// - Schema columns with no persisted entry are appended in schema order and
///   shown.
/// - Everything except visibility, background and position comes from the
///   live schema.
pub fn merge_columns(live: &[ColumnDef], mut persisted: Vec<PersistedColumn>) -> Vec<ColumnDef> {
    persisted.sort_by_key(|p| p.order);

    let mut merged = Vec::with_capacity(live.len());
    let mut placed: HashSet<&str> = HashSet::with_capacity(live.len());

    for entry in &persisted {
        let Some(column) = live.iter().find(|c| c.key == entry.key) else {
            debug!("dropping persisted column '{}' missing from schema", entry.key);
            continue;
        };
        if !placed.insert(column.key.as_str()) {
            continue;
        }
        let mut column = column.clone();
        column.hidden = entry.hidden;
        column.background_color = entry.background_color.clone();
        merged.push(column);
    }

    for column in live {
        if placed.contains(column.key.as_str()) {
            continue;
        }
        let mut column = column.clone();
        column.hidden = false;
        merged.push(column);
    }

    merged
}

/// Loads, saves and resets per-table column settings.
///
/// # Example
///
/// ```
/// use datagrid_lib::column::ColumnDef;
/// use datagrid_lib::settings::{ColumnStore, MemoryStore};
///
/// let store = ColumnStore::new(MemoryStore::new());
/// assert_eq!(store.columns_key("invoices"), "datagrid-columns-invoices");
/// ```
#[derive(Clone)]
pub struct ColumnStore {
    backend: Arc<dyn KeyValueStore>,
    namespace: String,
    writer: Arc<Mutex<Option<mpsc::UnboundedSender<PendingWrite>>>>,
}

/// A queued background write. Writes apply one at a time in queue order.
enum PendingWrite {
    Columns(String, Vec<ColumnDef>),
    Style(String, TableStyle),
    Reset(String),
    Barrier(oneshot::Sender<()>),
}

impl ColumnStore {
    /// Creates a store under the default namespace.
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self::with_namespace(Arc::new(backend), DEFAULT_NAMESPACE)
    }

    /// Creates a store over a shared backend with an explicit namespace.
    pub fn with_namespace(backend: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            writer: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the namespace prefix.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the key holding column settings for `table_id`.
    pub fn columns_key(&self, table_id: &str) -> String {
        format!("{}-columns-{}", self.namespace, table_id)
    }

    /// Returns the key holding style settings for `table_id`.
    pub fn style_key(&self, table_id: &str) -> String {
        format!("{}-style-{}", self.namespace, table_id)
    }

    /// Reads the raw persisted column entries, if any are stored and parse.
    pub async fn persisted(&self, table_id: &str) -> Option<Vec<PersistedColumn>> {
        let key = self.columns_key(table_id);
        let raw = match self.backend.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("failed to read '{}': {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!("ignoring corrupt column settings '{}': {}", key, e);
                None
            }
        }
    }

    /// Returns `live` with any persisted customization applied.
    pub async fn load(&self, table_id: &str, live: &[ColumnDef]) -> Vec<ColumnDef> {
        match self.persisted(table_id).await {
            Some(persisted) => merge_columns(live, persisted),
            None => live.to_vec(),
        }
    }

    /// Returns the persisted table style, or the default style.
    pub async fn load_style(&self, table_id: &str) -> TableStyle {
        let key = self.style_key(table_id);
        match self.backend.get(&key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("ignoring corrupt style settings '{}': {}", key, e);
                TableStyle::default()
            }),
            Ok(None) => TableStyle::default(),
            Err(e) => {
                warn!("failed to read '{}': {}", key, e);
                TableStyle::default()
            }
        }
    }

    /// Overwrites the persisted column settings for `table_id`.
    pub async fn save(&self, table_id: &str, columns: &[ColumnDef]) -> Result<(), StoreError> {
        let key = self.columns_key(table_id);
        let json = serde_json::to_string(&to_persisted(columns))?;
        debug!("persisting {} columns to '{}'", columns.len(), key);
        self.backend.set(&key, json).await
    }

    /// Overwrites the persisted style for `table_id`.
    pub async fn save_style(&self, table_id: &str, style: &TableStyle) -> Result<(), StoreError> {
        let key = self.style_key(table_id);
        let json = serde_json::to_string(style)?;
        self.backend.set(&key, json).await
    }

    /// Clears both column and style settings for `table_id`.
    pub async fn reset(&self, table_id: &str) -> Result<(), StoreError> {
        self.backend.remove(&self.columns_key(table_id)).await?;
        self.backend.remove(&self.style_key(table_id)).await
    }

    /// Saves columns in the background; failures are logged.
    pub fn spawn_save(&self, table_id: &str, columns: &[ColumnDef]) {
        self.enqueue(PendingWrite::Columns(table_id.to_string(), columns.to_vec()));
    }

    /// Saves the style in the background; failures are logged.
    pub fn spawn_save_style(&self, table_id: &str, style: &TableStyle) {
        self.enqueue(PendingWrite::Style(table_id.to_string(), style.clone()));
    }

    /// Resets in the background; failures are logged.
    pub fn spawn_reset(&self, table_id: &str) {
        self.enqueue(PendingWrite::Reset(table_id.to_string()));
    }

    /// Waits until every background write queued so far has been applied.
    pub async fn settle(&self) {
        let (tx, rx) = oneshot::channel();
        if self.enqueue(PendingWrite::Barrier(tx)) {
            let _ = rx.await;
        }
    }

    /// Queues `write` on the background writer, starting it on first use.
    ///
    /// Returns `false` if the write was dropped because no runtime is running.
    fn enqueue(&self, write: PendingWrite) -> bool {
        let Ok(mut writer) = self.writer.lock() else {
            warn!("settings writer poisoned; dropping write");
            return false;
        };
        let write = match writer.as_ref() {
            Some(tx) => match tx.send(write) {
                Ok(()) => return true,
                // The writer's runtime is gone; start a new one below.
                Err(mpsc::error::SendError(write)) => write,
            },
            None => write,
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; skipping settings write");
            return false;
        };
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(Self::drain(self.backend.clone(), self.namespace.clone(), rx));
        let sent = tx.send(write).is_ok();
        *writer = Some(tx);
        sent
    }

    async fn drain(
        backend: Arc<dyn KeyValueStore>,
        namespace: String,
        mut rx: mpsc::UnboundedReceiver<PendingWrite>,
    ) {
        let store = ColumnStore::with_namespace(backend, namespace);
        while let Some(write) = rx.recv().await {
            let (what, result) = match write {
                PendingWrite::Columns(table_id, columns) => {
                    ("save columns", store.save(&table_id, &columns).await)
                }
                PendingWrite::Style(table_id, style) => {
                    ("save style", store.save_style(&table_id, &style).await)
                }
                PendingWrite::Reset(table_id) => ("reset", store.reset(&table_id).await),
                PendingWrite::Barrier(done) => {
                    let _ = done.send(());
                    continue;
                }
            };
            if let Err(e) = result {
                warn!("settings {} failed: {}", what, e);
            }
        }
    }
}

impl std::fmt::Debug for ColumnStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("name", "Name"),
            ColumnDef::new("amount", "Amount"),
            ColumnDef::new("status", "Status"),
        ]
    }

    fn keys(columns: &[ColumnDef]) -> Vec<&str> {
        columns.iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn test_merge_reorders_and_applies() {
        let persisted = vec![
            PersistedColumn {
                key: "status".into(),
                hidden: true,
                background_color: Some("#eee".into()),
                order: 0,
            },
            PersistedColumn {
                key: "name".into(),
                hidden: false,
                background_color: None,
                order: 1,
            },
            PersistedColumn {
                key: "amount".into(),
                hidden: false,
                background_color: None,
                order: 2,
            },
        ];
        let merged = merge_columns(&schema(), persisted);
        assert_eq!(keys(&merged), vec!["status", "name", "amount"]);
        assert!(merged[0].hidden);
        assert_eq!(merged[0].background_color(), Some("#eee"));
    }

    #[test]
    fn test_merge_drops_unknown_and_appends_new() {
        let persisted = vec![
            PersistedColumn {
                key: "removed".into(),
                hidden: false,
                background_color: None,
                order: 0,
            },
            PersistedColumn {
                key: "amount".into(),
                hidden: true,
                background_color: None,
                order: 1,
            },
        ];
        let merged = merge_columns(&schema(), persisted);
        assert_eq!(keys(&merged), vec!["amount", "name", "status"]);
        assert!(merged[0].hidden);
        assert!(!merged[1].hidden);
        assert!(!merged[2].hidden);
    }

    #[test]
    fn test_merge_ignores_duplicate_entries() {
        let entry = PersistedColumn {
            key: "name".into(),
            hidden: false,
            background_color: None,
            order: 0,
        };
        let merged = merge_columns(&schema(), vec![entry.clone(), entry]);
        assert_eq!(keys(&merged), vec!["name", "amount", "status"]);
    }

    #[test]
    fn test_persisted_json_shape() {
        let json = serde_json::to_value(to_persisted(&schema()[..1])).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"key": "name", "hidden": false, "backgroundColor": null, "order": 0}])
        );
    }

    #[tokio::test]
    async fn test_load_without_settings_returns_schema() {
        let store = ColumnStore::new(MemoryStore::new());
        let loaded = store.load("t", &schema()).await;
        assert_eq!(keys(&loaded), keys(&schema()));
        assert_eq!(store.load_style("t").await, TableStyle::default());
    }

    #[tokio::test]
    async fn test_corrupt_settings_fall_back() {
        let backend = Arc::new(MemoryStore::new());
        let store = ColumnStore::with_namespace(backend.clone(), "ns");
        backend.set("ns-columns-t", "{not json".into()).await.unwrap();
        backend.set("ns-style-t", "[1,2]".into()).await.unwrap();

        let loaded = store.load("t", &schema()).await;
        assert_eq!(keys(&loaded), keys(&schema()));
        assert_eq!(store.load_style("t").await, TableStyle::default());
    }

    #[tokio::test]
    async fn test_save_load_reset() {
        let backend = Arc::new(MemoryStore::new());
        let store = ColumnStore::with_namespace(backend.clone(), "ns");

        let mut columns = schema();
        columns.swap(0, 2);
        columns[1].hidden = true;
        store.save("t", &columns).await.unwrap();
        store
            .save_style(
                "t",
                &TableStyle {
                    show_vertical_borders: true,
                    header_background_color: "#000".into(),
                },
            )
            .await
            .unwrap();

        let loaded = store.load("t", &schema()).await;
        assert_eq!(keys(&loaded), vec!["status", "amount", "name"]);
        assert!(loaded[1].hidden);
        assert!(store.load_style("t").await.show_vertical_borders);

        store.reset("t").await.unwrap();
        assert!(backend.is_empty());
        let loaded = store.load("t", &schema()).await;
        assert_eq!(keys(&loaded), keys(&schema()));
    }

    /// Backend whose first write stalls, so a later write can overtake it
    /// unless writes are ordered.
    struct SlowFirstStore {
        inner: MemoryStore,
        writes: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for SlowFirstStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
            let n = self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_background_writes_apply_in_order() {
        let store = ColumnStore::new(SlowFirstStore {
            inner: MemoryStore::new(),
            writes: Default::default(),
        });
        let mut columns = schema();
        columns[0].hidden = true;
        store.spawn_save("t", &columns);
        columns[0].hidden = false;
        store.spawn_save("t", &columns);
        store.spawn_reset("t");
        columns[1].hidden = true;
        store.spawn_save("t", &columns);
        store.settle().await;

        let persisted = store.persisted("t").await.unwrap();
        let hidden: Vec<bool> = persisted.iter().map(|p| p.hidden).collect();
        assert_eq!(hidden, vec![false, true, false]);
    }

    #[test]
    fn test_spawn_without_runtime_is_dropped() {
        let store = ColumnStore::new(MemoryStore::new());
        store.spawn_save("t", &schema());
    }
}
