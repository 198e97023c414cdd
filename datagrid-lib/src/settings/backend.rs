//! Key-value store trait.

use async_trait::async_trait;

use crate::error::StoreError;

/// String-keyed storage for persisted table settings.
///
/// Implementations handle raw string storage. The
/// [`ColumnStore`](super::ColumnStore) wraps this with JSON serialization and
/// the merge rules for column settings. A missing key is a normal state, not
/// an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value for a key.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set the value for a key, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
