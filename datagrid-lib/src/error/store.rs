//! Key-value store error types

/// Errors raised by a [`KeyValueStore`](crate::settings::KeyValueStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite backend failure.
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),

    /// A value could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure (custom stores).
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a backend error for custom store implementations.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
