//! RenderError for column render rules

/// Error returned by a column render rule for a single cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot render column '{column}': {message}")]
pub struct RenderError {
    /// Key of the column whose rule failed.
    pub column: String,
    /// Description of the failure.
    pub message: String,
}

impl RenderError {
    /// Creates a new render error.
    pub fn new(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            message: message.into(),
        }
    }
}
