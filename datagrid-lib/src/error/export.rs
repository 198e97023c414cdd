//! Export error types

use crate::export::ExportFormat;

/// Errors that can occur while encoding an export.
///
/// Table state is never touched by an export, so any of these leave the grid
/// exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The encoder for `format` failed.
    #[error("{format} export failed: {message}")]
    Encode {
        /// Target format.
        format: ExportFormat,
        /// Description of the failure.
        message: String,
    },

    /// CSV writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure while writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The export was abandoned because a newer export started.
    #[error("export cancelled")]
    Cancelled,

    /// The encoding task panicked or was aborted.
    #[error("export task failed: {0}")]
    Join(String),
}

impl ExportError {
    /// Creates a new encoder error.
    pub fn encode(format: ExportFormat, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }

    /// Returns `true` if the export was superseded rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
