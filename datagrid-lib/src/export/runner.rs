//! Asynchronous, cancellable export runs.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use chrono::Local;
use log::debug;
use log::info;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::EncoderRegistry;
use super::ExportFormat;
use super::ExportPayload;
use super::ExportScope;
use crate::config::ExportOptions;
use crate::error::ExportError;

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    /// Suggested download name.
    pub file_name: String,
    pub scope: ExportScope,
    pub exported_records: usize,
    /// Cells that show their raw value because rendering failed.
    pub degraded_cells: usize,
}

/// Runs encoders off the async executor, one export at a time.
///
/// Starting an export cancels the one in flight, which then resolves to
/// [`ExportError::Cancelled`]. Payloads are owned snapshots, so grid state can
/// keep changing while an export encodes.
///
/// # Example
///
/// ```no_run
/// use datagrid_lib::export::{ExportFormat, Exporter};
/// # async fn run(payload: datagrid_lib::export::ExportPayload) -> Result<(), datagrid_lib::error::ExportError> {
/// let exporter = Exporter::default();
/// let output = exporter.export(payload, ExportFormat::Pdf).await?;
/// std::fs::write(&output.file_name, &output.bytes)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Exporter {
    registry: Arc<EncoderRegistry>,
    in_flight: Arc<Mutex<Option<(u64, CancellationToken)>>>,
    next_run: Arc<AtomicU64>,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self::with_registry(Arc::new(EncoderRegistry::new(options)))
    }

    pub fn with_registry(registry: Arc<EncoderRegistry>) -> Self {
        Self {
            registry,
            in_flight: Arc::new(Mutex::new(None)),
            next_run: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ExportOptions {
        self.registry.options()
    }

    /// Encodes `payload`, cancelling any export still running.
    pub async fn export(
        &self,
        payload: ExportPayload,
        format: ExportFormat,
    ) -> Result<ExportOutput, ExportError> {
        let run = self.next_run.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        if let Some((_, previous)) = self.in_flight.lock().await.replace((run, token.clone())) {
            debug!("cancelling in-flight export");
            previous.cancel();
        }

        let encoder = self.registry.get(format);
        let file_name = format.file_name(&payload.metadata.title, Local::now().naive_local());
        let scope = payload.metadata.scope;
        let exported_records = payload.metadata.exported_records;
        let degraded_cells = payload.metadata.degraded_cells;

        let task_token = token.clone();
        let result = tokio::task::spawn_blocking(move || encoder.encode(&payload, &task_token))
            .await
            .map_err(|e| ExportError::Join(e.to_string()));

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight.as_ref().is_some_and(|(current, _)| *current == run) {
                *in_flight = None;
            }
        }

        if token.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        let bytes = result??;

        info!(
            "exported {} records as {} ({} bytes, {} degraded cells)",
            exported_records,
            format,
            bytes.len(),
            degraded_cells
        );
        Ok(ExportOutput {
            format,
            mime_type: format.mime_type(),
            bytes,
            file_name,
            scope,
            exported_records,
            degraded_cells,
        })
    }

    /// Cancels the export in flight, if any.
    pub async fn cancel(&self) -> bool {
        match self.in_flight.lock().await.take() {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::export::Encoder;
    use crate::export::check_cancelled;
    use crate::export::encode::fixtures;

    /// Blocks until cancelled when the title is "slow".
    struct Slow;

    impl Encoder for Slow {
        fn format(&self) -> ExportFormat {
            ExportFormat::Csv
        }

        fn encode(
            &self,
            payload: &ExportPayload,
            cancel: &CancellationToken,
        ) -> Result<Vec<u8>, ExportError> {
            if payload.metadata.title == "slow" {
                for _ in 0..400 {
                    check_cancelled(cancel)?;
                    std::thread::sleep(Duration::from_millis(5));
                }
            }
            Ok(payload.metadata.title.clone().into_bytes())
        }
    }

    fn titled(title: &str) -> ExportPayload {
        let mut payload = fixtures::payload(2);
        payload.metadata.title = title.to_string();
        payload
    }

    #[tokio::test]
    async fn test_export_output() {
        let exporter = Exporter::default();
        let output = exporter.export(fixtures::payload(3), ExportFormat::Csv).await.unwrap();
        assert_eq!(output.mime_type, "text/csv");
        assert!(output.file_name.starts_with("invoices_"));
        assert!(output.file_name.ends_with(".csv"));
        assert_eq!(output.exported_records, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_new_export_cancels_previous() {
        let exporter = Exporter::default();
        exporter.registry().register(Arc::new(Slow));

        let first = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.export(titled("slow"), ExportFormat::Csv).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = exporter.export(titled("fast"), ExportFormat::Csv).await.unwrap();
        assert_eq!(second.bytes, b"fast");

        let first = first.await.unwrap();
        assert!(matches!(first, Err(ExportError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_without_export() {
        let exporter = Exporter::default();
        assert!(!exporter.cancel().await);
    }
}
