//! Export sinks and the shutdown signal.
//!
//! A sink receives exported resources one at a time, in result order. The
//! exporter never buffers more than one resource ahead of the sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{BulkExportError, ExportResult};
use crate::resource::Encounter;

/// Destination for exported resources.
#[async_trait]
pub trait ExportSink: Send {
    /// Appends one resource.
    ///
    /// # Errors
    ///
    /// Any error aborts the export run.
    async fn append(&mut self, resource: &Encounter) -> ExportResult<()>;
}

/// Writes resources as newline-delimited JSON.
///
/// Each resource is one line with a trailing `\n`.
#[derive(Debug)]
pub struct NdjsonSink<W> {
    writer: W,
    written: u64,
}

impl<W: AsyncWrite + Unpin + Send> NdjsonSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of lines written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes the underlying writer.
    pub async fn flush(&mut self) -> ExportResult<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ExportSink for NdjsonSink<W> {
    async fn append(&mut self, resource: &Encounter) -> ExportResult<()> {
        let mut line = resource
            .to_json_line()
            .map_err(|e| BulkExportError::Encoding {
                resource_type: resource.resource_type.clone(),
                id: resource.id.clone(),
                message: e.to_string(),
            })?;
        line.push('\n');

        self.writer.write_all(line.as_bytes()).await?;
        self.written += 1;
        Ok(())
    }
}

/// Collects resources in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    resources: Vec<Encounter>,
}

impl VecSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected resources in append order.
    pub fn resources(&self) -> &[Encounter] {
        &self.resources
    }

    /// Consumes the sink, returning the collected resources.
    pub fn into_resources(self) -> Vec<Encounter> {
        self.resources
    }
}

#[async_trait]
impl ExportSink for VecSink {
    async fn append(&mut self, resource: &Encounter) -> ExportResult<()> {
        self.resources.push(resource.clone());
        Ok(())
    }
}

/// Process-wide shutdown flag observed by running exports.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    /// Returns true once shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::EncounterMapper;
    use crate::record::EncounterRecord;

    fn encounter(id: &str) -> Encounter {
        EncounterMapper::default().map(&EncounterRecord::new(id).with_patient("pat-1"))
    }

    #[tokio::test]
    async fn test_ndjson_sink_writes_one_line_per_resource() {
        let mut sink = NdjsonSink::new(Vec::new());
        sink.append(&encounter("enc-1")).await.unwrap();
        sink.append(&encounter("enc-2")).await.unwrap();
        assert_eq!(sink.written(), 2);

        let bytes = sink.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], "enc-1");
        assert_eq!(first["resourceType"], "Encounter");
    }

    #[tokio::test]
    async fn test_vec_sink() {
        let mut sink = VecSink::new();
        sink.append(&encounter("enc-1")).await.unwrap();
        assert_eq!(sink.resources().len(), 1);
        assert_eq!(sink.into_resources()[0].id, "enc-1");
    }

    #[test]
    fn test_shutdown_signal_is_shared() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_triggered());
        signal.trigger();
        assert!(observer.is_triggered());
    }
}
