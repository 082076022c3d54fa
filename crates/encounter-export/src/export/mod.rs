//! Bulk export of encounters.
//!
//! - [`EncounterExporter`] - Runs a point-in-time export into a sink
//! - [`ExportSink`] - Destination trait, with [`NdjsonSink`] and [`VecSink`]
//! - [`ShutdownSignal`] - Cooperative cancellation flag
//! - [`ExportJob`], [`ExportLevel`], [`ExportSummary`] - Job types

mod orchestrator;
mod sink;
mod types;

pub use orchestrator::{BulkExportCapable, EncounterExporter};
pub use sink::{ExportSink, NdjsonSink, ShutdownSignal, VecSink};
pub use types::{ExportJob, ExportJobId, ExportLevel, ExportSummary};
