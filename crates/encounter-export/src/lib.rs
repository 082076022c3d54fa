//! Helios Encounter Export
//!
//! This crate turns stored clinical encounter records into FHIR R4
//! `Encounter` resources and streams them into bulk export sinks.
//!
//! # Features
//!
//! - **Total mapping**: every record with an id maps to a resource; missing
//!   required data is marked with data-absent-reason codes
//! - **Search**: `_id`, `patient` and `date` parameters with FHIR prefixes
//! - **Point-in-time export**: system, patient and group level
//! - **Pluggable storage**: any [`RecordStore`](store::RecordStore) implementation
//!
//! # Architecture
//!
//! - [`record`] - Typed encounter records and field names
//! - [`resource`] - FHIR Encounter wire model
//! - [`mapper`] - Record to resource mapping
//! - [`config`] - Code systems used by the mapper
//! - [`search`] - Search parameters, catalog and adapter
//! - [`store`] - Record store trait and in-memory implementation
//! - [`export`] - Export orchestration and sinks
//! - [`datetime`] - Timestamp handling
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use helios_encounter_export::mapper::EncounterMapper;
//! use helios_encounter_export::record::EncounterRecord;
//!
//! let record = EncounterRecord::new("enc-1")
//!     .with_patient("pat-1")
//!     .with_provider("prac-1")
//!     .with_date("2023-06-01 09:30:00");
//!
//! let encounter = EncounterMapper::default().map(&record);
//! assert_eq!(encounter.url(), "Encounter/enc-1");
//! assert_eq!(
//!     encounter.period.and_then(|p| p.start).as_deref(),
//!     Some("2023-06-01T09:30:00+00:00")
//! );
//! ```
//!
//! # Export
//!
//! ```
//! use chrono::Utc;
//! use helios_encounter_export::export::{EncounterExporter, ExportJob, NdjsonSink};
//! use helios_encounter_export::store::MemoryRecordStore;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), helios_encounter_export::ExportError> {
//! let store = MemoryRecordStore::with_rows(vec![
//!     json!({"euuid": "enc-1", "puuid": "pat-1", "date": "2023-01-01"}),
//! ]);
//!
//! let exporter = EncounterExporter::new(store);
//! let mut sink = NdjsonSink::new(Vec::new());
//! exporter.export(&mut sink, &ExportJob::new(Utc::now()), None).await?;
//!
//! let output = String::from_utf8_lossy(&sink.into_inner()).into_owned();
//! assert_eq!(output.lines().count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod datetime;
pub mod error;
pub mod export;
pub mod mapper;
pub mod record;
pub mod resource;
pub mod search;
pub mod store;

// Re-export commonly used types at crate root
pub use config::CodeSystemConfig;
pub use error::{ExportError, ExportResult};
pub use mapper::EncounterMapper;
pub use record::EncounterRecord;
pub use resource::Encounter;

pub use export::{
    BulkExportCapable, EncounterExporter, ExportJob, ExportLevel, ExportSink, ExportSummary,
    NdjsonSink, ShutdownSignal,
};
pub use store::{MemoryRecordStore, RecordStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
