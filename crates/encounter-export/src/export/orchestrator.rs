//! Point-in-time encounter export.
//!
//! [`EncounterExporter`] ties the search adapter, the mapper and a sink
//! together. One export run:
//!
//! 1. Builds a single `date=le<start_time>` filter from the job.
//! 2. Executes it without a patient restriction.
//! 3. Maps each record and appends it to the sink, in result order.
//!
//! The run is sequential. A sink failure or a shutdown request stops it
//! immediately; resources already appended stay in the sink.

use crate::config::CodeSystemConfig;
use crate::datetime::format_extended;
use crate::error::{BulkExportError, ExportError, ExportResult};
use crate::mapper::EncounterMapper;
use crate::resource::{ENCOUNTER, Encounter};
use crate::search::{
    IssueSeverity, RecordSearchAdapter, SearchParamCapability, SearchParameterCatalog,
    SearchParams,
};
use crate::store::RecordStore;

use super::sink::{ExportSink, ShutdownSignal};
use super::types::{ExportJob, ExportLevel, ExportSummary};

/// Advertises which bulk export levels a resource type takes part in.
pub trait BulkExportCapable {
    /// Returns the resource type exported.
    fn resource_type(&self) -> &'static str;

    /// Returns true if system-level export is supported.
    fn supports_system_export(&self) -> bool;

    /// Returns true if group-level export is supported.
    fn supports_group_export(&self) -> bool;

    /// Returns true if patient-level export is supported.
    fn supports_patient_export(&self) -> bool;

    /// Returns true if the given level is supported.
    fn supports_level(&self, level: &ExportLevel) -> bool {
        match level {
            ExportLevel::System => self.supports_system_export(),
            ExportLevel::Patient => self.supports_patient_export(),
            ExportLevel::Group { .. } => self.supports_group_export(),
        }
    }
}

/// Exports encounters from a [`RecordStore`] into an [`ExportSink`].
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use helios_encounter_export::export::{EncounterExporter, ExportJob, VecSink};
/// use helios_encounter_export::record::EncounterRecord;
/// use helios_encounter_export::store::MemoryRecordStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryRecordStore::new();
/// let record = EncounterRecord::new("enc-1")
///     .with_patient("pat-1")
///     .with_date("2023-03-01");
/// store.insert_record(&record);
///
/// let exporter = EncounterExporter::new(store);
/// let job = ExportJob::new(Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap());
/// let mut sink = VecSink::new();
///
/// let summary = exporter.export(&mut sink, &job, None).await.unwrap();
/// assert_eq!(summary.exported_count, 1);
/// assert_eq!(sink.resources()[0].id, "enc-1");
/// # }
/// ```
#[derive(Debug)]
pub struct EncounterExporter<S> {
    adapter: RecordSearchAdapter<S>,
    mapper: EncounterMapper,
    shutdown: Option<ShutdownSignal>,
}

impl<S: RecordStore> EncounterExporter<S> {
    /// Creates an exporter with the default catalog and code systems.
    pub fn new(store: S) -> Self {
        Self::with_parts(
            RecordSearchAdapter::new(store, SearchParameterCatalog::default()),
            EncounterMapper::default(),
        )
    }

    /// Creates an exporter from an adapter and a mapper.
    pub fn with_parts(adapter: RecordSearchAdapter<S>, mapper: EncounterMapper) -> Self {
        Self {
            adapter,
            mapper,
            shutdown: None,
        }
    }

    /// Replaces the code systems used for mapping.
    pub fn with_codes(mut self, codes: CodeSystemConfig) -> Self {
        self.mapper = EncounterMapper::new(codes);
        self
    }

    /// Observes the given shutdown signal during export.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    /// Returns the search adapter.
    pub fn adapter(&self) -> &RecordSearchAdapter<S> {
        &self.adapter
    }

    /// Returns the mapper.
    pub fn mapper(&self) -> &EncounterMapper {
        &self.mapper
    }

    /// Describes the search parameters supported for encounters.
    pub fn search_param_capabilities(&self) -> Vec<SearchParamCapability> {
        self.adapter.catalog().capabilities()
    }

    /// Searches and maps encounters.
    ///
    /// Non-fatal issues are logged and dropped.
    pub async fn search(
        &self,
        params: &SearchParams,
        restrict_to_patient: Option<&str>,
    ) -> ExportResult<Vec<Encounter>> {
        let outcome = self.adapter.search(params, restrict_to_patient).await?;
        let (records, issues) = outcome.into_parts();
        for issue in &issues {
            tracing::warn!(
                severity = %issue.severity,
                record = ?issue.record_id,
                "{}",
                issue.message
            );
        }
        Ok(records.iter().map(|r| self.mapper.map(r)).collect())
    }

    /// The search filter for a job: everything dated at or before its start.
    ///
    /// The start time is written at second precision, and a FHIR `le`
    /// comparison covers the whole second it names. A record dated at
    /// `12:00:00.500` is therefore exported by a job started at
    /// `12:00:00.200`.
    pub fn export_filter(job: &ExportJob) -> SearchParams {
        SearchParams::new().with("date", format!("le{}", format_extended(job.start_time)))
    }

    /// Runs a point-in-time export.
    ///
    /// `last_exported_id` is accepted for compatibility with resumable
    /// exports but not applied; every run exports the full result set.
    ///
    /// # Errors
    ///
    /// * `BulkExportError::InvalidRequest` - If a group-level job has no group id
    /// * `BulkExportError::LevelNotSupported` - If the job level is not supported
    /// * `BulkExportError::ShutdownInProgress` - If shutdown was requested mid-run
    /// * Any search error, and any error returned by the sink
    pub async fn export<K>(
        &self,
        sink: &mut K,
        job: &ExportJob,
        last_exported_id: Option<&str>,
    ) -> ExportResult<ExportSummary>
    where
        K: ExportSink + ?Sized,
    {
        if let ExportLevel::Group { group_id } = &job.level {
            if group_id.trim().is_empty() {
                return Err(BulkExportError::InvalidRequest {
                    message: "group-level export requires a group id".to_string(),
                }
                .into());
            }
        }

        if !self.supports_level(&job.level) {
            return Err(BulkExportError::LevelNotSupported {
                resource_type: ENCOUNTER.to_string(),
                level: job.level.to_string(),
            }
            .into());
        }

        let resume_from = last_exported_id.or(job.last_exported_id.as_deref());
        if let Some(id) = resume_from {
            tracing::info!(
                job_id = %job.id,
                last_exported_id = id,
                "Resumption marker ignored; exporting the full result set"
            );
        }

        tracing::info!(
            job_id = %job.id,
            level = %job.level,
            start_time = %format_extended(job.start_time),
            "Starting encounter export"
        );

        let params = Self::export_filter(job);
        let outcome = self.adapter.search(&params, None).await?;
        let (records, issues) = outcome.into_parts();

        for issue in &issues {
            match issue.severity {
                IssueSeverity::Error => tracing::error!(
                    job_id = %job.id,
                    record = ?issue.record_id,
                    "{}",
                    issue.message
                ),
                _ => tracing::warn!(
                    job_id = %job.id,
                    record = ?issue.record_id,
                    "{}",
                    issue.message
                ),
            }
        }

        let mut exported_count = 0u64;
        let mut last_id: Option<String> = None;

        for record in &records {
            if self.shutdown.as_ref().is_some_and(ShutdownSignal::is_triggered) {
                tracing::warn!(
                    job_id = %job.id,
                    exported = exported_count,
                    last_exported_id = ?last_id,
                    "Shutdown requested; stopping export"
                );
                return Err(BulkExportError::ShutdownInProgress {
                    last_exported_id: last_id,
                }
                .into());
            }

            let resource = self.mapper.map(record);
            if let Err(e) = sink.append(&resource).await {
                tracing::error!(
                    job_id = %job.id,
                    resource = %resource.url(),
                    error = %e,
                    "Sink rejected resource; aborting export"
                );
                return Err(fill_shutdown_marker(e, last_id));
            }

            exported_count += 1;
            last_id = Some(resource.id);
        }

        tracing::info!(
            job_id = %job.id,
            exported = exported_count,
            issues = issues.len(),
            "Encounter export complete"
        );

        Ok(ExportSummary {
            job_id: job.id.clone(),
            exported_count,
            last_exported_id: last_id,
            issues,
        })
    }
}

impl<S: RecordStore> BulkExportCapable for EncounterExporter<S> {
    fn resource_type(&self) -> &'static str {
        ENCOUNTER
    }

    fn supports_system_export(&self) -> bool {
        true
    }

    fn supports_group_export(&self) -> bool {
        true
    }

    fn supports_patient_export(&self) -> bool {
        true
    }
}

// A sink that stops on shutdown does not know what was exported before it.
fn fill_shutdown_marker(error: ExportError, last_id: Option<String>) -> ExportError {
    match error {
        ExportError::BulkExport(BulkExportError::ShutdownInProgress {
            last_exported_id: None,
        }) => BulkExportError::ShutdownInProgress {
            last_exported_id: last_id,
        }
        .into(),
        other => other,
    }
}
