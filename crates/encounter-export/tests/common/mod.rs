//! Shared test infrastructure for the encounter export crate.
//!
//! Fixtures, plus stores and sinks that fail on demand.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};

use helios_encounter_export::error::{BackendError, BulkExportError, ExportResult};
use helios_encounter_export::export::ExportSink;
use helios_encounter_export::record::EncounterRecord;
use helios_encounter_export::resource::Encounter;
use helios_encounter_export::store::{MemoryRecordStore, RecordQuery, RecordStore};

/// A record with every source field populated.
pub fn full_record() -> EncounterRecord {
    EncounterRecord::new("enc-full")
        .with_patient("pat-1")
        .with_provider("prac-1")
        .with_facility("org-1")
        .with_facility_location("loc-1")
        .with_class("AMB", "ambulatory")
        .with_date("2023-06-01 09:30:00")
        .with_reason("Annual physical")
        .with_discharge_disposition("home", "Home")
}

/// A record with only the id.
pub fn minimal_record() -> EncounterRecord {
    EncounterRecord::new("enc-min")
}

/// Three dated rows; only the first two precede 2023-12-31.
pub fn dated_rows() -> Vec<Value> {
    vec![
        json!({"euuid": "enc-1", "puuid": "pat-1", "date": "2023-01-01"}),
        json!({"euuid": "enc-2", "puuid": "pat-2", "date": "2023-06-01"}),
        json!({"euuid": "enc-3", "puuid": "pat-1", "date": "2024-01-01"}),
    ]
}

/// A store holding [`dated_rows`].
pub fn dated_store() -> MemoryRecordStore {
    MemoryRecordStore::with_rows(dated_rows())
}

/// A store whose every query fails.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn search(&self, _query: &RecordQuery) -> ExportResult<Vec<Value>> {
        Err(BackendError::Unavailable {
            backend_name: "failing".to_string(),
            message: "connection refused".to_string(),
        }
        .into())
    }
}

/// A store that ignores the patient restriction.
#[derive(Debug)]
pub struct LeakyStore {
    pub rows: Vec<Value>,
}

#[async_trait]
impl RecordStore for LeakyStore {
    fn backend_name(&self) -> &'static str {
        "leaky"
    }

    async fn search(&self, _query: &RecordQuery) -> ExportResult<Vec<Value>> {
        Ok(self.rows.clone())
    }
}

/// A sink that records appends and fails on the nth one (zero-based).
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub appended: Vec<String>,
    pub fail_at: Option<usize>,
    pub calls: usize,
}

impl RecordingSink {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ExportSink for RecordingSink {
    async fn append(&mut self, resource: &Encounter) -> ExportResult<()> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_at == Some(call) {
            return Err(BulkExportError::WriteError {
                message: format!("refused {}", resource.id),
            }
            .into());
        }
        self.appended.push(resource.id.clone());
        Ok(())
    }
}
