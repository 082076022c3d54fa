//! Bulk export job types.
//!
//! The FHIR Bulk Data Access IG defines three export levels:
//!
//! - **System-level** (`[base]/$export`) - all resources in the system
//! - **Patient-level** (`[base]/Patient/$export`) - all patient compartment resources
//! - **Group-level** (`[base]/Group/[id]/$export`) - resources for the patients in a group
//!
//! See <https://hl7.org/fhir/uv/bulkdata/export.html>.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::OutcomeIssue;

/// Unique identifier for an export job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExportJobId(String);

impl ExportJobId {
    /// Creates a new random export job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an export job ID from an existing string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ExportJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExportJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExportJobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Level at which the export is being performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportLevel {
    /// System-level export (`[base]/$export`).
    System,
    /// Patient-level export (`[base]/Patient/$export`).
    Patient,
    /// Group-level export (`[base]/Group/[id]/$export`).
    Group {
        /// The group ID to export.
        group_id: String,
    },
}

impl ExportLevel {
    /// Creates a system-level export.
    pub fn system() -> Self {
        Self::System
    }

    /// Creates a patient-level export.
    pub fn patient() -> Self {
        Self::Patient
    }

    /// Creates a group-level export for the given group ID.
    pub fn group(group_id: impl Into<String>) -> Self {
        Self::Group {
            group_id: group_id.into(),
        }
    }
}

impl std::fmt::Display for ExportLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Patient => write!(f, "patient"),
            Self::Group { group_id } => write!(f, "group/{}", group_id),
        }
    }
}

/// A point-in-time export job, as handed over by the export controller.
///
/// The job is read-only to the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Job identifier, used for logging.
    pub id: ExportJobId,

    /// The level at which the export runs.
    pub level: ExportLevel,

    /// Only resources visible as of this instant are exported.
    pub start_time: DateTime<Utc>,

    /// Time from which referenced resources should be included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_include_time: Option<DateTime<Utc>>,

    /// Id of the last resource exported by a previous, interrupted run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exported_id: Option<String>,
}

impl ExportJob {
    /// Creates a system-level job starting at `start_time`.
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            id: ExportJobId::new(),
            level: ExportLevel::System,
            start_time,
            resource_include_time: None,
            last_exported_id: None,
        }
    }

    /// Sets the job id.
    pub fn with_id(mut self, id: impl Into<ExportJobId>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the export level.
    pub fn with_level(mut self, level: ExportLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the resource include time.
    pub fn with_resource_include_time(mut self, time: DateTime<Utc>) -> Self {
        self.resource_include_time = Some(time);
        self
    }

    /// Sets the resumption marker.
    pub fn with_last_exported_id(mut self, id: impl Into<String>) -> Self {
        self.last_exported_id = Some(id.into());
        self
    }
}

/// Result of a completed export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    /// The job that ran.
    pub job_id: ExportJobId,
    /// Number of resources appended to the sink.
    pub exported_count: u64,
    /// Id of the last resource appended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exported_id: Option<String>,
    /// Non-fatal issues reported by the search.
    #[serde(default)]
    pub issues: Vec<OutcomeIssue>,
}
