//! Command-line configuration for the export driver.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ENCOUNTER_EXPORT_INPUT` | | JSON file holding an array of encounter rows |
//! | `ENCOUNTER_EXPORT_OUTPUT` | stdout | NDJSON output file |
//! | `ENCOUNTER_EXPORT_START_TIME` | now | Export start time |
//! | `ENCOUNTER_EXPORT_CODES` | | JSON file overriding code systems |
//! | `ENCOUNTER_EXPORT_LEVEL` | system | Export level (system, patient, group) |
//! | `ENCOUNTER_EXPORT_GROUP_ID` | | Group id for group-level export |
//! | `ENCOUNTER_EXPORT_JOB_ID` | random | Export job id |
//! | `ENCOUNTER_EXPORT_LAST_EXPORTED_ID` | | Resumption marker |
//! | `ENCOUNTER_EXPORT_LOG_LEVEL` | info | Log level |

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use helios_encounter_export::ExportLevel;
use helios_encounter_export::datetime::parse_stored;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Export driver configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "encounter-export")]
#[command(about = "Export encounter records as FHIR R4 NDJSON")]
pub struct ExportConfig {
    /// JSON file holding an array of encounter rows.
    #[arg(short, long, env = "ENCOUNTER_EXPORT_INPUT")]
    pub input: PathBuf,

    /// NDJSON output file. Writes to stdout when omitted.
    #[arg(short, long, env = "ENCOUNTER_EXPORT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Export start time (RFC 3339 or a stored date). Defaults to now.
    #[arg(long, env = "ENCOUNTER_EXPORT_START_TIME")]
    pub start_time: Option<String>,

    /// JSON file overriding the mapper's code systems.
    #[arg(long, env = "ENCOUNTER_EXPORT_CODES")]
    pub codes: Option<PathBuf>,

    /// Export level (system, patient, group).
    #[arg(long, env = "ENCOUNTER_EXPORT_LEVEL", default_value = "system")]
    pub level: String,

    /// Group id, required for group-level export.
    #[arg(long, env = "ENCOUNTER_EXPORT_GROUP_ID")]
    pub group_id: Option<String>,

    /// Export job id. A random id is generated when omitted.
    #[arg(long, env = "ENCOUNTER_EXPORT_JOB_ID")]
    pub job_id: Option<String>,

    /// Id of the last resource exported by an interrupted run.
    #[arg(long, env = "ENCOUNTER_EXPORT_LAST_EXPORTED_ID")]
    pub last_exported_id: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ENCOUNTER_EXPORT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ExportConfig {
    /// Parses the start time, defaulting to now.
    pub fn start_time(&self) -> Result<DateTime<Utc>, String> {
        match &self.start_time {
            None => Ok(Utc::now()),
            Some(value) => {
                parse_stored(value).ok_or_else(|| format!("Invalid start time '{}'", value))
            }
        }
    }

    /// Resolves the export level.
    pub fn export_level(&self) -> Result<ExportLevel, String> {
        match self.level.to_ascii_lowercase().as_str() {
            "system" => Ok(ExportLevel::system()),
            "patient" => Ok(ExportLevel::patient()),
            "group" => match &self.group_id {
                Some(id) if !id.is_empty() => Ok(ExportLevel::group(id.clone())),
                _ => Err("Group-level export requires --group-id".to_string()),
            },
            other => Err(format!("Unknown export level '{}'", other)),
        }
    }

    /// Validates the configuration and returns every error found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.input.as_os_str().is_empty() {
            errors.push("Input file cannot be empty".to_string());
        }

        if let Err(e) = self.start_time() {
            errors.push(e);
        }

        if let Err(e) = self.export_level() {
            errors.push(e);
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!("Unknown log level '{}'", self.log_level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence.
///
/// Logs go to stderr so NDJSON on stdout stays clean.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "helios_encounter_export={level},encounter_export={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
