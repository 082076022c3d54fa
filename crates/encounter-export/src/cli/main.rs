//! Encounter export driver.
//!
//! Loads encounter rows from a JSON file, runs one point-in-time export and
//! writes the resulting FHIR Encounters as NDJSON.

mod config;

use anyhow::Context;
use clap::Parser;
use helios_encounter_export::export::{EncounterExporter, ExportJob, NdjsonSink, ShutdownSignal};
use helios_encounter_export::{CodeSystemConfig, MemoryRecordStore};
use tokio::io::{AsyncWrite, BufWriter};
use tracing::{info, warn};

use crate::config::{ExportConfig, init_logging};

type Output = Box<dyn AsyncWrite + Unpin + Send>;

async fn open_output(config: &ExportConfig) -> anyhow::Result<Output> {
    match &config.output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(tokio::io::stdout()))),
    }
}

async fn load_codes(config: &ExportConfig) -> anyhow::Result<CodeSystemConfig> {
    match &config.codes {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("cannot read code system file {}", path.display()))?;
            Ok(CodeSystemConfig::from_json_str(&text)?)
        }
        None => Ok(CodeSystemConfig::default()),
    }
}

fn watch_ctrl_c(signal: ShutdownSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current resource");
            signal.trigger();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ExportConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let start_time = config.start_time().map_err(anyhow::Error::msg)?;
    let level = config.export_level().map_err(anyhow::Error::msg)?;

    let rows = tokio::fs::read_to_string(&config.input)
        .await
        .with_context(|| format!("cannot read input file {}", config.input.display()))?;
    let store = MemoryRecordStore::from_json_str(&rows)?;
    info!(input = %config.input.display(), rows = store.len(), "Loaded encounter rows");

    let shutdown = ShutdownSignal::new();
    watch_ctrl_c(shutdown.clone());

    let exporter = EncounterExporter::new(store)
        .with_codes(load_codes(&config).await?)
        .with_shutdown(shutdown);

    let mut job = ExportJob::new(start_time).with_level(level);
    if let Some(id) = &config.job_id {
        job = job.with_id(id.as_str());
    }

    let mut sink = NdjsonSink::new(open_output(&config).await?);
    let result = exporter
        .export(&mut sink, &job, config.last_exported_id.as_deref())
        .await;

    // Keep whatever was written before a failure.
    sink.flush().await?;

    match result {
        Ok(summary) => {
            info!(
                job_id = %summary.job_id,
                exported = summary.exported_count,
                issues = summary.issues.len(),
                "Export finished"
            );
            Ok(())
        }
        Err(e) if e.is_shutdown() => {
            warn!(
                job_id = %job.id,
                last_exported_id = ?e.last_exported_id(),
                written = sink.written(),
                "Export interrupted"
            );
            std::process::exit(130);
        }
        Err(e) => Err(e).context(format!("export job {} failed", job.id)),
    }
}
