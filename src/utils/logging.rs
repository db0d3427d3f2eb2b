use crate::models::BatchItemResult;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PDF2DICOM_LOG";

/// Install the stderr subscriber. `PDF2DICOM_LOG` wins over `RUST_LOG`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the OK/ERROR line or the JSON report
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Clone, serde::Serialize)]
pub struct LogEntry {
    pub input: String,
    pub output: String,
    pub description: String,
    pub series_number: u32,
    pub status: String,
    pub study_uid: String,
    pub series_uid: String,
    pub message: String,
}

impl From<&BatchItemResult> for LogEntry {
    fn from(item: &BatchItemResult) -> Self {
        let outcome = &item.outcome;
        Self {
            input: item.input.clone().unwrap_or_default(),
            output: item.output.clone().unwrap_or_default(),
            description: item.description.clone().unwrap_or_default(),
            series_number: item.series_number,
            status: if outcome.success { "ok" } else { "error" }.to_string(),
            study_uid: outcome.study_uid.clone().unwrap_or_default(),
            series_uid: outcome.series_uid.clone().unwrap_or_default(),
            message: outcome.error.clone().unwrap_or_default(),
        }
    }
}

/// Append entries to a CSV conversion log, writing the header on creation.
pub fn write_logs(log_path: &Path, logs: &[LogEntry]) -> Result<()> {
    let file_exists = log_path.exists();

    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create log folder {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for log in logs {
        wtr.serialize(log)?;
    }

    wtr.flush()?;
    Ok(())
}
