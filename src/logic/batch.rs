use crate::error::ConversionError;
use crate::logic::encapsulate::encapsulate;
use crate::models::config::{BatchConfig, PdfEntry};
use crate::models::{BatchItemResult, BatchResult, ConversionRequest, ConversionResult};
use crate::utils::uid::generate_uid;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Encapsulate documents concurrently; numbering and order are unchanged.
    pub parallel: bool,
}

/// One batch entry after validation, before any file is touched.
enum PlannedEntry {
    Rejected(BatchItemResult),
    Ready {
        item: BatchItemResult,
        request: ConversionRequest,
    },
}

pub fn run_batch_file(config_path: &Path, options: &BatchOptions) -> BatchResult {
    match BatchConfig::load(config_path) {
        Ok(config) => run_batch_with(&config, options),
        Err(err) => {
            warn!(config = %config_path.display(), "Batch configuration rejected: {err:#}");
            BatchResult::config_error(format!("Error reading config: {err:#}"))
        }
    }
}

pub fn run_batch(config: &BatchConfig) -> BatchResult {
    run_batch_with(config, &BatchOptions::default())
}

pub fn run_batch_with(config: &BatchConfig, options: &BatchOptions) -> BatchResult {
    // resolved once, before any document is processed
    let study_instance_uid = config
        .supplied_study_uid()
        .map(str::to_string)
        .unwrap_or_else(generate_uid);

    info!(
        accession = %config.accession_number,
        study_uid = %study_instance_uid,
        documents = config.pdfs.len(),
        parallel = options.parallel,
        "Starting batch"
    );

    let planned = plan_entries(config, &study_instance_uid);

    let results: Vec<BatchItemResult> = if options.parallel {
        planned.into_par_iter().map(execute).collect()
    } else {
        planned.into_iter().map(execute).collect()
    };

    for item in results.iter().filter(|item| !item.outcome.success) {
        eprintln!(
            "{} Failed to convert {}: {}",
            "✖".red(),
            item.input.as_deref().unwrap_or("<missing input>"),
            item.outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    let report = BatchResult::from_items(study_instance_uid, results);
    info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.failed,
        "Batch finished"
    );
    report
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Key for duplicate detection: absolute against the working directory,
/// with `.` components dropped.
fn output_key(output: &Path) -> PathBuf {
    let absolute = if output.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(output))
            .unwrap_or_else(|_| output.to_path_buf())
    } else {
        output.to_path_buf()
    };
    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn plan_entries(config: &BatchConfig, study_instance_uid: &str) -> Vec<PlannedEntry> {
    let mut claimed_outputs: HashMap<PathBuf, u32> = HashMap::new();

    config
        .pdfs
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let series_number = (index + 1) as u32;
            plan_entry(
                config,
                entry,
                series_number,
                study_instance_uid,
                &mut claimed_outputs,
            )
        })
        .collect()
}

fn plan_entry(
    config: &BatchConfig,
    entry: &PdfEntry,
    series_number: u32,
    study_instance_uid: &str,
    claimed_outputs: &mut HashMap<PathBuf, u32>,
) -> PlannedEntry {
    let description = entry
        .description
        .clone()
        .unwrap_or_else(|| format!("Document {series_number}"));

    let mut item = BatchItemResult {
        input: entry.input.clone(),
        output: entry.output.clone(),
        description: Some(description.clone()),
        series_number,
        outcome: ConversionResult::default(),
    };

    let (Some(input), Some(output)) = (non_empty(&entry.input), non_empty(&entry.output)) else {
        item.outcome = ConversionResult::error(&ConversionError::MissingPath);
        return PlannedEntry::Rejected(item);
    };

    let output = PathBuf::from(output);
    let key = output_key(&output);
    if let Some(&first) = claimed_outputs.get(&key) {
        item.outcome = ConversionResult::error(&ConversionError::DuplicateOutput {
            path: output,
            index: first as usize,
        });
        return PlannedEntry::Rejected(item);
    }
    claimed_outputs.insert(key, series_number);

    let request = ConversionRequest {
        pdf_source: PathBuf::from(input),
        output_target: output,
        patient_name: config.patient_name.clone(),
        patient_id: config.patient_id.clone(),
        accession_number: config.accession_number.clone(),
        study_date: config.study_date.clone(),
        study_description: config.study_description.clone(),
        series_description: description,
        series_number,
        instance_number: 1,
        study_instance_uid: Some(study_instance_uid.to_string()),
        // each document is its own series, even within one study
        series_instance_uid: Some(generate_uid()),
    };

    PlannedEntry::Ready { item, request }
}

fn execute(planned: PlannedEntry) -> BatchItemResult {
    match planned {
        PlannedEntry::Rejected(item) => item,
        PlannedEntry::Ready { mut item, request } => {
            item.outcome = encapsulate(&request);
            item
        }
    }
}
