use crate::models::config::{BatchConfig, PdfEntry, DEFAULT_PATIENT_NAME};
use crate::models::DEFAULT_STUDY_DESCRIPTION;
use crate::utils::discovery::collect_pdf_files;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Inputs for building a batch descriptor from a folder of report PDFs.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub input_folder: PathBuf,
    pub output_root: PathBuf,
    pub patient_name: String,
    pub patient_id: String,
    pub accession_number: String,
    pub study_date: Option<String>,
    pub study_description: Option<String>,
}

/// `DOE  JANE` -> `DOE^JANE`
pub fn normalize_patient_name(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.is_empty() {
        DEFAULT_PATIENT_NAME.to_string()
    } else {
        parts.join("^")
    }
}

/// Keep the characters that make up a national id (digits, check letter, dash).
fn clean_patient_id(patient_id: &str) -> String {
    patient_id
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'k' || *c == 'K' || *c == '-')
        .collect()
}

/// `{accession}_{patient_id}_{stem}.dcm`, unless the stem already carries
/// the accession number.
pub fn output_file_name(accession_number: &str, patient_id: &str, pdf: &Path) -> String {
    let stem = pdf
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    if !accession_number.is_empty() && stem.starts_with(accession_number) {
        format!("{stem}.dcm")
    } else {
        format!(
            "{}_{}_{}.dcm",
            accession_number,
            clean_patient_id(patient_id),
            stem
        )
    }
}

pub fn plan_batch(request: &PlanRequest) -> Result<BatchConfig> {
    if !request.input_folder.is_dir() {
        bail!(
            "Input folder '{}' does not exist",
            request.input_folder.display()
        );
    }

    let pdfs = collect_pdf_files(&request.input_folder);
    if pdfs.is_empty() {
        bail!("No PDF files found in {}", request.input_folder.display());
    }

    let study_folder = request.output_root.join(&request.accession_number);
    let entries = pdfs
        .iter()
        .map(|pdf| {
            let file_name =
                output_file_name(&request.accession_number, &request.patient_id, pdf);
            PdfEntry {
                input: Some(pdf.to_string_lossy().into_owned()),
                output: Some(study_folder.join(file_name).to_string_lossy().into_owned()),
                description: pdf
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string),
            }
        })
        .collect();

    Ok(BatchConfig {
        patient_name: normalize_patient_name(&request.patient_name),
        patient_id: request.patient_id.clone(),
        accession_number: request.accession_number.clone(),
        study_date: request.study_date.clone(),
        study_instance_uid: None,
        study_description: request
            .study_description
            .clone()
            .unwrap_or_else(|| DEFAULT_STUDY_DESCRIPTION.to_string()),
        pdfs: entries,
    })
}
