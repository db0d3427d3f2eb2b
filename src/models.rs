pub mod config;
pub mod metadata;

use crate::error::{ConversionError, ErrorKind};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_STUDY_DESCRIPTION: &str = "Radiology Report";
pub const DEFAULT_SERIES_DESCRIPTION: &str = "PDF Report";

/// One PDF-to-DICOM conversion with all identifiers resolved or resolvable.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub pdf_source: PathBuf,
    pub output_target: PathBuf,
    pub patient_name: String,
    pub patient_id: String,
    pub accession_number: String,
    /// `YYYYMMDD`; today when absent.
    pub study_date: Option<String>,
    pub study_description: String,
    pub series_description: String,
    pub series_number: u32,
    pub instance_number: u32,
    pub study_instance_uid: Option<String>,
    pub series_instance_uid: Option<String>,
}

impl ConversionRequest {
    /// Request for a standalone document: series 1, instance 1, fresh UIDs.
    pub fn new(
        pdf_source: impl Into<PathBuf>,
        output_target: impl Into<PathBuf>,
        patient_name: impl Into<String>,
        patient_id: impl Into<String>,
        accession_number: impl Into<String>,
    ) -> Self {
        Self {
            pdf_source: pdf_source.into(),
            output_target: output_target.into(),
            patient_name: patient_name.into(),
            patient_id: patient_id.into(),
            accession_number: accession_number.into(),
            study_date: None,
            study_description: DEFAULT_STUDY_DESCRIPTION.to_string(),
            series_description: DEFAULT_SERIES_DESCRIPTION.to_string(),
            series_number: 1,
            instance_number: 1,
            study_instance_uid: None,
            series_instance_uid: None,
        }
    }

    pub fn with_study_date(mut self, study_date: Option<String>) -> Self {
        self.study_date = study_date;
        self
    }
}

/// Identifiers of a DICOM file that was written successfully.
#[derive(Debug, Clone)]
pub struct EncapsulatedDocument {
    pub path: PathBuf,
    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub sop_instance_uid: String,
}

/// Outcome of one encapsulation, always returned and never raised.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ConversionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ConversionResult {
    pub fn success(document: EncapsulatedDocument) -> Self {
        Self {
            success: true,
            path: Some(document.path),
            study_uid: Some(document.study_instance_uid),
            series_uid: Some(document.series_instance_uid),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(err: &ConversionError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            ..Default::default()
        }
    }
}

impl From<Result<EncapsulatedDocument, ConversionError>> for ConversionResult {
    fn from(outcome: Result<EncapsulatedDocument, ConversionError>) -> Self {
        match outcome {
            Ok(document) => ConversionResult::success(document),
            Err(err) => ConversionResult::error(&err),
        }
    }
}

/// Per-entry line of a batch report: the entry as given plus its outcome.
#[derive(Serialize, Debug, Clone)]
pub struct BatchItemResult {
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub series_number: u32,
    #[serde(flatten)]
    pub outcome: ConversionResult,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct BatchResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_instance_uid: Option<String>,
    pub total: usize,
    #[serde(rename = "exitosos")]
    pub succeeded: usize,
    #[serde(rename = "errores")]
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

impl BatchResult {
    /// Report for a batch that never started (unreadable descriptor).
    pub fn config_error(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
            ..Default::default()
        }
    }

    pub fn from_items(study_instance_uid: String, results: Vec<BatchItemResult>) -> Self {
        let succeeded = results.iter().filter(|item| item.outcome.success).count();
        let failed = results.len() - succeeded;
        Self {
            success: failed == 0,
            error: None,
            study_instance_uid: Some(study_instance_uid),
            total: results.len(),
            succeeded,
            failed,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(success: bool, series_number: u32) -> BatchItemResult {
        let outcome = if success {
            ConversionResult {
                success: true,
                ..Default::default()
            }
        } else {
            ConversionResult::error(&ConversionError::MissingPath)
        };
        BatchItemResult {
            input: Some(format!("{series_number}.pdf")),
            output: None,
            description: None,
            series_number,
            outcome,
        }
    }

    #[test]
    fn counts_successes_and_errors() {
        let report = BatchResult::from_items(
            "2.25.1".into(),
            vec![item(true, 1), item(false, 2), item(true, 3)],
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.success);
    }

    #[test]
    fn empty_batch_is_successful() {
        let report = BatchResult::from_items("2.25.1".into(), Vec::new());
        assert!(report.success);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn report_uses_legacy_count_keys() {
        let report = BatchResult::from_items("2.25.7".into(), vec![item(false, 1)]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["exitosos"], 0);
        assert_eq!(json["errores"], 1);
        assert_eq!(json["study_instance_uid"], "2.25.7");
        assert_eq!(json["results"][0]["error"], "missing input or output path");
        assert_eq!(json["results"][0]["error_kind"], "input");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn config_error_has_no_results() {
        let report = BatchResult::config_error("Error reading config: nope".into());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["results"].as_array().unwrap().len(), 0);
    }
}
