use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_PATIENT_NAME: &str = "UNKNOWN";
pub const DEFAULT_PATIENT_ID: &str = "000000000";
pub const DEFAULT_ACCESSION_NUMBER: &str = "ACC000";

/// Batch descriptor: shared patient and study fields plus the documents of
/// one study, in series order.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BatchConfig {
    pub patient_name: String,
    pub patient_id: String,
    pub accession_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_instance_uid: Option<String>,
    pub study_description: String,
    pub pdfs: Vec<PdfEntry>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            patient_name: DEFAULT_PATIENT_NAME.to_string(),
            patient_id: DEFAULT_PATIENT_ID.to_string(),
            accession_number: DEFAULT_ACCESSION_NUMBER.to_string(),
            study_date: None,
            study_instance_uid: None,
            study_description: crate::models::DEFAULT_STUDY_DESCRIPTION.to_string(),
            pdfs: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PdfEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BatchConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid batch configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Supplied study UID exactly as given; blank values count as absent.
    pub fn supplied_study_uid(&self) -> Option<&str> {
        self.study_instance_uid
            .as_deref()
            .filter(|uid| !uid.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let config = BatchConfig::from_json(r#"{"pdfs": [{"input": "a.pdf"}]}"#).unwrap();
        assert_eq!(config.patient_name, "UNKNOWN");
        assert_eq!(config.patient_id, "000000000");
        assert_eq!(config.accession_number, "ACC000");
        assert_eq!(config.study_description, "Radiology Report");
        assert_eq!(config.pdfs.len(), 1);
        assert_eq!(config.pdfs[0].input.as_deref(), Some("a.pdf"));
        assert!(config.pdfs[0].output.is_none());
    }

    #[test]
    fn parses_full_descriptor() {
        let config = BatchConfig::from_json(
            r#"{
                "patient_name": "DOE^JANE",
                "patient_id": "12345678-9",
                "accession_number": "ACC001",
                "study_date": "20240115",
                "study_instance_uid": "1.2.3",
                "pdfs": [
                    {"input": "a.pdf", "output": "a.dcm", "description": "Main Report"},
                    {"input": "b.pdf", "output": "b.dcm"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.study_date.as_deref(), Some("20240115"));
        assert_eq!(config.supplied_study_uid(), Some("1.2.3"));
        assert_eq!(config.pdfs[0].description.as_deref(), Some("Main Report"));
        assert!(config.pdfs[1].description.is_none());
    }

    #[test]
    fn blank_study_uid_counts_as_absent() {
        let config = BatchConfig::from_json(r#"{"study_instance_uid": "  "}"#).unwrap();
        assert_eq!(config.supplied_study_uid(), None);

        let padded = BatchConfig::from_json(r#"{"study_instance_uid": " 1.2.3"}"#).unwrap();
        assert_eq!(padded.supplied_study_uid(), Some(" 1.2.3"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(BatchConfig::from_json("{not json").is_err());
        assert!(BatchConfig::load(Path::new("/definitely/not/here.json")).is_err());
    }
}
