//! Conversion error types

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification reported alongside every failed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Input,
    Resource,
    Serialization,
}

/// Everything that can stop a single PDF from becoming a DICOM file.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("PDF not found: {}", .0.display())]
    PdfNotFound(PathBuf),

    #[error("invalid study date '{0}', expected YYYYMMDD")]
    InvalidStudyDate(String),

    #[error("missing input or output path")]
    MissingPath,

    #[error("output path already used by entry {index}: {}", .path.display())]
    DuplicateOutput { path: PathBuf, index: usize },

    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to create output folder {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to write {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("DICOM serialization failed: {0}")]
    Serialization(String),
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::PdfNotFound(_)
            | ConversionError::InvalidStudyDate(_)
            | ConversionError::MissingPath
            | ConversionError::DuplicateOutput { .. } => ErrorKind::Input,
            ConversionError::Io { .. }
            | ConversionError::CreateDir { .. }
            | ConversionError::Persist { .. } => ErrorKind::Resource,
            ConversionError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_error_kinds() {
        assert_eq!(
            ConversionError::PdfNotFound(PathBuf::from("a.pdf")).kind(),
            ErrorKind::Input
        );
        assert_eq!(ConversionError::MissingPath.kind(), ErrorKind::Input);
        assert_eq!(
            ConversionError::CreateDir {
                path: PathBuf::from("out"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }
            .kind(),
            ErrorKind::Resource
        );
        assert_eq!(
            ConversionError::Serialization("bad".into()).kind(),
            ErrorKind::Serialization
        );
    }

    #[test]
    fn not_found_message_names_the_path() {
        let err = ConversionError::PdfNotFound(PathBuf::from("/tmp/missing.pdf"));
        assert_eq!(err.to_string(), "PDF not found: /tmp/missing.pdf");
    }
}
