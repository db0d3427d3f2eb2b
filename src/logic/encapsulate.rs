use crate::error::{ConversionError, Result};
use crate::models::metadata::{
    dicom_date, dicom_time, parse_dicom_date, study_id_from_accession, CodedEntry,
    EncapsulatedPdf, EncapsulatedPdfAttributes, Equipment, FileMeta, Patient, Series,
    SopCommon, Study, CONVERSION_TYPE, MODALITY, PDF_MIME_TYPE,
};
use crate::models::{ConversionRequest, ConversionResult, EncapsulatedDocument};
use crate::utils::uid::{generate_uid, is_valid_uid};
use chrono::{Local, NaiveDateTime};
use dicom::dictionary_std::uids;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Convert one PDF into an Encapsulated PDF DICOM file.
///
/// Failures are reported in the returned [`ConversionResult`]; nothing is
/// left at `output_target` unless the whole object was written.
pub fn encapsulate(request: &ConversionRequest) -> ConversionResult {
    let outcome = try_encapsulate(request);
    match &outcome {
        Ok(document) => info!(
            pdf = %request.pdf_source.display(),
            output = %document.path.display(),
            series_number = request.series_number,
            "PDF encapsulated"
        ),
        Err(err) => warn!(
            pdf = %request.pdf_source.display(),
            kind = ?err.kind(),
            "Encapsulation failed: {err}"
        ),
    }
    outcome.into()
}

pub fn try_encapsulate(request: &ConversionRequest) -> Result<EncapsulatedDocument> {
    let pdf_path = &request.pdf_source;
    if !pdf_path.is_file() {
        return Err(ConversionError::PdfNotFound(pdf_path.clone()));
    }

    let pdf_data = fs::read(pdf_path).map_err(|source| ConversionError::Io {
        path: pdf_path.clone(),
        source,
    })?;
    debug!(pdf = %pdf_path.display(), bytes = pdf_data.len(), "PDF read");

    let now = Local::now().naive_local();
    let attributes = build_attributes(request, pdf_data, &now)?;

    let document = EncapsulatedDocument {
        path: request.output_target.clone(),
        study_instance_uid: attributes.study.instance_uid.clone(),
        series_instance_uid: attributes.series.instance_uid.clone(),
        sop_instance_uid: attributes.sop.instance_uid.clone(),
    };

    write_dicom_file(attributes, &request.output_target)?;
    Ok(document)
}

fn resolve_uid(supplied: Option<&str>, what: &str) -> String {
    match supplied.filter(|uid| !uid.trim().is_empty()) {
        Some(uid) => {
            if !is_valid_uid(uid) {
                warn!(uid, "Supplied {what} UID is not a well-formed DICOM UID");
            }
            uid.to_string()
        }
        None => generate_uid(),
    }
}

/// Assemble the full attribute record for `request`, taking `now` as the
/// conversion instant.
pub fn build_attributes(
    request: &ConversionRequest,
    pdf_data: Vec<u8>,
    now: &NaiveDateTime,
) -> Result<EncapsulatedPdfAttributes> {
    let study_date = match request.study_date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            if parse_dicom_date(raw).is_none() {
                return Err(ConversionError::InvalidStudyDate(raw.to_string()));
            }
            raw.to_string()
        }
        _ => dicom_date(now),
    };

    let study_instance_uid = resolve_uid(request.study_instance_uid.as_deref(), "study");
    let series_instance_uid = resolve_uid(request.series_instance_uid.as_deref(), "series");

    Ok(EncapsulatedPdfAttributes {
        file_meta: FileMeta::new(generate_uid()),
        patient: Patient {
            name: request.patient_name.clone(),
            id: request.patient_id.clone(),
            birth_date: String::new(),
            sex: String::new(),
        },
        study: Study {
            instance_uid: study_instance_uid,
            id: study_id_from_accession(&request.accession_number),
            accession_number: request.accession_number.clone(),
            referring_physician_name: String::new(),
            description: request.study_description.clone(),
            date: study_date,
            time: dicom_time(now),
        },
        series: Series {
            instance_uid: series_instance_uid,
            number: request.series_number,
            modality: MODALITY.to_string(),
            description: request.series_description.clone(),
        },
        equipment: Equipment::converter(),
        conversion_type: CONVERSION_TYPE.to_string(),
        sop: SopCommon {
            class_uid: uids::ENCAPSULATED_PDF_STORAGE.to_string(),
            instance_uid: generate_uid(),
            instance_number: request.instance_number,
        },
        document: EncapsulatedPdf {
            burned_in_annotation: "YES".to_string(),
            title: format!(
                "{} - {}",
                request.series_description, request.accession_number
            ),
            mime_type: PDF_MIME_TYPE.to_string(),
            content_date: dicom_date(now),
            content_time: dicom_time(now),
            concept_name: CodedEntry::radiology_study_observation(),
            data: pdf_data,
        },
    })
}

/// Serialize into a temporary sibling file, then rename it onto `output`.
fn write_dicom_file(attributes: EncapsulatedPdfAttributes, output: &Path) -> Result<()> {
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    fs::create_dir_all(parent).map_err(|source| ConversionError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let obj = attributes
        .into_file_object()
        .map_err(|e| ConversionError::Serialization(e.to_string()))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".pdf2dicom-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(|source| ConversionError::Persist {
            path: parent.to_path_buf(),
            source,
        })?;

    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        obj.write_all(&mut writer)
            .map_err(|e| ConversionError::Serialization(e.to_string()))?;
        writer.flush().map_err(|source| ConversionError::Persist {
            path: output.to_path_buf(),
            source,
        })?;
    }

    // dropping `staged` on any error above removes the partial file
    staged
        .persist(output)
        .map_err(|e| ConversionError::Persist {
            path: output.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}
