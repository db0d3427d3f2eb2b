use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use dicom::core::value::DataSetSequence;
use dicom::core::{DataElement, Length, PrimitiveValue, Tag, VR};
use dicom::dictionary_std::{tags, uids};
use dicom::object::meta::FileMetaTable;
use dicom::object::{FileDicomObject, FileMetaTableBuilder, InMemDicomObject};
use dicom_object::open_file;
use dicom_transfer_syntax_registry::{TransferSyntaxIndex, TransferSyntaxRegistry};
use std::path::Path;

pub const IMPLEMENTATION_VERSION_NAME: &str = "PDF2DICOM_1.0";
pub const MANUFACTURER: &str = "PDF2DICOM";
pub const STATION_NAME: &str = "PDF2DICOM";
pub const MODALITY: &str = "DOC";
/// Workstation
pub const CONVERSION_TYPE: &str = "WSD";
pub const PDF_MIME_TYPE: &str = "application/pdf";
/// UTF-8, so patient names outside ASCII encode cleanly.
pub const CHARACTER_SET: &str = "ISO_IR 192";
pub const STUDY_ID_MAX_CHARS: usize = 16;

pub const DICOM_DATE_FORMAT: &str = "%Y%m%d";
pub const DICOM_TIME_FORMAT: &str = "%H%M%S";

/// Complete attribute set of an Encapsulated PDF Storage instance.
///
/// Every mandatory attribute is a field, so a missing value is a compile
/// error rather than a silently incomplete object.
#[derive(Debug, Clone)]
pub struct EncapsulatedPdfAttributes {
    pub file_meta: FileMeta,
    pub patient: Patient,
    pub study: Study,
    pub series: Series,
    pub equipment: Equipment,
    pub conversion_type: String,
    pub sop: SopCommon,
    pub document: EncapsulatedPdf,
}

#[derive(Debug, Clone)]
pub struct FileMeta {
    pub transfer_syntax_uid: String,
    pub implementation_class_uid: String,
    pub implementation_version_name: String,
}

#[derive(Debug, Clone)]
pub struct Patient {
    pub name: String,
    pub id: String,
    pub birth_date: String,
    pub sex: String,
}

#[derive(Debug, Clone)]
pub struct Study {
    pub instance_uid: String,
    pub id: String,
    pub accession_number: String,
    pub referring_physician_name: String,
    pub description: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone)]
pub struct Series {
    pub instance_uid: String,
    pub number: u32,
    pub modality: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Equipment {
    pub manufacturer: String,
    pub institution_name: String,
    pub station_name: String,
}

/// SOP Class / Instance UIDs, shared by the file meta group and the data set.
#[derive(Debug, Clone)]
pub struct SopCommon {
    pub class_uid: String,
    pub instance_uid: String,
    pub instance_number: u32,
}

#[derive(Debug, Clone)]
pub struct EncapsulatedPdf {
    pub burned_in_annotation: String,
    pub title: String,
    pub mime_type: String,
    pub content_date: String,
    pub content_time: String,
    pub concept_name: CodedEntry,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedEntry {
    pub code_value: String,
    pub coding_scheme_designator: String,
    pub code_meaning: String,
}

impl CodedEntry {
    /// LOINC 18782-3
    pub fn radiology_study_observation() -> Self {
        Self {
            code_value: "18782-3".to_string(),
            coding_scheme_designator: "LN".to_string(),
            code_meaning: "Radiology Study observation".to_string(),
        }
    }
}

impl FileMeta {
    pub fn new(implementation_class_uid: String) -> Self {
        Self {
            transfer_syntax_uid: uids::EXPLICIT_VR_LITTLE_ENDIAN.to_string(),
            implementation_class_uid,
            implementation_version_name: IMPLEMENTATION_VERSION_NAME.to_string(),
        }
    }
}

impl Equipment {
    pub fn converter() -> Self {
        Self {
            manufacturer: MANUFACTURER.to_string(),
            institution_name: String::new(),
            station_name: STATION_NAME.to_string(),
        }
    }
}

/// StudyID is limited to 16 characters (SH); AccessionNumber keeps the rest.
pub fn study_id_from_accession(accession_number: &str) -> String {
    accession_number.chars().take(STUDY_ID_MAX_CHARS).collect()
}

/// Parse an 8-digit `YYYYMMDD` value into a calendar date.
pub fn parse_dicom_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, DICOM_DATE_FORMAT).ok()
}

pub fn dicom_date(now: &NaiveDateTime) -> String {
    now.format(DICOM_DATE_FORMAT).to_string()
}

pub fn dicom_time(now: &NaiveDateTime) -> String {
    now.format(DICOM_TIME_FORMAT).to_string()
}

fn text(tag: Tag, vr: VR, value: &str) -> DataElement<InMemDicomObject> {
    DataElement::new(tag, vr, PrimitiveValue::from(value))
}

fn integer_string(tag: Tag, value: u32) -> DataElement<InMemDicomObject> {
    DataElement::new(tag, VR::IS, PrimitiveValue::from(value.to_string()))
}

impl EncapsulatedPdfAttributes {
    pub fn file_meta_table(&self) -> Result<FileMetaTable, dicom::object::meta::Error> {
        FileMetaTableBuilder::new()
            .media_storage_sop_class_uid(self.sop.class_uid.as_str())
            .media_storage_sop_instance_uid(self.sop.instance_uid.as_str())
            .transfer_syntax(self.file_meta.transfer_syntax_uid.as_str())
            .implementation_class_uid(self.file_meta.implementation_class_uid.as_str())
            .implementation_version_name(self.file_meta.implementation_version_name.as_str())
            .build()
    }

    /// Build the main data set, consuming the record to avoid copying the PDF.
    pub fn into_data_set(self) -> InMemDicomObject {
        let concept_name = InMemDicomObject::from_element_iter([
            text(tags::CODE_VALUE, VR::SH, &self.document.concept_name.code_value),
            text(
                tags::CODING_SCHEME_DESIGNATOR,
                VR::SH,
                &self.document.concept_name.coding_scheme_designator,
            ),
            text(tags::CODE_MEANING, VR::LO, &self.document.concept_name.code_meaning),
        ]);

        let mut data = self.document.data;
        // OB values must have even length
        if data.len() % 2 == 1 {
            data.push(0);
        }

        InMemDicomObject::from_element_iter([
            text(tags::SPECIFIC_CHARACTER_SET, VR::CS, CHARACTER_SET),
            // SOP Common
            text(tags::SOP_CLASS_UID, VR::UI, &self.sop.class_uid),
            text(tags::SOP_INSTANCE_UID, VR::UI, &self.sop.instance_uid),
            integer_string(tags::INSTANCE_NUMBER, self.sop.instance_number),
            // Patient
            text(tags::PATIENT_NAME, VR::PN, &self.patient.name),
            text(tags::PATIENT_ID, VR::LO, &self.patient.id),
            text(tags::PATIENT_BIRTH_DATE, VR::DA, &self.patient.birth_date),
            text(tags::PATIENT_SEX, VR::CS, &self.patient.sex),
            // General Study
            text(tags::STUDY_INSTANCE_UID, VR::UI, &self.study.instance_uid),
            text(tags::STUDY_ID, VR::SH, &self.study.id),
            text(tags::ACCESSION_NUMBER, VR::SH, &self.study.accession_number),
            text(
                tags::REFERRING_PHYSICIAN_NAME,
                VR::PN,
                &self.study.referring_physician_name,
            ),
            text(tags::STUDY_DESCRIPTION, VR::LO, &self.study.description),
            text(tags::STUDY_DATE, VR::DA, &self.study.date),
            text(tags::STUDY_TIME, VR::TM, &self.study.time),
            // General Series
            text(tags::SERIES_INSTANCE_UID, VR::UI, &self.series.instance_uid),
            integer_string(tags::SERIES_NUMBER, self.series.number),
            text(tags::MODALITY, VR::CS, &self.series.modality),
            text(tags::SERIES_DESCRIPTION, VR::LO, &self.series.description),
            // General Equipment
            text(tags::MANUFACTURER, VR::LO, &self.equipment.manufacturer),
            text(tags::INSTITUTION_NAME, VR::LO, &self.equipment.institution_name),
            text(tags::STATION_NAME, VR::SH, &self.equipment.station_name),
            // SC Equipment
            text(tags::CONVERSION_TYPE, VR::CS, &self.conversion_type),
            // Encapsulated Document
            text(
                tags::BURNED_IN_ANNOTATION,
                VR::CS,
                &self.document.burned_in_annotation,
            ),
            text(tags::DOCUMENT_TITLE, VR::ST, &self.document.title),
            text(
                tags::MIME_TYPE_OF_ENCAPSULATED_DOCUMENT,
                VR::LO,
                &self.document.mime_type,
            ),
            text(tags::CONTENT_DATE, VR::DA, &self.document.content_date),
            text(tags::CONTENT_TIME, VR::TM, &self.document.content_time),
            DataElement::new(
                tags::CONCEPT_NAME_CODE_SEQUENCE,
                VR::SQ,
                DataSetSequence::new(vec![concept_name], Length::UNDEFINED),
            ),
            DataElement::new(
                tags::ENCAPSULATED_DOCUMENT,
                VR::OB,
                PrimitiveValue::from(data),
            ),
        ])
    }

    pub fn into_file_object(
        self,
    ) -> Result<FileDicomObject<InMemDicomObject>, dicom::object::meta::Error> {
        let meta = self.file_meta_table()?;
        Ok(self.into_data_set().with_exact_meta(meta))
    }
}

/// Identifying fields read back from a written Encapsulated PDF file.
#[derive(Debug, Clone)]
pub struct EncapsulatedSummary {
    pub media_storage_sop_class_uid: String,
    pub media_storage_sop_instance_uid: String,
    pub transfer_syntax: String,
    pub transfer_syntax_name: Option<String>,
    pub implementation_version_name: Option<String>,
    pub sop_class_uid: Option<String>,
    pub sop_instance_uid: Option<String>,
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub study_instance_uid: Option<String>,
    pub study_id: Option<String>,
    pub accession_number: Option<String>,
    pub study_date: Option<String>,
    pub study_description: Option<String>,
    pub series_instance_uid: Option<String>,
    pub series_number: Option<u32>,
    pub series_description: Option<String>,
    pub instance_number: Option<u32>,
    pub modality: Option<String>,
    pub conversion_type: Option<String>,
    pub burned_in_annotation: Option<String>,
    pub document_title: Option<String>,
    pub mime_type: Option<String>,
    pub concept_name: Option<CodedEntry>,
    pub document: Vec<u8>,
}

pub fn dicom_text(obj: &InMemDicomObject, tag: Tag) -> Option<String> {
    obj.element(tag)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn dicom_u32(obj: &InMemDicomObject, tag: Tag) -> Option<u32> {
    obj.element(tag).ok().and_then(|e| e.to_int().ok())
}

fn concept_name(obj: &InMemDicomObject) -> Option<CodedEntry> {
    let item = obj
        .element(tags::CONCEPT_NAME_CODE_SEQUENCE)
        .ok()?
        .items()?
        .first()?;
    Some(CodedEntry {
        code_value: dicom_text(item, tags::CODE_VALUE)?,
        coding_scheme_designator: dicom_text(item, tags::CODING_SCHEME_DESIGNATOR)?,
        code_meaning: dicom_text(item, tags::CODE_MEANING)?,
    })
}

pub fn read_summary(path: &Path) -> Result<EncapsulatedSummary> {
    let obj = open_file(path)
        .with_context(|| format!("Failed to open DICOM file {}", path.display()))?;

    let ts_uid = obj.meta().transfer_syntax();
    let transfer_syntax_name = TransferSyntaxRegistry
        .get(ts_uid)
        .map(|ts| ts.name().to_string());

    let document = obj
        .element(tags::ENCAPSULATED_DOCUMENT)
        .context("No encapsulated document")?
        .to_bytes()
        .context("Encapsulated document is not binary")?
        .into_owned();

    Ok(EncapsulatedSummary {
        media_storage_sop_class_uid: obj.meta().media_storage_sop_class_uid().to_string(),
        media_storage_sop_instance_uid: obj.meta().media_storage_sop_instance_uid().to_string(),
        transfer_syntax: ts_uid.to_string(),
        transfer_syntax_name,
        implementation_version_name: obj
            .meta()
            .implementation_version_name
            .as_deref()
            .map(|name| name.trim_end_matches(['\0', ' ']).to_string()),
        sop_class_uid: dicom_text(&obj, tags::SOP_CLASS_UID),
        sop_instance_uid: dicom_text(&obj, tags::SOP_INSTANCE_UID),
        patient_name: dicom_text(&obj, tags::PATIENT_NAME),
        patient_id: dicom_text(&obj, tags::PATIENT_ID),
        study_instance_uid: dicom_text(&obj, tags::STUDY_INSTANCE_UID),
        study_id: dicom_text(&obj, tags::STUDY_ID),
        accession_number: dicom_text(&obj, tags::ACCESSION_NUMBER),
        study_date: dicom_text(&obj, tags::STUDY_DATE),
        study_description: dicom_text(&obj, tags::STUDY_DESCRIPTION),
        series_instance_uid: dicom_text(&obj, tags::SERIES_INSTANCE_UID),
        series_number: dicom_u32(&obj, tags::SERIES_NUMBER),
        series_description: dicom_text(&obj, tags::SERIES_DESCRIPTION),
        instance_number: dicom_u32(&obj, tags::INSTANCE_NUMBER),
        modality: dicom_text(&obj, tags::MODALITY),
        conversion_type: dicom_text(&obj, tags::CONVERSION_TYPE),
        burned_in_annotation: dicom_text(&obj, tags::BURNED_IN_ANNOTATION),
        document_title: dicom_text(&obj, tags::DOCUMENT_TITLE),
        mime_type: dicom_text(&obj, tags::MIME_TYPE_OF_ENCAPSULATED_DOCUMENT),
        concept_name: concept_name(&obj),
        document,
    })
}
