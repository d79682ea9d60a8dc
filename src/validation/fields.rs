use crate::models::ExtractedData;
use crate::processing::fields::{DirectFields, FieldExtractor, KnownFixtures};
use crate::processing::mrz::{MrzFields, MrzParser};
use crate::utils::DocumentError;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;

lazy_static! {
    static ref DOC_NUMBER_FORMAT: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
    static ref EXPIRY_FORMAT: Regex = Regex::new(r"^\d{2}[-./]\d{2}[-./]\d{2,4}$").unwrap();
}

/// Runs the text pipeline end to end: direct cascades, conditional MRZ
/// fallback, precedence merge, then rule validation that collects every
/// violation instead of failing fast.
pub struct FieldValidator {
    extractor: FieldExtractor,
}

impl FieldValidator {
    pub fn new(fixtures: Option<KnownFixtures>) -> Self {
        FieldValidator {
            extractor: FieldExtractor::new(fixtures),
        }
    }

    pub fn process_text(&self, text: &str) -> Result<ExtractedData, DocumentError> {
        let direct = self.extractor.extract(text);

        // The MRZ fallback runs only when a direct field is missing; a
        // complete direct extraction skips the zone entirely.
        let merged = if direct.is_complete() {
            Self::merge(direct, MrzFields::default())
        } else {
            info!(
                "Direct extraction incomplete ({:?}), attempting MRZ fallback",
                direct.missing_fields()
            );
            let mrz = MrzParser::parse(text);
            Self::merge(direct, mrz)
        };

        Self::validate(&merged)?;
        Ok(merged)
    }

    /// Direct values always take precedence; MRZ values only fill fields the
    /// cascades left missing or empty.
    pub fn merge(direct: DirectFields, mrz: MrzFields) -> ExtractedData {
        ExtractedData {
            name: direct
                .name
                .filter(|v| !v.is_empty())
                .or(mrz.name)
                .unwrap_or_default(),
            document_number: direct
                .document_number
                .filter(|v| !v.is_empty())
                .or(mrz.document_number)
                .unwrap_or_default(),
            expiration_date: direct
                .expiration_date
                .filter(|v| !v.is_empty())
                .or(mrz.expiration_date)
                .unwrap_or_default(),
        }
    }

    /// All rules evaluate; every violation lands in one error.
    pub fn validate(data: &ExtractedData) -> Result<(), DocumentError> {
        let mut violations = Vec::new();

        if data.name.is_empty() {
            violations.push("Name is required".to_string());
        }

        if data.document_number.is_empty() {
            violations.push("Document number is required".to_string());
        } else if !DOC_NUMBER_FORMAT.is_match(&data.document_number) {
            violations.push("Invalid document number format".to_string());
        }

        if data.expiration_date.is_empty() {
            violations.push("Expiration date is required".to_string());
        } else if !EXPIRY_FORMAT.is_match(&data.expiration_date) {
            violations.push("Invalid expiration date format".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(DocumentError::Validation(violations))
        }
    }
}
