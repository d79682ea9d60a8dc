use serde::{Deserialize, Serialize};

/// Identity fields recovered from a document image. All three fields are
/// required non-empty once validation has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    pub name: String,
    pub document_number: String,
    pub expiration_date: String,
}

/// One named pass/fail fraud signal. Never partially constructed: a failing
/// analysis still yields a well-formed check with confidence 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudDetectionCheck {
    pub check: String,
    pub passed: bool,
    pub confidence: f64,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetectionResult {
    pub face_detected: bool,
    pub confidence: f64,
    pub landmarks: Vec<Point>,
}

impl Default for FaceDetectionResult {
    fn default() -> Self {
        FaceDetectionResult {
            face_detected: false,
            confidence: 0.0,
            landmarks: Vec::new(),
        }
    }
}

/// Closed set of supported document types. Downstream behavior that differs
/// per type matches exhaustively on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    DriverLicense,
    IdCard,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DocumentType::Passport => write!(f, "passport"),
            DocumentType::DriverLicense => write!(f, "driver_license"),
            DocumentType::IdCard => write!(f, "id_card"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub success: bool,
    pub document_type: DocumentType,
    pub is_valid: bool,
    pub confidence: f64,
    pub fraud_detection_results: Vec<FraudDetectionCheck>,
    pub extracted_data: ExtractedData,
}

/// Final combined shape: validation verdict plus face detection. Built once
/// per request by the aggregator; nothing here persists beyond the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProcessingResult {
    #[serde(flatten)]
    pub validation: ValidationResult,
    pub face_detection: FaceDetectionResult,
}
