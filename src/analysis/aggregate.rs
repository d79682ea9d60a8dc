use crate::models::{
    DocumentProcessingResult, DocumentType, ExtractedData, FaceDetectionResult,
    FraudDetectionCheck, ValidationResult,
};

/// Combines both pipelines into the final verdict. This is the only place
/// `is_valid` is computed; no component re-derives it.
pub struct ResultAggregator;

impl ResultAggregator {
    pub fn aggregate(
        document_type: DocumentType,
        fraud_detection_results: Vec<FraudDetectionCheck>,
        extracted_data: ExtractedData,
        face_detection: FaceDetectionResult,
    ) -> DocumentProcessingResult {
        let all_checks_passed = fraud_detection_results.iter().all(|check| check.passed);
        let is_valid = all_checks_passed && face_detection.face_detected;

        let mean_check_confidence = if fraud_detection_results.is_empty() {
            0.0
        } else {
            fraud_detection_results
                .iter()
                .map(|check| check.confidence)
                .sum::<f64>()
                / fraud_detection_results.len() as f64
        };
        let confidence = (mean_check_confidence + face_detection.confidence) / 2.0;

        DocumentProcessingResult {
            validation: ValidationResult {
                success: is_valid,
                document_type,
                is_valid,
                confidence,
                fraud_detection_results,
                extracted_data,
            },
            face_detection,
        }
    }
}
