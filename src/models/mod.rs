pub mod data;

pub use data::{
    DocumentProcessingResult, DocumentType, ExtractedData, FaceDetectionResult,
    FraudDetectionCheck, Point, ValidationResult,
};
