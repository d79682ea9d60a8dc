use thiserror::Error;

/// Crate-wide error taxonomy. Per-signal failures (classifier load, signal
/// analysis, face model) are recovered close to where they occur and only
/// reach the caller as degraded results; extraction, validation and platform
/// failures propagate.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Classifier load error: {0}")]
    ClassifierLoad(String),

    #[error("Signal analysis error: {0}")]
    SignalAnalysis(String),

    #[error("Face model error: {0}")]
    FaceModel(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Violation messages for a validation failure, empty for other variants.
    pub fn violations(&self) -> &[String] {
        match self {
            DocumentError::Validation(v) => v,
            _ => &[],
        }
    }
}
