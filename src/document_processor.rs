use crate::analysis::{
    run_fraud_checks, DocumentClassifier, FaceDetector, PixelFrame, RandomScoreStub, ScoreSource,
    SignalAnalyzer,
};
use crate::config::{Config, ScoreSourceKind};
use crate::models::{DocumentProcessingResult, ExtractedData};
use crate::processing::{ImagePreprocessor, KnownFixtures, TextExtractor};
use crate::utils::DocumentError;
use crate::validation::FieldValidator;
use image::DynamicImage;
use log::info;
use std::path::Path;

/// Runs both pipelines over one document image and aggregates the verdict.
/// Owns the OCR handle, so recognition calls are serialized through `&mut
/// self` and the engine is reused across requests until the processor drops.
pub struct DocumentProcessor {
    config: Config,
    text_extractor: TextExtractor,
    field_validator: FieldValidator,
    classifier: DocumentClassifier,
    face_detector: FaceDetector,
    score_source: Box<dyn ScoreSource>,
}

impl DocumentProcessor {
    pub fn new(config: Config) -> Self {
        let text_extractor =
            TextExtractor::new(config.tessdata_path.clone(), &config.ocr_language);
        let fixtures = if config.fixtures_enabled {
            Some(KnownFixtures::demo())
        } else {
            None
        };
        let field_validator = FieldValidator::new(fixtures);
        let classifier = DocumentClassifier::new(&config.model_dir);
        let face_detector = FaceDetector::new(&config.model_dir);
        let score_source: Box<dyn ScoreSource> = match config.score_source {
            ScoreSourceKind::Signal => Box::new(SignalAnalyzer),
            ScoreSourceKind::RandomStub => Box::new(RandomScoreStub::new()),
        };

        DocumentProcessor {
            config,
            text_extractor,
            field_validator,
            classifier,
            face_detector,
            score_source,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full pipeline over one image. A structural failure (unreadable image)
    /// or a field-validation failure propagates; signal, classifier and face
    /// failures have already been recovered into degraded results.
    pub fn process(&mut self, image_path: &Path) -> Result<DocumentProcessingResult, DocumentError> {
        let img = image::open(image_path)
            .map_err(|e| DocumentError::Platform(format!("Failed to open image: {}", e)))?;

        let extracted_data = self.extract_fields(&img, image_path)?;

        let frame = PixelFrame::from_image(&img);
        let fraud_checks = run_fraud_checks(self.score_source.as_ref(), &frame);
        let document_type = self.classifier.classify(img.width(), img.height(), &frame);
        let face_detection = self.face_detector.detect(&frame);

        info!(
            "Processed {} as {}: {} fraud checks, face confidence {:.3}",
            image_path.display(),
            document_type,
            fraud_checks.len(),
            face_detection.confidence
        );

        Ok(crate::analysis::ResultAggregator::aggregate(
            document_type,
            fraud_checks,
            extracted_data,
            face_detection,
        ))
    }

    /// Text pipeline only, the `/api/documents/extract` surface: returns the
    /// validated fields without the image-signal verdict.
    pub fn extract(&mut self, image_path: &Path) -> Result<ExtractedData, DocumentError> {
        let img = image::open(image_path)
            .map_err(|e| DocumentError::Platform(format!("Failed to open image: {}", e)))?;
        self.extract_fields(&img, image_path)
    }

    /// Text pipeline: OCR preparation, recognition, cascades + MRZ fallback,
    /// validation. The temp OCR input lives only for this call.
    fn extract_fields(
        &mut self,
        img: &DynamicImage,
        source: &Path,
    ) -> Result<ExtractedData, DocumentError> {
        info!("Starting OCR extraction for {}", source.display());
        let gray = ImagePreprocessor::prepare_for_ocr(img);
        let temp = ImagePreprocessor::write_temp_png(&gray)?;
        let text = self.text_extractor.extract_text(temp.path())?;
        self.field_validator.process_text(&text)
    }

    /// Releases the OCR engine early. It is re-created on the next request;
    /// dropping the processor releases it as well.
    pub fn cleanup(&mut self) {
        self.text_extractor.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_image_is_a_platform_error() {
        let mut processor = DocumentProcessor::new(Config::default());
        let err = processor.process(Path::new("/nonexistent/image.png")).unwrap_err();
        assert!(matches!(err, DocumentError::Platform(_)));
    }
}
