use crate::utils::DocumentError;
use image::{DynamicImage, GrayImage};
use imageproc::contrast::stretch_contrast;
use log::debug;
use tempfile::NamedTempFile;

/// OCR-oriented image preparation. Recognition quality on photographed
/// documents improves noticeably with a grayscale, contrast-stretched input.
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    pub fn prepare_for_ocr(img: &DynamicImage) -> GrayImage {
        let gray = img.to_luma8();
        stretch_contrast(&gray, 30, 225)
    }

    /// Writes the prepared frame to a temp PNG for the tesseract engine.
    /// The returned handle owns the file; dropping it deletes the file.
    pub fn write_temp_png(gray: &GrayImage) -> Result<NamedTempFile, DocumentError> {
        let temp_file = tempfile::Builder::new()
            .prefix("docuvet-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| DocumentError::Extraction(format!("Failed to create temp file: {}", e)))?;

        gray.save(temp_file.path())
            .map_err(|e| DocumentError::Extraction(format!("Failed to write temp image: {}", e)))?;

        debug!("OCR input written to {:?}", temp_file.path());
        Ok(temp_file)
    }
}
