use crate::utils::DocumentError;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use std::path::Path;
use tesseract::Tesseract;

lazy_static! {
    // Everything outside word chars, whitespace and the MRZ/date punctuation
    // set is OCR noise.
    static ref NOISE_CHARS: Regex = Regex::new(r"[^\w\s.<>/-]").unwrap();
}

/// Owned handle around the OCR engine. The engine is created lazily on the
/// first recognition call and reused afterwards; `cleanup` (or dropping the
/// handle) terminates it, and the next call re-creates it. `&mut self`
/// receivers keep recognition calls serialized — the engine is not reentrant.
pub struct TextExtractor {
    engine: Option<Tesseract>,
    datapath: Option<String>,
    language: String,
}

impl TextExtractor {
    pub fn new(datapath: Option<String>, language: &str) -> Self {
        TextExtractor {
            engine: None,
            datapath,
            language: language.to_string(),
        }
    }

    /// Runs OCR over the image at `path` and returns the cleaned text.
    /// On engine failure the engine is torn down before the error surfaces,
    /// so a later call starts from a fresh engine.
    pub fn extract_text(&mut self, path: &Path) -> Result<String, DocumentError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| DocumentError::Extraction("Non-UTF8 image path".to_string()))?;

        let engine = match self.engine.take() {
            Some(engine) => engine,
            None => {
                info!("Initializing OCR engine (language: {})", self.language);
                Tesseract::new(self.datapath.as_deref(), Some(&self.language))
                    .map_err(|e| DocumentError::Extraction(format!("OCR engine init failed: {}", e)))?
            }
        };

        // set_image consumes the engine; a failure here drops it, which is
        // the required teardown-on-failure behavior.
        let mut engine = engine
            .set_image(path_str)
            .map_err(|e| DocumentError::Extraction(format!("OCR set image failed: {}", e)))?;

        let raw = match engine.get_text() {
            Ok(text) => text,
            Err(e) => {
                return Err(DocumentError::Extraction(format!("OCR recognition failed: {}", e)));
            }
        };

        self.engine = Some(engine);
        let cleaned = Self::clean_text(&raw);
        debug!("OCR produced {} cleaned lines", cleaned.lines().count());
        Ok(cleaned)
    }

    /// Releases the engine. The next `extract_text` call re-creates it.
    pub fn cleanup(&mut self) {
        if self.engine.take().is_some() {
            info!("OCR engine released");
        }
    }

    /// Text cleaning applied to every raw OCR result, in order: strip noise
    /// characters, normalize CRLF, trim each line, drop empty lines.
    pub fn clean_text(raw: &str) -> String {
        let stripped = NOISE_CHARS.replace_all(raw, "");
        stripped
            .replace("\r\n", "\n")
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Drop for TextExtractor {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_noise_characters() {
        let cleaned = TextExtractor::clean_text("P@SS: №99006000!* <OK>");
        assert_eq!(cleaned, "PSS 99006000 <OK>");
    }

    #[test]
    fn clean_text_normalizes_crlf_and_drops_empty_lines() {
        let cleaned = TextExtractor::clean_text("  SPECIMEN  \r\n\r\n\n  99006000 \n");
        assert_eq!(cleaned, "SPECIMEN\n99006000");
    }

    #[test]
    fn clean_text_keeps_mrz_and_date_punctuation() {
        let cleaned = TextExtractor::clean_text("P<CZESPECIMEN<<VZOR\n06.09.2016 01/02-2030");
        assert_eq!(cleaned, "P<CZESPECIMEN<<VZOR\n06.09.2016 01/02-2030");
    }

    #[test]
    fn clean_text_is_pure() {
        let input = "Name: John\r\n  DOC 12345678  ";
        assert_eq!(TextExtractor::clean_text(input), TextExtractor::clean_text(input));
    }
}
