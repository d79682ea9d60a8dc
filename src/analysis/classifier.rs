use crate::analysis::frame::PixelFrame;
use crate::models::DocumentType;
use crate::utils::DocumentError;
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFINITION_FILE: &str = "document_classifier.json";
const WEIGHTS_FILE: &str = "document_classifier.bin";

#[derive(Debug, Deserialize)]
struct ModelDefinition {
    inputs: usize,
    classes: Vec<String>,
}

/// Small linear head over aspect ratio and per-channel means, loaded from a
/// definition/weights file pair.
struct LinearModel {
    classes: Vec<DocumentType>,
    // Per class: bias followed by one weight per input.
    rows: Vec<Vec<f32>>,
    inputs: usize,
}

impl LinearModel {
    fn load(model_dir: &Path) -> Result<Self, DocumentError> {
        let definition_path = model_dir.join(DEFINITION_FILE);
        let raw = fs::read_to_string(&definition_path)
            .map_err(|e| DocumentError::ClassifierLoad(format!("{}: {}", definition_path.display(), e)))?;
        let definition: ModelDefinition = serde_json::from_str(&raw)
            .map_err(|e| DocumentError::ClassifierLoad(format!("bad model definition: {}", e)))?;

        let classes = definition
            .classes
            .iter()
            .map(|tag| document_type_from_tag(tag))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                DocumentError::ClassifierLoad("unknown class tag in model definition".to_string())
            })?;

        let weights_path = model_dir.join(WEIGHTS_FILE);
        let bytes = fs::read(&weights_path)
            .map_err(|e| DocumentError::ClassifierLoad(format!("{}: {}", weights_path.display(), e)))?;

        let expected = classes.len() * (definition.inputs + 1) * 4;
        if bytes.len() != expected {
            return Err(DocumentError::ClassifierLoad(format!(
                "weights file has {} bytes, expected {}",
                bytes.len(),
                expected
            )));
        }

        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let rows = floats
            .chunks_exact(definition.inputs + 1)
            .map(|row| row.to_vec())
            .collect();

        Ok(LinearModel {
            classes,
            rows,
            inputs: definition.inputs,
        })
    }

    fn predict(&self, aspect_ratio: f64, frame: &PixelFrame) -> Option<DocumentType> {
        let [r, g, b] = frame.channels();
        let channel_mean = |c: &[f32]| c.iter().map(|&v| v as f64).sum::<f64>() / c.len().max(1) as f64;
        let features = [
            aspect_ratio,
            channel_mean(&r),
            channel_mean(&g),
            channel_mean(&b),
        ];
        if self.inputs != features.len() {
            return None;
        }

        let mut best: Option<(f64, DocumentType)> = None;
        for (row, class) in self.rows.iter().zip(&self.classes) {
            let logit = row[0] as f64
                + row[1..]
                    .iter()
                    .zip(features.iter())
                    .map(|(&w, &x)| w as f64 * x)
                    .sum::<f64>();
            if best.map_or(true, |(b, _)| logit > b) {
                best = Some((logit, *class));
            }
        }
        best.map(|(_, class)| class)
    }
}

/// Document type classification: a learned linear head when the model pair
/// is present, otherwise the aspect-ratio heuristic. Model absence never
/// aborts a request.
pub struct DocumentClassifier {
    model: Option<LinearModel>,
}

impl DocumentClassifier {
    pub fn new(model_dir: &Path) -> Self {
        match LinearModel::load(model_dir) {
            Ok(model) => {
                info!("Document classifier model loaded from {}", model_dir.display());
                DocumentClassifier { model: Some(model) }
            }
            Err(e) => {
                warn!("{}; using aspect-ratio heuristic", e);
                DocumentClassifier { model: None }
            }
        }
    }

    pub fn heuristic_only() -> Self {
        DocumentClassifier { model: None }
    }

    pub fn classify(&self, width: u32, height: u32, frame: &PixelFrame) -> DocumentType {
        if let Some(model) = &self.model {
            let aspect_ratio = aspect(width, height);
            if let Some(document_type) = model.predict(aspect_ratio, frame) {
                return document_type;
            }
        }
        Self::classify_by_aspect(width, height)
    }

    /// Windowed aspect-ratio rules. The windows overlap (1.58 sits in both
    /// the passport and driver-license windows); evaluation order is the
    /// tie-break and must stay exactly as listed.
    pub fn classify_by_aspect(width: u32, height: u32) -> DocumentType {
        let ratio = aspect(width, height);
        if ratio > 1.4 && ratio < 1.6 {
            DocumentType::Passport
        } else if ratio > 1.55 && ratio < 1.7 {
            DocumentType::DriverLicense
        } else if ratio > 1.2 && ratio < 1.4 {
            DocumentType::IdCard
        } else {
            DocumentType::Passport
        }
    }
}

fn aspect(width: u32, height: u32) -> f64 {
    if height == 0 {
        return 0.0;
    }
    width as f64 / height as f64
}

fn document_type_from_tag(tag: &str) -> Option<DocumentType> {
    match tag {
        "passport" => Some(DocumentType::Passport),
        "driver_license" => Some(DocumentType::DriverLicense),
        "id_card" => Some(DocumentType::IdCard),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn aspect_windows_follow_listed_order() {
        assert_eq!(DocumentClassifier::classify_by_aspect(300, 200), DocumentType::Passport); // 1.5
        assert_eq!(DocumentClassifier::classify_by_aspect(320, 200), DocumentType::DriverLicense); // 1.6
        assert_eq!(DocumentClassifier::classify_by_aspect(260, 200), DocumentType::IdCard); // 1.3
        assert_eq!(DocumentClassifier::classify_by_aspect(400, 200), DocumentType::Passport); // 2.0, default
    }

    #[test]
    fn overlapping_window_resolves_to_the_first_match() {
        // 1.58 matches both the passport and driver-license windows.
        assert_eq!(DocumentClassifier::classify_by_aspect(316, 200), DocumentType::Passport);
    }

    #[test]
    fn missing_model_falls_back_to_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = DocumentClassifier::new(dir.path());
        let frame = PixelFrame::constant(0.5, 0.5, 0.5);
        assert_eq!(classifier.classify(300, 200, &frame), DocumentType::Passport);
    }

    #[test]
    fn corrupt_weights_fall_back_to_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFINITION_FILE),
            r#"{"inputs": 4, "classes": ["passport", "driver_license", "id_card"]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(WEIGHTS_FILE), [0u8; 7]).unwrap();
        let classifier = DocumentClassifier::new(dir.path());
        let frame = PixelFrame::constant(0.5, 0.5, 0.5);
        assert_eq!(classifier.classify(320, 200, &frame), DocumentType::DriverLicense);
    }

    #[test]
    fn loaded_model_drives_the_prediction() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFINITION_FILE),
            r#"{"inputs": 4, "classes": ["passport", "driver_license", "id_card"]}"#,
        )
        .unwrap();

        // Rows of [bias, w_aspect, w_r, w_g, w_b]; the red-channel weight
        // makes a red frame classify as driver_license.
        let rows: [[f32; 5]; 3] = [
            [0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 10.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let mut file = std::fs::File::create(dir.path().join(WEIGHTS_FILE)).unwrap();
        for row in rows {
            for value in row {
                file.write_all(&value.to_le_bytes()).unwrap();
            }
        }
        drop(file);

        let classifier = DocumentClassifier::new(dir.path());
        let frame = PixelFrame::constant(1.0, 0.0, 0.0);
        // Geometry alone would say passport; the model overrides it.
        assert_eq!(classifier.classify(300, 200, &frame), DocumentType::DriverLicense);
    }
}
