use crate::analysis::frame::{PixelFrame, FRAME_SIZE};
use crate::models::{FaceDetectionResult, Point};
use crate::utils::DocumentError;
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFINITION_FILE: &str = "face_detector.json";
const WEIGHTS_FILE: &str = "face_detector.bin";
const DETECTION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct ModelDefinition {
    /// Grayscale pooling grid; the weight vector has grid*grid entries plus
    /// a trailing bias.
    pooled_grid: usize,
    #[serde(default)]
    landmarks: Vec<Point>,
}

struct FaceModel {
    grid: usize,
    weights: Vec<f32>,
    bias: f32,
    landmarks: Vec<Point>,
}

impl FaceModel {
    fn load(model_dir: &Path) -> Result<Self, DocumentError> {
        let definition_path = model_dir.join(DEFINITION_FILE);
        let raw = fs::read_to_string(&definition_path)
            .map_err(|e| DocumentError::FaceModel(format!("{}: {}", definition_path.display(), e)))?;
        let definition: ModelDefinition = serde_json::from_str(&raw)
            .map_err(|e| DocumentError::FaceModel(format!("bad model definition: {}", e)))?;

        if definition.pooled_grid == 0 || FRAME_SIZE % definition.pooled_grid != 0 {
            return Err(DocumentError::FaceModel(format!(
                "pooling grid {} does not divide the frame",
                definition.pooled_grid
            )));
        }

        let weights_path = model_dir.join(WEIGHTS_FILE);
        let bytes = fs::read(&weights_path)
            .map_err(|e| DocumentError::FaceModel(format!("{}: {}", weights_path.display(), e)))?;
        let expected = (definition.pooled_grid * definition.pooled_grid + 1) * 4;
        if bytes.len() != expected {
            return Err(DocumentError::FaceModel(format!(
                "weights file has {} bytes, expected {}",
                bytes.len(),
                expected
            )));
        }

        let mut floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let bias = floats.pop().unwrap_or(0.0);

        Ok(FaceModel {
            grid: definition.pooled_grid,
            weights: floats,
            bias,
            landmarks: definition.landmarks,
        })
    }

    fn confidence(&self, frame: &PixelFrame) -> f64 {
        let pooled = average_pool(&frame.grayscale(), self.grid);
        let logit = self.bias as f64
            + self
                .weights
                .iter()
                .zip(pooled.iter())
                .map(|(&w, &x)| w as f64 * x)
                .sum::<f64>();
        sigmoid(logit)
    }
}

/// Face presence estimation over the document frame. Model load and
/// inference failures never propagate; the detector degrades to a
/// no-face-found result.
pub struct FaceDetector {
    model: Option<FaceModel>,
}

impl FaceDetector {
    pub fn new(model_dir: &Path) -> Self {
        match FaceModel::load(model_dir) {
            Ok(model) => {
                info!("Face model loaded from {}", model_dir.display());
                FaceDetector { model: Some(model) }
            }
            Err(e) => {
                warn!("{}; face detection disabled for this process", e);
                FaceDetector { model: None }
            }
        }
    }

    pub fn detect(&self, frame: &PixelFrame) -> FaceDetectionResult {
        let Some(model) = &self.model else {
            return FaceDetectionResult::default();
        };

        let confidence = model.confidence(frame).clamp(0.0, 1.0);
        let face_detected = confidence > DETECTION_THRESHOLD;
        let landmarks = if face_detected {
            model.landmarks.clone()
        } else {
            Vec::new()
        };

        FaceDetectionResult {
            face_detected,
            confidence,
            landmarks,
        }
    }
}

fn average_pool(gray: &[f32], grid: usize) -> Vec<f64> {
    let block = FRAME_SIZE / grid;
    let mut pooled = vec![0.0f64; grid * grid];
    for (i, &v) in gray.iter().enumerate() {
        let row = i / FRAME_SIZE;
        let col = i % FRAME_SIZE;
        pooled[(row / block) * grid + col / block] += v as f64;
    }
    let per_block = (block * block) as f64;
    for v in &mut pooled {
        *v /= per_block;
    }
    pooled
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
