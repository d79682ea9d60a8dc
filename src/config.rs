use std::env;
use std::path::PathBuf;

/// Which fraud score source backs the signal pipeline. The two are never
/// mixed within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSourceKind {
    /// Deterministic Sobel/pattern/color analysis of the pixel frame.
    Signal,
    /// Bounded pseudo-random scores. Demo and test deployments only.
    RandomStub,
}

/// Runtime configuration, read once from `DOCUVET_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Passed to tesseract as the datapath (TESSDATA_PREFIX equivalent).
    pub tessdata_path: Option<String>,
    pub ocr_language: String,
    /// Directory holding the classifier and face model definition/weight
    /// file pairs. Missing files fall back to heuristics, never abort.
    pub model_dir: PathBuf,
    pub score_source: ScoreSourceKind,
    /// When set, internal error messages are exposed at the API boundary.
    pub development_mode: bool,
    /// Enables the known-fixtures table ahead of the general cascades.
    pub fixtures_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tessdata_path: None,
            ocr_language: "eng".to_string(),
            model_dir: PathBuf::from("models"),
            score_source: ScoreSourceKind::Signal,
            development_mode: false,
            fixtures_enabled: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(path) = env::var("DOCUVET_TESSDATA") {
            config.tessdata_path = Some(path);
        }
        if let Ok(lang) = env::var("DOCUVET_OCR_LANG") {
            config.ocr_language = lang;
        }
        if let Ok(dir) = env::var("DOCUVET_MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }
        if let Ok(source) = env::var("DOCUVET_SCORE_SOURCE") {
            config.score_source = match source.as_str() {
                "random_stub" => ScoreSourceKind::RandomStub,
                _ => ScoreSourceKind::Signal,
            };
        }
        if let Ok(mode) = env::var("DOCUVET_ENV") {
            config.development_mode = mode == "development";
        }
        if let Ok(flag) = env::var("DOCUVET_FIXTURES") {
            config.fixtures_enabled = flag != "0" && flag != "false";
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_production_settings() {
        let config = Config::default();
        assert_eq!(config.score_source, ScoreSourceKind::Signal);
        assert!(!config.development_mode);
        assert_eq!(config.ocr_language, "eng");
    }
}
