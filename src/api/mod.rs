//! Interface boundary for the HTTP collaborator. Routing, multipart parsing
//! and CORS live outside this crate; this module provides the request
//! decoding, upload persistence and response shaping the routes delegate to.

use crate::models::ExtractedData;
use crate::utils::DocumentError;
use crate::DocumentProcessor;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use log::warn;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// The two accepted request forms of `POST /api/documents/extract`.
#[derive(Debug)]
pub enum ExtractRequest {
    /// Multipart `document` field, already persisted by the upload layer.
    UploadedFile(PathBuf),
    /// JSON body `{"image": "<base64 data URL>"}`.
    InlineImage(String),
}

#[derive(Debug, Deserialize)]
pub struct InlineImageBody {
    pub image: String,
}

/// Status code plus JSON body, ready for the transport layer to send.
#[derive(Debug)]
pub struct ExtractResponse {
    pub status: u16,
    pub body: Value,
}

/// Temp-directory persistence for uploaded images. Files are named with a
/// timestamp plus sequence number; `cleanup_all` is the interrupt-time
/// best-effort sweep.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(UploadStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self, bytes: &[u8]) -> Result<PathBuf, DocumentError> {
        let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = format!("document-{}-{}.png", Utc::now().timestamp_millis(), seq);
        let path = self.dir.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Deletes every file currently in the upload directory. Individual
    /// failures are logged and skipped, never propagated.
    pub fn cleanup_all(&self) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Upload cleanup skipped: {}", e);
                return;
            }
        };
        for entry in entries.flatten() {
            if let Err(e) = fs::remove_file(entry.path()) {
                warn!("Failed to remove {}: {}", entry.path().display(), e);
            }
        }
    }
}

/// Strips the `data:<mime>;base64,` prefix when present and decodes the
/// payload.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, DocumentError> {
    let payload = data_url
        .split_once(',')
        .map(|(_, p)| p)
        .unwrap_or(data_url);
    STANDARD
        .decode(payload.trim())
        .map_err(|e| DocumentError::Extraction(format!("Invalid base64 image payload: {}", e)))
}

/// The extract endpoint: resolve the image to a stored file, run the text
/// pipeline, shape the response.
pub fn handle_extract(
    processor: &mut DocumentProcessor,
    store: &UploadStore,
    request: ExtractRequest,
) -> ExtractResponse {
    let development_mode = processor.config().development_mode;
    let result = resolve_image_path(store, request).and_then(|path| processor.extract(&path));
    response_for(result, development_mode)
}

fn resolve_image_path(
    store: &UploadStore,
    request: ExtractRequest,
) -> Result<PathBuf, DocumentError> {
    match request {
        ExtractRequest::UploadedFile(path) => Ok(path),
        ExtractRequest::InlineImage(data_url) => {
            let bytes = decode_data_url(&data_url)?;
            store.store(&bytes)
        }
    }
}

/// Validation failures expose their full violation list; anything else is a
/// masked internal error whose detail appears only in development mode.
pub fn response_for(
    result: Result<ExtractedData, DocumentError>,
    development_mode: bool,
) -> ExtractResponse {
    match result {
        Ok(data) => ExtractResponse {
            status: 200,
            body: serde_json::to_value(data).unwrap_or_else(|_| json!({})),
        },
        Err(DocumentError::Validation(violations)) => ExtractResponse {
            status: 400,
            body: json!({
                "error": "Validation Error",
                "message": violations.join(", "),
            }),
        },
        Err(e) => {
            warn!("Extraction request failed: {}", e);
            let mut body = json!({ "error": "Internal Server Error" });
            if development_mode {
                body["message"] = json!(e.to_string());
            }
            ExtractResponse { status: 500, body }
        }
    }
}
