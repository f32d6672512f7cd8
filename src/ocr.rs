// src/ocr.rs

use sha2::{Digest, Sha256};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Result of asking the OCR backend for the text on a register photo.
#[derive(Debug)]
pub enum OcrContent {
    /// The backend produced text (possibly empty — a blank page is a
    /// valid, reportable observation, not a failure).
    Text(String),
    /// The backend could not run at all.
    Unavailable(String),
}

/// Run the external `tesseract` binary over the image. The OCR engine
/// is a black box here: one pixel grid in, one text string out, with a
/// documented but opaque error rate.
pub fn extract_text(image: &Path, languages: &str) -> OcrContent {
    let output = match Command::new("tesseract")
        .arg(image)
        .arg("stdout")
        .arg("-l")
        .arg(languages)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            return OcrContent::Unavailable(format!(
                "failed to run tesseract (is it installed?): {e}"
            ));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return OcrContent::Unavailable(format!("tesseract failed: {}", stderr.trim()));
    }

    OcrContent::Text(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Absorb an unavailable OCR backend into empty text. Callers still get
/// a valid (empty) report; the failure is surfaced as a warning, not
/// propagated.
pub fn recover_text(image: &Path, languages: &str) -> String {
    match extract_text(image, languages) {
        OcrContent::Text(text) => {
            info!(chars = text.len(), "OCR text extracted");
            text
        }
        OcrContent::Unavailable(reason) => {
            warn!(reason = %reason, "OCR backend unavailable — continuing with empty text");
            String::new()
        }
    }
}

/// The OCR-produced text for one uploaded image, immutable once built.
#[derive(Debug, Clone)]
pub struct Observation {
    pub uid: String,
    pub source: String,
    pub text: String,
}

impl Observation {
    pub fn new(source: &str, text: String) -> Self {
        let uid = Self::generate_uid(source, &text);
        Self {
            uid,
            source: source.to_string(),
            text,
        }
    }

    /// Deterministic ID from the source identifier and the text.
    fn generate_uid(source: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
