//! Image-to-text pipeline: preprocessing plus OCR.

pub mod normalize;
pub mod ocr;

use std::fmt;
use std::sync::Arc;

use image::GrayImage;
use thiserror::Error;
use tracing::{info, warn};

pub use normalize::normalize;
pub use ocr::{create_ocr_engine, OcrEngine, OcrError, TesseractCli};

/// Shown when OCR finds nothing but whitespace.
pub const NO_TEXT_DETECTED: &str = "No text detected in the image.";

/// Errors from the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("{0}")]
    EngineUnavailable(String),
    #[error("{0}")]
    Ocr(String),
}

impl From<OcrError> for ExtractError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::Unavailable(_) => Self::EngineUnavailable(err.to_string()),
            OcrError::Failed(_) => Self::Ocr(err.to_string()),
        }
    }
}

/// Outcome of a successful OCR pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Trimmed, non-empty text.
    Text(String),
    /// The engine returned only whitespace. Not an error.
    NoTextDetected,
}

impl Extraction {
    fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::NoTextDetected
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    /// The recognized text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::NoTextDetected => None,
        }
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::NoTextDetected => f.write_str(NO_TEXT_DETECTED),
        }
    }
}

/// Runs OCR over normalized rasters. Cheap to clone.
#[derive(Clone)]
pub struct TextExtractor {
    engine: Arc<dyn OcrEngine>,
}

impl TextExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    /// Extract text from an already-normalized raster.
    pub fn extract(&self, raster: &GrayImage) -> Result<Extraction, ExtractError> {
        let raw = self.engine.recognize(raster).map_err(|e| {
            warn!(engine = %self.engine.name(), "OCR failed: {}", e);
            ExtractError::from(e)
        })?;
        let extraction = Extraction::from_raw(&raw);
        info!(
            engine = %self.engine.name(),
            found = extraction.text().is_some(),
            chars = extraction.text().map(str::len).unwrap_or(0),
            "OCR complete"
        );
        Ok(extraction)
    }

    /// Decode, normalize and extract in one step.
    pub fn extract_image(&self, bytes: &[u8]) -> Result<Extraction, ExtractError> {
        let raster = normalize(bytes)?;
        self.extract(&raster)
    }

    /// Blocking-pool variant for async callers; OCR is CPU- and process-bound.
    pub async fn extract_image_async(&self, bytes: Vec<u8>) -> Result<Extraction, ExtractError> {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract_image(&bytes))
            .await
            .map_err(|e| ExtractError::Ocr(format!("OCR task failed: {e}")))?
    }
}
