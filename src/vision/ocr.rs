//! OCR engine backends.
//!
//! Every backend runs Tesseract with OEM 3 (best available model) and PSM 6
//! (assume a single uniform block of text):
//! - `TesseractCli` spawns the tesseract executable (default)
//! - `LeptessOcr` links libtesseract in-process (behind the `leptess` feature)

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::{GrayImage, ImageFormat};
use thiserror::Error;
use tracing::debug;

/// Tesseract OCR engine mode: default, best available.
pub const ENGINE_MODE: &str = "3";

/// Tesseract page segmentation mode: single uniform block of text.
pub const PAGE_SEG_MODE: &str = "6";

#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine could not be started at all (missing binary or library).
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),
    /// The engine ran but failed on this raster.
    #[error("OCR failed: {0}")]
    Failed(String),
}

/// Common trait for OCR backends.
pub trait OcrEngine: Send + Sync {
    /// Recognize text in a single-channel raster. Output is untrimmed.
    fn recognize(&self, raster: &GrayImage) -> Result<String, OcrError>;

    /// Display name for logs.
    fn name(&self) -> String;
}

/// Encode a raster as PNG for engines that take container formats.
fn encode_png(raster: &GrayImage) -> Result<Vec<u8>, OcrError> {
    let mut png = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| OcrError::Failed(format!("failed to encode raster: {e}")))?;
    Ok(png)
}

// ---------------------------------------------------------------------------
// tesseract executable
// ---------------------------------------------------------------------------

/// Runs `tesseract stdin stdout --oem 3 --psm 6 -l <lang>`.
pub struct TesseractCli {
    command: String,
    language: String,
}

impl TesseractCli {
    pub fn new(command: &str, language: &str) -> Self {
        Self {
            command: command.to_string(),
            language: language.to_string(),
        }
    }

    fn args(&self) -> Vec<&str> {
        vec![
            "stdin",
            "stdout",
            "--oem",
            ENGINE_MODE,
            "--psm",
            PAGE_SEG_MODE,
            "-l",
            &self.language,
        ]
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, raster: &GrayImage) -> Result<String, OcrError> {
        let png = encode_png(raster)?;
        debug!(
            command = %self.command,
            bytes = png.len(),
            "Running tesseract"
        );

        let mut child = Command::new(&self.command)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrError::Unavailable(format!(
                        "{} not found; is Tesseract installed?",
                        self.command
                    ))
                } else {
                    OcrError::Unavailable(format!("failed to start {}: {e}", self.command))
                }
            })?;

        // Feed stdin from a separate thread so a chatty stderr can't deadlock us.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Failed("tesseract stdin unavailable".into()))?;
        let writer = std::thread::spawn(move || stdin.write_all(&png));

        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::Failed(format!("tesseract did not finish: {e}")))?;

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(OcrError::Failed(format!("failed to send raster: {e}"))),
            Err(_) => return Err(OcrError::Failed("raster writer panicked".into())),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> String {
        format!("tesseract ({})", self.command)
    }
}

// ---------------------------------------------------------------------------
// libtesseract via leptess
// ---------------------------------------------------------------------------

#[cfg(feature = "leptess")]
mod inner {
    use image::GrayImage;
    use leptess::{LepTess, Variable};

    use super::{encode_png, OcrEngine, OcrError, PAGE_SEG_MODE};

    /// In-process Tesseract. A fresh `LepTess` is created per call since the
    /// handle is not `Sync`.
    pub struct LeptessOcr {
        language: String,
    }

    impl LeptessOcr {
        pub fn new(language: &str) -> Self {
            Self {
                language: language.to_string(),
            }
        }
    }

    impl OcrEngine for LeptessOcr {
        fn recognize(&self, raster: &GrayImage) -> Result<String, OcrError> {
            let mut tess = LepTess::new(None, &self.language)
                .map_err(|e| OcrError::Unavailable(format!("failed to initialize Tesseract: {e}")))?;
            tess.set_variable(Variable::TesseditPagesegMode, PAGE_SEG_MODE)
                .map_err(|e| OcrError::Failed(format!("failed to set page segmentation: {e}")))?;

            let png = encode_png(raster)?;
            tess.set_image_from_mem(&png)
                .map_err(|e| OcrError::Failed(format!("failed to load raster: {e}")))?;
            tess.set_source_resolution(300);

            tess.get_utf8_text()
                .map_err(|e| OcrError::Failed(format!("failed to read text: {e}")))
        }

        fn name(&self) -> String {
            format!("libtesseract ({})", self.language)
        }
    }
}

#[cfg(feature = "leptess")]
pub use inner::LeptessOcr;

/// Create an OCR engine. With the `leptess` feature the in-process engine is
/// used; otherwise the configured tesseract executable.
pub fn create_ocr_engine(tesseract_cmd: &str, language: &str) -> Box<dyn OcrEngine> {
    #[cfg(feature = "leptess")]
    {
        let _ = tesseract_cmd;
        Box::new(LeptessOcr::new(language))
    }
    #[cfg(not(feature = "leptess"))]
    {
        Box::new(TesseractCli::new(tesseract_cmd, language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_cli_args_request_uniform_block() {
        let cli = TesseractCli::new("tesseract", "eng");
        assert_eq!(
            cli.args(),
            vec!["stdin", "stdout", "--oem", "3", "--psm", "6", "-l", "eng"]
        );
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let cli = TesseractCli::new("/nonexistent/assistant-core/tesseract", "eng");
        let raster = GrayImage::from_pixel(8, 8, Luma([255]));
        let err = cli.recognize(&raster).unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
        assert!(err.to_string().contains("Tesseract"));
    }

    #[test]
    fn test_png_encoding_roundtrips_dimensions() {
        let raster = GrayImage::from_pixel(12, 5, Luma([7]));
        let png = encode_png(&raster).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 5));
    }
}
