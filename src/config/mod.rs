//! Configuration reading and data directory paths.
//!
//! Two sources, both read once at process start:
//! - `.env` / process environment for the completion credential
//!   (see [`crate::llm::CompletionConfig::from_env`]);
//! - `assistant_config.json` in the data directory for engine selection.

pub mod paths;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use paths::get_data_dir;

/// Top-level assistant_config.json shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    #[serde(default)]
    pub narration: NarrationConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tts_adapter")]
    pub adapter: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub output_device: Option<String>,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            adapter: default_tts_adapter(),
            voice: None,
            api_key: None,
            endpoint: None,
            output_device: None,
        }
    }
}

/// Speech recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    #[serde(default = "default_stt_adapter")]
    pub adapter: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub input_device: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            adapter: default_stt_adapter(),
            api_key: None,
            endpoint: None,
            model: None,
            locale: default_locale(),
            input_device: None,
        }
    }
}

/// OCR engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    #[serde(default = "default_tesseract_cmd")]
    pub tesseract_cmd: String,
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: default_tesseract_cmd(),
            language: default_ocr_language(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tts_adapter() -> String {
    "espeak".into()
}

fn default_stt_adapter() -> String {
    "google-web".into()
}

fn default_locale() -> String {
    "en-US".into()
}

fn default_tesseract_cmd() -> String {
    "tesseract".into()
}

fn default_ocr_language() -> String {
    "eng".into()
}

/// Load `.env` into the process environment, if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env: {}", e),
    }
}

/// Read assistant_config.json from the data directory.
pub fn read_assistant_config() -> AssistantConfig {
    read_config_from(&get_config_path())
}

/// Read an assistant config from an explicit path, falling back to defaults.
pub fn read_config_from(path: &Path) -> AssistantConfig {
    read_json_file(path).unwrap_or_default()
}

/// Path to assistant_config.json.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("assistant_config.json")
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}
