//! Speech-to-Text adapters and the speech capturer.
//!
//! Provides a common `SttEngine` trait with implementations for:
//! - Chromium web speech endpoint (keyless default)
//! - OpenAI-compatible transcription API (OpenAI, Groq)
//! - Custom user-configured endpoint

pub mod cloud;
pub mod listener;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use listener::{ListenSettings, RecognitionResult, SpeechCapturer};

/// Transcription failures, split the way callers report them.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// The remote service failed: network, auth, quota, bad status.
    #[error("{0}")]
    Service(String),
    /// Anything else (encoding, unexpected payloads).
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TranscribeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Other(format!("unreadable response: {err}"))
        } else {
            Self::Service(format!("recognition request failed: {err}"))
        }
    }
}

/// Common trait for all STT engines (dyn-compatible).
pub trait SttEngine: Send + Sync {
    /// Transcribe 16 kHz mono f32 audio. `locale` is a BCP-47 tag such as
    /// `en-US`. An empty string means nothing intelligible was heard.
    fn transcribe(
        &self,
        audio: Vec<f32>,
        locale: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String, TranscribeError>> + Send + '_>>;

    /// Display name for logs.
    fn name(&self) -> String;
}

/// Stand-in for a speech adapter that could not be built from config.
///
/// Every transcription fails with the setup error, so only voice chat is
/// affected.
pub struct UnavailableStt {
    reason: String,
}

impl UnavailableStt {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SttEngine for UnavailableStt {
    fn transcribe(
        &self,
        _audio: Vec<f32>,
        _locale: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String, TranscribeError>> + Send + '_>> {
        Box::pin(async move {
            Err(TranscribeError::Service(format!(
                "speech recognition unavailable: {}",
                self.reason
            )))
        })
    }

    fn name(&self) -> String {
        "unavailable".into()
    }
}

/// Create an STT engine from config values.
///
/// `adapter` is one of: "google-web", "openai-cloud", "custom-cloud".
pub fn create_stt_engine(
    adapter: &str,
    api_key: Option<&str>,
    endpoint: Option<&str>,
    model: Option<&str>,
) -> anyhow::Result<Box<dyn SttEngine>> {
    match adapter {
        "google-web" => Ok(Box::new(cloud::GoogleWebStt::new(api_key, endpoint))),
        "openai-cloud" => {
            let key = api_key
                .ok_or_else(|| anyhow::anyhow!("OpenAI-compatible STT requires an API key"))?;
            Ok(Box::new(cloud::OpenAiStt::new(key, endpoint, model)))
        }
        "custom-cloud" => {
            let url = endpoint
                .ok_or_else(|| anyhow::anyhow!("Custom STT requires an endpoint URL"))?;
            Ok(Box::new(cloud::CustomApiStt::new(
                url,
                api_key.map(|s| s.to_string()),
                model,
            )))
        }
        other => anyhow::bail!("Unknown STT adapter: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_known_adapters() {
        let google = create_stt_engine("google-web", None, None, None).unwrap();
        assert!(google.name().contains("Google"));

        let openai = create_stt_engine("openai-cloud", Some("k"), None, None).unwrap();
        assert!(openai.name().contains("whisper"));

        let custom =
            create_stt_engine("custom-cloud", None, Some("http://127.0.0.1:9/stt"), None).unwrap();
        assert!(custom.name().contains("127.0.0.1"));
    }

    #[test]
    fn test_create_rejects_missing_requirements() {
        assert!(create_stt_engine("openai-cloud", None, None, None).is_err());
        assert!(create_stt_engine("custom-cloud", Some("k"), None, None).is_err());
        assert!(create_stt_engine("vosk", None, None, None).is_err());
    }

    #[tokio::test]
    async fn test_unavailable_engine_reports_service_error() {
        let stt = UnavailableStt::new("OpenAI-compatible STT requires an API key");
        match stt.transcribe(vec![0.0; 160], "en-US").await {
            Err(TranscribeError::Service(msg)) => assert!(msg.contains("requires an API key")),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
