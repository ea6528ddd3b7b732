//! Text-to-Speech adapters, playback and the narration worker.
//!
//! Provides a common `TtsEngine` trait with implementations for:
//! - Local eSpeak NG synthesis (keyless default)
//! - OpenAI-compatible speech API

pub mod cloud;
pub mod espeak;
pub mod narrator;
pub mod playback;

use std::future::Future;
use std::pin::Pin;

pub use narrator::{NarrationError, NarrationJob, Narrator};
pub use playback::{AudioPlayer, AudioSink};

/// Speaking rate in words per minute.
pub const SPEECH_RATE_WPM: u32 = 150;

/// Output volume, 0.0..=1.0.
pub const SPEECH_VOLUME: f32 = 0.9;

/// Synthesized mono audio.
#[derive(Debug, Clone, Default)]
pub struct Speech {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Common trait for all TTS engines (dyn-compatible).
pub trait TtsEngine: Send + Sync {
    /// Synthesize text to mono f32 PCM.
    fn speak(&self, text: &str) -> Pin<Box<dyn Future<Output = anyhow::Result<Speech>> + Send + '_>>;

    /// Display name for this engine (e.g. "eSpeak NG (en-us)").
    fn name(&self) -> String;
}

/// Create a TTS engine from config values.
///
/// `adapter` is one of: "espeak", "openai-tts".
pub fn create_tts_engine(
    adapter: &str,
    voice: Option<&str>,
    api_key: Option<&str>,
    endpoint: Option<&str>,
) -> anyhow::Result<Box<dyn TtsEngine>> {
    match adapter {
        "espeak" => Ok(Box::new(espeak::EspeakTts::new(
            espeak::DEFAULT_COMMAND,
            voice,
            SPEECH_RATE_WPM,
        ))),
        "openai-tts" => {
            let key = api_key
                .ok_or_else(|| anyhow::anyhow!("OpenAI TTS requires an API key"))?;
            let v = voice.unwrap_or("alloy");
            Ok(Box::new(cloud::OpenAiTts::new(key, v, endpoint, SPEECH_RATE_WPM)))
        }
        other => anyhow::bail!("Unknown TTS adapter: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_known_adapters() {
        let espeak = create_tts_engine("espeak", Some("en-us"), None, None).unwrap();
        assert!(espeak.name().contains("en-us"));

        let openai = create_tts_engine("openai-tts", None, Some("k"), None).unwrap();
        assert!(openai.name().contains("alloy"));
    }

    #[test]
    fn test_create_rejects_unknown_or_unkeyed() {
        assert!(create_tts_engine("openai-tts", None, None, None).is_err());
        assert!(create_tts_engine("festival", None, None, None).is_err());
    }
}
