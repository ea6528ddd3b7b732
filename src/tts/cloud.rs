//! OpenAI-compatible speech synthesis (`/audio/speech`).

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use super::{Speech, TtsEngine};

const OPENAI_SPEECH_ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";

/// The `pcm` response format is raw 24 kHz 16-bit mono.
const PCM_SAMPLE_RATE: u32 = 24_000;

/// Words per minute the API's `speed = 1.0` roughly corresponds to.
const NORMAL_RATE_WPM: f32 = 200.0;

/// OpenAI TTS API (paid cloud synthesis).
pub struct OpenAiTts {
    api_key: String,
    voice: String,
    model: String,
    endpoint: String,
    speed: f32,
    client: reqwest::Client,
}

impl OpenAiTts {
    pub fn new(api_key: &str, voice: &str, endpoint: Option<&str>, rate_wpm: u32) -> Self {
        Self {
            api_key: api_key.to_string(),
            voice: voice.to_string(),
            model: "tts-1".to_string(),
            endpoint: endpoint.unwrap_or(OPENAI_SPEECH_ENDPOINT).to_string(),
            speed: rate_wpm as f32 / NORMAL_RATE_WPM,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
            "response_format": "pcm",
            "speed": self.speed,
        })
    }
}

fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / 32768.0)
        .collect()
}

impl TtsEngine for OpenAiTts {
    fn speak(&self, text: &str) -> Pin<Box<dyn Future<Output = anyhow::Result<Speech>> + Send + '_>> {
        let text = text.to_string();
        Box::pin(async move {
            if text.trim().is_empty() {
                return Ok(Speech::default());
            }

            info!(voice = %self.voice, text_len = text.len(), "OpenAI TTS request");

            let resp = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&self.request_body(&text))
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("OpenAI TTS request failed: {}", e))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("OpenAI TTS API error {}: {}", status, body);
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read OpenAI TTS response: {}", e))?;

            let samples = pcm16_to_f32(&bytes);
            info!(samples = samples.len(), "OpenAI TTS synthesis complete");
            Ok(Speech {
                samples,
                sample_rate: PCM_SAMPLE_RATE,
            })
        })
    }

    fn name(&self) -> String {
        format!("OpenAI TTS ({})", self.voice)
    }
}
