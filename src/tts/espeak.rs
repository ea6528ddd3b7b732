//! Local synthesis through the `espeak-ng` executable.
//!
//! Text goes in on stdin, a WAV stream comes back on stdout. When stdout is a
//! pipe espeak cannot seek back to fix the RIFF sizes, so the data chunk is
//! read to the end of the buffer instead of trusting its header length.

use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::process::Stdio;

use hound::{SampleFormat, WavReader};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{Speech, TtsEngine};

pub const DEFAULT_COMMAND: &str = "espeak-ng";

pub struct EspeakTts {
    command: String,
    voice: Option<String>,
    rate_wpm: u32,
}

impl EspeakTts {
    pub fn new(command: &str, voice: Option<&str>, rate_wpm: u32) -> Self {
        Self {
            command: command.to_string(),
            voice: voice.map(str::to_string),
            rate_wpm,
        }
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--stdout".to_string(),
            "-s".to_string(),
            self.rate_wpm.to_string(),
        ];
        if let Some(v) = &self.voice {
            args.push("-v".into());
            args.push(v.clone());
        }
        args
    }
}

impl TtsEngine for EspeakTts {
    fn speak(&self, text: &str) -> Pin<Box<dyn Future<Output = anyhow::Result<Speech>> + Send + '_>> {
        let text = text.to_string();
        Box::pin(async move {
            if text.trim().is_empty() {
                return Ok(Speech::default());
            }

            let mut child = Command::new(&self.command)
                .args(self.args())
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        anyhow::anyhow!("{} not found; is eSpeak NG installed?", self.command)
                    }
                    _ => anyhow::anyhow!("Failed to start {}: {}", self.command, e),
                })?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes()).await?;
                stdin.shutdown().await?;
            }

            let output = child.wait_with_output().await?;
            if !output.status.success() {
                anyhow::bail!(
                    "{} exited with {}: {}",
                    self.command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }

            let speech = decode_wav(&output.stdout)?;
            debug!(samples = speech.samples.len(), rate = speech.sample_rate, "eSpeak synthesis complete");
            Ok(speech)
        })
    }

    fn name(&self) -> String {
        format!("eSpeak NG ({})", self.voice.as_deref().unwrap_or("default"))
    }
}

/// Decode 16-bit PCM WAV into mono f32, averaging channels.
///
/// Samples are taken until the first read error, since a streamed header
/// claims more data than espeak actually wrote.
pub(crate) fn decode_wav(bytes: &[u8]) -> anyhow::Result<Speech> {
    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| anyhow::anyhow!("synthesizer output is not a WAV stream: {}", e))?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        anyhow::bail!(
            "unsupported WAV sample format: {:?} {} bits",
            spec.sample_format,
            spec.bits_per_sample
        );
    }

    let pcm: Vec<i16> = reader.samples::<i16>().map_while(Result::ok).collect();
    let channels = spec.channels.max(1) as usize;
    let samples = pcm
        .chunks_exact(channels)
        .map(|frame| frame.iter().map(|&s| s as f32 / 32768.0).sum::<f32>() / channels as f32)
        .collect();

    Ok(Speech {
        samples,
        sample_rate: spec.sample_rate,
    })
}
