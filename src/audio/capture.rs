//! Microphone capture via cpal.
//!
//! Opens the default (or named) input device at its native rate, down-mixes
//! to mono, resamples to 16 kHz and pushes samples into a ring buffer that
//! the capture loop polls.

use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{error, info};

use super::ring_buffer::{audio_ring_buffer, AudioConsumer};
use super::{AudioSource, AudioStream, CaptureError, TARGET_SAMPLE_RATE};

/// List available input device names.
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut names = Vec::new();
    if let Ok(devices) = host.input_devices() {
        for dev in devices {
            if let Ok(name) = dev.name() {
                names.push(name);
            }
        }
    }
    names
}

/// List available output device names.
pub fn list_output_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut names = Vec::new();
    if let Ok(devices) = host.output_devices() {
        for dev in devices {
            if let Ok(name) = dev.name() {
                names.push(name);
            }
        }
    }
    names
}

/// The system microphone as an [`AudioSource`].
#[derive(Debug, Clone, Default)]
pub struct Microphone {
    device_name: Option<String>,
}

impl Microphone {
    /// `None` selects the system default input.
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl AudioSource for Microphone {
    fn open(&self) -> Result<Box<dyn AudioStream>, CaptureError> {
        let (producer, consumer) = audio_ring_buffer(None);
        let stream = start_capture(producer, self.device_name.as_deref())?;
        Ok(Box::new(MicrophoneStream {
            _stream: stream,
            consumer,
        }))
    }
}

/// Keeps the cpal stream alive for as long as samples are being read.
struct MicrophoneStream {
    _stream: Stream,
    consumer: AudioConsumer,
}

impl AudioStream for MicrophoneStream {
    fn read(&mut self, wait: Duration) -> Result<Vec<f32>, CaptureError> {
        if self.consumer.available() == 0 {
            std::thread::sleep(wait);
        }
        Ok(self.consumer.drain_all())
    }
}

struct CaptureConfig {
    device: cpal::Device,
    stream_config: StreamConfig,
    native_rate: u32,
}

fn resolve_device(device_name: Option<&str>) -> Result<CaptureConfig, CaptureError> {
    let host = cpal::default_host();

    let device = if let Some(name) = device_name {
        host.input_devices()
            .map_err(|e| CaptureError::Device(format!("failed to enumerate input devices: {e}")))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| CaptureError::Device(format!("input device not found: {name}")))?
    } else {
        host.default_input_device()
            .ok_or_else(|| CaptureError::Device("no default input device available".into()))?
    };

    let dev_name = device.name().unwrap_or_else(|_| "unknown".into());
    info!(device = %dev_name, "Selected input device");

    let default_config = device
        .default_input_config()
        .map_err(|e| CaptureError::Device(format!("failed to get default input config: {e}")))?;

    let native_rate = default_config.sample_rate().0;
    let stream_config = StreamConfig {
        channels: default_config.channels(),
        sample_rate: cpal::SampleRate(native_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    Ok(CaptureConfig {
        device,
        stream_config,
        native_rate,
    })
}

/// Linear resampler over mono f32 samples.
pub(crate) fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return input.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).floor() as usize;
    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_idx = i as f64 * ratio;
        let idx0 = src_idx.floor() as usize;
        let frac = (src_idx - idx0 as f64) as f32;
        let s0 = input.get(idx0).copied().unwrap_or(0.0);
        let s1 = input.get(idx0 + 1).copied().unwrap_or(s0);
        output.push(s0 + frac * (s1 - s0));
    }
    output
}

/// Average interleaved channels down to mono.
pub(crate) fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

fn start_capture(
    mut producer: super::AudioProducer,
    device_name: Option<&str>,
) -> Result<Stream, CaptureError> {
    let cfg = resolve_device(device_name)?;
    let native_rate = cfg.native_rate;
    let channels = cfg.stream_config.channels;

    info!(
        native_rate,
        channels,
        "Input config (resampling to {}Hz mono)",
        TARGET_SAMPLE_RATE
    );

    let stream = cfg
        .device
        .build_input_stream(
            &cfg.stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let mono = to_mono(data, channels);
                let resampled = resample_linear(&mono, native_rate, TARGET_SAMPLE_RATE);
                producer.push_slice(&resampled);
            },
            move |err| {
                error!("Audio input stream error: {}", err);
            },
            None,
        )
        .map_err(|e| CaptureError::Device(format!("failed to build input stream: {e}")))?;

    stream
        .play()
        .map_err(|e| CaptureError::Device(format!("failed to start input stream: {e}")))?;

    info!("Audio capture started");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_same_rate() {
        let input = vec![1.0, 2.0, 3.0];
        assert_eq!(resample_linear(&input, 16_000, 16_000), input);
    }

    #[test]
    fn test_resample_48k_to_16k() {
        let input: Vec<f32> = (0..48).map(|i| i as f32).collect();
        let output = resample_linear(&input, 48_000, 16_000);
        assert_eq!(output.len(), 16);
        assert_eq!(output[1], 3.0);
    }

    #[test]
    fn test_to_mono_averages_frames() {
        let stereo = [0.2, 0.4, -1.0, 1.0];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert_eq!(mono[1], 0.0);
    }

    #[test]
    fn test_device_listing_does_not_panic() {
        // CI machines usually have no audio hardware; only check it returns.
        let _ = list_input_devices();
        let _ = list_output_devices();
    }
}
