//! Audio playback via rodio.
//!
//! Plays f32 PCM audio through the default (or named) output device.

use rodio::buffer::SamplesBuffer;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::info;

/// Where synthesized speech goes. `play` blocks until playback finishes.
pub trait AudioSink {
    fn play(&self, samples: &[f32], sample_rate: u32) -> anyhow::Result<()>;
}

/// Audio player that plays f32 PCM samples through an output device.
///
/// Holds a rodio `OutputStream`, which is not `Send`: create it on the
/// thread that plays.
pub struct AudioPlayer {
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    sink: Sink,
}

impl AudioPlayer {
    /// Open an output device. `None` selects the system default.
    pub fn new(device_name: Option<&str>, volume: f32) -> anyhow::Result<Self> {
        let (stream, stream_handle) = match device_name {
            Some(name) => {
                let host = rodio::cpal::default_host();
                let device = host
                    .output_devices()
                    .map_err(|e| anyhow::anyhow!("Failed to enumerate output devices: {}", e))?
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow::anyhow!("Output device not found: {}", name))?;
                OutputStream::try_from_device(&device)
                    .map_err(|e| anyhow::anyhow!("Failed to open audio output '{}': {}", name, e))?
            }
            None => OutputStream::try_default()
                .map_err(|e| anyhow::anyhow!("Failed to open audio output: {}", e))?,
        };
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| anyhow::anyhow!("Failed to create audio sink: {}", e))?;
        sink.set_volume(volume.clamp(0.0, 1.0));

        info!(device = device_name.unwrap_or("default"), volume, "Audio output opened");

        Ok(Self {
            _stream: stream,
            _stream_handle: stream_handle,
            sink,
        })
    }
}

impl AudioSink for AudioPlayer {
    fn play(&self, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        if sample_rate == 0 {
            anyhow::bail!("cannot play audio with a zero sample rate");
        }

        let source = SamplesBuffer::new(1, sample_rate, samples.to_vec());
        self.sink.append(source);
        self.sink.sleep_until_end();
        Ok(())
    }
}
