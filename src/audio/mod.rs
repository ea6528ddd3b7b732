//! Audio input: source abstraction, cpal microphone, ring buffer and the
//! capture state machine.

pub mod capture;
pub mod ring_buffer;
pub mod state;

use std::time::Duration;

use thiserror::Error;

pub use capture::{list_input_devices, list_output_devices, Microphone};
pub use ring_buffer::{audio_ring_buffer, AudioConsumer, AudioProducer};
pub use state::{CaptureState, CaptureStateMachine};

/// Sample rate every `AudioStream` delivers.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// No usable input device, or the device refused to open.
    #[error("audio input unavailable: {0}")]
    Device(String),
    /// The stream failed after it was opened.
    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Something that can be opened to produce 16 kHz mono audio.
///
/// `open` may be called more than once per capture (calibration and
/// listening each open their own stream).
pub trait AudioSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn AudioStream>, CaptureError>;
}

/// An open input stream. Not required to be `Send`; it lives on the thread
/// that opened it.
pub trait AudioStream {
    /// Return whatever samples arrived, waiting up to `wait` for the first
    /// one. An empty vec means nothing arrived in time.
    fn read(&mut self, wait: Duration) -> Result<Vec<f32>, CaptureError>;
}
