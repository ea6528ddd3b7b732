//! Bounded speech capture: calibrate, listen for one phrase, recognize.
//!
//! The capture loop is blocking (it polls an [`AudioStream`]) and runs on the
//! tokio blocking pool. All durations are measured in consumed audio, so a
//! scripted source runs as fast as it can be read.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{SttEngine, TranscribeError};
use crate::audio::{AudioSource, CaptureError, CaptureState, CaptureStateMachine, TARGET_SAMPLE_RATE};
use crate::vad::EnergyThreshold;

/// Outcome of one `listen()` call. Exactly one per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionResult {
    /// Recognized speech, trimmed.
    Utterance(String),
    /// No speech started before the listen timeout.
    TimedOut,
    /// Audio was captured but the recognizer found nothing in it.
    Unintelligible,
    /// The recognition service failed.
    ServiceError(String),
    /// Device or unexpected failure.
    UnknownError(String),
}

#[derive(Debug, Clone)]
pub struct ListenSettings {
    /// Ambient noise sampling before listening.
    pub calibration: Duration,
    /// How long to wait for speech to start.
    pub timeout: Duration,
    /// Maximum phrase length once speech started.
    pub phrase_time_limit: Duration,
    /// Silence that ends a phrase.
    pub pause_threshold: Duration,
    /// Audio kept from before the onset.
    pub pre_roll: Duration,
    /// How long a read waits for samples.
    pub poll_interval: Duration,
    pub locale: String,
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            calibration: Duration::from_secs(1),
            timeout: Duration::from_secs(15),
            phrase_time_limit: Duration::from_secs(10),
            pause_threshold: Duration::from_millis(800),
            pre_roll: Duration::from_millis(500),
            poll_interval: Duration::from_millis(40),
            locale: "en-US".into(),
        }
    }
}

/// Callback invoked on every capture state change.
pub type StateObserver = Arc<dyn Fn(CaptureState) + Send + Sync>;

#[derive(Clone)]
struct Progress {
    state: Arc<CaptureStateMachine>,
    observer: Option<StateObserver>,
}

impl Progress {
    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer(self.state.current_state());
        }
    }

    fn listening(&self) {
        if self.state.start_listening() {
            self.notify();
        }
    }

    fn recognizing(&self) {
        if self.state.start_recognizing() {
            self.notify();
        }
    }

    fn finish(&self) {
        self.state.reset();
        self.notify();
    }
}

/// Records one utterance from an audio source and hands it to an STT engine.
pub struct SpeechCapturer {
    source: Arc<dyn AudioSource>,
    engine: Arc<dyn SttEngine>,
    settings: ListenSettings,
    progress: Progress,
}

impl SpeechCapturer {
    pub fn new(source: Arc<dyn AudioSource>, engine: Arc<dyn SttEngine>, settings: ListenSettings) -> Self {
        Self {
            source,
            engine,
            settings,
            progress: Progress {
                state: Arc::new(CaptureStateMachine::new()),
                observer: None,
            },
        }
    }

    pub fn with_observer(mut self, observer: StateObserver) -> Self {
        self.progress.observer = Some(observer);
        self
    }

    pub fn state(&self) -> CaptureState {
        self.progress.state.current_state()
    }

    pub fn engine_name(&self) -> String {
        self.engine.name()
    }

    /// Calibrate, capture one phrase and recognize it.
    pub async fn listen(&self) -> RecognitionResult {
        if !self.progress.state.begin() {
            return RecognitionResult::UnknownError("a capture is already in progress".into());
        }
        self.progress.notify();

        let result = self.run().await;
        self.progress.finish();

        match &result {
            RecognitionResult::Utterance(text) => info!(chars = text.len(), "Speech recognized"),
            RecognitionResult::TimedOut => info!("No speech before timeout"),
            other => warn!(outcome = ?other, "Speech capture did not produce text"),
        }
        result
    }

    async fn run(&self) -> RecognitionResult {
        let source = Arc::clone(&self.source);
        let settings = self.settings.clone();
        let progress = self.progress.clone();

        let captured = tokio::task::spawn_blocking(move || {
            capture_phrase(source.as_ref(), &settings, || progress.listening())
        })
        .await;

        let audio = match captured {
            Ok(Ok(Some(audio))) => audio,
            Ok(Ok(None)) => return RecognitionResult::TimedOut,
            Ok(Err(e)) => return RecognitionResult::UnknownError(e.to_string()),
            Err(e) => return RecognitionResult::UnknownError(format!("capture task failed: {e}")),
        };

        self.progress.recognizing();
        debug!(samples = audio.len(), engine = %self.engine.name(), "Recognizing phrase");

        match self.engine.transcribe(audio, &self.settings.locale).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    RecognitionResult::Unintelligible
                } else {
                    RecognitionResult::Utterance(text.to_string())
                }
            }
            Err(TranscribeError::Service(detail)) => RecognitionResult::ServiceError(detail),
            Err(TranscribeError::Other(detail)) => RecognitionResult::UnknownError(detail),
        }
    }
}

fn seconds(samples: usize) -> f32 {
    samples as f32 / TARGET_SAMPLE_RATE as f32
}

fn samples_for(d: Duration) -> usize {
    (d.as_secs_f32() * TARGET_SAMPLE_RATE as f32) as usize
}

/// Blocking capture. `Ok(None)` means no speech started before the timeout.
fn capture_phrase(
    source: &dyn AudioSource,
    settings: &ListenSettings,
    on_listening: impl FnOnce(),
) -> Result<Option<Vec<f32>>, CaptureError> {
    let poll = settings.poll_interval;
    let poll_secs = poll.as_secs_f32();

    // Calibration
    let mut threshold = EnergyThreshold::default();
    {
        let mut stream = source.open()?;
        let mut elapsed = 0.0f32;
        while elapsed < settings.calibration.as_secs_f32() {
            let chunk = stream.read(poll)?;
            if chunk.is_empty() {
                elapsed += poll_secs;
                continue;
            }
            let secs = seconds(chunk.len());
            threshold.adapt(&chunk, secs);
            elapsed += secs;
        }
    }
    debug!(threshold = threshold.value(), "Calibrated energy threshold");

    on_listening();
    let mut stream = source.open()?;

    // Wait for onset
    let pre_roll_cap = samples_for(settings.pre_roll);
    let mut pre_roll: VecDeque<f32> = VecDeque::with_capacity(pre_roll_cap);
    let mut waited = 0.0f32;
    let (mut phrase, mut phrase_secs) = loop {
        if waited > settings.timeout.as_secs_f32() {
            return Ok(None);
        }
        let chunk = stream.read(poll)?;
        if chunk.is_empty() {
            waited += poll_secs;
            continue;
        }
        let secs = seconds(chunk.len());
        waited += secs;

        if threshold.is_speech(&chunk) {
            let mut phrase: Vec<f32> = pre_roll.drain(..).collect();
            phrase.extend_from_slice(&chunk);
            break (phrase, secs);
        }

        threshold.adapt(&chunk, secs);
        pre_roll.extend(chunk);
        let excess = pre_roll.len().saturating_sub(pre_roll_cap);
        pre_roll.drain(..excess);
    };
    debug!(waited_secs = waited, "Speech onset");

    // Record until pause or phrase limit
    let limit = settings.phrase_time_limit.as_secs_f32();
    let pause_limit = settings.pause_threshold.as_secs_f32();
    let mut pause_secs = 0.0f32;
    while phrase_secs < limit {
        let chunk = stream.read(poll)?;
        if chunk.is_empty() {
            phrase_secs += poll_secs;
            pause_secs += poll_secs;
        } else {
            let secs = seconds(chunk.len());
            phrase_secs += secs;
            if threshold.is_speech(&chunk) {
                pause_secs = 0.0;
            } else {
                pause_secs += secs;
            }
            phrase.extend_from_slice(&chunk);
        }
        if pause_secs > pause_limit {
            break;
        }
    }
    debug!(phrase_secs, "Phrase captured");

    Ok(Some(phrase))
}
