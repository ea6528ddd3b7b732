//! Serialized narration.
//!
//! One worker thread owns the TTS engine and the audio sink and drains a FIFO
//! queue: job N is fully played before job N+1 is synthesized. The worker runs
//! a private current-thread runtime for the async engines, since the sink is
//! not `Send` and must stay on one thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{AudioSink, TtsEngine};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NarrationError {
    /// Output device or engine failed to initialize; narration is off for
    /// the rest of the process.
    #[error("narration is unavailable")]
    Disabled,
    /// The worker thread has exited.
    #[error("narration worker has stopped")]
    QueueClosed,
}

/// One piece of text waiting to be spoken.
#[derive(Debug, Clone)]
pub struct NarrationJob {
    pub id: Uuid,
    pub text: String,
}

/// Everything the worker needs, built on the worker thread itself.
pub type NarrationInit =
    Box<dyn FnOnce() -> anyhow::Result<(Box<dyn TtsEngine>, Box<dyn AudioSink>)> + Send>;

pub struct Narrator {
    tx: Option<mpsc::Sender<NarrationJob>>,
    worker: Option<JoinHandle<()>>,
    engine_name: Option<String>,
    closed_warned: AtomicBool,
}

impl Narrator {
    /// Spawn the worker and wait for it to report whether `init` succeeded.
    /// On failure a warning is logged and a disabled narrator is returned.
    pub fn start(init: NarrationInit) -> Self {
        let (tx, rx) = mpsc::channel::<NarrationJob>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<String, String>>(1);

        let spawned = std::thread::Builder::new()
            .name("narrator".into())
            .spawn(move || run_worker(init, rx, ready_tx));

        let worker = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Narration disabled: failed to spawn worker: {}", e);
                return Self::disabled();
            }
        };

        match ready_rx.recv() {
            Ok(Ok(name)) => {
                info!(engine = %name, "Narration ready");
                Self {
                    tx: Some(tx),
                    worker: Some(worker),
                    engine_name: Some(name),
                    closed_warned: AtomicBool::new(false),
                }
            }
            Ok(Err(reason)) => {
                warn!("Narration disabled: {}", reason);
                let _ = worker.join();
                Self::disabled()
            }
            Err(_) => {
                warn!("Narration disabled: worker exited during startup");
                let _ = worker.join();
                Self::disabled()
            }
        }
    }

    /// A narrator that never speaks.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
            engine_name: None,
            closed_warned: AtomicBool::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        self.tx.is_some()
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    /// Queue `text` for speech and return immediately.
    pub fn narrate(&self, text: &str) -> Result<(), NarrationError> {
        let Some(tx) = &self.tx else {
            return Err(NarrationError::Disabled);
        };

        let job = NarrationJob {
            id: Uuid::new_v4(),
            text: text.to_string(),
        };
        debug!(job = %job.id, chars = job.text.len(), "Narration queued");

        tx.send(job).map_err(|_| {
            if !self.closed_warned.swap(true, Ordering::Relaxed) {
                warn!("Narration worker is gone; further narration is dropped");
            }
            NarrationError::QueueClosed
        })
    }

    /// Close the queue and wait for queued jobs to finish playing.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Narration worker panicked");
            }
        }
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        // Detach: the worker exits once the queue drains.
        self.tx.take();
    }
}

fn run_worker(
    init: NarrationInit,
    rx: mpsc::Receiver<NarrationJob>,
    ready: mpsc::SyncSender<Result<String, String>>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready.send(Err(format!("failed to build runtime: {e}")));
            return;
        }
    };

    let (engine, sink) = match init() {
        Ok(parts) => parts,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };
    if ready.send(Ok(engine.name())).is_err() {
        return;
    }

    for job in rx {
        match rt.block_on(engine.speak(&job.text)) {
            Ok(speech) => {
                if let Err(e) = sink.play(&speech.samples, speech.sample_rate) {
                    warn!(job = %job.id, "Narration playback failed: {}", e);
                } else {
                    debug!(job = %job.id, "Narration finished");
                }
            }
            Err(e) => warn!(job = %job.id, "Speech synthesis failed: {}", e),
        }
    }
    debug!("Narration worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::Speech;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    type Log = Arc<Mutex<Vec<String>>>;

    struct FakeTts {
        log: Log,
    }

    impl TtsEngine for FakeTts {
        fn speak(&self, text: &str) -> Pin<Box<dyn Future<Output = anyhow::Result<Speech>> + Send + '_>> {
            let text = text.to_string();
            Box::pin(async move {
                if text == "boom" {
                    anyhow::bail!("synthesis exploded");
                }
                self.log.lock().unwrap().push(format!("synth {text}"));
                Ok(Speech {
                    samples: vec![0.0; text.len()],
                    sample_rate: 16_000,
                })
            })
        }

        fn name(&self) -> String {
            "fake".into()
        }
    }

    struct SlowSink {
        log: Log,
        delay: Duration,
    }

    impl AudioSink for SlowSink {
        fn play(&self, samples: &[f32], _sample_rate: u32) -> anyhow::Result<()> {
            std::thread::sleep(self.delay);
            self.log.lock().unwrap().push(format!("play {}", samples.len()));
            Ok(())
        }
    }

    fn fake_narrator(log: &Log, delay: Duration) -> Narrator {
        let engine_log = Arc::clone(log);
        let sink_log = Arc::clone(log);
        Narrator::start(Box::new(
            move || -> anyhow::Result<(Box<dyn TtsEngine>, Box<dyn AudioSink>)> {
                Ok((
                    Box::new(FakeTts { log: engine_log }),
                    Box::new(SlowSink {
                        log: sink_log,
                        delay,
                    }),
                ))
            },
        ))
    }

    #[test]
    fn test_narrate_returns_before_playback() {
        let log: Log = Arc::default();
        let mut narrator = fake_narrator(&log, Duration::from_millis(300));
        assert!(narrator.is_available());
        assert_eq!(narrator.engine_name(), Some("fake"));

        let started = Instant::now();
        narrator.narrate("hello").unwrap();
        assert!(started.elapsed() < Duration::from_millis(200));

        narrator.shutdown();
        assert_eq!(*log.lock().unwrap(), vec!["synth hello", "play 5"]);
    }

    #[test]
    fn test_jobs_play_in_order_without_overlap() {
        let log: Log = Arc::default();
        let mut narrator = fake_narrator(&log, Duration::from_millis(10));
        for text in ["a", "bb", "ccc"] {
            narrator.narrate(text).unwrap();
        }
        narrator.shutdown();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["synth a", "play 1", "synth bb", "play 2", "synth ccc", "play 3"]
        );
    }

    #[test]
    fn test_synthesis_failure_does_not_stop_the_queue() {
        let log: Log = Arc::default();
        let mut narrator = fake_narrator(&log, Duration::ZERO);
        narrator.narrate("boom").unwrap();
        narrator.narrate("ok").unwrap();
        narrator.shutdown();

        assert_eq!(*log.lock().unwrap(), vec!["synth ok", "play 2"]);
    }

    #[test]
    fn test_failed_init_disables_narration() {
        let narrator = Narrator::start(Box::new(
            || -> anyhow::Result<(Box<dyn TtsEngine>, Box<dyn AudioSink>)> {
                anyhow::bail!("no output device")
            },
        ));
        assert!(!narrator.is_available());
        assert_eq!(narrator.narrate("hello"), Err(NarrationError::Disabled));
        assert_eq!(narrator.narrate("again"), Err(NarrationError::Disabled));
    }
}
