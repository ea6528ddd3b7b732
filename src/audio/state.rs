//! Atomic speech-capture state.
//!
//! Idle -> Calibrating -> Listening -> Recognizing -> Idle. Readable from any
//! thread while the capture loop runs on the blocking pool.

use std::sync::atomic::{AtomicU8, Ordering};

/// Speech capture phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CaptureState {
    /// No capture in progress.
    Idle = 0,
    /// Sampling ambient noise to set the energy threshold.
    Calibrating = 1,
    /// Waiting for and recording an utterance.
    Listening = 2,
    /// Captured audio is with the STT service.
    Recognizing = 3,
}

impl CaptureState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Calibrating,
            2 => Self::Listening,
            3 => Self::Recognizing,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Calibrating => write!(f, "calibrating"),
            Self::Listening => write!(f, "listening"),
            Self::Recognizing => write!(f, "recognizing"),
        }
    }
}

/// Thread-safe capture state, shareable via `Arc`.
#[derive(Debug)]
pub struct CaptureStateMachine {
    state: AtomicU8,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(CaptureState::Idle as u8),
        }
    }

    pub fn current_state(&self) -> CaptureState {
        CaptureState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Idle -> Calibrating. Fails if a capture is already running.
    pub fn begin(&self) -> bool {
        self.transition(CaptureState::Idle, CaptureState::Calibrating)
    }

    /// Calibrating -> Listening.
    pub fn start_listening(&self) -> bool {
        self.transition(CaptureState::Calibrating, CaptureState::Listening)
    }

    /// Listening -> Recognizing.
    pub fn start_recognizing(&self) -> bool {
        self.transition(CaptureState::Listening, CaptureState::Recognizing)
    }

    /// Back to Idle from any phase (terminal outcome reached).
    pub fn reset(&self) {
        self.state.store(CaptureState::Idle as u8, Ordering::Release);
    }

    fn transition(&self, from: CaptureState, to: CaptureState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_progression() {
        let sm = CaptureStateMachine::new();
        assert_eq!(sm.current_state(), CaptureState::Idle);
        assert!(sm.begin());
        assert!(sm.start_listening());
        assert!(sm.start_recognizing());
        assert_eq!(sm.current_state(), CaptureState::Recognizing);
        sm.reset();
        assert_eq!(sm.current_state(), CaptureState::Idle);
    }

    #[test]
    fn test_no_skipping_or_reentry() {
        let sm = CaptureStateMachine::new();
        assert!(!sm.start_recognizing());
        assert!(sm.begin());
        assert!(!sm.begin());
        assert!(!sm.start_recognizing());
        assert_eq!(sm.current_state(), CaptureState::Calibrating);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(CaptureState::Calibrating.to_string(), "calibrating");
        assert_eq!(CaptureState::Recognizing.to_string(), "recognizing");
    }
}
