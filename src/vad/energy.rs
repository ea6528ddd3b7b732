//! Energy-based voice activity detection with ambient-noise calibration.
//!
//! The threshold tracks background noise with exponential damping:
//! `threshold = threshold * damping + rms * ratio * (1 - damping)` where
//! `damping = DAMPING_PER_SECOND ^ chunk_seconds`.

/// Starting threshold before any calibration, in normalized RMS
/// (300 on a 16-bit scale).
pub const DEFAULT_THRESHOLD: f32 = 300.0 / 32_768.0;

/// Fraction of the old threshold kept after one second of audio.
const DAMPING_PER_SECOND: f32 = 0.15;

/// Speech must be this much louder than the ambient level.
const SPEECH_RATIO: f32 = 1.5;

/// Root-mean-square level of a chunk.
pub fn rms(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum: f32 = chunk.iter().map(|s| s * s).sum();
    (sum / chunk.len() as f32).sqrt()
}

/// Adaptive speech/silence threshold.
#[derive(Debug, Clone, Copy)]
pub struct EnergyThreshold {
    value: f32,
}

impl EnergyThreshold {
    pub fn new(initial: f32) -> Self {
        Self { value: initial }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// True if `chunk` is loud enough to count as speech.
    pub fn is_speech(&self, chunk: &[f32]) -> bool {
        rms(chunk) > self.value
    }

    /// Fold a chunk of (assumed) background noise into the threshold.
    pub fn adapt(&mut self, chunk: &[f32], chunk_seconds: f32) {
        if chunk.is_empty() || chunk_seconds <= 0.0 {
            return;
        }
        let damping = DAMPING_PER_SECOND.powf(chunk_seconds);
        let target = rms(chunk) * SPEECH_RATIO;
        self.value = self.value * damping + target * (1.0 - damping);
    }
}

impl Default for EnergyThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_constant_signal() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_converges_towards_noise_floor() {
        let noise = vec![0.1f32; 1600];
        let mut threshold = EnergyThreshold::default();
        for _ in 0..50 {
            threshold.adapt(&noise, 0.1);
        }
        assert!((threshold.value() - 0.15).abs() < 1e-3);
        assert!(!threshold.is_speech(&noise));
        assert!(threshold.is_speech(&vec![0.5f32; 1600]));
    }

    #[test]
    fn test_adapt_ignores_empty_chunks() {
        let mut threshold = EnergyThreshold::new(0.2);
        threshold.adapt(&[], 0.1);
        threshold.adapt(&[0.9; 10], 0.0);
        assert_eq!(threshold.value(), 0.2);
    }
}
