//! Voice activity detection.

pub mod energy;

pub use energy::{rms, EnergyThreshold};
