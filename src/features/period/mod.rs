//! Period estimation
//!
//! Turns a decimated, high-passed signal into BPM candidates and one
//! consensus tempo:
//! - Windowed autocorrelation (multi-size sliding windows)
//! - Candidate bucketing shared by the interval-based onset methods
//! - Weighted consensus vote with octave correction
//! - Legacy single-window autocorrelation

pub mod autocorrelation;
pub mod candidate_filter;
pub mod consensus;
pub mod estimator;
pub mod peak_picking;

use crate::config::TempoConfig;

pub use estimator::{detect_bpm, detect_bpm_legacy, estimate_bpm, try_estimate_bpm};

/// Lowest tempo the estimator reports
pub const MIN_BPM: f32 = 40.0;

/// Highest tempo the estimator reports
pub const MAX_BPM: f32 = 300.0;

/// Lowest interval-derived tempo kept as a candidate at all
pub const CANDIDATE_MIN_BPM: f32 = 30.0;

/// Tempo reported when no method produces a candidate
pub const FALLBACK_BPM: u32 = 120;

/// Tempo detection method that produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempoMethod {
    /// Sliding-window autocorrelation of the rectified signal
    Autocorrelation,
    /// Inter-beat intervals from spectral-flux peaks
    BeatTracking,
    /// Inter-onset intervals from the energy envelope
    OnsetDetection,
}

impl TempoMethod {
    /// Tempo range this method is trusted in, in BPM
    ///
    /// Candidates outside it are kept but down-weighted.
    pub fn preferred_range(self) -> (f32, f32) {
        match self {
            TempoMethod::Autocorrelation => (40.0, 300.0),
            TempoMethod::BeatTracking => (100.0, 300.0),
            TempoMethod::OnsetDetection => (30.0, 100.0),
        }
    }

    /// Reliability weight used by the consensus vote
    pub fn weight(self, config: &TempoConfig) -> f32 {
        match self {
            TempoMethod::Autocorrelation => config.autocorrelation_weight,
            TempoMethod::BeatTracking => config.beat_tracking_weight,
            TempoMethod::OnsetDetection => config.onset_weight,
        }
    }

    /// Strength multiplier for a candidate at `bpm`
    pub fn range_factor(self, bpm: f32, out_of_range_penalty: f32) -> f32 {
        let (lo, hi) = self.preferred_range();
        if bpm >= lo && bpm <= hi {
            1.0
        } else {
            out_of_range_penalty
        }
    }
}

/// BPM candidate with confidence
#[derive(Debug, Clone, PartialEq)]
pub struct BpmCandidate {
    /// BPM estimate
    pub bpm: f32,

    /// Strength of the candidate (≥ 0, roughly 0.0-1.1)
    pub confidence: f32,

    /// Method that produced it
    pub method: TempoMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_ranges() {
        assert_eq!(TempoMethod::BeatTracking.range_factor(120.0, 0.5), 1.0);
        assert_eq!(TempoMethod::OnsetDetection.range_factor(120.0, 0.5), 0.5);
        assert_eq!(TempoMethod::OnsetDetection.range_factor(30.0, 0.5), 1.0);
    }

    #[test]
    fn test_weights_follow_config() {
        let config = TempoConfig::default();
        assert_eq!(TempoMethod::Autocorrelation.weight(&config), 1.2);
        assert_eq!(TempoMethod::BeatTracking.weight(&config), 1.0);
        assert_eq!(TempoMethod::OnsetDetection.weight(&config), 0.8);
    }
}
