//! Onset-based tempo methods
//!
//! Two interval-based BPM detectors running on the decimated, high-passed
//! signal:
//! - Spectral flux beat tracking
//! - Energy envelope onset detection
//!
//! Both turn event times into intervals and hand them to
//! [`crate::features::period::candidate_filter::rank_intervals`].

pub mod energy_flux;
pub mod spectral_flux;

pub use energy_flux::{detect_energy_onsets, energy_envelope, onset_candidates};
pub use spectral_flux::{beat_tracking_candidates, spectral_flux};

/// Minimum spacing between detected events, in seconds
pub const MIN_EVENT_GAP_SECONDS: f32 = 0.2;

/// Minimum event spacing in frames for a given hop
pub(crate) fn min_gap_frames(rate: f32, hop_size: usize) -> usize {
    ((MIN_EVENT_GAP_SECONDS * rate / hop_size as f32) as usize).max(1)
}

/// Frame indices to inter-event intervals in seconds
pub(crate) fn frame_intervals(frames: &[usize], rate: f32, hop_size: usize) -> Vec<f32> {
    let seconds_per_frame = hop_size as f32 / rate;
    frames
        .windows(2)
        .map(|w| (w[1] - w[0]) as f32 * seconds_per_frame)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_intervals() {
        let intervals = frame_intervals(&[0, 43, 86], 11025.0, 128);
        assert_eq!(intervals.len(), 2);
        assert!((intervals[0] - 43.0 * 128.0 / 11025.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_gap_frames() {
        assert_eq!(min_gap_frames(11025.0, 128), 17);
        assert_eq!(min_gap_frames(100.0, 128), 1);
    }
}
