//! Energy envelope onset detection
//!
//! Detects onsets where the frame energy rises sharply.
//!
//! Algorithm:
//! 1. Divide audio into overlapping frames (frame_size, hop_size)
//! 2. Compute mean-square energy per frame
//! 3. Flag a frame when `E[n] - E[n-1]` exceeds 10% of the envelope maximum
//! 4. Keep the first frame of each rise, at least 0.2 s after the last onset
//!
//! # Example
//!
//! ```no_run
//! use stratum_remix::features::onset::energy_flux::{energy_envelope, detect_energy_onsets};
//!
//! let samples = vec![0.0f32; 11025 * 10];
//! let envelope = energy_envelope(&samples, 256, 128)?;
//! let onsets = detect_energy_onsets(&envelope, 17);
//! println!("Found {} onsets", onsets.len());
//! # Ok::<(), stratum_remix::RemixError>(())
//! ```

use super::{frame_intervals, min_gap_frames};
use crate::config::TempoConfig;
use crate::error::RemixError;
use crate::features::period::candidate_filter::rank_intervals;
use crate::features::period::{BpmCandidate, TempoMethod};

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Rise threshold relative to the envelope maximum
const RISE_RATIO: f32 = 0.1;

/// Mean-square energy per frame
///
/// # Errors
///
/// Returns `InvalidInput` if `frame_size` or `hop_size` is zero
pub fn energy_envelope(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Vec<f32>, RemixError> {
    if frame_size == 0 {
        return Err(RemixError::InvalidInput("Frame size must be > 0".to_string()));
    }
    if hop_size == 0 {
        return Err(RemixError::InvalidInput("Hop size must be > 0".to_string()));
    }
    if samples.len() < frame_size {
        return Ok(Vec::new());
    }

    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    Ok((0..num_frames)
        .map(|i| {
            let start = i * hop_size;
            let sum_sq: f32 = samples[start..start + frame_size].iter().map(|&x| x * x).sum();
            sum_sq / frame_size as f32
        })
        .collect())
}

/// Onset frames of an energy envelope
///
/// # Arguments
///
/// * `envelope` - Output of [`energy_envelope`]
/// * `min_gap` - Minimum distance between onsets, in frames
///
/// # Returns
///
/// Onset frame indices, ascending
pub fn detect_energy_onsets(envelope: &[f32], min_gap: usize) -> Vec<usize> {
    let max_energy = envelope.iter().copied().fold(0.0f32, f32::max);
    if max_energy <= EPSILON {
        log::debug!("Energy envelope is silent, no onsets detected");
        return Vec::new();
    }

    let threshold = max_energy * RISE_RATIO;
    let mut onsets: Vec<usize> = Vec::new();
    let mut was_rising = false;

    for i in 1..envelope.len() {
        let rising = envelope[i] - envelope[i - 1] > threshold;
        if rising && !was_rising {
            let far_enough = onsets.last().map_or(true, |&last| i - last >= min_gap);
            if far_enough {
                onsets.push(i);
            }
        }
        was_rising = rising;
    }

    log::debug!(
        "Energy onsets: {} frames, max={:.6}, {} onsets",
        envelope.len(),
        max_energy,
        onsets.len()
    );

    onsets
}

/// Onset-detection BPM candidates
///
/// # Arguments
///
/// * `samples` - Decimated, high-passed mono signal
/// * `rate` - Its sample rate in Hz
/// * `config` - Tempo configuration (energy frame/hop, bucketing)
///
/// # Returns
///
/// Up to three candidates, most voted first
pub fn onset_candidates(samples: &[f32], rate: f32, config: &TempoConfig) -> Result<Vec<BpmCandidate>, RemixError> {
    if rate.is_nan() || rate <= 0.0 {
        return Err(RemixError::AnalysisError(format!("Invalid analysis rate: {}", rate)));
    }

    let envelope = energy_envelope(samples, config.energy_frame_size, config.energy_hop_size)?;
    let onsets = detect_energy_onsets(&envelope, min_gap_frames(rate, config.energy_hop_size));
    let intervals = frame_intervals(&onsets, rate, config.energy_hop_size);

    Ok(rank_intervals(&intervals, TempoMethod::OnsetDetection, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::onset::test_signals::kick_pattern;

    #[test]
    fn test_envelope_frames() {
        let samples = vec![0.5f32; 1024];
        let envelope = energy_envelope(&samples, 256, 128).unwrap();
        assert_eq!(envelope.len(), 7);
        assert!((envelope[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_envelope_invalid_parameters() {
        let samples = vec![0.5f32; 1024];
        assert!(energy_envelope(&samples, 0, 128).is_err());
        assert!(energy_envelope(&samples, 256, 0).is_err());
        assert!(energy_envelope(&samples[..100], 256, 128).unwrap().is_empty());
    }

    #[test]
    fn test_step_function_onset() {
        let mut samples = vec![0.0f32; 11025];
        for s in samples.iter_mut().skip(5000) {
            *s = 0.5;
        }
        let envelope = energy_envelope(&samples, 256, 128).unwrap();
        let onsets = detect_energy_onsets(&envelope, 17);

        assert_eq!(onsets.len(), 1, "A single step should give one onset");
        let onset_sample = onsets[0] * 128;
        assert!(
            (4700..=5100).contains(&onset_sample),
            "Onset should be near the step at 5000, got {}",
            onset_sample
        );
    }

    #[test]
    fn test_silent_audio_has_no_onsets() {
        let envelope = energy_envelope(&vec![0.0f32; 11025], 256, 128).unwrap();
        assert!(detect_energy_onsets(&envelope, 17).is_empty());
    }

    #[test]
    fn test_min_gap_suppresses_close_onsets() {
        let envelope = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        assert_eq!(detect_energy_onsets(&envelope, 1), vec![1, 3, 5]);
        assert_eq!(detect_energy_onsets(&envelope, 3), vec![1, 5]);
    }

    #[test]
    fn test_onset_candidates_kick_pattern_120_bpm() {
        let samples = kick_pattern(8.0, 120.0, 11025.0, 50.0);
        let candidates = onset_candidates(&samples, 11025.0, &TempoConfig::default()).unwrap();

        assert!(!candidates.is_empty(), "Should find onset candidates");
        assert!(
            (candidates[0].bpm - 120.0).abs() < 3.0,
            "Top onset candidate should be ~120 BPM, got {:.2}",
            candidates[0].bpm
        );
        // 120 BPM is above the onset method's preferred range
        assert!(candidates[0].confidence <= 0.5 + 1e-6);
    }
}
