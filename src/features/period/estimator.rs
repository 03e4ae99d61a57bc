//! Tempo estimation entry points
//!
//! Prepares the analysis signal (first channel, leading window, naive
//! decimation, high-pass) and runs either the three-method consensus or the
//! legacy single autocorrelation.

use super::autocorrelation::{full_signal_tempo, windowed_candidates};
use super::consensus::select_consensus;
use super::{BpmCandidate, FALLBACK_BPM, MAX_BPM, MIN_BPM};
use crate::config::{AnalysisConfig, TempoConfig, TempoStrategy};
use crate::error::RemixError;
use crate::features::onset::{beat_tracking_candidates, onset_candidates};
use crate::io::AudioClip;
use crate::preprocessing::filter::{decimate, high_pass_filter};

/// Tempo range of the legacy path
pub const LEGACY_BPM_RANGE: (f32, f32) = (60.0, 200.0);

/// Estimate a clip's tempo, failing soft
///
/// Runs the configured strategy on the first `analysis_window_seconds` of
/// channel 0. Any analysis error, or no candidate at all, yields
/// [`FALLBACK_BPM`].
///
/// # Returns
///
/// Integer BPM in [40, 300]
pub fn estimate_bpm(clip: &AudioClip, config: &AnalysisConfig) -> u32 {
    match try_estimate_bpm(clip, config) {
        Ok(Some(bpm)) => bpm,
        Ok(None) => {
            log::warn!("No tempo candidates for '{}', using {} BPM", clip.name(), FALLBACK_BPM);
            FALLBACK_BPM
        }
        Err(e) => {
            log::warn!("Tempo analysis failed for '{}': {}, using {} BPM", clip.name(), e, FALLBACK_BPM);
            FALLBACK_BPM
        }
    }
}

/// Estimate a clip's tempo
///
/// # Returns
///
/// Integer BPM in [40, 300], or `None` when no method found a candidate
///
/// # Errors
///
/// Returns `AnalysisError` if a method fails
pub fn try_estimate_bpm(clip: &AudioClip, config: &AnalysisConfig) -> Result<Option<u32>, RemixError> {
    let samples = clip.leading_samples(config.analysis_window_seconds);

    let detected = match config.tempo.strategy {
        TempoStrategy::Consensus => detect_bpm(samples, clip.sample_rate(), &config.tempo)?,
        TempoStrategy::Legacy => detect_bpm_legacy(samples, clip.sample_rate(), &config.tempo)?,
    };

    Ok(detected
        .filter(|bpm| bpm.is_finite())
        .map(|bpm| bpm.round().clamp(MIN_BPM, MAX_BPM) as u32))
}

/// Consensus tempo of a mono signal
///
/// # Arguments
///
/// * `samples` - Mono samples at `sample_rate`
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Tempo configuration
///
/// # Returns
///
/// Unrounded consensus BPM, or `None` when no method found a candidate
///
/// # Errors
///
/// Returns `AnalysisError` if any method fails
pub fn detect_bpm(samples: &[f32], sample_rate: u32, config: &TempoConfig) -> Result<Option<f32>, RemixError> {
    let candidates = consensus_candidates(samples, sample_rate, config)?;
    Ok(select_consensus(&candidates, config))
}

/// Candidates of all three methods for a mono signal
///
/// The methods are independent and run in parallel.
pub fn consensus_candidates(
    samples: &[f32],
    sample_rate: u32,
    config: &TempoConfig,
) -> Result<Vec<BpmCandidate>, RemixError> {
    if sample_rate == 0 {
        return Err(RemixError::AnalysisError("Invalid sample rate: 0".to_string()));
    }
    if samples.is_empty() {
        return Ok(vec![]);
    }

    let (decimated, rate) = decimate(samples, sample_rate, config.target_rate);
    let filtered = high_pass_filter(&decimated, rate, config.highpass_cutoff_hz);
    let rectified: Vec<f32> = filtered.iter().map(|x| x.abs()).collect();

    let (autocorr, (beats, onsets)) = rayon::join(
        || windowed_candidates(&rectified, rate, config),
        || {
            rayon::join(
                || beat_tracking_candidates(&filtered, rate, config),
                || onset_candidates(&filtered, rate, config),
            )
        },
    );

    let mut candidates = autocorr?;
    let beats = beats?;
    let onsets = onsets?;

    log::debug!(
        "Tempo candidates: {} autocorrelation, {} beat tracking, {} onset",
        candidates.len(),
        beats.len(),
        onsets.len()
    );

    candidates.extend(beats);
    candidates.extend(onsets);
    Ok(candidates)
}

/// Legacy tempo of a mono signal
///
/// 4 kHz decimation, 100 Hz high-pass and rectification, then one
/// autocorrelation over the whole signal; the strongest peak in [60, 200]
/// BPM wins.
pub fn detect_bpm_legacy(samples: &[f32], sample_rate: u32, config: &TempoConfig) -> Result<Option<f32>, RemixError> {
    if sample_rate == 0 {
        return Err(RemixError::AnalysisError("Invalid sample rate: 0".to_string()));
    }
    if samples.is_empty() {
        return Ok(None);
    }

    let (decimated, rate) = decimate(samples, sample_rate, config.legacy_target_rate);
    let rectified: Vec<f32> = high_pass_filter(&decimated, rate, config.legacy_highpass_cutoff_hz)
        .into_iter()
        .map(f32::abs)
        .collect();

    let bpm = full_signal_tempo(&rectified, rate, LEGACY_BPM_RANGE.0, LEGACY_BPM_RANGE.1)?;
    Ok(bpm.map(|b| b.clamp(LEGACY_BPM_RANGE.0, LEGACY_BPM_RANGE.1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::period::TempoMethod;
    use std::f32::consts::PI;

    /// 1 kHz clicks decaying over 10 ms, one every `60 / bpm` seconds
    fn click_track(bpm: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let sr = sample_rate as f32;
        let n = (seconds * sr) as usize;
        let mut samples = vec![0.0f32; n];
        let click_len = (0.01 * sr) as usize;
        let mut beat = 0usize;
        loop {
            let start = (beat as f32 * 60.0 / bpm * sr) as usize;
            if start >= n {
                break;
            }
            for i in 0..click_len.min(n - start) {
                let t = i as f32 / sr;
                samples[start + i] += 0.8 * (-t / 0.002).exp() * (2.0 * PI * 1000.0 * t).sin();
            }
            beat += 1;
        }
        samples
    }

    fn best_of(candidates: &[BpmCandidate], method: TempoMethod) -> f32 {
        candidates
            .iter()
            .filter(|c| c.method == method)
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|c| c.bpm)
            .unwrap_or(0.0)
    }

    #[test]
    fn test_click_track_each_method_near_120() {
        let samples = click_track(120.0, 12.0, 44100);
        let config = TempoConfig::default();
        let candidates = consensus_candidates(&samples, 44100, &config).unwrap();

        for method in [
            TempoMethod::Autocorrelation,
            TempoMethod::BeatTracking,
            TempoMethod::OnsetDetection,
        ] {
            let bpm = best_of(&candidates, method);
            assert!(
                (bpm - 120.0).abs() <= 5.0,
                "{:?} should report ~120 BPM, got {:.2}",
                method,
                bpm
            );
        }
    }

    #[test]
    fn test_click_track_consensus_is_120() {
        let samples = click_track(120.0, 12.0, 44100);
        let clip = AudioClip::new("clicks", 44100, vec![samples]).unwrap();
        assert_eq!(estimate_bpm(&clip, &AnalysisConfig::default()), 120);
    }

    #[test]
    fn test_silence_falls_back_to_120() {
        let clip = AudioClip::new("silence", 44100, vec![vec![0.0; 44100 * 4]]).unwrap();
        assert_eq!(estimate_bpm(&clip, &AnalysisConfig::default()), FALLBACK_BPM);
    }

    #[test]
    fn test_legacy_path() {
        let samples = click_track(120.0, 8.0, 44100);
        let clip = AudioClip::new("clicks", 44100, vec![samples]).unwrap();
        let mut config = AnalysisConfig::default();
        config.tempo.strategy = TempoStrategy::Legacy;

        let bpm = estimate_bpm(&clip, &config);
        assert!((118..=122).contains(&bpm), "Legacy path should find ~120, got {}", bpm);
    }

    #[test]
    fn test_zero_rate_is_error() {
        assert!(detect_bpm(&[0.0; 10], 0, &TempoConfig::default()).is_err());
        assert!(detect_bpm_legacy(&[0.0; 10], 0, &TempoConfig::default()).is_err());
    }
}
