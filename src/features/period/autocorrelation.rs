//! Autocorrelation-based BPM estimation
//!
//! Finds periodicity in the rectified, high-passed signal using
//! FFT-accelerated autocorrelation.
//!
//! # Algorithm
//!
//! 1. Slide windows of several sizes (default 3, 6 and 12 s) over the signal
//!    with 50% hop
//! 2. Remove the window mean and compute `ACF = IFFT(|FFT(window)|²)`
//! 3. Pick peaks inside the lag range of [`MIN_BPM`, `MAX_BPM`]
//! 4. Convert each peak lag to BPM: `BPM = 60 * rate / lag`
//! 5. Weight by the normalised peak height `ACF[lag] / ACF[0]` and a small
//!    bias towards longer windows
//!
//! # Example
//!
//! ```no_run
//! use stratum_remix::config::TempoConfig;
//! use stratum_remix::features::period::autocorrelation::windowed_candidates;
//!
//! let rectified = vec![0.0f32; 11025 * 12];
//! let candidates = windowed_candidates(&rectified, 11025.0, &TempoConfig::default())?;
//! # Ok::<(), stratum_remix::RemixError>(())
//! ```

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::peak_picking::{find_peaks, PeakThreshold};
use super::{BpmCandidate, TempoMethod, MAX_BPM, MIN_BPM};
use crate::config::TempoConfig;
use crate::error::RemixError;

const EPSILON: f32 = 1e-10;

/// Peaks kept per window
const PEAKS_PER_WINDOW: usize = 3;

/// Peak height threshold relative to the strongest lag in range
const PEAK_THRESHOLD: f32 = 0.3;

/// Candidates from multi-size sliding-window autocorrelation
///
/// # Arguments
///
/// * `signal` - Rectified analysis signal
/// * `rate` - Analysis sample rate in Hz
/// * `config` - Tempo configuration (window sizes)
///
/// # Returns
///
/// Up to three candidates per window, in window order
///
/// # Errors
///
/// Returns `AnalysisError` if the rate is not positive or the FFT produces
/// non-finite values
pub fn windowed_candidates(
    signal: &[f32],
    rate: f32,
    config: &TempoConfig,
) -> Result<Vec<BpmCandidate>, RemixError> {
    if rate.is_nan() || rate <= 0.0 {
        return Err(RemixError::AnalysisError(format!("Invalid analysis rate: {}", rate)));
    }

    let lag_min = (60.0 * rate / MAX_BPM).ceil() as usize;
    let lag_max = (60.0 * rate / MIN_BPM).floor() as usize;

    let mut sizes: Vec<f32> = config
        .autocorrelation_windows
        .iter()
        .copied()
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();
    sizes.sort_by(f32::total_cmp);

    // Longer windows see more periods and get a slightly larger vote
    let mid = sizes.len().saturating_sub(1) as f32 / 2.0;
    let mut windows: Vec<(usize, f32)> = sizes
        .iter()
        .enumerate()
        .map(|(i, &secs)| ((secs * rate) as usize, 1.0 + 0.1 * (i as f32 - mid)))
        .filter(|&(len, _)| len > lag_min && len <= signal.len())
        .collect();

    if windows.is_empty() {
        log::debug!(
            "No autocorrelation window fits {} samples, using the whole signal",
            signal.len()
        );
        windows.push((signal.len(), 1.0));
    }

    let mut candidates = Vec::new();
    let mut window_count = 0usize;

    for (window_len, bias) in windows {
        let hop = (window_len / 2).max(1);
        let mut start = 0;
        while start + window_len <= signal.len() {
            let window = &signal[start..start + window_len];
            candidates.extend(window_candidates(window, rate, lag_min, lag_max, bias)?);
            window_count += 1;
            start += hop;
        }
    }

    log::debug!(
        "Autocorrelation: {} windows, {} candidates (lag range {}..={})",
        window_count,
        candidates.len(),
        lag_min,
        lag_max
    );

    Ok(candidates)
}

/// Strongest periodicity of the whole signal, in BPM
///
/// Runs one autocorrelation over the entire signal and returns the lag of
/// the highest peak inside `[min_bpm, max_bpm]`, or `None` if there is none.
pub fn full_signal_tempo(
    signal: &[f32],
    rate: f32,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<Option<f32>, RemixError> {
    if rate.is_nan() || rate <= 0.0 || min_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(RemixError::AnalysisError(format!(
            "Invalid tempo search: rate={}, range=[{:.1}, {:.1}]",
            rate, min_bpm, max_bpm
        )));
    }

    let lag_min = (60.0 * rate / max_bpm).ceil() as usize;
    let lag_max = (60.0 * rate / min_bpm).floor() as usize;

    let candidates = window_candidates(signal, rate, lag_min, lag_max, 1.0)?;
    Ok(candidates.first().map(|c| c.bpm))
}

/// Peak-picked candidates of one window
fn window_candidates(
    window: &[f32],
    rate: f32,
    lag_min: usize,
    lag_max: usize,
    bias: f32,
) -> Result<Vec<BpmCandidate>, RemixError> {
    if window.len() <= lag_min + 2 || lag_min == 0 {
        return Ok(vec![]);
    }

    let mean = window.iter().sum::<f32>() / window.len() as f32;
    let centered: Vec<f32> = window.iter().map(|&x| x - mean).collect();

    let acf = compute_autocorrelation_fft(&centered)?;
    let energy = acf[0];
    if energy < EPSILON {
        return Ok(vec![]);
    }

    let upper = lag_max.min(acf.len() - 1);
    if lag_min >= upper {
        return Ok(vec![]);
    }

    let peaks = find_peaks(
        &acf[lag_min..=upper],
        PeakThreshold::Relative(PEAK_THRESHOLD),
        (lag_min / 4).max(1),
    );

    Ok(peaks
        .into_iter()
        .take(PEAKS_PER_WINDOW)
        .map(|(offset, value)| {
            let lag = offset + lag_min;
            BpmCandidate {
                bpm: 60.0 * rate / lag as f32,
                confidence: (value / energy).max(0.0) * bias,
                method: TempoMethod::Autocorrelation,
            }
        })
        .collect())
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²), zero-padded to avoid
/// circular wrap-around.
///
/// # Returns
///
/// Autocorrelation function (same length as input), unnormalised
pub fn compute_autocorrelation_fft(signal: &[f32]) -> Result<Vec<f32>, RemixError> {
    let n = signal.len();
    if n == 0 {
        return Ok(vec![]);
    }

    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in &mut buffer {
        *x = Complex::new(x.norm_sqr(), 0.0);
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    let acf: Vec<f32> = buffer[..n].iter().map(|x| x.re * scale).collect();

    if acf.iter().any(|v| !v.is_finite()) {
        return Err(RemixError::AnalysisError(
            "Non-finite autocorrelation".to_string(),
        ));
    }

    Ok(acf)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rectified pulse train: `width` ones every `period` samples
    fn pulse_train(len: usize, period: usize, width: usize) -> Vec<f32> {
        (0..len).map(|i| if i % period < width { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_compute_autocorrelation_fft() {
        let signal = vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let acf = compute_autocorrelation_fft(&signal).unwrap();

        assert_eq!(acf.len(), signal.len());
        assert!((acf[0] - 3.0).abs() < 1e-4, "ACF[0] is the energy, got {}", acf[0]);
        assert!((acf[1]).abs() < 1e-4);
        assert!((acf[2] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_windowed_120bpm_pulse_train() {
        // 120 BPM at 1 kHz analysis rate: one pulse every 500 samples
        let rate = 1000.0;
        let signal = pulse_train(12_000, 500, 10);
        let candidates = windowed_candidates(&signal, rate, &TempoConfig::default()).unwrap();

        assert!(!candidates.is_empty(), "Should find candidates");
        let best = candidates
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .unwrap();
        assert!(
            (best.bpm - 120.0).abs() < 2.0,
            "Strongest candidate should be 120 BPM, got {:.2}",
            best.bpm
        );
        assert!(candidates.iter().all(|c| c.method == TempoMethod::Autocorrelation));
        assert!(candidates.iter().all(|c| c.bpm >= MIN_BPM && c.bpm <= MAX_BPM));
    }

    #[test]
    fn test_short_signal_uses_whole_signal() {
        // 2 s of pulses: no 3 s window fits
        let signal = pulse_train(2_000, 500, 10);
        let candidates = windowed_candidates(&signal, 1000.0, &TempoConfig::default()).unwrap();
        assert!(candidates.iter().any(|c| (c.bpm - 120.0).abs() < 2.0));
    }

    #[test]
    fn test_silence_yields_nothing() {
        let signal = vec![0.0f32; 12_000];
        let candidates = windowed_candidates(&signal, 1000.0, &TempoConfig::default()).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_full_signal_tempo() {
        let signal = pulse_train(8_000, 400, 8);
        let bpm = full_signal_tempo(&signal, 1000.0, 60.0, 200.0).unwrap().unwrap();
        assert!((bpm - 150.0).abs() < 2.0, "Expected 150 BPM, got {:.2}", bpm);
    }

    #[test]
    fn test_invalid_rate() {
        assert!(windowed_candidates(&[0.0; 10], 0.0, &TempoConfig::default()).is_err());
        assert!(full_signal_tempo(&[0.0; 10], 1000.0, 200.0, 60.0).is_err());
    }
}
