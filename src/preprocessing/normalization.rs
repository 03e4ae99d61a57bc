//! Peak normalization
//!
//! Rendered mixes and synthetic impulse responses are scaled so that their
//! largest absolute sample hits a fixed fraction of full scale.
//!
//! # Example
//!
//! ```
//! use stratum_remix::preprocessing::normalization::{peak_normalize, TARGET_PEAK};
//!
//! let mut channels = vec![vec![0.1f32, -0.4, 0.2]];
//! peak_normalize(&mut channels, TARGET_PEAK);
//! assert!((channels[0][1] + 0.8).abs() < 1e-6);
//! ```

/// Default normalization target (0.8 of full scale)
pub const TARGET_PEAK: f32 = 0.8;

/// Largest absolute sample across all channels
pub fn peak(channels: &[Vec<f32>]) -> f32 {
    channels
        .iter()
        .flat_map(|c| c.iter())
        .fold(0.0f32, |m, &x| m.max(x.abs()))
}

/// Scale every channel so the peak equals `target_peak`
///
/// A silent buffer (peak 0) is left unchanged.
///
/// # Returns
///
/// The linear gain that was applied (1.0 for silence)
pub fn peak_normalize(channels: &mut [Vec<f32>], target_peak: f32) -> f32 {
    let max_amplitude = peak(channels);
    if max_amplitude <= 0.0 || !max_amplitude.is_finite() {
        log::debug!("Peak normalization skipped (peak={})", max_amplitude);
        return 1.0;
    }

    let gain = target_peak / max_amplitude;
    for channel in channels.iter_mut() {
        for sample in channel.iter_mut() {
            *sample *= gain;
        }
    }

    log::debug!(
        "Peak normalized: peak {:.4} -> {:.4} (gain {:.4})",
        max_amplitude,
        target_peak,
        gain
    );
    gain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_to_target() {
        let mut channels = vec![vec![0.1, 0.5, -0.25], vec![0.0, -2.0, 1.0]];
        let gain = peak_normalize(&mut channels, TARGET_PEAK);
        assert!((gain - 0.4).abs() < 1e-6);
        assert!((peak(&channels) - 0.8).abs() < 1e-6);
        assert!((channels[0][1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_idempotent() {
        let mut channels = vec![vec![0.3, -0.9, 0.45, 0.05]];
        peak_normalize(&mut channels, TARGET_PEAK);
        let once = channels.clone();
        peak_normalize(&mut channels, TARGET_PEAK);
        for (a, b) in once[0].iter().zip(channels[0].iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_silence_unchanged() {
        let mut channels = vec![vec![0.0f32; 16], vec![0.0f32; 16]];
        let gain = peak_normalize(&mut channels, TARGET_PEAK);
        assert_eq!(gain, 1.0);
        assert!(channels.iter().flatten().all(|&s| s == 0.0));
    }
}
