//! Perceptually weighted spectral centroid ("center frequency")
//!
//! One 2048-point Blackman-windowed FFT over the loudest frame of the clip,
//! an approximate A-weighting curve, and a 70/30 blend of the weighted
//! centroid with the strongest bin's frequency.

use super::{SpectrumAnalyzer, WindowKind};
use crate::error::RemixError;
use crate::io::AudioClip;
use crate::preprocessing::channel_mixer::downmix_to_mono;

/// FFT size of the center-frequency snapshot
pub const CENTROID_FFT_SIZE: usize = 2048;

/// Share of the weighted centroid in the final blend
const CENTROID_SHARE: f32 = 0.7;

/// Approximate A-weighting
///
/// Linear ramp from 0 at DC to 1 at 1 kHz, flat to 4 kHz, then a linear
/// roll-off reaching 0 at 20 kHz.
pub fn a_weighting_approx(freq_hz: f32) -> f32 {
    if freq_hz < 1000.0 {
        (freq_hz / 1000.0).max(0.0)
    } else if freq_hz <= 4000.0 {
        1.0
    } else {
        ((20000.0 - freq_hz) / 16000.0).max(0.0)
    }
}

/// Center frequency of a clip in Hz
///
/// All channels are averaged and the first `max_seconds` are scanned for the
/// loudest 2048-sample frame, which is then analysed.
///
/// # Arguments
///
/// * `clip` - Decoded clip
/// * `max_seconds` - Analysis span from the start of the clip
///
/// # Returns
///
/// Frequency in Hz (≥ 0), 0 when the frame carries no energy
///
/// # Errors
///
/// `AnalysisError` if the spectrum contains non-finite values
pub fn center_frequency(clip: &AudioClip, max_seconds: f32) -> Result<f32, RemixError> {
    let limit = if max_seconds.is_finite() && max_seconds > 0.0 {
        (max_seconds as f64 * clip.sample_rate() as f64) as usize
    } else {
        clip.frames()
    };

    let mono = downmix_to_mono(clip.channels());
    let span = &mono[..mono.len().min(limit)];
    center_frequency_from_samples(span, clip.sample_rate())
}

/// Center frequency of a mono signal in Hz
///
/// See [`center_frequency`].
pub fn center_frequency_from_samples(samples: &[f32], sample_rate: u32) -> Result<f32, RemixError> {
    if samples.is_empty() || sample_rate == 0 {
        return Ok(0.0);
    }

    let frame = loudest_frame(samples, CENTROID_FFT_SIZE);
    let mut analyzer = SpectrumAnalyzer::new(CENTROID_FFT_SIZE, WindowKind::Blackman)?;
    let magnitudes = analyzer.magnitudes(frame);

    let bin_hz = sample_rate as f32 / CENTROID_FFT_SIZE as f32;

    let mut weighted_sum = 0.0f32;
    let mut total = 0.0f32;
    let mut peak_bin = 0usize;
    let mut peak_mag = 0.0f32;

    for (bin, &mag) in magnitudes.iter().enumerate() {
        let freq = bin as f32 * bin_hz;
        let weighted = mag * a_weighting_approx(freq);
        weighted_sum += freq * weighted;
        total += weighted;

        if mag > peak_mag {
            peak_mag = mag;
            peak_bin = bin;
        }
    }

    if !weighted_sum.is_finite() || !total.is_finite() {
        return Err(RemixError::AnalysisError(
            "Non-finite spectrum in center frequency".to_string(),
        ));
    }

    if total <= 0.0 {
        log::debug!("Center frequency: silent frame");
        return Ok(0.0);
    }

    let centroid = weighted_sum / total;
    let peak_freq = peak_bin as f32 * bin_hz;
    let blended = CENTROID_SHARE * centroid + (1.0 - CENTROID_SHARE) * peak_freq;

    log::debug!(
        "Center frequency: centroid={:.1} Hz, peak={:.1} Hz, blended={:.1} Hz",
        centroid,
        peak_freq,
        blended
    );

    Ok(blended.max(0.0))
}

/// Highest-energy window of `size` samples (hop `size / 2`)
fn loudest_frame(samples: &[f32], size: usize) -> &[f32] {
    if samples.len() <= size {
        return samples;
    }

    let hop = size / 2;
    let mut best_start = 0;
    let mut best_energy = -1.0f32;
    let mut start = 0;
    while start + size <= samples.len() {
        let energy: f32 = samples[start..start + size].iter().map(|x| x * x).sum();
        if energy > best_energy {
            best_energy = energy;
            best_start = start;
        }
        start += hop;
    }

    &samples[best_start..best_start + size]
}
