//! Synthetic reverb impulse response
//!
//! Stereo white noise under an exponential decay `exp(-t / duration)`,
//! peak-normalized to 0.8. A new response is drawn for every render.

use rand::Rng;

use crate::error::RemixError;
use crate::preprocessing::normalization::{peak_normalize, TARGET_PEAK};

/// Default reverb tail in seconds
pub const DEFAULT_REVERB_SECONDS: f32 = 2.0;

/// Build a stereo impulse response
///
/// # Arguments
///
/// * `duration` - Tail length in seconds, also the decay time constant
/// * `sample_rate` - Rate of the render the response is used in
/// * `rng` - Noise source
///
/// # Returns
///
/// Two planar channels of `round(duration * sample_rate)` samples
///
/// # Errors
///
/// `ValidationError` if the duration or rate give an empty response
pub fn impulse_response<R: Rng + ?Sized>(
    duration: f32,
    sample_rate: u32,
    rng: &mut R,
) -> Result<Vec<Vec<f32>>, RemixError> {
    if !duration.is_finite() || duration <= 0.0 || sample_rate == 0 {
        return Err(RemixError::ValidationError(format!(
            "Invalid reverb: {}s at {} Hz",
            duration, sample_rate
        )));
    }

    let time_constant = sample_rate as f64 * duration as f64;
    let length = time_constant.round() as usize;
    if length == 0 {
        return Err(RemixError::ValidationError(format!(
            "Reverb of {}s is shorter than one sample",
            duration
        )));
    }

    let mut channels: Vec<Vec<f32>> = (0..2)
        .map(|_| {
            (0..length)
                .map(|i| {
                    let decay = (-(i as f64) / time_constant).exp() as f32;
                    (rng.gen::<f32>() * 2.0 - 1.0) * decay
                })
                .collect()
        })
        .collect();

    peak_normalize(&mut channels, TARGET_PEAK);
    log::debug!("Reverb impulse response: {} samples x 2", length);
    Ok(channels)
}
