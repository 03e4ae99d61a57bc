//! Resampling
//!
//! Two kinds of resampling live here:
//!
//! - **Playback rate**: a buffer is read at `rate` source samples per output
//!   sample with linear interpolation, the way a buffer source with a
//!   playback-rate parameter does. Pitch and tempo move together.
//! - **Sample-rate conversion**: band-limited sinc interpolation through
//!   rubato, so downsampling does not fold content above the new Nyquist
//!   frequency back into the mix.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::RemixError;
use crate::io::AudioClip;

/// Sinc filter length of the sample-rate converter
pub const SINC_LEN: usize = 256;

/// Resample one channel by a playback rate
///
/// Output length is `ceil(len / rate)`.
pub fn resample_channel(samples: &[f32], rate: f64) -> Vec<f32> {
    if samples.is_empty() || !rate.is_finite() || rate <= 0.0 {
        return samples.to_vec();
    }
    if (rate - 1.0).abs() < f64::EPSILON {
        return samples.to_vec();
    }

    let out_len = (samples.len() as f64 / rate).ceil() as usize;
    let last = samples.len() - 1;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 * rate;
        let idx = src_pos.floor() as usize;
        if idx >= last {
            out.push(samples[last]);
        } else {
            let frac = (src_pos - idx as f64) as f32;
            out.push(samples[idx] * (1.0 - frac) + samples[idx + 1] * frac);
        }
    }
    out
}

/// Resample all channels of a clip by a playback rate, keeping its name
/// and sample rate
///
/// # Errors
///
/// `InvalidInput` for a non-positive or non-finite rate.
pub fn resample_clip(clip: &AudioClip, rate: f64) -> Result<AudioClip, RemixError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(RemixError::InvalidInput(format!(
            "Invalid playback rate: {}",
            rate
        )));
    }
    let channels = clip
        .channels()
        .iter()
        .map(|c| resample_channel(c, rate))
        .collect();
    AudioClip::new(clip.name(), clip.sample_rate(), channels)
}

/// Pitch-shift a clip by whole semitones through playback-rate resampling
///
/// The rate is `2^(semitones / 12)`; a positive shift shortens the clip.
pub fn transpose_clip(clip: &AudioClip, semitones: i32) -> Result<AudioClip, RemixError> {
    if semitones == 0 {
        return Ok(clip.clone());
    }
    let rate = 2f64.powf(semitones as f64 / 12.0);
    log::debug!(
        "Transposing '{}' by {} semitones (rate {:.4})",
        clip.name(),
        semitones,
        rate
    );
    resample_clip(clip, rate)
}

/// Convert a clip to another sample rate
///
/// All channels go through one sinc resampler. The filter delay is removed
/// so the output stays aligned with the input and holds exactly
/// `ceil(frames * target_rate / source_rate)` frames.
///
/// # Errors
///
/// - `InvalidInput` for a zero target rate
/// - `ValidationError` if the resampler rejects the ratio or the input
pub fn convert_sample_rate(clip: &AudioClip, target_rate: u32) -> Result<AudioClip, RemixError> {
    if target_rate == 0 {
        return Err(RemixError::InvalidInput("Invalid sample rate: 0".to_string()));
    }
    if clip.sample_rate() == target_rate {
        return Ok(clip.clone());
    }

    let ratio = target_rate as f64 / clip.sample_rate() as f64;
    let frames = clip.frames();
    let out_len = (frames as f64 * ratio).ceil() as usize;
    log::debug!(
        "Converting '{}' from {} Hz to {} Hz ({} -> {} frames)",
        clip.name(),
        clip.sample_rate(),
        target_rate,
        frames,
        out_len
    );

    // Trailing silence flushes the filter tail out of the resampler
    let padded = frames + SINC_LEN;
    let waves_in: Vec<Vec<f32>> = clip
        .channels()
        .iter()
        .map(|c| {
            let mut channel = Vec::with_capacity(padded);
            channel.extend_from_slice(c);
            channel.resize(padded, 0.0);
            channel
        })
        .collect();

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, padded, waves_in.len())
        .map_err(|e| RemixError::ValidationError(format!("Cannot build resampler: {}", e)))?;
    let waves_out = resampler
        .process(&waves_in, None)
        .map_err(|e| RemixError::ValidationError(format!("Resampling failed: {}", e)))?;

    let delay = (SINC_LEN as f64 * ratio / 2.0) as usize;
    let channels = waves_out
        .into_iter()
        .map(|wave| {
            let mut channel: Vec<f32> = wave.into_iter().skip(delay).take(out_len).collect();
            channel.resize(out_len, 0.0);
            channel
        })
        .collect();
    AudioClip::new(clip.name(), target_rate, channels)
}
