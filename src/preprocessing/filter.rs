//! Decimation and high-pass filtering
//!
//! The tempo estimators run on a cheap, lower-rate copy of the first channel:
//! naive decimation (keep every Nth sample) followed by a single-pole IIR
//! high-pass that strips DC and rumble.

use std::f32::consts::PI;

/// Naive decimation toward a target rate
///
/// Keeps every Nth sample where `N = max(1, floor(sample_rate / target_rate))`.
/// There is no anti-alias filter.
///
/// # Returns
///
/// `(decimated, effective_rate)`, where `effective_rate = sample_rate / N`
pub fn decimate(samples: &[f32], sample_rate: u32, target_rate: u32) -> (Vec<f32>, f32) {
    let factor = if target_rate == 0 {
        1
    } else {
        (sample_rate / target_rate).max(1) as usize
    };
    let decimated: Vec<f32> = samples.iter().step_by(factor).copied().collect();
    let effective_rate = sample_rate as f32 / factor as f32;

    log::debug!(
        "Decimated {} samples by {} -> {} samples at {:.1} Hz",
        samples.len(),
        factor,
        decimated.len(),
        effective_rate
    );

    (decimated, effective_rate)
}

/// Single-pole RC high-pass filter
///
/// `y[i] = a * (y[i-1] + x[i] - x[i-1])` with `a = RC / (RC + dt)`,
/// `RC = 1 / (2π·cutoff)` and `dt = 1 / sample_rate`. The first output equals
/// the first input.
pub fn high_pass_filter(samples: &[f32], sample_rate: f32, cutoff_hz: f32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    if sample_rate <= 0.0 || cutoff_hz <= 0.0 {
        return samples.to_vec();
    }

    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    let dt = 1.0 / sample_rate;
    let alpha = rc / (rc + dt);

    let mut out = Vec::with_capacity(samples.len());
    out.push(samples[0]);
    for i in 1..samples.len() {
        let y = alpha * (out[i - 1] + samples[i] - samples[i - 1]);
        out.push(y);
    }
    out
}
