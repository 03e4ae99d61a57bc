//! Spectral flux beat tracking
//!
//! Flux is the positive-only difference between consecutive magnitude
//! spectra (Hann window, 75% overlap by default). Flux peaks are taken as
//! beats; inter-beat intervals vote for a tempo.
//!
//! # Example
//!
//! ```no_run
//! use stratum_remix::config::TempoConfig;
//! use stratum_remix::features::onset::spectral_flux::beat_tracking_candidates;
//!
//! let samples = vec![0.0f32; 11025 * 10];
//! let candidates = beat_tracking_candidates(&samples, 11025.0, &TempoConfig::default())?;
//! # Ok::<(), stratum_remix::RemixError>(())
//! ```

use super::{frame_intervals, min_gap_frames};
use crate::config::TempoConfig;
use crate::error::RemixError;
use crate::features::period::candidate_filter::rank_intervals;
use crate::features::period::peak_picking::{find_peaks, PeakThreshold};
use crate::features::period::{BpmCandidate, TempoMethod};
use crate::features::spectrum::stft_magnitudes;

/// Flux peak threshold relative to the strongest flux frame
const FLUX_PEAK_THRESHOLD: f32 = 0.3;

/// Positive spectral flux per frame
///
/// # Arguments
///
/// * `samples` - Mono analysis signal
/// * `frame_size` - FFT size
/// * `hop_size` - Hop between frames
///
/// # Returns
///
/// One value per frame; the first frame has no predecessor and is 0
///
/// # Errors
///
/// Returns `InvalidInput` for a zero or too-small frame/hop size
pub fn spectral_flux(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Vec<f32>, RemixError> {
    let spectra = stft_magnitudes(samples, frame_size, hop_size)?;

    let mut flux = Vec::with_capacity(spectra.len());
    if let Some(first) = spectra.first() {
        flux.push(0.0);
        let mut prev = first;
        for current in &spectra[1..] {
            let value: f32 = current
                .iter()
                .zip(prev.iter())
                .map(|(&m, &p)| (m - p).max(0.0))
                .sum();
            flux.push(value);
            prev = current;
        }
    }

    Ok(flux)
}

/// Beat-tracking BPM candidates
///
/// # Arguments
///
/// * `samples` - Decimated, high-passed mono signal
/// * `rate` - Its sample rate in Hz
/// * `config` - Tempo configuration (flux frame/hop, bucketing)
///
/// # Returns
///
/// Up to three candidates, most voted first
pub fn beat_tracking_candidates(
    samples: &[f32],
    rate: f32,
    config: &TempoConfig,
) -> Result<Vec<BpmCandidate>, RemixError> {
    if rate.is_nan() || rate <= 0.0 {
        return Err(RemixError::AnalysisError(format!("Invalid analysis rate: {}", rate)));
    }

    let flux = spectral_flux(samples, config.flux_frame_size, config.flux_hop_size)?;

    let mut beats: Vec<usize> = find_peaks(
        &flux,
        PeakThreshold::Relative(FLUX_PEAK_THRESHOLD),
        min_gap_frames(rate, config.flux_hop_size),
    )
    .into_iter()
    .map(|(idx, _)| idx)
    .collect();
    beats.sort_unstable();

    log::debug!("Spectral flux: {} frames, {} beats", flux.len(), beats.len());

    let intervals = frame_intervals(&beats, rate, config.flux_hop_size);
    Ok(rank_intervals(&intervals, TempoMethod::BeatTracking, config))
}
