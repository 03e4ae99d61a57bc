//! Peak detection utilities
//!
//! Local-maximum search with a height threshold and greedy minimum-distance
//! suppression. Used on autocorrelation functions and onset strength curves.

const EPSILON: f32 = 1e-10;

/// Minimum peak height
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeakThreshold {
    /// Fraction of the signal maximum (0.0-1.0)
    Relative(f32),
    /// Absolute value
    Absolute(f32),
}

/// Find peaks in a signal
///
/// # Arguments
///
/// * `signal` - Signal to find peaks in
/// * `threshold` - Minimum peak height
/// * `min_distance` - Minimum distance between kept peaks (in samples)
///
/// # Returns
///
/// Vector of (index, value) pairs, sorted by value (highest first)
///
/// # Algorithm
///
/// 1. Find interior local maxima (value > both neighbours)
/// 2. Filter by threshold
/// 3. Walk peaks from highest to lowest, dropping any closer than
///    `min_distance` to one already kept
///
/// # Example
///
/// ```
/// use stratum_remix::features::period::peak_picking::{find_peaks, PeakThreshold};
///
/// let signal = vec![0.0, 0.5, 1.0, 0.7, 0.3, 0.9, 0.2];
/// let peaks = find_peaks(&signal, PeakThreshold::Relative(0.5), 2);
/// assert_eq!(peaks[0].0, 2);
/// assert_eq!(peaks[1].0, 5);
/// ```
pub fn find_peaks(signal: &[f32], threshold: PeakThreshold, min_distance: usize) -> Vec<(usize, f32)> {
    if signal.len() < 3 {
        return vec![];
    }

    let max_value = signal.iter().copied().fold(f32::MIN, f32::max);
    let actual_threshold = match threshold {
        PeakThreshold::Relative(ratio) => {
            if max_value < EPSILON {
                return vec![];
            }
            max_value * ratio
        }
        PeakThreshold::Absolute(value) => value,
    };

    let mut peaks: Vec<(usize, f32)> = (1..signal.len() - 1)
        .filter(|&i| signal[i] > signal[i - 1] && signal[i] > signal[i + 1])
        .filter(|&i| signal[i] >= actual_threshold)
        .map(|i| (i, signal[i]))
        .collect();

    peaks.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    if min_distance > 1 && peaks.len() > 1 {
        let mut kept: Vec<(usize, f32)> = Vec::with_capacity(peaks.len());
        for (idx, value) in peaks {
            if kept.iter().all(|&(k, _)| idx.abs_diff(k) >= min_distance) {
                kept.push((idx, value));
            }
        }
        peaks = kept;
    }

    log::debug!(
        "Found {} peaks in {} samples (threshold={:.4}, min_distance={})",
        peaks.len(),
        signal.len(),
        actual_threshold,
        min_distance
    );

    peaks
}
