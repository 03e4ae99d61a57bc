//! BPM candidate bucketing
//!
//! Interval-based methods produce one BPM value per interval. Values are
//! grouped into fixed-width buckets and the three most-voted buckets become
//! candidates.

use std::collections::BTreeMap;

use super::{BpmCandidate, TempoMethod, CANDIDATE_MIN_BPM, MAX_BPM};
use crate::config::TempoConfig;

/// Buckets kept per method
pub const TOP_BUCKETS: usize = 3;

/// Bucket index of a tempo: `round(bpm / width)`
pub fn bucket_index(bpm: f32, width: f32) -> i64 {
    let width = if width > 0.0 { width } else { 5.0 };
    (bpm / width).round() as i64
}

/// Median of a set of values (mean of the middle pair for even counts)
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Rank inter-event intervals into BPM candidates
///
/// # Arguments
///
/// * `intervals` - Time between consecutive events, in seconds
/// * `method` - Method the intervals came from
/// * `config` - Tempo configuration (bucket width, range penalty)
///
/// # Returns
///
/// Up to [`TOP_BUCKETS`] candidates, most votes first. Each candidate's BPM
/// is the median of its bucket; its confidence is the bucket's vote share,
/// scaled down when outside the method's preferred range.
pub fn rank_intervals(intervals: &[f32], method: TempoMethod, config: &TempoConfig) -> Vec<BpmCandidate> {
    let mut buckets: BTreeMap<i64, Vec<f32>> = BTreeMap::new();
    let mut total = 0usize;

    for &interval in intervals {
        if !(interval.is_finite() && interval > 0.0) {
            continue;
        }
        let bpm = 60.0 / interval;
        if bpm < CANDIDATE_MIN_BPM || bpm > MAX_BPM {
            continue;
        }
        buckets
            .entry(bucket_index(bpm, config.bucket_width))
            .or_default()
            .push(bpm);
        total += 1;
    }

    if total == 0 {
        log::debug!("{:?}: no usable intervals", method);
        return vec![];
    }

    let mut ranked: Vec<(i64, Vec<f32>)> = buckets.into_iter().collect();
    // Most votes first, lower tempo first on ties
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));

    let candidates: Vec<BpmCandidate> = ranked
        .into_iter()
        .take(TOP_BUCKETS)
        .filter_map(|(_, mut members)| {
            let votes = members.len();
            let bpm = median(&mut members)?;
            Some(BpmCandidate {
                bpm,
                confidence: votes as f32 / total as f32
                    * method.range_factor(bpm, config.out_of_range_penalty),
                method,
            })
        })
        .collect();

    log::debug!(
        "{:?}: {} intervals -> {} candidates {:?}",
        method,
        total,
        candidates.len(),
        candidates.iter().map(|c| c.bpm).collect::<Vec<_>>()
    );

    candidates
}
