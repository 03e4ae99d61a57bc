//! Weighted consensus over candidates from every method
//!
//! All candidates are bucketed by tempo. A bucket's score is the sum of
//! `confidence × method weight` of its members; the best bucket's median
//! BPM wins, then a half/double-tempo check pulls extreme results back
//! towards a supported octave.

use std::collections::BTreeMap;

use super::candidate_filter::{bucket_index, median};
use super::BpmCandidate;
use crate::config::TempoConfig;

/// Results above this are checked for a supported half tempo
pub const OCTAVE_HIGH_BPM: f32 = 200.0;

/// Results below this are checked for a supported double tempo
pub const OCTAVE_LOW_BPM: f32 = 50.0;

/// Select the consensus tempo
///
/// # Arguments
///
/// * `candidates` - Candidates from all methods
/// * `config` - Tempo configuration (weights, bucket width)
///
/// # Returns
///
/// Consensus BPM (unrounded), or `None` when there are no candidates
pub fn select_consensus(candidates: &[BpmCandidate], config: &TempoConfig) -> Option<f32> {
    let mut buckets: BTreeMap<i64, (f32, Vec<f32>)> = BTreeMap::new();

    for candidate in candidates {
        if !candidate.bpm.is_finite() || candidate.bpm <= 0.0 {
            continue;
        }
        let entry = buckets
            .entry(bucket_index(candidate.bpm, config.bucket_width))
            .or_insert_with(|| (0.0, Vec::new()));
        entry.0 += candidate.confidence * candidate.method.weight(config);
        entry.1.push(candidate.bpm);
    }

    let mut best: Option<(i64, f32)> = None;
    for (&index, (score, _)) in &buckets {
        if best.map_or(true, |(_, s)| *score > s) {
            best = Some((index, *score));
        }
    }
    let (index, score) = best?;
    let mut members = buckets.remove(&index)?.1;
    let bpm = median(&mut members)?;

    log::debug!(
        "Consensus: {} buckets, best bucket {} (score {:.3}, median {:.2} BPM)",
        buckets.len() + 1,
        index,
        score,
        bpm
    );

    Some(octave_correct(bpm, candidates, config.bucket_width))
}

/// Half/double-tempo correction
///
/// A result above 200 BPM is halved when some candidate sits within one
/// bucket width of the half; a result below 50 BPM is doubled likewise.
pub fn octave_correct(bpm: f32, candidates: &[BpmCandidate], tolerance: f32) -> f32 {
    let supported = |target: f32| candidates.iter().any(|c| (c.bpm - target).abs() <= tolerance);

    if bpm > OCTAVE_HIGH_BPM && supported(bpm / 2.0) {
        log::debug!("Octave correction: {:.2} -> {:.2} BPM", bpm, bpm / 2.0);
        bpm / 2.0
    } else if bpm < OCTAVE_LOW_BPM && supported(bpm * 2.0) {
        log::debug!("Octave correction: {:.2} -> {:.2} BPM", bpm, bpm * 2.0);
        bpm * 2.0
    } else {
        bpm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::period::TempoMethod;

    fn candidate(bpm: f32, confidence: f32, method: TempoMethod) -> BpmCandidate {
        BpmCandidate {
            bpm,
            confidence,
            method,
        }
    }

    #[test]
    fn test_empty_has_no_consensus() {
        assert_eq!(select_consensus(&[], &TempoConfig::default()), None);
    }

    #[test]
    fn test_weighted_bucket_wins() {
        let candidates = vec![
            candidate(120.0, 0.8, TempoMethod::Autocorrelation),
            candidate(121.0, 0.6, TempoMethod::BeatTracking),
            candidate(90.0, 1.0, TempoMethod::OnsetDetection),
        ];
        let bpm = select_consensus(&candidates, &TempoConfig::default()).unwrap();
        assert!((bpm - 120.5).abs() < 1e-4, "Expected median of 120/121, got {}", bpm);
    }

    #[test]
    fn test_method_weights_break_ties() {
        // Equal confidence: autocorrelation (1.2) outweighs onset (0.8)
        let candidates = vec![
            candidate(100.0, 1.0, TempoMethod::OnsetDetection),
            candidate(140.0, 1.0, TempoMethod::Autocorrelation),
        ];
        let bpm = select_consensus(&candidates, &TempoConfig::default()).unwrap();
        assert_eq!(bpm, 140.0);
    }

    #[test]
    fn test_octave_correction_halves() {
        let candidates = vec![
            candidate(240.0, 1.0, TempoMethod::Autocorrelation),
            candidate(240.0, 1.0, TempoMethod::BeatTracking),
            candidate(121.0, 0.2, TempoMethod::OnsetDetection),
        ];
        let bpm = select_consensus(&candidates, &TempoConfig::default()).unwrap();
        assert_eq!(bpm, 120.0);
    }

    #[test]
    fn test_octave_correction_doubles() {
        let candidates = vec![
            candidate(45.0, 1.0, TempoMethod::Autocorrelation),
            candidate(88.0, 0.1, TempoMethod::BeatTracking),
        ];
        assert_eq!(select_consensus(&candidates, &TempoConfig::default()).unwrap(), 90.0);
    }

    #[test]
    fn test_no_correction_without_support() {
        let candidates = vec![candidate(220.0, 1.0, TempoMethod::Autocorrelation)];
        assert_eq!(select_consensus(&candidates, &TempoConfig::default()).unwrap(), 220.0);
    }
}
