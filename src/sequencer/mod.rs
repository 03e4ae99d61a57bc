//! Clip ordering
//!
//! Produces the play order of a looping mix: one clip index per bar.
//! Orderings are cyclic over the clip set except `random` (independent
//! draws) and `markov` (a random walk on a [`TransitionMatrix`]).

pub mod markov;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RemixError;
use crate::features::key::Scale;

pub use markov::TransitionMatrix;

/// Ordering algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequenceAlgorithm {
    /// `i mod n`
    Sequential,
    /// Independent uniform draw per step
    Random,
    /// `n - 1 - (i mod n)`
    Reverse,
    /// In-scale roots first, then ascending pitch class
    ScaleAscending,
    /// Ascending center frequency
    FrequencyAscending,
    /// Descending center frequency
    FrequencyDescending,
    /// Random walk on a memoised transition matrix
    Markov,
    /// Every clip once, all starting together
    OneShot,
}

impl SequenceAlgorithm {
    /// All algorithms, in menu order
    pub const ALL: [SequenceAlgorithm; 8] = [
        SequenceAlgorithm::Sequential,
        SequenceAlgorithm::Random,
        SequenceAlgorithm::Reverse,
        SequenceAlgorithm::ScaleAscending,
        SequenceAlgorithm::FrequencyAscending,
        SequenceAlgorithm::FrequencyDescending,
        SequenceAlgorithm::Markov,
        SequenceAlgorithm::OneShot,
    ];

    /// Whether clips all start together instead of being placed per bar
    pub fn is_one_shot(self) -> bool {
        self == SequenceAlgorithm::OneShot
    }

    /// Identifier used in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            SequenceAlgorithm::Sequential => "sequential",
            SequenceAlgorithm::Random => "random",
            SequenceAlgorithm::Reverse => "reverse",
            SequenceAlgorithm::ScaleAscending => "scale-ascending",
            SequenceAlgorithm::FrequencyAscending => "frequency-ascending",
            SequenceAlgorithm::FrequencyDescending => "frequency-descending",
            SequenceAlgorithm::Markov => "markov",
            SequenceAlgorithm::OneShot => "one-shot",
        }
    }
}

impl fmt::Display for SequenceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SequenceAlgorithm {
    type Err = RemixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| RemixError::InvalidInput(format!("Unknown sequencing algorithm: {}", s)))
    }
}

/// What the sequencer knows about a clip
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipFeatures {
    /// Resolved root pitch class, if any
    pub root_pitch_class: Option<u8>,
    /// Center frequency in Hz
    pub center_frequency: f32,
}

/// Play order of `length` steps
///
/// # Arguments
///
/// * `algorithm` - Ordering algorithm
/// * `clips` - Per-clip features, indexed like the clip list
/// * `length` - Number of steps (ignored by `OneShot`, which lists each clip once)
/// * `scale` - Scale for `ScaleAscending` (chromatic when `None`)
/// * `markov` - Memoised transition matrix; built or rebuilt when absent or
///   sized for a different clip count
/// * `rng` - Randomness for `Random` and `Markov`
///
/// # Returns
///
/// Clip indices, each in `[0, clips.len())`
///
/// # Errors
///
/// `ValidationError` if steps are requested from an empty clip set
pub fn sequence<R: Rng + ?Sized>(
    algorithm: SequenceAlgorithm,
    clips: &[ClipFeatures],
    length: usize,
    scale: Option<&Scale>,
    markov: &mut Option<TransitionMatrix>,
    rng: &mut R,
) -> Result<Vec<usize>, RemixError> {
    let n = clips.len();
    if n == 0 {
        if length == 0 || algorithm == SequenceAlgorithm::OneShot {
            return Ok(Vec::new());
        }
        return Err(RemixError::ValidationError("No clips to sequence".to_string()));
    }

    let order = match algorithm {
        SequenceAlgorithm::Sequential => (0..length).map(|i| i % n).collect(),
        SequenceAlgorithm::Random => (0..length).map(|_| rng.gen_range(0..n)).collect(),
        SequenceAlgorithm::Reverse => (0..length).map(|i| n - 1 - (i % n)).collect(),
        SequenceAlgorithm::ScaleAscending => cycle(&scale_order(clips, scale), length),
        SequenceAlgorithm::FrequencyAscending => cycle(&frequency_order(clips, false), length),
        SequenceAlgorithm::FrequencyDescending => cycle(&frequency_order(clips, true), length),
        SequenceAlgorithm::Markov => {
            let matrix = match markov.take() {
                Some(matrix) if matrix.len() == n => matrix,
                stale => {
                    if stale.is_some() {
                        log::debug!("Clip count changed to {}, rebuilding transition matrix", n);
                    }
                    TransitionMatrix::random(n, rng)?
                }
            };
            let order = matrix.sample_sequence(length, rng);
            *markov = Some(matrix);
            order
        }
        SequenceAlgorithm::OneShot => (0..n).collect(),
    };

    log::debug!("Sequenced {} clips with {}: {:?}", n, algorithm, order);
    Ok(order)
}

fn cycle(sorted: &[usize], length: usize) -> Vec<usize> {
    (0..length).map(|i| sorted[i % sorted.len()]).collect()
}

/// Indices sorted by (in scale first, pitch class); unknown roots count as C
fn scale_order(clips: &[ClipFeatures], scale: Option<&Scale>) -> Vec<usize> {
    let in_scale = |pc: u8| scale.map_or(true, |s| s.contains(pc));
    let mut keyed: Vec<(bool, u8, usize)> = clips
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let pc = c.root_pitch_class.unwrap_or(0);
            (in_scale(pc), pc, i)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
    keyed.into_iter().map(|(_, _, i)| i).collect()
}

/// Indices sorted by center frequency; ties keep input order
fn frequency_order(clips: &[ClipFeatures], descending: bool) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..clips.len()).collect();
    indices.sort_by(|&a, &b| {
        let ord = clips[a].center_frequency.total_cmp(&clips[b].center_frequency);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn features(roots: &[Option<u8>], freqs: &[f32]) -> Vec<ClipFeatures> {
        roots
            .iter()
            .zip(freqs)
            .map(|(&root_pitch_class, &center_frequency)| ClipFeatures {
                root_pitch_class,
                center_frequency,
            })
            .collect()
    }

    fn run(algorithm: SequenceAlgorithm, clips: &[ClipFeatures], length: usize) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(3);
        sequence(algorithm, clips, length, None, &mut None, &mut rng).unwrap()
    }

    #[test]
    fn test_sequential_and_reverse() {
        let clips = vec![ClipFeatures::default(); 3];
        assert_eq!(run(SequenceAlgorithm::Sequential, &clips, 7), vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(run(SequenceAlgorithm::Reverse, &clips, 5), vec![2, 1, 0, 2, 1]);
    }

    #[test]
    fn test_random_in_range() {
        let clips = vec![ClipFeatures::default(); 4];
        let order = run(SequenceAlgorithm::Random, &clips, 100);
        assert_eq!(order.len(), 100);
        assert!(order.iter().all(|&i| i < 4));
    }

    #[test]
    fn test_scale_ascending() {
        let clips = features(&[Some(6), Some(4), None, Some(1)], &[0.0; 4]);
        let major = Scale::by_name("major").unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let order = sequence(SequenceAlgorithm::ScaleAscending, &clips, 6, Some(major), &mut None, &mut rng).unwrap();
        // C (unknown) and E are in scale; then C#, F#
        assert_eq!(order, vec![2, 1, 3, 0, 2, 1]);
    }

    #[test]
    fn test_scale_ascending_without_scale_is_chromatic() {
        let clips = features(&[Some(7), Some(2), Some(11)], &[0.0; 3]);
        assert_eq!(run(SequenceAlgorithm::ScaleAscending, &clips, 3), vec![1, 0, 2]);
    }

    #[test]
    fn test_frequency_orders() {
        let clips = features(&[None; 3], &[800.0, 200.0, 1500.0]);
        assert_eq!(run(SequenceAlgorithm::FrequencyAscending, &clips, 4), vec![1, 0, 2, 1]);
        assert_eq!(run(SequenceAlgorithm::FrequencyDescending, &clips, 3), vec![2, 0, 1]);
    }

    #[test]
    fn test_one_shot_lists_each_clip() {
        let clips = vec![ClipFeatures::default(); 3];
        assert_eq!(run(SequenceAlgorithm::OneShot, &clips, 30), vec![0, 1, 2]);
    }

    #[test]
    fn test_markov_memoises_and_rebuilds() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut cache = None;

        let clips = vec![ClipFeatures::default(); 3];
        let order = sequence(SequenceAlgorithm::Markov, &clips, 50, None, &mut cache, &mut rng).unwrap();
        assert!(order.iter().all(|&i| i < 3));
        let first = cache.clone().unwrap();

        sequence(SequenceAlgorithm::Markov, &clips, 10, None, &mut cache, &mut rng).unwrap();
        assert_eq!(cache.as_ref().unwrap(), &first, "matrix should be reused");

        let fewer = vec![ClipFeatures::default(); 2];
        let order = sequence(SequenceAlgorithm::Markov, &fewer, 50, None, &mut cache, &mut rng).unwrap();
        assert!(order.iter().all(|&i| i < 2));
        assert_eq!(cache.unwrap().len(), 2);
    }

    #[test]
    fn test_empty_clip_set() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sequence(SequenceAlgorithm::Sequential, &[], 0, None, &mut None, &mut rng).unwrap().is_empty());
        assert!(sequence(SequenceAlgorithm::Markov, &[], 4, None, &mut None, &mut rng).is_err());
    }

    #[test]
    fn test_algorithm_names() {
        for algorithm in SequenceAlgorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<SequenceAlgorithm>().unwrap(), algorithm);
            let json = serde_json::to_string(&algorithm).unwrap();
            assert_eq!(json, format!("\"{}\"", algorithm.as_str()));
        }
        assert!("shuffle".parse::<SequenceAlgorithm>().is_err());
    }
}
