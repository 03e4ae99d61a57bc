//! Scale filtering, transposition and reordering
//!
//! Works on any clip representation: callers supply how to read a clip's
//! root pitch class and how to transpose it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::scales::Scale;
use crate::error::RemixError;

/// What to do with clips relative to a scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleBehavior {
    /// Keep only clips whose root is in the scale; unknown roots are dropped
    Filter,
    /// Shift out-of-scale clips to the nearest scale note; unknown roots pass
    Transpose,
    /// Put in-scale clips first, then sort by root; unknown roots count as C
    Reorder,
}

impl FromStr for ScaleBehavior {
    type Err = RemixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filter" => Ok(ScaleBehavior::Filter),
            "transpose" => Ok(ScaleBehavior::Transpose),
            "reorder" => Ok(ScaleBehavior::Reorder),
            other => Err(RemixError::InvalidInput(format!("Unknown scale behavior: {}", other))),
        }
    }
}

impl fmt::Display for ScaleBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScaleBehavior::Filter => "filter",
            ScaleBehavior::Transpose => "transpose",
            ScaleBehavior::Reorder => "reorder",
        };
        write!(f, "{}", name)
    }
}

/// Signed circular offset from `note` to `scale_note` with the smallest size
///
/// Compares the raw, +12 and -12 offsets; the first smallest wins.
fn circular_offset(note: u8, scale_note: u8) -> i32 {
    let raw = scale_note as i32 - note as i32;
    [raw, raw + 12, raw - 12]
        .into_iter()
        .fold(raw, |best, d| if d.abs() < best.abs() { d } else { best })
}

/// Nearest scale note to a pitch class
///
/// Ties go to the earliest note in the scale's pitch-class order.
pub fn nearest_scale_note(pitch_class: u8, scale: &Scale) -> u8 {
    let mut nearest = pitch_class;
    let mut min_dist = i32::MAX;
    for &note in scale.pitch_classes {
        let dist = circular_offset(pitch_class, note).abs();
        if dist < min_dist {
            min_dist = dist;
            nearest = note;
        }
    }
    nearest
}

/// Semitones that move a pitch class onto its nearest scale note
///
/// The result is the shortest signed shift, in [-6, 6]; 0 for members.
pub fn transposition_semitones(pitch_class: u8, scale: &Scale) -> i32 {
    // Octave picked for the shortest shift: B -> C is +1, not -11
    circular_offset(pitch_class, nearest_scale_note(pitch_class, scale))
}

/// Apply a scale behavior to a set of clips
///
/// # Arguments
///
/// * `items` - Clips in their current order
/// * `scale` - Target scale
/// * `behavior` - Filter, transpose or reorder
/// * `root_of` - Root pitch class of a clip, `None` when unresolvable
/// * `transpose` - Shift a clip by a number of semitones
///
/// # Returns
///
/// The surviving clips in their new order
///
/// # Errors
///
/// Propagates the first error returned by `transpose`
pub fn adjust_to_scale<T, R, X>(
    items: Vec<T>,
    scale: &Scale,
    behavior: ScaleBehavior,
    root_of: R,
    mut transpose: X,
) -> Result<Vec<T>, RemixError>
where
    R: Fn(&T) -> Option<u8>,
    X: FnMut(T, i32) -> Result<T, RemixError>,
{
    let before = items.len();

    let result = match behavior {
        ScaleBehavior::Filter => items
            .into_iter()
            .filter(|item| root_of(item).map_or(false, |pc| scale.contains(pc)))
            .collect(),
        ScaleBehavior::Transpose => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let shift = root_of(&item).map_or(0, |pc| transposition_semitones(pc, scale));
                if shift == 0 {
                    out.push(item);
                } else {
                    out.push(transpose(item, shift)?);
                }
            }
            out
        }
        ScaleBehavior::Reorder => {
            let mut keyed: Vec<(bool, u8, T)> = items
                .into_iter()
                .map(|item| {
                    let pc = root_of(&item).unwrap_or(0);
                    (scale.contains(pc), pc, item)
                })
                .collect();
            // Stable: equal keys keep their input order
            keyed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            keyed.into_iter().map(|(_, _, item)| item).collect()
        }
    };

    log::debug!(
        "Scale '{}' ({}): {} clips -> {}",
        scale.name,
        behavior,
        before,
        result.len()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::key::notes::root_pitch_class;
    use crate::features::key::scales::SCALES;

    fn major() -> &'static Scale {
        Scale::by_name("major").unwrap()
    }

    fn no_transpose(item: &'static str, _: i32) -> Result<&'static str, RemixError> {
        Ok(item)
    }

    #[test]
    fn test_filter_keeps_c_e_g_in_major() {
        let keys = vec!["C", "E", "G"];
        let kept = adjust_to_scale(keys, major(), ScaleBehavior::Filter, |k| root_pitch_class(k), no_transpose).unwrap();
        assert_eq!(kept, vec!["C", "E", "G"]);
    }

    #[test]
    fn test_filter_matches_membership_for_every_scale() {
        for scale in SCALES {
            let pcs: Vec<u8> = (0..12).collect();
            let kept = adjust_to_scale(pcs, scale, ScaleBehavior::Filter, |&p| Some(p), |p, _| Ok(p)).unwrap();
            let expected: Vec<u8> = (0..12).filter(|p| scale.contains(*p)).collect();
            assert_eq!(kept, expected, "filter should keep exactly the members of {}", scale.name);
        }
    }

    #[test]
    fn test_filter_drops_unknown() {
        let keys = vec!["C", "Unknown", "C#"];
        let kept = adjust_to_scale(keys, major(), ScaleBehavior::Filter, |k| root_pitch_class(k), no_transpose).unwrap();
        assert_eq!(kept, vec!["C"]);
    }

    #[test]
    fn test_nearest_scale_note_ties_take_first() {
        // C# is one semitone from both C and D; C comes first
        assert_eq!(nearest_scale_note(1, major()), 0);
        assert_eq!(transposition_semitones(1, major()), -1);
        // Members stay put
        assert_eq!(transposition_semitones(4, major()), 0);
    }

    #[test]
    fn test_transposition_wraps_around_the_octave() {
        let scale = Scale {
            name: "test",
            pitch_classes: &[0, 5],
        };
        // B is one semitone below C, not eleven above
        assert_eq!(transposition_semitones(11, &scale), 1);
        assert!((0..12u8).all(|p| transposition_semitones(p, &scale).abs() <= 6));
    }

    #[test]
    fn test_transpose_shifts_only_out_of_scale() {
        let items = vec![(0u8, 0i32), (6, 0), (10, 0)];
        let out = adjust_to_scale(
            items,
            major(),
            ScaleBehavior::Transpose,
            |&(pc, _)| Some(pc),
            |(pc, _), shift| Ok((pc, shift)),
        )
        .unwrap();
        assert_eq!(out, vec![(0, 0), (6, -1), (10, -1)]);
    }

    #[test]
    fn test_transpose_passes_unknown_through() {
        let keys = vec!["Unknown", "D"];
        let out = adjust_to_scale(keys, major(), ScaleBehavior::Transpose, |k| root_pitch_class(k), |_, _| {
            Err(RemixError::RenderError("should not transpose".to_string()))
        })
        .unwrap();
        assert_eq!(out, vec!["Unknown", "D"]);
    }

    #[test]
    fn test_transpose_propagates_errors() {
        let result = adjust_to_scale(vec!["C#"], major(), ScaleBehavior::Transpose, |k| root_pitch_class(k), |_, _| {
            Err::<&str, _>(RemixError::RenderError("boom".to_string()))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_reorder_scale_members_first() {
        let keys = vec!["F#", "G", "Unknown", "C#", "E", "C"];
        let out = adjust_to_scale(keys, major(), ScaleBehavior::Reorder, |k| root_pitch_class(k), no_transpose).unwrap();
        assert_eq!(out, vec!["Unknown", "C", "E", "G", "C#", "F#"]);
    }

    #[test]
    fn test_behavior_parsing() {
        assert_eq!("reorder".parse::<ScaleBehavior>().unwrap(), ScaleBehavior::Reorder);
        assert!("shuffle".parse::<ScaleBehavior>().is_err());
        assert_eq!(ScaleBehavior::Transpose.to_string(), "transpose");
    }
}
