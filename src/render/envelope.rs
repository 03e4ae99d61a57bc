//! Per-event blend gain
//!
//! The step sequence is split into four cycles; within each cycle the gain
//! rises from 0.3 along half a sine toward 1.0 and falls back.

use std::f32::consts::PI;

/// Gain at the start of every cycle
pub const BLEND_FLOOR: f32 = 0.3;

/// Headroom above the floor reached mid-cycle
pub const BLEND_RANGE: f32 = 0.7;

/// Cycles per sequence
pub const BLEND_CYCLES: usize = 4;

/// Gain of step `index` in a sequence of `total` steps
///
/// Sequences shorter than four steps have one-step cycles and stay at the
/// floor.
///
/// # Example
///
/// ```
/// use stratum_remix::render::envelope::dynamic_blend;
///
/// assert!((dynamic_blend(0, 40) - 0.3).abs() < 1e-6);
/// assert!((dynamic_blend(5, 40) - 1.0).abs() < 1e-6);
/// ```
pub fn dynamic_blend(index: usize, total: usize) -> f32 {
    let cycle = (total / BLEND_CYCLES).max(1);
    let position = (index % cycle) as f32 / cycle as f32;
    BLEND_FLOOR + BLEND_RANGE * (PI * position).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_bounds() {
        for total in [1, 3, 4, 30, 100] {
            for i in 0..total {
                let g = dynamic_blend(i, total);
                assert!((BLEND_FLOOR - 1e-6..=1.0 + 1e-6).contains(&g), "{} of {}: {}", i, total, g);
            }
        }
    }

    #[test]
    fn test_blend_cycles_repeat() {
        // 30 steps: cycle of 7
        assert!((dynamic_blend(0, 30) - dynamic_blend(7, 30)).abs() < 1e-6);
        assert!((dynamic_blend(3, 30) - dynamic_blend(24, 30)).abs() < 1e-6);
        assert!(dynamic_blend(3, 30) > 0.9);
    }

    #[test]
    fn test_short_sequences_stay_at_floor() {
        for i in 0..3 {
            assert!((dynamic_blend(i, 3) - BLEND_FLOOR).abs() < 1e-6);
        }
    }
}
