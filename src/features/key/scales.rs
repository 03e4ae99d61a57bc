//! Named 12-TET scales
//!
//! Each scale is a set of pitch classes relative to C. Names are the
//! identifiers accepted by `RemixConfig::scale`.
//!
//! Every entry holds values in 0-11, and clip roots reach [`Scale::contains`]
//! through `pitch_class`, which also yields 0-11. A set with values above
//! 11 would need roots measured in the same finer unit.

/// A named pitch-class set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    /// Catalog identifier
    pub name: &'static str,
    /// Member pitch classes, ascending, relative to C
    pub pitch_classes: &'static [u8],
}

impl Scale {
    /// Look up a scale by catalog name
    ///
    /// `"none"` and unknown names give `None`.
    pub fn by_name(name: &str) -> Option<&'static Scale> {
        SCALES.iter().find(|s| s.name == name)
    }

    /// Whether a pitch class belongs to the scale
    pub fn contains(&self, pitch_class: u8) -> bool {
        self.pitch_classes.contains(&pitch_class)
    }
}

const fn scale(name: &'static str, pitch_classes: &'static [u8]) -> Scale {
    Scale { name, pitch_classes }
}

/// All known scales
pub const SCALES: &[Scale] = &[
    scale("major", &[0, 2, 4, 5, 7, 9, 11]),
    scale("minor", &[0, 2, 3, 5, 7, 8, 10]),
    scale("harmonicMinor", &[0, 2, 3, 5, 7, 8, 11]),
    scale("melodicMinor", &[0, 2, 3, 5, 7, 9, 11]),
    scale("pentatonic", &[0, 2, 4, 7, 9]),
    scale("minorPentatonic", &[0, 3, 5, 7, 10]),
    scale("blues", &[0, 3, 5, 6, 7, 10]),
    scale("majorBlues", &[0, 2, 3, 4, 7, 9]),
    scale("chromatic", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
    // Church modes
    scale("ionian", &[0, 2, 4, 5, 7, 9, 11]),
    scale("dorian", &[0, 2, 3, 5, 7, 9, 10]),
    scale("phrygian", &[0, 1, 3, 5, 7, 8, 10]),
    scale("lydian", &[0, 2, 4, 6, 7, 9, 11]),
    scale("mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
    scale("aeolian", &[0, 2, 3, 5, 7, 8, 10]),
    scale("locrian", &[0, 1, 3, 5, 6, 8, 10]),
    // Melodic and harmonic minor modes
    scale("dorianFlat2", &[0, 1, 3, 5, 7, 9, 10]),
    scale("lydianAugmented", &[0, 2, 4, 6, 8, 9, 11]),
    scale("lydianDominant", &[0, 2, 4, 6, 7, 9, 10]),
    scale("mixolydianFlat6", &[0, 2, 4, 5, 7, 8, 10]),
    scale("locrianNatural2", &[0, 2, 3, 5, 6, 8, 10]),
    scale("superLocrian", &[0, 1, 3, 4, 6, 8, 10]),
    scale("phrygianDominant", &[0, 1, 4, 5, 7, 8, 10]),
    scale("harmonicMajor", &[0, 2, 4, 5, 7, 8, 11]),
    // Symmetric
    scale("wholeTone", &[0, 2, 4, 6, 8, 10]),
    scale("diminished", &[0, 2, 3, 5, 6, 8, 9, 11]),
    scale("halfWholeDiminished", &[0, 1, 3, 4, 6, 7, 9, 10]),
    scale("augmented", &[0, 3, 4, 7, 8, 11]),
    scale("tritone", &[0, 1, 4, 6, 7, 10]),
    // Bebop
    scale("bebopMajor", &[0, 2, 4, 5, 7, 8, 9, 11]),
    scale("bebopDominant", &[0, 2, 4, 5, 7, 9, 10, 11]),
    scale("bebopMinor", &[0, 2, 3, 4, 5, 7, 9, 10]),
    // Regional and exotic
    scale("hungarianMinor", &[0, 2, 3, 6, 7, 8, 11]),
    scale("hungarianMajor", &[0, 3, 4, 6, 7, 9, 10]),
    scale("neapolitanMajor", &[0, 1, 3, 5, 7, 9, 11]),
    scale("neapolitanMinor", &[0, 1, 3, 5, 7, 8, 11]),
    scale("doubleHarmonic", &[0, 1, 4, 5, 7, 8, 11]),
    scale("ukrainianDorian", &[0, 2, 3, 6, 7, 9, 10]),
    scale("persian", &[0, 1, 4, 5, 6, 8, 11]),
    scale("enigmatic", &[0, 1, 4, 6, 8, 10, 11]),
    scale("prometheus", &[0, 2, 4, 6, 9, 10]),
    scale("hirajoshi", &[0, 2, 3, 7, 8]),
    scale("inSen", &[0, 1, 5, 7, 10]),
    scale("iwato", &[0, 1, 5, 6, 10]),
    scale("kumoi", &[0, 2, 3, 7, 9]),
    scale("pelog", &[0, 1, 3, 7, 8]),
    scale("egyptian", &[0, 2, 5, 7, 10]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let major = Scale::by_name("major").unwrap();
        assert_eq!(major.pitch_classes, &[0, 2, 4, 5, 7, 9, 11]);
        assert!(Scale::by_name("none").is_none());
        assert!(Scale::by_name("Major").is_none());
    }

    #[test]
    fn test_catalog_is_well_formed() {
        assert!(SCALES.len() >= 45);
        for (i, s) in SCALES.iter().enumerate() {
            assert!(s.pitch_classes.contains(&0), "{} should contain its root", s.name);
            assert!(
                s.pitch_classes.windows(2).all(|w| w[0] < w[1] && w[1] < 12),
                "{} should be ascending within one octave",
                s.name
            );
            assert!(
                SCALES[..i].iter().all(|other| other.name != s.name),
                "duplicate scale name {}",
                s.name
            );
        }
    }
}
