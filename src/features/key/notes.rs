//! Note names and pitch classes

/// Sharp-spelled note names, indexed by pitch class
pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Octave assumed when a note name carries none
pub const DEFAULT_OCTAVE: i32 = 4;

/// Parse a note name into a MIDI note number
///
/// Accepts a leading letter A-G (either case), an optional `#` and an
/// optional signed octave (default 4). Trailing text is ignored.
/// `C4` is 60. An octave whose note number does not fit in `i32` gives
/// `None`.
///
/// # Example
///
/// ```
/// use stratum_remix::features::key::note_to_midi;
///
/// assert_eq!(note_to_midi("C4"), Some(60));
/// assert_eq!(note_to_midi("a"), Some(69));
/// assert_eq!(note_to_midi("H2"), None);
/// ```
pub fn note_to_midi(note: &str) -> Option<i32> {
    let bytes = note.as_bytes();
    let letter = bytes.first()?.to_ascii_uppercase();
    if !(b'A'..=b'G').contains(&letter) {
        return None;
    }

    let mut pos = 1;
    let sharp = bytes.get(pos) == Some(&b'#');
    if sharp {
        pos += 1;
    }

    let mut name = String::with_capacity(2);
    name.push(letter as char);
    if sharp {
        name.push('#');
    }
    // E# and B# are not in the sharp spelling table
    let index = NOTE_NAMES.iter().position(|&n| n == name)? as i32;

    let octave = match parse_octave(&note[pos..]) {
        Some(octave) => octave?,
        None => DEFAULT_OCTAVE,
    };
    octave.checked_add(1)?.checked_mul(12)?.checked_add(index)
}

/// Leading `-?\d+` of a string
///
/// `None` when there are no digits, `Some(None)` when the digits overflow.
fn parse_octave(text: &str) -> Option<Option<i32>> {
    let bytes = text.as_bytes();
    let sign_len = usize::from(bytes.first() == Some(&b'-'));
    let digits = bytes[sign_len..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    Some(text[..sign_len + digits].parse().ok())
}

/// Pitch class (0-11) of a MIDI note number
pub fn pitch_class(midi: i32) -> u8 {
    midi.rem_euclid(12) as u8
}

/// Root pitch class of a key string
///
/// Only the first whitespace-separated token is parsed, so `"A MINOR"` and
/// `"A3"` both resolve to 9. `"Unknown"` and other non-notes give `None`.
pub fn root_pitch_class(key: &str) -> Option<u8> {
    let token = key.split_whitespace().next()?;
    note_to_midi(token).map(pitch_class)
}
