//! Filename key heuristics
//!
//! Scans a filename for key-like substrings. Patterns are tried in order
//! and the first match wins:
//! 1. `<A-G>#?<digit>` (e.g. `pad_c#3.wav` gives `C#3`)
//! 2. `key of <A-G>#?` (gives the note alone)
//! 3. `<A-G>#? major`
//! 4. `<A-G>#? minor`
//!
//! Letters are matched case-insensitively and the result is uppercased.

/// Key string used when nothing can be resolved
pub const UNKNOWN_KEY: &str = "Unknown";

/// Key found in a filename, or [`UNKNOWN_KEY`]
pub fn extract_key_from_filename(filename: &str) -> String {
    find_key_in_filename(filename).unwrap_or_else(|| UNKNOWN_KEY.to_string())
}

/// Key found in a filename
pub fn find_key_in_filename(filename: &str) -> Option<String> {
    let bytes = filename.as_bytes();

    note_with_octave(bytes)
        .or_else(|| key_of(bytes))
        .or_else(|| note_with_mode(bytes, b"major"))
        .or_else(|| note_with_mode(bytes, b"minor"))
}

fn is_note_letter(b: u8) -> bool {
    (b'A'..=b'G').contains(&b.to_ascii_uppercase())
}

/// Length of `<A-G>#?` at `pos`, if present
fn note_len(bytes: &[u8], pos: usize) -> Option<usize> {
    if !is_note_letter(*bytes.get(pos)?) {
        return None;
    }
    Some(if bytes.get(pos + 1) == Some(&b'#') { 2 } else { 1 })
}

fn upper(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_ascii_uppercase()
}

fn note_with_octave(bytes: &[u8]) -> Option<String> {
    (0..bytes.len()).find_map(|pos| {
        let len = note_len(bytes, pos)?;
        bytes
            .get(pos + len)
            .filter(|b| b.is_ascii_digit())
            .map(|_| upper(&bytes[pos..pos + len + 1]))
    })
}

fn key_of(bytes: &[u8]) -> Option<String> {
    const PREFIX: &[u8] = b"key of ";
    (0..bytes.len()).find_map(|pos| {
        let candidate = bytes.get(pos..pos + PREFIX.len())?;
        if !candidate.eq_ignore_ascii_case(PREFIX) {
            return None;
        }
        let note_start = pos + PREFIX.len();
        let len = note_len(bytes, note_start)?;
        Some(upper(&bytes[note_start..note_start + len]))
    })
}

fn note_with_mode(bytes: &[u8], mode: &[u8]) -> Option<String> {
    (0..bytes.len()).find_map(|pos| {
        let len = note_len(bytes, pos)?;
        let space = pos + len;
        if bytes.get(space) != Some(&b' ') {
            return None;
        }
        let word = bytes.get(space + 1..space + 1 + mode.len())?;
        word.eq_ignore_ascii_case(mode)
            .then(|| upper(&bytes[pos..space + 1 + mode.len()]))
    })
}
