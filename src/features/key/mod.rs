//! Key and scale handling
//!
//! - Note-name parsing and pitch-class arithmetic
//! - Filename key heuristics
//! - A catalog of named 12-TET scales
//! - Scale filtering, transposition and reordering of clip sets

pub mod filename;
pub mod notes;
pub mod scale_engine;
pub mod scales;

pub use filename::{extract_key_from_filename, find_key_in_filename, UNKNOWN_KEY};
pub use notes::{note_to_midi, pitch_class, root_pitch_class, NOTE_NAMES};
pub use scale_engine::{adjust_to_scale, nearest_scale_note, transposition_semitones, ScaleBehavior};
pub use scales::{Scale, SCALES};
