//! Audio I/O modules
//!
//! Decoding raw file bytes into clips with Symphonia, the decoded clip type,
//! and 16-bit WAV encoding of rendered mixes with hound.

pub mod audio_clip;
pub mod decoder;
pub mod wav;

pub use audio_clip::AudioClip;
pub use decoder::{decode_clip, DecodedClip, EmbeddedTags};
pub use wav::encode_wav;
