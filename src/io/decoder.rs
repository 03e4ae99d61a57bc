//! Audio decoding using Symphonia
//!
//! Turns raw file bytes (any container Symphonia can probe) into a validated
//! [`AudioClip`], keeping every channel. Tags carried by the container that
//! the analysis stage can use (BPM, initial key) are returned alongside.

use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::Hint;

use super::AudioClip;
use crate::error::RemixError;

/// Tags embedded in the source container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedTags {
    /// Tempo tag (ID3 TBPM, Vorbis BPM), if present and numeric
    pub bpm: Option<f32>,
    /// Initial key tag (ID3 TKEY, Vorbis INITIALKEY / KEY)
    pub key: Option<String>,
}

impl EmbeddedTags {
    fn absorb(&mut self, tags: &[Tag]) {
        for tag in tags {
            let value = tag.value.to_string();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            let is_bpm = tag.std_key == Some(StandardTagKey::Bpm)
                || tag.key.eq_ignore_ascii_case("TBPM")
                || tag.key.eq_ignore_ascii_case("BPM");
            let is_key = tag.key.eq_ignore_ascii_case("TKEY")
                || tag.key.eq_ignore_ascii_case("INITIALKEY")
                || tag.key.eq_ignore_ascii_case("KEY");

            if is_bpm && self.bpm.is_none() {
                self.bpm = value.parse::<f32>().ok().filter(|b| b.is_finite() && *b > 0.0);
            } else if is_key && self.key.is_none() {
                self.key = Some(value.to_string());
            }
        }
    }
}

/// A decoded clip together with its container tags
#[derive(Debug, Clone)]
pub struct DecodedClip {
    /// Decoded audio
    pub clip: AudioClip,
    /// Tags found while probing
    pub tags: EmbeddedTags,
}

/// Decode raw file bytes into an [`AudioClip`]
///
/// # Arguments
///
/// * `name` - Source filename, used as the clip name and as a probe hint
/// * `mime` - MIME type reported by the file source; must be `audio/*`
/// * `bytes` - Complete file contents
///
/// # Errors
///
/// `DecodingError` when the MIME type is not audio, no container or codec
/// matches, or no frames could be decoded. `ValidationError` when the decoded
/// buffer breaks the clip invariants.
pub fn decode_clip(name: &str, mime: &str, bytes: &[u8]) -> Result<DecodedClip, RemixError> {
    log::debug!("Decoding '{}' ({}, {} bytes)", name, mime, bytes.len());

    if !mime.starts_with("audio/") {
        return Err(RemixError::DecodingError(format!(
            "Invalid file type '{}' for '{}'. Please upload audio files (e.g., WAV, OGG, MP3).",
            mime, name
        )));
    }

    if bytes.is_empty() {
        return Err(RemixError::DecodingError(format!("'{}' is empty", name)));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    hint.mime_type(mime);

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| RemixError::DecodingError(format!("'{}': {}", name, e)))?;

    let mut tags = EmbeddedTags::default();
    if let Some(metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.current() {
            tags.absorb(revision.tags());
        }
    }

    let mut format = probed.format;
    if let Some(revision) = format.metadata().current() {
        tags.absorb(revision.tags());
    }

    let (track_id, codec_params) = {
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                RemixError::DecodingError(format!("'{}': no supported audio tracks found", name))
            })?;
        (track.id, track.codec_params.clone())
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| RemixError::DecodingError(format!("'{}': {}", name, e)))?;

    let mut sample_rate = codec_params.sample_rate;
    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break, // end of stream
            Err(e) => {
                log::warn!("'{}': stopping at unreadable packet: {}", name, e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channel_count = spec.channels.count();
                if channel_count == 0 {
                    continue;
                }
                if sample_rate.is_none() {
                    sample_rate = Some(spec.rate);
                }
                if channels.is_empty() {
                    channels = vec![Vec::new(); channel_count];
                }

                let mut interleaved = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                interleaved.copy_interleaved_ref(decoded);

                for frame in interleaved.samples().chunks_exact(channel_count) {
                    for (ch, &sample) in frame.iter().enumerate() {
                        if let Some(dest) = channels.get_mut(ch) {
                            dest.push(sample);
                        }
                    }
                }
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupt packets are skipped
                log::debug!("'{}': skipping corrupt packet: {}", name, msg);
                continue;
            }
            Err(e) => {
                return Err(RemixError::DecodingError(format!("'{}': {}", name, e)));
            }
        }
    }

    if channels.iter().all(Vec::is_empty) {
        return Err(RemixError::DecodingError(format!(
            "'{}': no audio frames could be decoded",
            name
        )));
    }

    // Packets of a partially decoded stream can leave channels uneven
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    for channel in &mut channels {
        channel.truncate(frames);
    }

    let clip = AudioClip::new(name, sample_rate.unwrap_or(0), channels)?;

    log::debug!(
        "Decoded '{}': {} ch, {} Hz, {:.2}s, tags={:?}",
        name,
        clip.num_channels(),
        clip.sample_rate(),
        clip.duration(),
        tags
    );

    Ok(DecodedClip { clip, tags })
}
