//! Per-clip analysis
//!
//! Decodes a clip and fills its metadata:
//! - Tempo (tag, estimator, 120 BPM)
//! - Key (tag, filename, "Unknown")
//! - Center frequency (0 Hz on failure)
//!
//! Analysis failures never fail the clip; only decoding and validation do.

pub mod metadata;
pub mod resolver;

pub use metadata::{ClipMetadata, MetadataStore};
pub use resolver::{default_key_chain, default_tempo_chain, resolve_root_pitch_class, ClipContext, Resolver, ResolverChain};

use crate::config::AnalysisConfig;
use crate::error::RemixError;
use crate::features::spectrum::center_frequency;
use crate::io::{decode_clip, AudioClip, DecodedClip};

/// A decoded clip and its metadata
#[derive(Debug, Clone)]
pub struct AnalyzedClip {
    /// Decoded audio
    pub clip: AudioClip,
    /// Analysis results
    pub metadata: ClipMetadata,
}

/// Decode and analyse one clip
///
/// # Arguments
///
/// * `name` - Filename (used as the clip's identity and for key heuristics)
/// * `mime` - MIME type; must start with `audio/`
/// * `bytes` - Raw file contents
/// * `config` - Analysis configuration
///
/// # Errors
///
/// `DecodingError` if the bytes are not decodable audio, `ValidationError`
/// if the decoded clip is empty or malformed
///
/// # Example
///
/// ```no_run
/// use stratum_remix::{analyze_clip, AnalysisConfig};
///
/// let bytes = std::fs::read("loop C3.wav")?;
/// let analyzed = analyze_clip("loop C3.wav", "audio/wav", &bytes, &AnalysisConfig::default())?;
/// println!("{} BPM, key {}", analyzed.metadata.bpm, analyzed.metadata.key);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn analyze_clip(name: &str, mime: &str, bytes: &[u8], config: &AnalysisConfig) -> Result<AnalyzedClip, RemixError> {
    let decoded = decode_clip(name, mime, bytes)?;
    Ok(analyze_decoded(decoded, config))
}

/// Analyse an already decoded clip
pub fn analyze_decoded(decoded: DecodedClip, config: &AnalysisConfig) -> AnalyzedClip {
    let DecodedClip { clip, tags } = decoded;

    let ctx = ClipContext {
        clip: &clip,
        tags: &tags,
        config,
    };
    let bpm = default_tempo_chain().resolve(&ctx);
    let key = default_key_chain().resolve(&ctx);

    let center_frequency = match center_frequency(&clip, config.center_frequency_seconds) {
        Ok(freq) => freq,
        Err(e) => {
            log::warn!("Center frequency failed for '{}': {}, using 0 Hz", clip.name(), e);
            0.0
        }
    };

    log::info!(
        "Analyzed '{}': {:.2}s, {} ch, {} BPM, key {}, center {:.1} Hz",
        clip.name(),
        clip.duration(),
        clip.num_channels(),
        bpm,
        key,
        center_frequency
    );

    AnalyzedClip {
        clip,
        metadata: ClipMetadata {
            bpm,
            key,
            is_loop: false,
            center_frequency,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::EmbeddedTags;

    #[test]
    fn test_analyze_decoded_defaults_on_silence() {
        let clip = AudioClip::new("pad F#2.wav", 22050, vec![vec![0.0; 22050 * 2]]).unwrap();
        let analyzed = analyze_decoded(
            DecodedClip {
                clip,
                tags: EmbeddedTags::default(),
            },
            &AnalysisConfig::default(),
        );

        assert_eq!(analyzed.metadata.bpm, 120);
        assert_eq!(analyzed.metadata.key, "F#2");
        assert_eq!(analyzed.metadata.center_frequency, 0.0);
        assert!(!analyzed.metadata.is_loop);
    }

    #[test]
    fn test_analyze_clip_rejects_non_audio() {
        let result = analyze_clip("notes.txt", "text/plain", b"hello", &AnalysisConfig::default());
        assert!(matches!(result, Err(RemixError::DecodingError(_))));
    }
}
