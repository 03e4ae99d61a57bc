//! Ordered metadata resolvers
//!
//! Each resolver may produce a value for a clip; a chain asks them in order
//! and the first answer wins, otherwise the chain's fallback is used.

use crate::config::AnalysisConfig;
use crate::features::key::{find_key_in_filename, root_pitch_class, UNKNOWN_KEY};
use crate::features::period::{estimator::try_estimate_bpm, FALLBACK_BPM, MAX_BPM, MIN_BPM};
use crate::io::{AudioClip, EmbeddedTags};

use super::metadata::ClipMetadata;

/// What a resolver can look at
pub struct ClipContext<'a> {
    /// Decoded audio
    pub clip: &'a AudioClip,
    /// Container tags
    pub tags: &'a EmbeddedTags,
    /// Analysis parameters
    pub config: &'a AnalysisConfig,
}

/// One strategy for producing a metadata value
pub trait Resolver<T>: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Value for this clip, or `None` to defer to the next resolver
    fn resolve(&self, ctx: &ClipContext<'_>) -> Option<T>;
}

/// Ordered resolvers with a fallback value
pub struct ResolverChain<T> {
    resolvers: Vec<Box<dyn Resolver<T>>>,
    fallback: T,
}

impl<T: Clone + std::fmt::Debug> ResolverChain<T> {
    /// Empty chain that always yields `fallback`
    pub fn new(fallback: T) -> Self {
        Self {
            resolvers: Vec::new(),
            fallback,
        }
    }

    /// Append a resolver
    pub fn with(mut self, resolver: impl Resolver<T> + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// First resolved value, or the fallback
    pub fn resolve(&self, ctx: &ClipContext<'_>) -> T {
        for resolver in &self.resolvers {
            if let Some(value) = resolver.resolve(ctx) {
                log::debug!("'{}': {} resolved {:?}", ctx.clip.name(), resolver.name(), value);
                return value;
            }
        }
        log::debug!("'{}': no resolver answered, using {:?}", ctx.clip.name(), self.fallback);
        self.fallback.clone()
    }
}

/// Key from the container's initial-key tag
pub struct EmbeddedKey;

impl Resolver<String> for EmbeddedKey {
    fn name(&self) -> &'static str {
        "embedded key tag"
    }

    fn resolve(&self, ctx: &ClipContext<'_>) -> Option<String> {
        ctx.tags.key.clone()
    }
}

/// Key from the filename heuristics
pub struct FilenameKey;

impl Resolver<String> for FilenameKey {
    fn name(&self) -> &'static str {
        "filename"
    }

    fn resolve(&self, ctx: &ClipContext<'_>) -> Option<String> {
        find_key_in_filename(ctx.clip.name())
    }
}

/// Tempo from the container's BPM tag
pub struct EmbeddedBpm;

impl Resolver<u32> for EmbeddedBpm {
    fn name(&self) -> &'static str {
        "embedded BPM tag"
    }

    fn resolve(&self, ctx: &ClipContext<'_>) -> Option<u32> {
        ctx.tags.bpm.map(|bpm| bpm.round().clamp(MIN_BPM, MAX_BPM) as u32)
    }
}

/// Tempo from the signal
pub struct EstimatedBpm;

impl Resolver<u32> for EstimatedBpm {
    fn name(&self) -> &'static str {
        "tempo estimator"
    }

    fn resolve(&self, ctx: &ClipContext<'_>) -> Option<u32> {
        match try_estimate_bpm(ctx.clip, ctx.config) {
            Ok(bpm) => bpm,
            Err(e) => {
                log::warn!("Tempo analysis failed for '{}': {}", ctx.clip.name(), e);
                None
            }
        }
    }
}

/// Tag, then filename, then "Unknown"
pub fn default_key_chain() -> ResolverChain<String> {
    ResolverChain::new(UNKNOWN_KEY.to_string())
        .with(EmbeddedKey)
        .with(FilenameKey)
}

/// Tag, then estimator, then 120
pub fn default_tempo_chain() -> ResolverChain<u32> {
    ResolverChain::new(FALLBACK_BPM).with(EmbeddedBpm).with(EstimatedBpm)
}

/// Root pitch class used by scale operations
///
/// Stored key first, then the filename. A clip without metadata has no
/// resolvable root.
pub fn resolve_root_pitch_class(metadata: Option<&ClipMetadata>, name: &str) -> Option<u8> {
    let metadata = metadata?;
    root_pitch_class(&metadata.key).or_else(|| find_key_in_filename(name).and_then(|k| root_pitch_class(&k)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(name: &str) -> AudioClip {
        AudioClip::new(name, 8000, vec![vec![0.0; 8000]]).unwrap()
    }

    #[test]
    fn test_key_chain_order() {
        let config = AnalysisConfig::default();
        let clip = clip("bass C2.wav");
        let chain = default_key_chain();

        let tagged = EmbeddedTags {
            bpm: None,
            key: Some("Am".to_string()),
        };
        let ctx = ClipContext {
            clip: &clip,
            tags: &tagged,
            config: &config,
        };
        assert_eq!(chain.resolve(&ctx), "Am");

        let untagged = EmbeddedTags::default();
        let ctx = ClipContext {
            clip: &clip,
            tags: &untagged,
            config: &config,
        };
        assert_eq!(chain.resolve(&ctx), "C2");
    }

    #[test]
    fn test_key_chain_fallback() {
        let config = AnalysisConfig::default();
        let clip = clip("drums.wav");
        let tags = EmbeddedTags::default();
        let ctx = ClipContext {
            clip: &clip,
            tags: &tags,
            config: &config,
        };
        assert_eq!(default_key_chain().resolve(&ctx), UNKNOWN_KEY);
    }

    #[test]
    fn test_tempo_chain_prefers_tag_and_clamps() {
        let config = AnalysisConfig::default();
        let clip = clip("silence.wav");
        let tags = EmbeddedTags {
            bpm: Some(999.0),
            key: None,
        };
        let ctx = ClipContext {
            clip: &clip,
            tags: &tags,
            config: &config,
        };
        assert_eq!(default_tempo_chain().resolve(&ctx), 300);
    }

    #[test]
    fn test_tempo_chain_falls_back_on_silence() {
        let config = AnalysisConfig::default();
        let clip = clip("silence.wav");
        let tags = EmbeddedTags::default();
        let ctx = ClipContext {
            clip: &clip,
            tags: &tags,
            config: &config,
        };
        assert_eq!(default_tempo_chain().resolve(&ctx), FALLBACK_BPM);
    }

    #[test]
    fn test_root_resolution() {
        let mut meta = ClipMetadata::default();
        assert_eq!(resolve_root_pitch_class(None, "x C4.wav"), None);
        assert_eq!(resolve_root_pitch_class(Some(&meta), "pad d minor.wav"), Some(2));
        assert_eq!(resolve_root_pitch_class(Some(&meta), "drums.wav"), None);

        meta.key = "G# MAJOR".to_string();
        assert_eq!(resolve_root_pitch_class(Some(&meta), "pad d minor.wav"), Some(8));
    }
}
