//! # Stratum Remix
//!
//! An offline audio remix engine: analyses a set of clips, orders them with
//! a selectable algorithm and renders them through a fixed reverb chain into
//! one stereo mix.
//!
//! ## Features
//!
//! - **Tempo**: consensus of windowed autocorrelation, spectral-flux beat
//!   tracking and energy onsets, with half/double correction
//! - **Center frequency**: A-weighted spectral centroid blended with the peak bin
//! - **Key and scale**: note parsing, filename heuristics, 47 scales with
//!   filter, transpose and reorder behaviors
//! - **Sequencing**: sequential, random, reverse, scale and frequency orders,
//!   Markov chains, one-shot
//! - **Rendering**: declarative signal graph, FFT convolution reverb, blend
//!   envelopes, peak normalization, 16-bit WAV output
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratum_remix::{InputFile, RemixConfig, Session};
//!
//! let mut session = Session::new(5);
//! let bytes = std::fs::read("drums C3.wav")?;
//! session.distribute(vec![InputFile::new("drums C3.wav", "audio/wav", bytes)])?;
//!
//! let mix = session.render(&RemixConfig::default())?;
//! std::fs::write("mix.wav", mix.to_wav()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! bytes → decode → tempo / key / center frequency → scale → sequence → render → WAV
//! ```
//!
//! [`Session`] keeps the state between those steps; the free functions
//! [`analyze_clip`], [`sequence`] and [`render`] are the stateless core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod render;
pub mod sequencer;
pub mod session;

use rand::Rng;

// Re-export main types
pub use analysis::{analyze_clip, AnalyzedClip, ClipMetadata, MetadataStore};
pub use config::{AnalysisConfig, RemixConfig, TempoConfig, TempoStrategy};
pub use error::RemixError;
pub use features::key::{Scale, ScaleBehavior, SCALES};
pub use io::{AudioClip, EmbeddedTags};
pub use render::{LoopPlayer, MixTrack, MixedBuffer, RenderState};
pub use sequencer::{sequence, ClipFeatures, SequenceAlgorithm, TransitionMatrix};
pub use session::{InputFile, Session, Slot};

/// Render a mix in one call
///
/// Scale behaviors are not applied here; pass tracks that are already
/// filtered or transposed (see [`Session::render`] for the full pipeline).
///
/// # Arguments
///
/// * `tracks` - Clips to mix, in slot order
/// * `config` - Render configuration (clamped before use)
/// * `markov` - Memoised transition matrix for `markov` ordering
/// * `rng` - Randomness for ordering and the reverb
///
/// # Returns
///
/// The peak-normalized stereo mix
///
/// # Errors
///
/// `ValidationError` for an empty or all-invalid track list, `InvalidInput`
/// for an unknown scale, `RenderError` if rendering fails
///
/// # Example
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use stratum_remix::{render, AudioClip, ClipFeatures, MixTrack, RemixConfig, SequenceAlgorithm};
///
/// let clip = AudioClip::new("tone", 8000, vec![vec![0.25; 4000]])?;
/// let track = MixTrack { clip, is_loop: false, features: ClipFeatures::default() };
/// let config = RemixConfig {
///     algorithm: SequenceAlgorithm::OneShot,
///     sample_rate: 8000,
///     reverb_seconds: 0.1,
///     ..RemixConfig::default()
/// };
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let mix = render(&[track], &config, &mut None, &mut rng)?;
/// assert_eq!(mix.frames(), 4000);
/// # Ok::<(), stratum_remix::RemixError>(())
/// ```
pub fn render<R: Rng + ?Sized>(
    tracks: &[MixTrack],
    config: &RemixConfig,
    markov: &mut Option<TransitionMatrix>,
    rng: &mut R,
) -> Result<MixedBuffer, RemixError> {
    render::MixRenderer::new(config).render(tracks, markov, rng)
}
