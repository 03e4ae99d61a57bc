//! Offline mix rendering
//!
//! Turns analysed clips into one stereo [`MixedBuffer`]:
//! - [`graph`] describes the fixed effect chain as nodes and connections
//! - [`executor`] evaluates a graph offline (FFT convolution for the reverb)
//! - [`reverb`] draws the synthetic impulse response
//! - [`envelope`] computes the per-event blend gain
//! - [`mixer`] lays clips out in one-shot or looping mode
//! - [`playback`] loops a finished buffer for a consumer that pulls frames

pub mod envelope;
pub mod executor;
pub mod graph;
pub mod mixer;
pub mod playback;
pub mod reverb;

pub use mixer::{bar_seconds, loop_count, master_gain, MixRenderer, MixTrack};
pub use playback::LoopPlayer;

use std::fmt;

use crate::error::RemixError;
use crate::io::encode_wav;
use crate::preprocessing::normalization::peak;

/// Render progress, from construction to result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No render attempted yet
    Idle,
    /// Checking clips and output parameters
    Validating,
    /// Building and evaluating the signal graph
    Rendering,
    /// Final peak normalization
    Normalizing,
    /// Output produced
    Done,
    /// Render aborted; no output
    Failed,
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderState::Idle => "idle",
            RenderState::Validating => "validating",
            RenderState::Rendering => "rendering",
            RenderState::Normalizing => "normalizing",
            RenderState::Done => "done",
            RenderState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// The rendered mix
///
/// Planar stereo, peak-normalized. `playback_rate` is a hint for the player
/// when the rate change was not baked in (pitch-preserving mode).
#[derive(Debug, Clone, PartialEq)]
pub struct MixedBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
    playback_rate: f32,
}

impl MixedBuffer {
    /// Wrap rendered channels
    ///
    /// # Errors
    ///
    /// `ValidationError` for no channels, empty or ragged channels, a zero
    /// sample rate, or a non-positive playback rate
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32, playback_rate: f32) -> Result<Self, RemixError> {
        let frames = channels.first().map_or(0, Vec::len);
        if frames == 0 || channels.iter().any(|c| c.len() != frames) {
            return Err(RemixError::ValidationError(
                "Mixed buffer must have non-empty channels of equal length".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(RemixError::ValidationError("Mixed buffer sample rate is 0".to_string()));
        }
        if !playback_rate.is_finite() || playback_rate <= 0.0 {
            return Err(RemixError::ValidationError(format!(
                "Invalid playback rate: {}",
                playback_rate
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
            playback_rate,
        })
    }

    /// Planar channel data
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames per channel
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Rate the player should apply (1.0 when already baked in)
    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    /// Largest absolute sample
    pub fn peak(&self) -> f32 {
        peak(&self.channels)
    }

    /// Encode as a 16-bit PCM WAV file
    pub fn to_wav(&self) -> Result<Vec<u8>, RemixError> {
        encode_wav(&self.channels, self.sample_rate)
    }
}
