//! Decoded, immutable audio clip

use crate::error::RemixError;

/// One decoded input track
///
/// Samples are planar f32 in [-1.0, 1.0]. A clip that exists has passed
/// [`AudioClip::validate`]: at least one channel, a positive sample rate and
/// a positive duration.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    name: String,
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioClip {
    /// Build a clip from planar channel data
    ///
    /// # Errors
    ///
    /// `ValidationError` if there are no channels, the sample rate is zero,
    /// the channels are empty or of unequal length, or a sample is not finite.
    pub fn new(
        name: impl Into<String>,
        sample_rate: u32,
        channels: Vec<Vec<f32>>,
    ) -> Result<Self, RemixError> {
        let clip = Self {
            name: name.into(),
            sample_rate,
            channels,
        };
        clip.validate()?;
        Ok(clip)
    }

    /// Check the clip invariants
    pub fn validate(&self) -> Result<(), RemixError> {
        if self.channels.is_empty() {
            return Err(RemixError::ValidationError(format!(
                "Clip '{}' has no channels",
                self.name
            )));
        }
        if self.sample_rate == 0 {
            return Err(RemixError::ValidationError(format!(
                "Clip '{}' has sample rate 0",
                self.name
            )));
        }
        let frames = self.channels[0].len();
        if frames == 0 {
            return Err(RemixError::ValidationError(format!(
                "Clip '{}' has zero duration",
                self.name
            )));
        }
        if self.channels.iter().any(|c| c.len() != frames) {
            return Err(RemixError::ValidationError(format!(
                "Clip '{}' has channels of unequal length",
                self.name
            )));
        }
        if self.channels.iter().flatten().any(|s| !s.is_finite()) {
            return Err(RemixError::ValidationError(format!(
                "Clip '{}' contains non-finite samples",
                self.name
            )));
        }
        Ok(())
    }

    /// Display name (source filename)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames per channel
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// First `max_seconds` of channel 0
    pub fn leading_samples(&self, max_seconds: f32) -> &[f32] {
        let limit = if max_seconds.is_finite() && max_seconds > 0.0 {
            (max_seconds as f64 * self.sample_rate as f64) as usize
        } else {
            usize::MAX
        };
        let data = &self.channels[0];
        &data[..data.len().min(limit)]
    }

    /// Same audio under a different name
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
