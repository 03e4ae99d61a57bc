//! Looped playback of a finished mix
//!
//! The player owns no audio device. A consumer pulls interleaved stereo
//! blocks with [`LoopPlayer::fill`]; the buffer wraps end-to-start until
//! [`LoopPlayer::stop`] is called.

use std::sync::Arc;

use super::MixedBuffer;
use crate::preprocessing::channel_mixer::to_stereo;

/// Cyclic reader over a shared [`MixedBuffer`]
#[derive(Debug, Default)]
pub struct LoopPlayer {
    buffer: Option<Arc<MixedBuffer>>,
    position: usize,
    playing: bool,
}

impl LoopPlayer {
    /// Player with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded buffer; playback stops and rewinds
    pub fn load(&mut self, buffer: Arc<MixedBuffer>) {
        self.stop();
        self.buffer = Some(buffer);
    }

    /// The loaded buffer
    pub fn buffer(&self) -> Option<&Arc<MixedBuffer>> {
        self.buffer.as_ref()
    }

    /// Start looping
    ///
    /// # Returns
    ///
    /// `false` if nothing is loaded or playback is already running
    pub fn play(&mut self) -> bool {
        if self.playing || self.buffer.is_none() {
            return false;
        }
        self.playing = true;
        log::info!("Loop playback started");
        true
    }

    /// Halt playback and rewind
    pub fn stop(&mut self) {
        if self.playing {
            log::info!("Loop playback stopped at frame {}", self.position);
        }
        self.playing = false;
        self.position = 0;
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Next frame to be read
    pub fn position(&self) -> usize {
        self.position
    }

    /// Fill `out` with interleaved stereo frames
    ///
    /// A trailing odd sample is left silent.
    ///
    /// # Returns
    ///
    /// Frames read from the buffer (0 when stopped, with `out` zeroed)
    pub fn fill(&mut self, out: &mut [f32]) -> usize {
        out.fill(0.0);
        let buffer = match (&self.buffer, self.playing) {
            (Some(buffer), true) => buffer,
            _ => return 0,
        };

        let [left, right] = to_stereo(buffer.channels());
        let frames = left.len();
        if frames == 0 {
            return 0;
        }

        let mut written = 0;
        for frame in out.chunks_exact_mut(2) {
            frame[0] = left[self.position];
            frame[1] = right[self.position];
            self.position = (self.position + 1) % frames;
            written += 1;
        }
        written
    }
}
