//! Mix layout and rendering
//!
//! Two layouts share one effect chain (per-event gain into a dry bus and a
//! convolution reverb, both into a master gain):
//!
//! - **One-shot**: every clip starts at 0 with gain 0.8, master 0.8.
//! - **Looping**: one sequencer step per 4-beat bar, at most 100 steps,
//!   each event gain following [`dynamic_blend`]; master gain
//!   `min(0.8 / sqrt(n), 0.8)`. Loop clips repeat to fill their bar.
//!
//! The result is peak-normalized to 0.8.

use rand::Rng;
use rayon::prelude::*;

use super::envelope::dynamic_blend;
use super::executor::render_graph;
use super::graph::{SignalGraph, SourceNode};
use super::reverb::impulse_response;
use super::{MixedBuffer, RenderState};
use crate::config::RemixConfig;
use crate::error::RemixError;
use crate::features::key::Scale;
use crate::io::AudioClip;
use crate::preprocessing::normalization::{peak_normalize, TARGET_PEAK};
use crate::preprocessing::resample::{convert_sample_rate, resample_clip};
use crate::sequencer::{sequence, ClipFeatures, SequenceAlgorithm, TransitionMatrix};

/// Upper bound on looping steps
pub const MAX_LOOPS: usize = 100;

/// Upper bound on a looping render in seconds
pub const MAX_RENDER_SECONDS: f64 = 600.0;

/// Beats per placement slot
pub const BEATS_PER_BAR: f64 = 4.0;

/// Per-event gain in one-shot mode
pub const ONE_SHOT_GAIN: f32 = 0.8;

/// Master gain in one-shot mode
pub const ONE_SHOT_MASTER_GAIN: f32 = 0.8;

/// A clip ready for mixing
#[derive(Debug, Clone)]
pub struct MixTrack {
    /// Decoded (and possibly transposed) audio
    pub clip: AudioClip,
    /// Repeat the clip to fill its slot
    pub is_loop: bool,
    /// Features used for ordering
    pub features: ClipFeatures,
}

/// Length of one 4-beat bar in seconds
pub fn bar_seconds(bpm: f32) -> f64 {
    60.0 / bpm as f64 * BEATS_PER_BAR
}

/// Number of bars needed to cover `loop_minutes`, capped at [`MAX_LOOPS`]
///
/// # Example
///
/// ```
/// use stratum_remix::render::loop_count;
///
/// assert_eq!(loop_count(1.0, 120.0), 30);
/// assert_eq!(loop_count(10.0, 240.0), 100);
/// ```
pub fn loop_count(loop_minutes: f32, bpm: f32) -> usize {
    let bars = (loop_minutes as f64 * 60.0 / bar_seconds(bpm)).ceil();
    if !bars.is_finite() || bars <= 0.0 {
        return 0;
    }
    (bars as usize).min(MAX_LOOPS)
}

/// Master gain for a looping mix of `clip_count` clips
pub fn master_gain(clip_count: usize) -> f32 {
    (0.8 / (clip_count.max(1) as f32).sqrt()).min(0.8)
}

/// Renders tracks into a [`MixedBuffer`] under one configuration
///
/// The renderer records its [`RenderState`]; a failed render leaves it in
/// `Failed` and returns no output.
#[derive(Debug)]
pub struct MixRenderer {
    config: RemixConfig,
    state: RenderState,
}

impl MixRenderer {
    /// Create a renderer; the configuration is clamped to its valid ranges
    pub fn new(config: &RemixConfig) -> Self {
        Self {
            config: config.clamped(),
            state: RenderState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Effective (clamped) configuration
    pub fn config(&self) -> &RemixConfig {
        &self.config
    }

    /// Render a mix
    ///
    /// # Arguments
    ///
    /// * `tracks` - Clips in slot order; invalid clips are skipped
    /// * `markov` - Memoised transition matrix for `markov` ordering
    /// * `rng` - Randomness for ordering and the reverb noise
    ///
    /// # Errors
    ///
    /// - `ValidationError` if no track is valid or the output length is not
    ///   positive
    /// - `InvalidInput` for an unknown scale name
    /// - `RenderError` if graph evaluation fails
    pub fn render<R: Rng + ?Sized>(
        &mut self,
        tracks: &[MixTrack],
        markov: &mut Option<TransitionMatrix>,
        rng: &mut R,
    ) -> Result<MixedBuffer, RemixError> {
        match self.run(tracks, markov, rng) {
            Ok(buffer) => {
                self.state = RenderState::Done;
                Ok(buffer)
            }
            Err(e) => {
                log::warn!("Render failed in state {}: {}", self.state, e);
                self.state = RenderState::Failed;
                Err(e)
            }
        }
    }

    fn run<R: Rng + ?Sized>(
        &mut self,
        tracks: &[MixTrack],
        markov: &mut Option<TransitionMatrix>,
        rng: &mut R,
    ) -> Result<MixedBuffer, RemixError> {
        self.state = RenderState::Validating;
        let scale = self.config.resolve_scale()?;
        let sample_rate = self.config.sample_rate;

        if tracks.is_empty() {
            return Err(RemixError::ValidationError("No clips to render".to_string()));
        }
        let valid: Vec<&MixTrack> = tracks
            .iter()
            .filter(|t| match t.clip.validate() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Skipping clip '{}': {}", t.clip.name(), e);
                    false
                }
            })
            .collect();
        if valid.is_empty() {
            return Err(RemixError::ValidationError(
                "No valid clips to render".to_string(),
            ));
        }

        let prepared = self.prepare(&valid)?;

        self.state = RenderState::Rendering;
        let mut channels = if self.config.algorithm.is_one_shot() {
            self.render_one_shot(&prepared, rng)?
        } else {
            self.render_looping(&prepared, scale, markov, rng)?
        };

        self.state = RenderState::Normalizing;
        peak_normalize(&mut channels, TARGET_PEAK);

        let hint = if self.config.preserve_pitch {
            self.config.playback_rate
        } else {
            1.0
        };
        let buffer = MixedBuffer::new(channels, sample_rate, hint)?;
        log::info!(
            "Rendered {:.2}s mix of {} clips ({})",
            buffer.duration(),
            prepared.len(),
            self.config.algorithm
        );
        Ok(buffer)
    }

    /// Convert to the render rate and bake in the playback rate
    fn prepare(&self, tracks: &[&MixTrack]) -> Result<Vec<MixTrack>, RemixError> {
        let sample_rate = self.config.sample_rate;
        let rate = self.config.playback_rate as f64;
        let stretch = !self.config.preserve_pitch && (rate - 1.0).abs() > f64::EPSILON;
        if stretch {
            log::debug!("Time-stretching {} clips by {:.3}", tracks.len(), rate);
        }

        tracks
            .par_iter()
            .map(|track| {
                let mut clip = convert_sample_rate(&track.clip, sample_rate)?;
                if stretch {
                    clip = resample_clip(&clip, rate)?;
                }
                Ok(MixTrack {
                    clip,
                    is_loop: track.is_loop,
                    features: track.features,
                })
            })
            .collect()
    }

    fn output_frames(&self, seconds: f64) -> Result<usize, RemixError> {
        let frames = seconds * self.config.sample_rate as f64;
        if !frames.is_finite() || frames < 1.0 {
            return Err(RemixError::ValidationError(format!(
                "Invalid render length: {:.3}s at {} Hz",
                seconds, self.config.sample_rate
            )));
        }
        Ok(frames as usize)
    }

    fn render_one_shot<R: Rng + ?Sized>(&self, tracks: &[MixTrack], rng: &mut R) -> Result<Vec<Vec<f32>>, RemixError> {
        let longest = tracks.iter().map(|t| t.clip.duration()).fold(0.0f64, f64::max);
        let frames = self.output_frames(longest)?;

        let ir = impulse_response(self.config.reverb_seconds, self.config.sample_rate, rng)?;
        let mut graph = SignalGraph::new();
        let bus = self.effect_chain(&mut graph, ir, ONE_SHOT_MASTER_GAIN)?;

        for track in tracks {
            let source = graph.add_source(SourceNode {
                channels: track.clip.channels(),
                start_frame: 0,
                span_frames: track.clip.frames(),
                looping: false,
            });
            bus.attach(&mut graph, source, ONE_SHOT_GAIN)?;
        }

        log::debug!("One-shot graph: {} nodes, {} frames", graph.len(), frames);
        render_graph(&graph, frames, self.config.sample_rate)
    }

    fn render_looping<R: Rng + ?Sized>(
        &self,
        tracks: &[MixTrack],
        scale: Option<&Scale>,
        markov: &mut Option<TransitionMatrix>,
        rng: &mut R,
    ) -> Result<Vec<Vec<f32>>, RemixError> {
        let sample_rate = self.config.sample_rate as f64;
        let bar = bar_seconds(self.config.project_bpm);
        let loops = loop_count(self.config.loop_duration_minutes, self.config.project_bpm);
        let longest = tracks.iter().map(|t| t.clip.duration()).fold(0.0f64, f64::max);
        let frames = self.output_frames((longest * loops as f64).min(MAX_RENDER_SECONDS))?;

        let features: Vec<ClipFeatures> = tracks.iter().map(|t| t.features).collect();
        let algorithm = match self.config.algorithm {
            SequenceAlgorithm::OneShot => SequenceAlgorithm::Sequential,
            other => other,
        };
        let order = sequence(algorithm, &features, loops, scale, markov, rng)?;

        let ir = impulse_response(self.config.reverb_seconds, self.config.sample_rate, rng)?;
        let mut graph = SignalGraph::new();
        let bus = self.effect_chain(&mut graph, ir, master_gain(tracks.len()))?;

        let bar_frames = (bar * sample_rate).round() as usize;
        for (step, &index) in order.iter().enumerate() {
            let track = &tracks[index];
            let start_frame = (step as f64 * bar * sample_rate).round() as usize;
            if start_frame >= frames {
                log::debug!("Step {} starts past the end of the render, dropped", step);
                continue;
            }
            let span_frames = if track.is_loop {
                bar_frames.max(track.clip.frames())
            } else {
                track.clip.frames()
            };
            let source = graph.add_source(SourceNode {
                channels: track.clip.channels(),
                start_frame,
                span_frames,
                looping: track.is_loop,
            });
            bus.attach(&mut graph, source, dynamic_blend(step, order.len()))?;
        }

        log::debug!(
            "Looping graph: {} steps of {:.3}s, {} nodes, {} frames",
            order.len(),
            bar,
            graph.len(),
            frames
        );
        render_graph(&graph, frames, self.config.sample_rate)
    }

    fn effect_chain(&self, graph: &mut SignalGraph<'_>, ir: Vec<Vec<f32>>, master: f32) -> Result<EffectBus, RemixError> {
        let wet_mix = self.config.wet_dry_mix;
        let master = graph.add_gain(master);
        let dry = graph.add_gain(1.0 - wet_mix);
        let wet = graph.add_gain(wet_mix);
        let reverb = graph.add_convolver(ir);

        graph.connect(reverb, wet)?;
        graph.connect(wet, master)?;
        graph.connect(dry, master)?;
        graph.connect(master, graph.destination())?;
        Ok(EffectBus { dry, reverb })
    }
}

/// Entry points of the shared effect chain
struct EffectBus {
    dry: usize,
    reverb: usize,
}

impl EffectBus {
    /// Route a source through its own gain into the dry bus and the reverb
    fn attach(&self, graph: &mut SignalGraph<'_>, source: usize, gain: f32) -> Result<(), RemixError> {
        let event = graph.add_gain(gain);
        graph.connect(source, event)?;
        graph.connect(event, self.dry)?;
        graph.connect(event, self.reverb)
    }
}
