//! Configuration parameters for analysis and rendering

use serde::{Deserialize, Serialize};

use crate::error::RemixError;
use crate::features::key::{Scale, ScaleBehavior};
use crate::sequencer::SequenceAlgorithm;

/// Tempo estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TempoStrategy {
    /// Autocorrelation + spectral flux + energy onsets, combined by weighted vote
    Consensus,
    /// Single full-signal autocorrelation on a 4 kHz decimation
    Legacy,
}

/// Tempo estimation parameters
///
/// The weights and bucket width are heuristics; treat them as tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Which estimator to run (default: Consensus)
    pub strategy: TempoStrategy,

    /// Target analysis rate for the consensus path in Hz (default: 11025)
    /// Decimation picks every Nth sample with N = floor(sample_rate / target)
    pub target_rate: u32,

    /// High-pass cutoff for the consensus path in Hz (default: 50.0)
    pub highpass_cutoff_hz: f32,

    /// Autocorrelation window sizes in seconds (default: 3, 6, 12)
    pub autocorrelation_windows: Vec<f32>,

    /// Spectral flux frame size in analysis samples (default: 512)
    pub flux_frame_size: usize,

    /// Spectral flux hop size (default: 128, 75% overlap)
    pub flux_hop_size: usize,

    /// Energy envelope frame size in analysis samples (default: 256)
    pub energy_frame_size: usize,

    /// Energy envelope hop size (default: 128, 50% overlap)
    pub energy_hop_size: usize,

    /// Reliability weight of the autocorrelation method (default: 1.2)
    pub autocorrelation_weight: f32,

    /// Reliability weight of the spectral-flux beat tracker (default: 1.0)
    pub beat_tracking_weight: f32,

    /// Reliability weight of the energy onset method (default: 0.8)
    pub onset_weight: f32,

    /// Width of a voting bucket in BPM (default: 5.0)
    pub bucket_width: f32,

    /// Strength multiplier for candidates outside a method's preferred range (default: 0.5)
    pub out_of_range_penalty: f32,

    /// Target rate of the legacy path in Hz (default: 4000)
    pub legacy_target_rate: u32,

    /// High-pass cutoff of the legacy path in Hz (default: 100.0)
    pub legacy_highpass_cutoff_hz: f32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            strategy: TempoStrategy::Consensus,
            target_rate: 11025,
            highpass_cutoff_hz: 50.0,
            autocorrelation_windows: vec![3.0, 6.0, 12.0],
            flux_frame_size: 512,
            flux_hop_size: 128,
            energy_frame_size: 256,
            energy_hop_size: 128,
            autocorrelation_weight: 1.2,
            beat_tracking_weight: 1.0,
            onset_weight: 0.8,
            bucket_width: 5.0,
            out_of_range_penalty: 0.5,
            legacy_target_rate: 4000,
            legacy_highpass_cutoff_hz: 100.0,
        }
    }
}

/// Per-clip analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Seconds of audio fed to the tempo estimator (default: 30.0)
    pub analysis_window_seconds: f32,

    /// Seconds of audio scanned for the center frequency (default: 30.0)
    pub center_frequency_seconds: f32,

    /// Tempo estimation parameters
    pub tempo: TempoConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analysis_window_seconds: 30.0,
            center_frequency_seconds: 30.0,
            tempo: TempoConfig::default(),
        }
    }
}

/// Minimum number of track slots
pub const MIN_TRACKS: usize = 2;
/// Maximum number of track slots
pub const MAX_TRACKS: usize = 10;
/// Project tempo bounds in BPM
pub const PROJECT_BPM_RANGE: (f32, f32) = (60.0, 240.0);
/// Loop-duration bounds in minutes
pub const LOOP_MINUTES_RANGE: (f32, f32) = (0.1, 10.0);
/// Playback-rate bounds
pub const PLAYBACK_RATE_RANGE: (f32, f32) = (0.25, 4.0);
/// Reverb tail bounds in seconds
pub const REVERB_SECONDS_RANGE: (f32, f32) = (0.1, 10.0);

/// Remix rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemixConfig {
    /// Number of track slots (default: 5, clamped to [2, 10])
    pub track_count: usize,

    /// Reverb balance, 0 = fully dry, 1 = fully wet (default: 0.5)
    pub wet_dry_mix: f32,

    /// Playback rate multiplier (default: 1.0, clamped to [0.25, 4])
    pub playback_rate: f32,

    /// Keep pitch when changing rate (default: false)
    /// When set, the rate is only carried to the player as a hint.
    pub preserve_pitch: bool,

    /// Synthetic reverb tail length in seconds (default: 2.0, clamped to [0.1, 10])
    pub reverb_seconds: f32,

    /// Clip ordering algorithm (default: Sequential)
    pub algorithm: SequenceAlgorithm,

    /// Scale name from the catalog, or None to skip scale processing
    pub scale: Option<String>,

    /// What to do with clips relative to the scale (default: Filter)
    pub scale_behavior: ScaleBehavior,

    /// Looping mix budget in minutes (default: 5.0, clamped to [0.1, 10])
    pub loop_duration_minutes: f32,

    /// Project tempo used for bar placement (default: 120.0, clamped to [60, 240])
    pub project_bpm: f32,

    /// Output sample rate in Hz (default: 44100)
    pub sample_rate: u32,
}

impl Default for RemixConfig {
    fn default() -> Self {
        Self {
            track_count: 5,
            wet_dry_mix: 0.5,
            playback_rate: 1.0,
            preserve_pitch: false,
            reverb_seconds: 2.0,
            algorithm: SequenceAlgorithm::Sequential,
            scale: None,
            scale_behavior: ScaleBehavior::Filter,
            loop_duration_minutes: 5.0,
            project_bpm: 120.0,
            sample_rate: 44100,
        }
    }
}

impl RemixConfig {
    /// Return a copy with every field forced into its allowed range
    ///
    /// Non-finite values fall back to the defaults before clamping.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };

        Self {
            track_count: self.track_count.clamp(MIN_TRACKS, MAX_TRACKS),
            wet_dry_mix: finite_or(self.wet_dry_mix, defaults.wet_dry_mix).clamp(0.0, 1.0),
            playback_rate: {
                let rate = finite_or(self.playback_rate, defaults.playback_rate);
                if rate > 0.0 {
                    rate.clamp(PLAYBACK_RATE_RANGE.0, PLAYBACK_RATE_RANGE.1)
                } else {
                    defaults.playback_rate
                }
            },
            preserve_pitch: self.preserve_pitch,
            reverb_seconds: {
                let secs = finite_or(self.reverb_seconds, defaults.reverb_seconds);
                if secs > 0.0 {
                    secs.clamp(REVERB_SECONDS_RANGE.0, REVERB_SECONDS_RANGE.1)
                } else {
                    defaults.reverb_seconds
                }
            },
            algorithm: self.algorithm,
            scale: self.scale.clone(),
            scale_behavior: self.scale_behavior,
            loop_duration_minutes: finite_or(self.loop_duration_minutes, defaults.loop_duration_minutes)
                .clamp(LOOP_MINUTES_RANGE.0, LOOP_MINUTES_RANGE.1),
            project_bpm: finite_or(self.project_bpm, defaults.project_bpm)
                .clamp(PROJECT_BPM_RANGE.0, PROJECT_BPM_RANGE.1),
            sample_rate: if self.sample_rate == 0 { defaults.sample_rate } else { self.sample_rate },
        }
    }

    /// The configured scale from the catalog
    ///
    /// `None` and `"none"` mean no scale processing.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a name missing from the catalog
    pub fn resolve_scale(&self) -> Result<Option<&'static Scale>, RemixError> {
        match self.scale.as_deref() {
            None | Some("none") => Ok(None),
            Some(name) => Scale::by_name(name)
                .map(Some)
                .ok_or_else(|| RemixError::InvalidInput(format!("Unknown scale: {}", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_ranges() {
        let config = RemixConfig {
            track_count: 40,
            wet_dry_mix: 1.7,
            loop_duration_minutes: 0.0,
            project_bpm: 500.0,
            ..RemixConfig::default()
        }
        .clamped();

        assert_eq!(config.track_count, MAX_TRACKS);
        assert_eq!(config.wet_dry_mix, 1.0);
        assert!((config.loop_duration_minutes - 0.1).abs() < 1e-6);
        assert_eq!(config.project_bpm, 240.0);
    }

    #[test]
    fn test_clamped_playback_rate_and_reverb_bounds() {
        let slow = RemixConfig {
            playback_rate: 1e-12,
            reverb_seconds: 1e9,
            ..RemixConfig::default()
        }
        .clamped();
        assert_eq!(slow.playback_rate, 0.25);
        assert_eq!(slow.reverb_seconds, 10.0);

        let fast = RemixConfig {
            playback_rate: 1e12,
            reverb_seconds: 1e-9,
            ..RemixConfig::default()
        }
        .clamped();
        assert_eq!(fast.playback_rate, 4.0);
        assert!((fast.reverb_seconds - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_clamped_non_finite_falls_back() {
        let config = RemixConfig {
            wet_dry_mix: f32::NAN,
            playback_rate: -2.0,
            reverb_seconds: f32::INFINITY,
            sample_rate: 0,
            ..RemixConfig::default()
        }
        .clamped();

        assert_eq!(config.wet_dry_mix, 0.5);
        assert_eq!(config.playback_rate, 1.0);
        assert_eq!(config.reverb_seconds, 2.0);
        assert_eq!(config.sample_rate, 44100);
    }

    #[test]
    fn test_config_json_roundtrip_uses_defaults() {
        let config: RemixConfig =
            serde_json::from_str(r#"{"algorithm":"markov","scale":"major","project_bpm":128}"#).unwrap();
        assert_eq!(config.algorithm, SequenceAlgorithm::Markov);
        assert_eq!(config.scale.as_deref(), Some("major"));
        assert_eq!(config.project_bpm, 128.0);
        assert_eq!(config.track_count, 5);
    }

    #[test]
    fn test_resolve_scale() {
        let mut config = RemixConfig::default();
        assert!(config.resolve_scale().unwrap().is_none());
        config.scale = Some("none".to_string());
        assert!(config.resolve_scale().unwrap().is_none());
        config.scale = Some("blues".to_string());
        assert_eq!(config.resolve_scale().unwrap().unwrap().name, "blues");
        config.scale = Some("lydian dominant-ish".to_string());
        assert!(config.resolve_scale().is_err());
    }
}
