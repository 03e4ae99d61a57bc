//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for analysis and mixing:
//! - Decimation and single-pole high-pass filtering
//! - Peak normalization
//! - Channel mixing (mono downmix, stereo mapping)
//! - Playback-rate resampling (transpose, time-stretch)

pub mod channel_mixer;
pub mod filter;
pub mod normalization;
pub mod resample;
