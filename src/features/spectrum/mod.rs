//! Spectrum primitives
//!
//! Windowed magnitude spectra via rustfft, shared by the spectral-flux beat
//! tracker and the center-frequency extractor.

pub mod centroid;

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::RemixError;

pub use centroid::{center_frequency, center_frequency_from_samples, CENTROID_FFT_SIZE};

/// Analysis window shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Hann window (used for STFT frames)
    Hann,
    /// Blackman window with α = 0.16 (analyser-style single snapshots)
    Blackman,
}

/// Build a periodic window of `size` points
pub fn window(kind: WindowKind, size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = 2.0 * PI * i as f32 / n;
            match kind {
                WindowKind::Hann => 0.5 - 0.5 * x.cos(),
                WindowKind::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            }
        })
        .collect()
}

/// Reusable windowed-FFT magnitude analyser
///
/// Holds the FFT plan, window and scratch buffer for one frame size so
/// repeated frames do not re-plan.
pub struct SpectrumAnalyzer {
    size: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    /// Create an analyser for frames of `size` samples
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `size < 2`.
    pub fn new(size: usize, kind: WindowKind) -> Result<Self, RemixError> {
        if size < 2 {
            return Err(RemixError::InvalidInput(format!(
                "FFT size must be >= 2, got {}",
                size
            )));
        }
        let mut planner = FftPlanner::new();
        Ok(Self {
            size,
            window: window(kind, size),
            fft: planner.plan_fft_forward(size),
            buffer: vec![Complex::new(0.0, 0.0); size],
        })
    }

    /// Frame size in samples
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of magnitude bins returned (`size / 2`)
    pub fn bin_count(&self) -> usize {
        self.size / 2
    }

    /// Windowed magnitude spectrum of one frame, scaled by `1 / size`
    ///
    /// Frames shorter than `size` are zero-padded; longer frames are cut.
    pub fn magnitudes(&mut self, frame: &[f32]) -> Vec<f32> {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = frame.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let scale = 1.0 / self.size as f32;
        self.buffer[..self.bin_count()]
            .iter()
            .map(|c| c.norm() * scale)
            .collect()
    }
}

/// Short-time magnitude spectra of a signal
///
/// # Arguments
///
/// * `samples` - Mono signal
/// * `frame_size` - FFT size
/// * `hop_size` - Samples between frame starts
///
/// # Returns
///
/// One magnitude vector per full frame (n_frames × frame_size/2)
pub fn stft_magnitudes(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<Vec<f32>>, RemixError> {
    if hop_size == 0 {
        return Err(RemixError::InvalidInput("Hop size must be > 0".to_string()));
    }
    let mut analyzer = SpectrumAnalyzer::new(frame_size, WindowKind::Hann)?;

    if samples.len() < frame_size {
        return Ok(Vec::new());
    }

    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    let frames: Vec<Vec<f32>> = (0..num_frames)
        .map(|i| {
            let start = i * hop_size;
            analyzer.magnitudes(&samples[start..start + frame_size])
        })
        .collect();

    if frames.iter().flatten().any(|m| !m.is_finite()) {
        return Err(RemixError::AnalysisError(
            "Non-finite STFT magnitude".to_string(),
        ));
    }

    log::debug!(
        "STFT: {} frames of {} bins (frame={}, hop={})",
        frames.len(),
        frame_size / 2,
        frame_size,
        hop_size
    );

    Ok(frames)
}
