//! Feature extraction modules
//!
//! This module contains all per-clip analysis algorithms:
//! - Spectrum primitives and the spectral centroid ("center frequency")
//! - Onset functions (spectral flux, energy envelope) and their tempo votes
//! - Period estimation (windowed autocorrelation, candidate voting, consensus)
//! - Note parsing, the scale catalog and scale-aware clip adjustment

pub mod key;
pub mod onset;
pub mod period;
pub mod spectrum;
