//! Offline graph executor
//!
//! Evaluates a [`SignalGraph`] into a fixed-length stereo buffer. Node
//! outputs are sparse spans (start frame plus stereo data) so that a
//! hundred short events on a ten-minute timeline do not each cost a full
//! timeline of memory. A span is moved into its last consumer and cloned
//! for the others.

use rustfft::{num_complex::Complex, FftPlanner};

use super::graph::{Node, NodeId, SignalGraph, SourceNode};
use crate::error::RemixError;
use crate::preprocessing::channel_mixer::to_stereo;

/// Convolver calibration gain (-58 dB)
pub const GAIN_CALIBRATION: f32 = 0.00125;

/// Sample rate the calibration gain refers to
pub const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44100.0;

/// Floor on kernel RMS power
pub const MIN_POWER: f32 = 0.000125;

const MIN_FFT_SIZE: usize = 1024;

/// Stereo data starting at a timeline frame
#[derive(Debug, Clone)]
struct Span {
    start: usize,
    channels: [Vec<f32>; 2],
}

impl Span {
    fn silent(start: usize, len: usize) -> Self {
        Self {
            start,
            channels: [vec![0.0; len], vec![0.0; len]],
        }
    }

    fn len(&self) -> usize {
        self.channels[0].len()
    }

    fn end(&self) -> usize {
        self.start + self.len()
    }

    fn covers(&self, other: &Span) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    fn add(&mut self, other: &Span) {
        let offset = other.start - self.start;
        for (dst, src) in self.channels.iter_mut().zip(&other.channels) {
            for (d, s) in dst[offset..offset + src.len()].iter_mut().zip(src) {
                *d += s;
            }
        }
    }

    fn scale(&mut self, gain: f32) {
        for channel in self.channels.iter_mut() {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }
}

fn mix(a: Option<Span>, b: Option<Span>) -> Option<Span> {
    match (a, b) {
        (None, x) | (x, None) => x,
        (Some(mut a), Some(b)) => {
            if a.covers(&b) {
                a.add(&b);
                Some(a)
            } else if b.covers(&a) {
                let mut b = b;
                b.add(&a);
                Some(b)
            } else {
                let start = a.start.min(b.start);
                let mut out = Span::silent(start, a.end().max(b.end()) - start);
                out.add(&a);
                out.add(&b);
                Some(out)
            }
        }
    }
}

/// Evaluate a graph into `frames` frames of stereo audio
///
/// # Arguments
///
/// * `graph` - Graph to evaluate
/// * `frames` - Output length; anything past it is discarded
/// * `sample_rate` - Render rate in Hz (used for convolver calibration)
///
/// # Returns
///
/// Two planar channels of exactly `frames` samples
///
/// # Errors
///
/// `RenderError` for a cyclic graph, a zero frame count or rate, or
/// non-finite output
pub fn render_graph(
    graph: &SignalGraph<'_>,
    frames: usize,
    sample_rate: u32,
) -> Result<Vec<Vec<f32>>, RemixError> {
    if frames == 0 || sample_rate == 0 {
        return Err(RemixError::RenderError(format!(
            "Cannot render {} frames at {} Hz",
            frames, sample_rate
        )));
    }

    let order = graph.topological_order()?;
    let mut outputs: Vec<Option<Span>> = vec![None; graph.len()];
    let mut pending: Vec<usize> = (0..graph.len()).map(|id| graph.fan_out(id)).collect();

    for id in order {
        let inputs: Vec<NodeId> = graph.inputs(id).collect();
        let mut input = None;
        for from in inputs {
            pending[from] -= 1;
            let span = if pending[from] == 0 {
                outputs[from].take()
            } else {
                outputs[from].clone()
            };
            input = mix(input, span);
        }

        outputs[id] = match graph.node(id) {
            Some(Node::Source(source)) => source_span(source, frames),
            Some(Node::Gain(gain)) => input.map(|mut span| {
                span.scale(*gain);
                span
            }),
            Some(Node::Convolver { kernel }) => match input {
                Some(span) => Some(convolve_span(span, kernel, frames, sample_rate)?),
                None => None,
            },
            Some(Node::Destination) => input,
            None => {
                return Err(RemixError::RenderError(format!("Unknown node {}", id)));
            }
        };
    }

    let mut output = vec![vec![0.0f32; frames]; 2];
    if let Some(span) = outputs[graph.destination()].take() {
        for (dst, src) in output.iter_mut().zip(&span.channels) {
            let end = span.end().min(frames);
            if span.start < end {
                dst[span.start..end].copy_from_slice(&src[..end - span.start]);
            }
        }
    }

    if output.iter().flatten().any(|s| !s.is_finite()) {
        return Err(RemixError::RenderError(
            "Render produced non-finite samples".to_string(),
        ));
    }
    Ok(output)
}

fn source_span(source: &SourceNode<'_>, frames: usize) -> Option<Span> {
    let [left, right] = to_stereo(source.channels);
    let clip_len = left.len();
    if clip_len == 0 || source.start_frame >= frames {
        return None;
    }

    let wanted = if source.looping {
        source.span_frames
    } else {
        source.span_frames.min(clip_len)
    };
    let len = wanted.min(frames - source.start_frame);
    if len == 0 {
        return None;
    }

    let read = |channel: &[f32]| -> Vec<f32> {
        channel.iter().copied().cycle().take(len).collect()
    };
    Some(Span {
        start: source.start_frame,
        channels: [read(left), read(right)],
    })
}

fn convolve_span(span: Span, kernel: &[Vec<f32>], frames: usize, sample_rate: u32) -> Result<Span, RemixError> {
    let [k_left, k_right] = to_stereo(kernel);
    if k_left.is_empty() {
        return Err(RemixError::RenderError("Convolver kernel is empty".to_string()));
    }

    let scale = convolver_scale(kernel, sample_rate);
    let max_len = (span.len() + k_left.len() - 1).min(frames - span.start);
    let [in_left, in_right] = &span.channels;

    let (mut left, mut right) = rayon::join(
        || fft_convolve(in_left, k_left, max_len),
        || fft_convolve(in_right, k_right, max_len),
    );
    for sample in left.iter_mut().chain(right.iter_mut()) {
        *sample *= scale;
    }

    Ok(Span {
        start: span.start,
        channels: [left, right],
    })
}

/// Equal-power gain applied to a convolution kernel
///
/// `GAIN_CALIBRATION / rms(kernel)`, with the RMS floored at [`MIN_POWER`]
/// and rescaled for sample rates other than 44.1 kHz.
pub fn convolver_scale(kernel: &[Vec<f32>], sample_rate: u32) -> f32 {
    let count: usize = kernel.iter().map(Vec::len).sum();
    if count == 0 {
        return 1.0;
    }

    let sum_sq: f64 = kernel.iter().flatten().map(|&x| (x as f64) * (x as f64)).sum();
    let mut power = (sum_sq / count as f64).sqrt() as f32;
    if !power.is_finite() || power < MIN_POWER {
        power = MIN_POWER;
    }

    let mut scale = GAIN_CALIBRATION / power;
    if sample_rate > 0 {
        scale *= GAIN_CALIBRATION_SAMPLE_RATE / sample_rate as f32;
    }
    scale
}

/// Linear convolution by FFT overlap-add
///
/// # Arguments
///
/// * `signal` - Input samples
/// * `kernel` - Impulse response
/// * `max_len` - Output is truncated to this many samples (at most
///   `signal.len() + kernel.len() - 1`)
pub fn fft_convolve(signal: &[f32], kernel: &[f32], max_len: usize) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let out_len = (signal.len() + kernel.len() - 1).min(max_len);
    if out_len == 0 {
        return Vec::new();
    }

    let fft_size = (2 * kernel.len()).next_power_of_two().max(MIN_FFT_SIZE);
    let block = fft_size - kernel.len() + 1;

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(fft_size);
    let inverse = planner.plan_fft_inverse(fft_size);

    let zero = Complex::new(0.0f32, 0.0);
    let mut kernel_spectrum = vec![zero; fft_size];
    for (dst, &k) in kernel_spectrum.iter_mut().zip(kernel) {
        dst.re = k;
    }
    forward.process(&mut kernel_spectrum);

    let norm = 1.0 / fft_size as f32;
    let mut out = vec![0.0f32; out_len];
    let mut buffer = vec![zero; fft_size];

    for (b, chunk) in signal.chunks(block).enumerate() {
        let offset = b * block;
        if offset >= out_len {
            break;
        }

        buffer.fill(zero);
        for (dst, &s) in buffer.iter_mut().zip(chunk) {
            dst.re = s;
        }
        forward.process(&mut buffer);
        for (x, k) in buffer.iter_mut().zip(&kernel_spectrum) {
            *x *= k;
        }
        inverse.process(&mut buffer);

        let n = (chunk.len() + kernel.len() - 1).min(out_len - offset);
        for (dst, src) in out[offset..offset + n].iter_mut().zip(&buffer) {
            *dst += src.re * norm;
        }
    }

    log::debug!(
        "Convolved {} samples with {}-tap kernel (fft {}, block {})",
        signal.len(),
        kernel.len(),
        fft_size,
        block
    );
    out
}
