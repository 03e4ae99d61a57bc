//! 16-bit PCM WAV encoding of rendered buffers

use std::io::Cursor;

use crate::error::RemixError;

/// Quantize one sample to signed 16-bit
///
/// Clips to [-1, 1]; negative values scale by 32768, positive by 32767,
/// and the fractional part is truncated toward zero.
#[inline]
pub fn quantize_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode planar channels into a canonical RIFF/WAVE byte stream
///
/// # Arguments
///
/// * `channels` - Planar channel data, all channels the same length
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// The complete file: 44-byte header followed by interleaved little-endian
/// signed 16-bit samples
///
/// # Errors
///
/// `InvalidInput` for zero channels, zero sample rate or ragged channels;
/// `RenderError` if the writer fails.
pub fn encode_wav(channels: &[Vec<f32>], sample_rate: u32) -> Result<Vec<u8>, RemixError> {
    if channels.is_empty() || channels.len() > u16::MAX as usize {
        return Err(RemixError::InvalidInput(format!(
            "Cannot encode {} channels",
            channels.len()
        )));
    }
    if sample_rate == 0 {
        return Err(RemixError::InvalidInput("Invalid sample rate: 0".to_string()));
    }
    let frames = channels[0].len();
    if channels.iter().any(|c| c.len() != frames) {
        return Err(RemixError::InvalidInput(
            "Channels have unequal length".to_string(),
        ));
    }

    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let to_render_error = |e: hound::Error| RemixError::RenderError(format!("WAV encoding failed: {}", e));

    let mut cursor = Cursor::new(Vec::with_capacity(44 + frames * channels.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(to_render_error)?;
        for i in 0..frames {
            for channel in channels {
                writer.write_sample(quantize_i16(channel[i])).map_err(to_render_error)?;
            }
        }
        writer.finalize().map_err(to_render_error)?;
    }

    let bytes = cursor.into_inner();
    log::debug!(
        "Encoded WAV: {} ch, {} Hz, {} frames, {} bytes",
        channels.len(),
        sample_rate,
        frames,
        bytes.len()
    );
    Ok(bytes)
}
