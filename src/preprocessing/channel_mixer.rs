//! Channel mixing utilities

/// Average all channels into one
pub fn downmix_to_mono(channels: &[Vec<f32>]) -> Vec<f32> {
    match channels.len() {
        0 => Vec::new(),
        1 => channels[0].clone(),
        n => {
            let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
            let scale = 1.0 / n as f32;
            (0..frames)
                .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
                .collect()
        }
    }
}

/// Map a clip's channels onto a stereo pair
///
/// Mono is duplicated to both sides; stereo passes through; anything wider
/// keeps its first two channels.
pub fn to_stereo(channels: &[Vec<f32>]) -> [&[f32]; 2] {
    match channels.len() {
        0 => [&[], &[]],
        1 => [&channels[0], &channels[0]],
        _ => [&channels[0], &channels[1]],
    }
}
