//! Integration tests for the remix engine

use std::io::Cursor;

use rand::rngs::StdRng;
use rand::SeedableRng;
use stratum_remix::analysis::resolve_root_pitch_class;
use stratum_remix::features::key::adjust_to_scale;
use stratum_remix::preprocessing::normalization::{peak, peak_normalize, TARGET_PEAK};
use stratum_remix::render::loop_count;
use stratum_remix::{
    analyze_clip, AnalysisConfig, InputFile, RemixConfig, RemixError, Scale, ScaleBehavior,
    SequenceAlgorithm, Session, TransitionMatrix,
};

/// Encode planar channels as a 16-bit WAV file in memory
fn wav_bytes(channels: &[Vec<f32>], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..channels[0].len() {
            for channel in channels {
                writer.write_sample((channel[i].clamp(-1.0, 1.0) * 32767.0) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Decaying 1 kHz clicks at a fixed tempo
fn click_track(bpm: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let n = (seconds * sample_rate as f32) as usize;
    let period = (60.0 / bpm * sample_rate as f32) as usize;
    let click_len = (0.01 * sample_rate as f32) as usize;
    let mut samples = vec![0.0f32; n];
    let mut start = 0;
    while start < n {
        for i in 0..click_len.min(n - start) {
            let t = i as f32 / sample_rate as f32;
            samples[start + i] =
                0.8 * (-t / 0.002).exp() * (2.0 * std::f32::consts::PI * 1000.0 * t).sin();
        }
        start += period;
    }
    samples
}

fn tone(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let n = (seconds * sample_rate as f32) as usize;
    (0..n)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn tone_file(name: &str, freq: f32, seconds: f32, sample_rate: u32) -> InputFile {
    InputFile::new(name, "audio/wav", wav_bytes(&[tone(freq, seconds, sample_rate)], sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_120bpm_click_track() {
        let samples = click_track(120.0, 12.0, 44100);
        let bytes = wav_bytes(&[samples], 44100);

        let analyzed = analyze_clip("clicks.wav", "audio/wav", &bytes, &AnalysisConfig::default())
            .expect("Analysis should succeed");

        assert!((analyzed.clip.duration() - 12.0).abs() < 0.01);
        assert!(
            (118..=122).contains(&analyzed.metadata.bpm),
            "BPM should be close to 120, got {}",
            analyzed.metadata.bpm
        );
        assert_eq!(analyzed.metadata.key, "Unknown");
    }

    #[test]
    fn test_key_and_center_frequency() {
        let bytes = wav_bytes(&[tone(1000.0, 2.0, 44100)], 44100);
        let analyzed = analyze_clip("bass A2.wav", "audio/x-wav", &bytes, &AnalysisConfig::default()).unwrap();

        assert_eq!(analyzed.metadata.key, "A2");
        assert!(
            (analyzed.metadata.center_frequency - 1000.0).abs() < 100.0,
            "center frequency {}",
            analyzed.metadata.center_frequency
        );
    }

    #[test]
    fn test_non_audio_rejected() {
        let result = analyze_clip("photo.jpg", "image/jpeg", &[0xFF, 0xD8], &AnalysisConfig::default());
        assert!(matches!(result, Err(RemixError::DecodingError(_))));
    }

    #[test]
    fn test_major_filter_keeps_c_e_g() {
        let mut session = Session::with_seed(3, 1);
        let names = ["pad C4.wav", "pad E4.wav", "pad G4.wav"];
        let files = names.iter().map(|n| tone_file(n, 220.0, 0.5, 8000)).collect();
        assert_eq!(session.distribute(files).unwrap(), 3);

        let major = Scale::by_name("major").unwrap();
        let kept = adjust_to_scale(
            names.to_vec(),
            major,
            ScaleBehavior::Filter,
            |name| resolve_root_pitch_class(session.metadata(name), name),
            |name, _| Ok(name),
        )
        .unwrap();
        assert_eq!(kept, names.to_vec());
    }

    #[test]
    fn test_looping_mix_end_to_end() {
        let rate = 22050;
        let mut session = Session::with_seed(3, 42);
        session
            .distribute(vec![
                tone_file("low C3.wav", 130.8, 1.0, rate),
                tone_file("mid E4.wav", 329.6, 0.5, rate),
                InputFile::new(
                    "stereo G4.wav",
                    "audio/wav",
                    wav_bytes(&[tone(392.0, 0.75, rate), tone(392.0, 0.75, rate)], rate),
                ),
            ])
            .unwrap();
        assert!(session.is_ready());
        assert!(session.set_loop("mid E4.wav", true));

        let config = RemixConfig {
            algorithm: SequenceAlgorithm::FrequencyAscending,
            project_bpm: 120.0,
            loop_duration_minutes: 1.0,
            sample_rate: rate,
            ..RemixConfig::default()
        };
        assert_eq!(loop_count(config.loop_duration_minutes, config.project_bpm), 30);

        let mix = session.render(&config).expect("Render should succeed");
        assert_eq!(mix.num_channels(), 2);
        assert_eq!(mix.sample_rate(), rate);
        // Longest clip (1 s) x 30 bars
        assert_eq!(mix.frames(), 30 * rate as usize);
        assert!((mix.peak() - TARGET_PEAK).abs() < 1e-4);

        let wav = mix.to_wav().unwrap();
        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.len() as usize, 2 * mix.frames());
    }

    #[test]
    fn test_one_shot_markov_and_transpose() {
        let rate = 8000;
        let mut session = Session::with_seed(4, 3);
        session
            .distribute(vec![
                tone_file("a C#3.wav", 138.6, 0.5, rate),
                tone_file("b D3.wav", 146.8, 0.5, rate),
            ])
            .unwrap();

        let mut config = RemixConfig {
            algorithm: SequenceAlgorithm::OneShot,
            sample_rate: rate,
            reverb_seconds: 0.5,
            scale: Some("major".to_string()),
            scale_behavior: ScaleBehavior::Transpose,
            ..RemixConfig::default()
        };
        let mix = session.render(&config).unwrap();
        assert!(mix.frames() > 0);

        config.algorithm = SequenceAlgorithm::Markov;
        config.loop_duration_minutes = 0.1;
        config.scale_behavior = ScaleBehavior::Reorder;
        let mix = session.render(&config).unwrap();
        assert!((mix.peak() - TARGET_PEAK).abs() < 1e-4);
        assert!(session.has_markov_chain());
    }

    #[test]
    fn test_render_with_no_clips_fails() {
        let mut session = Session::with_seed(2, 0);
        let result = session.render(&RemixConfig::default());
        assert!(matches!(result, Err(RemixError::ValidationError(_))));
        assert!(session.output().is_none());
    }

    #[test]
    fn test_transition_matrix_properties() {
        let mut rng = StdRng::seed_from_u64(99);
        for n in 1..=10 {
            let matrix = TransitionMatrix::random(n, &mut rng).unwrap();
            for i in 0..n {
                let sum: f64 = matrix.row(i).unwrap().iter().sum();
                assert!((sum - 1.0).abs() < 1e-9);
            }
            for length in [0, 1, 57] {
                let order = matrix.sample_sequence(length, &mut rng);
                assert_eq!(order.len(), length);
                assert!(order.iter().all(|&i| i < n));
            }
        }
    }

    #[test]
    fn test_peak_normalize_idempotent() {
        let mut channels = vec![tone(440.0, 0.1, 8000), tone(220.0, 0.1, 8000)];
        peak_normalize(&mut channels, TARGET_PEAK);
        let once = channels.clone();
        peak_normalize(&mut channels, TARGET_PEAK);

        assert!((peak(&channels) - TARGET_PEAK).abs() < 1e-6);
        for (a, b) in once.iter().flatten().zip(channels.iter().flatten()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
