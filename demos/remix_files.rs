//! Example: Analyze audio files and render a remix
//!
//! Usage:
//!   cargo run --release --example remix_files -- [--config remix.json] [--out mix.wav] [--json] <file1> <file2> ...
//!
//! Notes:
//! - `--config` takes a JSON `RemixConfig`; missing fields use defaults.
//! - Up to `track_count` files are loaded, in argument order.

use std::env;
use std::path::Path;

use stratum_remix::{InputFile, RemixConfig, Session};

fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut out = String::from("mix.wav");
    let mut config_path: Option<String> = None;
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--out" => {
                out = args.first().ok_or("--out requires a path")?.clone();
                args.remove(0);
            }
            "--config" => {
                config_path = Some(args.first().ok_or("--config requires a path")?.clone());
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: remix_files [--config remix.json] [--out mix.wav] [--json] <file1> <file2> ...\n\
                     \n\
                     --config PATH  JSON remix configuration\n\
                     --out PATH     Output WAV (default: mix.wav)\n\
                     --json         Print clip metadata as JSON\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let config: RemixConfig = match config_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => RemixConfig::default(),
    };

    let mut session = Session::new(config.track_count);
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path.as_str())
            .to_string();
        files.push(InputFile::new(name, mime_for(path), std::fs::read(path)?));
    }

    let loaded = session.distribute(files)?;
    eprintln!("Loaded {} of {} files", loaded, paths.len());

    for index in 0..session.track_count() {
        let Some(clip) = session.slot(index).and_then(|s| s.clip()) else {
            continue;
        };
        let Some(metadata) = session.metadata(clip.name()) else {
            continue;
        };
        if json {
            println!(
                "{}",
                serde_json::json!({ "file": clip.name(), "metadata": metadata })
            );
        } else {
            println!(
                "{}: {} BPM, key {}, center {:.0} Hz, {:.2}s",
                clip.name(),
                metadata.bpm,
                metadata.key,
                metadata.center_frequency,
                clip.duration()
            );
        }
    }

    let mix = session.render(&config)?;
    std::fs::write(&out, mix.to_wav()?)?;
    eprintln!(
        "Wrote {} ({:.2}s, {} Hz, playback rate {:.2})",
        out,
        mix.duration(),
        mix.sample_rate(),
        mix.playback_rate()
    );

    Ok(())
}
