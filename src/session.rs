//! Remix session
//!
//! Owns everything that lives between user actions: track slots, clip
//! metadata, the FIFO of files waiting for analysis, the memoised Markov
//! matrix, the last rendered mix and its loop player.
//!
//! Files are analysed strictly one at a time in arrival order. A file that
//! fails to decode only invalidates its own slot. A failed render leaves the
//! previous output in place.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::{analyze_clip, resolve_root_pitch_class, ClipMetadata, MetadataStore};
use crate::config::{AnalysisConfig, RemixConfig, MAX_TRACKS, MIN_TRACKS};
use crate::error::RemixError;
use crate::features::key::adjust_to_scale;
use crate::io::AudioClip;
use crate::preprocessing::resample::transpose_clip;
use crate::render::{LoopPlayer, MixRenderer, MixTrack, MixedBuffer};
use crate::sequencer::{ClipFeatures, TransitionMatrix};

/// A file handed to the session: name, MIME type and raw contents
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Filename, used as the clip identity
    pub name: String,
    /// MIME type, e.g. `audio/wav`
    pub mime: String,
    /// Complete file contents
    pub bytes: Vec<u8>,
}

impl InputFile {
    /// Bundle a file
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    fn is_audio(&self) -> bool {
        self.mime.starts_with("audio/")
    }
}

/// State of one track slot
#[derive(Debug, Clone, Default)]
pub enum Slot {
    /// No file
    #[default]
    Empty,
    /// Waiting in the processing queue
    Queued(String),
    /// Decoded and analysed
    Ready(AudioClip),
    /// Decoding or validation failed
    Invalid {
        /// Filename
        name: String,
        /// Why the clip was rejected
        error: RemixError,
    },
}

impl Slot {
    /// The decoded clip, if the slot is ready
    pub fn clip(&self) -> Option<&AudioClip> {
        match self {
            Slot::Ready(clip) => Some(clip),
            _ => None,
        }
    }

    /// Whether a file was assigned to this slot
    pub fn is_occupied(&self) -> bool {
        !matches!(self, Slot::Empty)
    }
}

/// One user's working set of tracks
#[derive(Debug)]
pub struct Session {
    slots: Vec<Slot>,
    metadata: MetadataStore,
    queue: VecDeque<(usize, InputFile)>,
    is_processing: bool,
    markov: Option<TransitionMatrix>,
    rng: StdRng,
    analysis: AnalysisConfig,
    output: Option<Arc<MixedBuffer>>,
    player: LoopPlayer,
}

impl Session {
    /// New session with `track_count` slots (clamped to [2, 10])
    pub fn new(track_count: usize) -> Self {
        Self::with_rng(track_count, StdRng::from_entropy())
    }

    /// New session with a deterministic random source
    pub fn with_seed(track_count: usize, seed: u64) -> Self {
        Self::with_rng(track_count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(track_count: usize, rng: StdRng) -> Self {
        let mut session = Self {
            slots: Vec::new(),
            metadata: MetadataStore::new(),
            queue: VecDeque::new(),
            is_processing: false,
            markov: None,
            rng,
            analysis: AnalysisConfig::default(),
            output: None,
            player: LoopPlayer::new(),
        };
        session.reset(track_count);
        session
    }

    /// Use a non-default analysis configuration for files processed from now on
    pub fn with_analysis_config(mut self, config: AnalysisConfig) -> Self {
        self.analysis = config;
        self
    }

    /// Drop all clips, metadata and queued work and resize the slots
    ///
    /// The last rendered mix and the player are kept.
    pub fn reset(&mut self, track_count: usize) {
        let count = track_count.clamp(MIN_TRACKS, MAX_TRACKS);
        if count != track_count {
            log::warn!("Track count {} clamped to {}", track_count, count);
        }
        self.slots = vec![Slot::Empty; count];
        self.metadata.clear();
        self.queue.clear();
        self.is_processing = false;
        self.markov = None;
        log::info!("Session reset with {} track slots", count);
    }

    /// Number of track slots
    pub fn track_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot by index
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Spread dropped files over the slots and process them
    ///
    /// Non-audio files are ignored; audio files fill slots from 0 upwards and
    /// any beyond the slot count are dropped.
    ///
    /// # Returns
    ///
    /// Number of files that ended up as ready clips
    ///
    /// # Errors
    ///
    /// `InvalidInput` if no files were given or none is audio
    pub fn distribute(&mut self, files: Vec<InputFile>) -> Result<usize, RemixError> {
        if files.is_empty() {
            return Err(RemixError::InvalidInput("No files provided".to_string()));
        }
        let audio: Vec<InputFile> = files.into_iter().filter(InputFile::is_audio).collect();
        if audio.is_empty() {
            return Err(RemixError::InvalidInput(
                "No valid audio files detected. Use WAV, MP3, or OGG.".to_string(),
            ));
        }

        let count = audio.len().min(self.slots.len());
        if audio.len() > count {
            log::warn!("{} files dropped: only {} track slots", audio.len() - count, count);
        }
        for (slot, file) in audio.into_iter().take(count).enumerate() {
            self.enqueue(slot, file)?;
        }

        self.process_queue();
        Ok(self.slots[..count].iter().filter(|s| s.clip().is_some()).count())
    }

    /// Queue one file for a slot
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a slot index out of range
    pub fn enqueue(&mut self, slot: usize, file: InputFile) -> Result<(), RemixError> {
        if slot >= self.slots.len() {
            return Err(RemixError::InvalidInput(format!(
                "Slot {} out of range (0..{})",
                slot,
                self.slots.len()
            )));
        }
        log::debug!("Queuing '{}' for track {}", file.name, slot);
        self.slots[slot] = Slot::Queued(file.name.clone());
        self.queue.push_back((slot, file));
        Ok(())
    }

    /// Files waiting for analysis
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is being drained
    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Decode and analyse queued files in arrival order
    ///
    /// # Returns
    ///
    /// Number of files processed (ready or invalid)
    pub fn process_queue(&mut self) -> usize {
        if self.is_processing || self.queue.is_empty() {
            return 0;
        }
        self.is_processing = true;

        let mut processed = 0;
        while let Some((slot, file)) = self.queue.pop_front() {
            self.process_file(slot, file);
            processed += 1;
        }

        self.is_processing = false;
        log::info!(
            "File processing complete: {} processed, {} valid clips",
            processed,
            self.valid_clip_count()
        );
        processed
    }

    fn process_file(&mut self, slot: usize, file: InputFile) {
        let InputFile { name, mime, bytes } = file;
        self.markov = None;

        match analyze_clip(&name, &mime, &bytes, &self.analysis) {
            Ok(analyzed) => {
                let mut metadata = analyzed.metadata;
                if let Some(previous) = self.metadata.get(&name) {
                    metadata.is_loop = previous.is_loop;
                }
                self.metadata.insert(name, metadata);
                self.slots[slot] = Slot::Ready(analyzed.clip);
            }
            Err(error) => {
                log::warn!("Error processing '{}' for track {}: {}", name, slot, error);
                self.slots[slot] = Slot::Invalid { name, error };
            }
        }
    }

    /// Empty a slot
    ///
    /// The clip's metadata stays in the store.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a slot index out of range
    pub fn clear_slot(&mut self, slot: usize) -> Result<(), RemixError> {
        let entry = self.slots.get_mut(slot).ok_or_else(|| {
            RemixError::InvalidInput(format!("Slot {} out of range", slot))
        })?;
        *entry = Slot::Empty;
        self.queue.retain(|(s, _)| *s != slot);
        self.markov = None;
        Ok(())
    }

    /// Mark a clip as a loop (fills its bar) or a one-shot
    ///
    /// # Returns
    ///
    /// `false` if no metadata exists for `name`
    pub fn set_loop(&mut self, name: &str, is_loop: bool) -> bool {
        let found = self.metadata.set_loop(name, is_loop);
        if found {
            log::debug!("Loop set to {} for '{}'", is_loop, name);
        }
        found
    }

    /// Metadata of a clip by name
    pub fn metadata(&self, name: &str) -> Option<&ClipMetadata> {
        self.metadata.get(name)
    }

    /// The whole metadata store
    pub fn metadata_store(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Slots holding a ready clip
    pub fn valid_clip_count(&self) -> usize {
        self.slots.iter().filter(|s| s.clip().is_some()).count()
    }

    /// Whether every occupied slot is ready and at least one is
    pub fn is_ready(&self) -> bool {
        let occupied = self.slots.iter().filter(|s| s.is_occupied()).count();
        let valid = self.valid_clip_count();
        valid > 0 && valid == occupied
    }

    /// Render a mix of the ready clips
    ///
    /// Applies the configured scale behavior (filter, transpose or reorder),
    /// then renders. On success the new mix replaces the previous one and is
    /// loaded into the player (stopped).
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an unknown scale
    /// - `ValidationError` when no clip survives
    /// - `RenderError` when rendering fails
    ///
    /// The previous output is untouched on error.
    pub fn render(&mut self, config: &RemixConfig) -> Result<Arc<MixedBuffer>, RemixError> {
        let config = config.clamped();
        let scale = config.resolve_scale()?;

        let mut tracks: Vec<MixTrack> = self
            .slots
            .iter()
            .filter_map(Slot::clip)
            .map(|clip| {
                let metadata = self.metadata.get(clip.name());
                MixTrack {
                    clip: clip.clone(),
                    is_loop: metadata.map_or(false, |m| m.is_loop),
                    features: ClipFeatures {
                        root_pitch_class: resolve_root_pitch_class(metadata, clip.name()),
                        center_frequency: metadata.map_or(0.0, |m| m.center_frequency),
                    },
                }
            })
            .collect();

        if let Some(scale) = scale {
            tracks = adjust_to_scale(
                tracks,
                scale,
                config.scale_behavior,
                |t: &MixTrack| t.features.root_pitch_class,
                |t: MixTrack, shift| {
                    let clip = transpose_clip(&t.clip, shift)?;
                    let root = t
                        .features
                        .root_pitch_class
                        .map(|pc| (pc as i32 + shift).rem_euclid(12) as u8);
                    Ok(MixTrack {
                        clip,
                        features: ClipFeatures {
                            root_pitch_class: root,
                            ..t.features
                        },
                        ..t
                    })
                },
            )?;
        }

        if tracks.is_empty() {
            return Err(RemixError::ValidationError(
                "No valid audio files to process".to_string(),
            ));
        }

        let mut renderer = MixRenderer::new(&config);
        let buffer = Arc::new(renderer.render(&tracks, &mut self.markov, &mut self.rng)?);

        self.player.load(Arc::clone(&buffer));
        self.output = Some(Arc::clone(&buffer));
        Ok(buffer)
    }

    /// The last successful mix
    pub fn output(&self) -> Option<Arc<MixedBuffer>> {
        self.output.clone()
    }

    /// Start looping the last mix
    pub fn play(&mut self) -> bool {
        self.player.play()
    }

    /// Stop playback; analysis and rendering state are unaffected
    pub fn stop(&mut self) {
        self.player.stop();
    }

    /// The loop player, for pulling frames
    pub fn player_mut(&mut self) -> &mut LoopPlayer {
        &mut self.player
    }

    /// Whether a Markov matrix is cached
    pub fn has_markov_chain(&self) -> bool {
        self.markov.is_some()
    }
}
