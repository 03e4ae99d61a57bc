//! Per-clip metadata and its store

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::features::key::UNKNOWN_KEY;
use crate::features::period::FALLBACK_BPM;

/// Analysis results and user flags for one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMetadata {
    /// Estimated tempo in BPM, within [40, 300]
    pub bpm: u32,

    /// Key string: a note name with optional octave or mode, or "Unknown"
    pub key: String,

    /// Whether the clip repeats to fill its slot in a looping mix
    pub is_loop: bool,

    /// Perceptual center frequency in Hz (≥ 0)
    pub center_frequency: f32,
}

impl Default for ClipMetadata {
    fn default() -> Self {
        Self {
            bpm: FALLBACK_BPM,
            key: UNKNOWN_KEY.to_string(),
            is_loop: false,
            center_frequency: 0.0,
        }
    }
}

/// Metadata keyed by clip name
///
/// Entries are created when a clip finishes analysis and only removed by
/// [`MetadataStore::clear`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataStore {
    entries: HashMap<String, ClipMetadata>,
}

impl MetadataStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a clip's metadata
    pub fn insert(&mut self, name: impl Into<String>, metadata: ClipMetadata) {
        self.entries.insert(name.into(), metadata);
    }

    /// Metadata of a clip
    pub fn get(&self, name: &str) -> Option<&ClipMetadata> {
        self.entries.get(name)
    }

    /// Set the loop flag of a stored clip
    ///
    /// Returns `false` if the clip is unknown.
    pub fn set_loop(&mut self, name: &str, is_loop: bool) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.is_loop = is_loop;
                true
            }
            None => false,
        }
    }

    /// Number of stored clips
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
