//! Model persistence for saving and loading trained agents
//!
//! Agents are stored in numbered slots under a root directory. Each slot holds
//! two files:
//! - `slot_<n>.mpk` - Network weights (Burn named MessagePack record)
//! - `slot_<n>.meta.json` - [`SlotMetadata`] as JSON
//!
//! Failures are reported through anyhow internally and surface as
//! [`EngineError::Persistence`] with the cause attached.

use super::config::DqnConfig;
use crate::error::EngineError;
use crate::maze::MazeConfig;
use crate::metrics::Score;
use crate::modes::EpisodeResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const WEIGHTS_EXTENSION: &str = "mpk";
const META_EXTENSION: &str = "meta.json";

/// Metadata saved with the model
///
/// Contains the configuration needed to rebuild the agent plus the training
/// history shown when the slot is browsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotMetadata {
    /// Display name chosen by the user
    pub name: String,

    /// Unix timestamp in seconds
    pub saved_at: u64,

    /// Agent hyperparameters (includes the hidden width)
    pub config: DqnConfig,

    /// Episodes trained across every session
    pub total_episodes: usize,

    /// Episode index at which each training session started
    #[serde(default)]
    pub session_boundaries: Vec<usize>,

    /// Every episode result recorded so far
    #[serde(default)]
    pub history: Vec<EpisodeResult>,

    /// Mazes the agent was last trained on
    #[serde(default)]
    pub mazes: Vec<MazeConfig>,

    /// Score of the most recent evaluation, if any
    #[serde(default)]
    pub score: Option<Score>,

    /// Version identifier for compatibility checking
    pub version: String,
}

impl SlotMetadata {
    /// Create metadata stamped with the current time and crate version
    pub fn new(name: impl Into<String>, config: DqnConfig, total_episodes: usize) -> Self {
        let saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();

        Self {
            name: name.into(),
            saved_at,
            config,
            total_episodes,
            session_boundaries: Vec::new(),
            history: Vec::new(),
            mazes: Vec::new(),
            score: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One row of [`ModelStore::list`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSummary {
    pub slot: usize,
    pub name: String,
    pub saved_at: u64,
    pub total_episodes: usize,
    pub total_score: Option<u32>,
}

/// Directory-backed store of numbered model slots
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Create a store rooted at `root`; the directory is created on first save
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn weights_path(&self, slot: usize) -> PathBuf {
        self.root.join(format!("slot_{slot}.{WEIGHTS_EXTENSION}"))
    }

    fn meta_path(&self, slot: usize) -> PathBuf {
        self.root.join(format!("slot_{slot}.{META_EXTENSION}"))
    }

    /// Save serialized weights and metadata into `slot`, replacing its contents
    ///
    /// # Arguments
    ///
    /// * `slot` - Slot number
    /// * `weights` - Bytes produced by `DqnAgent::serialize`
    /// * `metadata` - Metadata written next to the weights
    pub fn save(&self, slot: usize, weights: &[u8], metadata: &SlotMetadata) -> Result<(), EngineError> {
        self.try_save(slot, weights, metadata)
            .map_err(|err| EngineError::persistence("save", slot, err))
    }

    fn try_save(&self, slot: usize, weights: &[u8], metadata: &SlotMetadata) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create directory: {:?}", self.root))?;

        let weights_path = self.weights_path(slot);
        std::fs::write(&weights_path, weights)
            .with_context(|| format!("Failed to write weights to {:?}", weights_path))?;

        let meta_path = self.meta_path(slot);
        let meta_json =
            serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
        std::fs::write(&meta_path, meta_json)
            .with_context(|| format!("Failed to write metadata to {:?}", meta_path))?;

        debug!(slot, bytes = weights.len(), "saved model slot");
        Ok(())
    }

    /// Load weights and metadata from `slot`
    ///
    /// # Returns
    ///
    /// The weight bytes (for `DqnAgent::deserialize`) and the slot metadata
    pub fn load(&self, slot: usize) -> Result<(Vec<u8>, SlotMetadata), EngineError> {
        self.try_load(slot)
            .map_err(|err| EngineError::persistence("load", slot, err))
    }

    fn try_load(&self, slot: usize) -> Result<(Vec<u8>, SlotMetadata)> {
        let metadata = self.read_metadata(slot)?;

        let weights_path = self.weights_path(slot);
        let weights = std::fs::read(&weights_path)
            .with_context(|| format!("Failed to read weights from {:?}", weights_path))?;

        debug!(slot, bytes = weights.len(), "loaded model slot");
        Ok((weights, metadata))
    }

    fn read_metadata(&self, slot: usize) -> Result<SlotMetadata> {
        let meta_path = self.meta_path(slot);
        let meta_json = std::fs::read_to_string(&meta_path)
            .with_context(|| format!("Failed to read metadata from {:?}", meta_path))?;
        serde_json::from_str(&meta_json).context("Failed to deserialize metadata")
    }

    /// Remove both files of `slot`; a missing slot is not an error
    pub fn delete(&self, slot: usize) -> Result<(), EngineError> {
        self.try_delete(slot)
            .map_err(|err| EngineError::persistence("delete", slot, err))
    }

    fn try_delete(&self, slot: usize) -> Result<()> {
        for path in [self.weights_path(slot), self.meta_path(slot)] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(err).with_context(|| format!("Failed to remove {:?}", path));
                }
            }
        }
        debug!(slot, "deleted model slot");
        Ok(())
    }

    /// Copy the contents of slot `from` into slot `to`
    pub fn copy(&self, from: usize, to: usize) -> Result<SlotMetadata, EngineError> {
        let (weights, metadata) = self.load(from)?;
        self.save(to, &weights, &metadata)?;
        Ok(metadata)
    }

    /// Summaries of every readable slot, ordered by slot number
    ///
    /// A missing root directory yields an empty list. Slots whose metadata
    /// cannot be parsed are skipped with a warning.
    pub fn list(&self) -> Result<Vec<SlotSummary>, EngineError> {
        self.try_list().map_err(EngineError::ListModels)
    }

    fn try_list(&self) -> Result<Vec<SlotSummary>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read directory: {:?}", self.root))?;

        let mut summaries = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let file_name = entry.file_name();
            let Some(slot) = file_name.to_str().and_then(parse_meta_file_name) else {
                continue;
            };

            match self.read_metadata(slot) {
                Ok(metadata) => summaries.push(SlotSummary {
                    slot,
                    name: metadata.name,
                    saved_at: metadata.saved_at,
                    total_episodes: metadata.total_episodes,
                    total_score: metadata.score.map(|score| score.total_score),
                }),
                Err(err) => warn!(
                    slot,
                    file = ?file_name,
                    error = %format!("{err:#}"),
                    "skipping unreadable model slot"
                ),
            }
        }

        summaries.sort_by_key(|summary| summary.slot);
        Ok(summaries)
    }
}

/// Slot number encoded in a `slot_<n>.meta.json` file name
fn parse_meta_file_name(name: &str) -> Option<usize> {
    name.strip_prefix("slot_")?
        .strip_suffix(&format!(".{META_EXTENSION}"))?
        .parse()
        .ok()
}
