//! Error taxonomy for the engine
//!
//! Configuration and precondition failures are detected before any simulation
//! starts. Persistence failures carry the underlying cause. Cancellation is not
//! an error and never appears here.

use thiserror::Error;

/// Errors surfaced by training, evaluation and model persistence
#[derive(Debug, Error)]
pub enum EngineError {
    /// The maze failed validation; carries the validator's message verbatim
    #[error("{0}")]
    InvalidMaze(String),

    /// Training was requested without any maze
    #[error("no maze was supplied for training")]
    NoMazes,

    /// Hyperparameters are out of range
    #[error("invalid hyperparameters: {0}")]
    InvalidHyperParams(String),

    /// Test or play was requested before an agent exists
    #[error("no trained agent; run training first")]
    NoAgent,

    /// A run is already active on the worker
    #[error("a run is already active; stop it first")]
    Busy,

    /// Save, load, delete, copy or list failed
    #[error("failed to {action} model slot {slot}: {source:#}")]
    Persistence {
        action: &'static str,
        slot: usize,
        #[source]
        source: anyhow::Error,
    },

    /// The slot directory could not be enumerated
    #[error("failed to list model slots: {0:#}")]
    ListModels(#[source] anyhow::Error),

    /// Weight (de)serialization failed
    #[error("model weights could not be processed: {0}")]
    Model(String),
}

impl EngineError {
    pub fn persistence(action: &'static str, slot: usize, source: anyhow::Error) -> Self {
        Self::Persistence {
            action,
            slot,
            source,
        }
    }
}
