//! Reinforcement learning core for the maze agent
//!
//! Provides:
//! - 77-value local observations (5x5 window plus goal direction)
//! - Maze environment with the shaped reward model
//! - Q network, replay buffer and ε schedule
//! - DQN agent with soft target updates
//! - Slot-based model persistence

pub mod backend;
pub mod buffer;
pub mod config;
pub mod dqn;
pub mod environment;
pub mod exploration;
pub mod network;
pub mod observation;
pub mod persistence;
pub mod rollout;

pub use backend::{InferenceBackend, TrainingBackend, default_device};
pub use buffer::{ReplayBuffer, Transition, TransitionBatch};
pub use config::{DqnConfig, HyperParams};
pub use dqn::DqnAgent;
pub use environment::{DEFAULT_REVISIT_PENALTY, MazeEnvironment, StepOutcome, StepResult};
pub use exploration::{DEFAULT_RESUME_EPSILON, EpsilonSchedule};
pub use network::{NUM_ACTIONS, QNetwork, QNetworkConfig};
pub use observation::{OBS_DIM, Observation, create_observation};
pub use persistence::{ModelStore, SlotMetadata, SlotSummary};
pub use rollout::{EpisodeStatus, RolloutTracker, STUCK_LIMIT};
