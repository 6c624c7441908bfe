//! DQN hyperparameter configuration

use super::buffer::ReplayBuffer;
use super::environment::DEFAULT_REVISIT_PENALTY;
use serde::{Deserialize, Serialize};

/// Hyperparameters fixed at agent construction
///
/// # Example
///
/// ```rust
/// use ml_maze::rl::DqnConfig;
///
/// let config = DqnConfig {
///     learning_rate: 5e-4,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqnConfig {
    /// Learning rate for the Adam optimizer
    ///
    /// Default: 1e-3
    pub learning_rate: f64,

    /// Discount factor for future rewards (gamma)
    ///
    /// Default: 0.99
    pub gamma: f32,

    /// Exploration rate before any episode has completed
    ///
    /// Default: 1.0
    pub epsilon_start: f32,

    /// Exploration rate once the schedule has run out
    ///
    /// Default: 0.05
    pub epsilon_end: f32,

    /// Completed episodes over which ε moves from start to end
    ///
    /// Default: 200
    pub epsilon_decay_episodes: usize,

    /// Minibatch size for each learning step
    ///
    /// Default: 64
    pub batch_size: usize,

    /// Soft-update rate for the target network
    ///
    /// Default: 0.01
    pub tau: f32,

    /// Width of both hidden layers
    ///
    /// Default: 128
    pub hidden_size: usize,

    /// Replay buffer capacity
    ///
    /// Default: 50_000
    pub buffer_capacity: usize,
}

impl DqnConfig {
    /// Create a configuration with default hyperparameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    pub fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }

        for (name, value) in [
            ("epsilon_start", self.epsilon_start),
            ("epsilon_end", self.epsilon_end),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0, 1], got {}", name, value));
            }
        }

        if self.tau <= 0.0 || self.tau > 1.0 {
            return Err(format!("tau must be in (0, 1], got {}", self.tau));
        }

        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }

        if self.hidden_size == 0 {
            return Err("hidden_size must be at least 1".to_string());
        }

        if self.buffer_capacity < self.batch_size {
            return Err(format!(
                "buffer_capacity ({}) cannot be smaller than batch_size ({})",
                self.buffer_capacity, self.batch_size
            ));
        }

        Ok(())
    }
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay_episodes: 200,
            batch_size: 64,
            tau: 0.01,
            hidden_size: 128,
            buffer_capacity: 50_000,
        }
    }
}

/// Parameters of one training request
///
/// Agent hyperparameters only apply when a new agent is created; the episode
/// budget and revisit penalty apply to every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperParams {
    /// Episode budget for the run
    pub max_episodes: usize,
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_end: f32,
    pub epsilon_decay_episodes: usize,
    /// Magnitude of the penalty for re-entering a visited cell
    pub revisit_penalty: f32,
    pub hidden_size: usize,
}

impl HyperParams {
    /// Short run with a myopic agent
    pub fn light() -> Self {
        Self {
            max_episodes: 100,
            learning_rate: 5e-4,
            gamma: 0.9,
            epsilon_end: 0.15,
            epsilon_decay_episodes: 80,
            ..Self::balanced()
        }
    }

    /// Default preset
    pub fn balanced() -> Self {
        Self {
            max_episodes: 300,
            learning_rate: 1e-3,
            gamma: 0.95,
            epsilon_end: 0.1,
            epsilon_decay_episodes: 250,
            revisit_penalty: DEFAULT_REVISIT_PENALTY,
            hidden_size: 128,
        }
    }

    /// Long run with a far-sighted agent
    pub fn thorough() -> Self {
        Self {
            max_episodes: 500,
            learning_rate: 3e-3,
            gamma: 0.99,
            epsilon_end: 0.05,
            epsilon_decay_episodes: 400,
            ..Self::balanced()
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::light()),
            "balanced" => Some(Self::balanced()),
            "thorough" => Some(Self::thorough()),
            _ => None,
        }
    }

    /// Set the ε decay length to two thirds of the episode budget
    pub fn with_auto_decay(mut self) -> Self {
        self.epsilon_decay_episodes = (self.max_episodes as f64 * 2.0 / 3.0).round() as usize;
        self
    }

    /// Agent configuration for a fresh agent trained on mazes of `area` cells
    pub fn agent_config(&self, area: usize) -> DqnConfig {
        DqnConfig {
            learning_rate: self.learning_rate,
            gamma: self.gamma,
            epsilon_end: self.epsilon_end,
            epsilon_decay_episodes: self.epsilon_decay_episodes,
            hidden_size: self.hidden_size,
            buffer_capacity: ReplayBuffer::capacity_for_area(area),
            ..DqnConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_episodes == 0 {
            return Err("max_episodes must be at least 1".to_string());
        }

        if self.revisit_penalty < 0.0 {
            return Err(format!(
                "revisit_penalty must be non-negative, got {}",
                self.revisit_penalty
            ));
        }

        self.agent_config(1).validate()
    }
}

impl Default for HyperParams {
    fn default() -> Self {
        Self::balanced()
    }
}
