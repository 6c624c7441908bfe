//! ML Maze - a DQN agent that learns to drive grid mazes
//!
//! This library provides:
//! - Maze model, BFS solver and seeded maze generator (maze module)
//! - Environment, Q network and DQN agent (rl module)
//! - Convergence detection, scoring and training statistics (metrics module)
//! - Training and evaluation jobs (modes module)
//! - Command/event worker that owns the agent (worker module)

pub mod error;
pub mod maze;
pub mod metrics;
pub mod modes;
pub mod rl;
pub mod worker;

pub use error::EngineError;
