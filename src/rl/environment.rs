use super::observation::{Observation, create_observation};
use crate::maze::{Cell, Direction, MazeConfig};
use std::collections::HashSet;

/// Reward for reaching the goal
pub const GOAL_REWARD: f32 = 1.0;
/// Penalty for bumping into a wall or the grid edge
pub const COLLISION_PENALTY: f32 = -0.6;
/// Penalty for stepping straight back onto the previous cell
pub const U_TURN_PENALTY: f32 = -0.2;
/// Penalty for an ordinary move onto a new cell
pub const FORWARD_PENALTY: f32 = -0.01;
/// Default magnitude of the revisit penalty
pub const DEFAULT_REVISIT_PENALTY: f32 = 0.05;

/// How a single move was classified, in reward precedence order
///
/// Stalling ranks below backtracking, which ranks below re-exploring, which
/// ranks below forward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Goal,
    Collision,
    UTurn,
    Revisit,
    Forward,
}

impl StepOutcome {
    pub fn reward(&self, revisit_penalty: f32) -> f32 {
        match self {
            StepOutcome::Goal => GOAL_REWARD,
            StepOutcome::Collision => COLLISION_PENALTY,
            StepOutcome::UTurn => U_TURN_PENALTY,
            StepOutcome::Revisit => -revisit_penalty,
            StepOutcome::Forward => FORWARD_PENALTY,
        }
    }
}

/// Result of one environment step
#[derive(Debug, Clone, Copy)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    pub outcome: StepOutcome,
}

/// Single-maze simulation for reinforcement learning
///
/// Provides:
/// - 77-value local observations (5x5 window, 3 channels, goal direction)
/// - Discrete action space (0: Up, 1: Right, 2: Down, 3: Left)
/// - Shaped rewards with a fixed precedence
pub struct MazeEnvironment {
    maze: MazeConfig,
    revisit_penalty: f32,
    position: Cell,
    previous: Option<Cell>,
    visited: HashSet<Cell>,
}

impl MazeEnvironment {
    /// Create an environment positioned at the maze start
    pub fn new(maze: MazeConfig, revisit_penalty: f32) -> Self {
        let start = maze.start;
        Self {
            maze,
            revisit_penalty,
            position: start,
            previous: None,
            visited: HashSet::from([start]),
        }
    }

    /// Return to the start, forget the previous cell and the visited set
    pub fn reset(&mut self) -> Observation {
        self.position = self.maze.start;
        self.previous = None;
        self.visited = HashSet::from([self.maze.start]);
        self.observation()
    }

    /// Apply an action index
    ///
    /// Moves into walls or off the grid leave the agent in place. Reward
    /// precedence: goal, collision, U-turn, revisit, forward.
    pub fn step(&mut self, action_idx: usize) -> StepResult {
        let old = self.position;
        let new = old
            .step(Direction::from_index(action_idx), self.maze.rows, self.maze.cols)
            .filter(|cell| !self.maze.is_wall(*cell))
            .unwrap_or(old);

        let outcome = if new == self.maze.goal {
            StepOutcome::Goal
        } else if new == old {
            StepOutcome::Collision
        } else if self.previous == Some(new) {
            StepOutcome::UTurn
        } else if self.visited.contains(&new) {
            StepOutcome::Revisit
        } else {
            StepOutcome::Forward
        };

        self.position = new;
        self.previous = Some(old);
        self.visited.insert(new);

        StepResult {
            observation: self.observation(),
            reward: outcome.reward(self.revisit_penalty),
            terminated: outcome == StepOutcome::Goal,
            outcome,
        }
    }

    /// Current observation without stepping
    pub fn observation(&self) -> Observation {
        create_observation(&self.maze, self.position, &self.visited)
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn previous_position(&self) -> Option<Cell> {
        self.previous
    }

    pub fn visited(&self) -> &HashSet<Cell> {
        &self.visited
    }

    pub fn maze(&self) -> &MazeConfig {
        &self.maze
    }
}
