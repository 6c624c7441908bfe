use burn::tensor::{Tensor, TensorData, backend::Backend};
use std::collections::HashSet;

use crate::maze::{Cell, MazeConfig};

/// Side length of the local view window centered on the agent
pub const VIEW_SIZE: usize = 5;

/// Channels per window cell: wall-or-outside, goal, visited
pub const CHANNELS: usize = 3;

/// Observation length: 5 x 5 x 3 window plus the two goal-direction scalars
pub const OBS_DIM: usize = VIEW_SIZE * VIEW_SIZE * CHANNELS + 2;

const WALL_CHANNEL: usize = 0;
const GOAL_CHANNEL: usize = 1;
const VISITED_CHANNEL: usize = 2;

/// Fixed-length encoding of the agent's surroundings
///
/// Owned by value and `Copy`, so a stored observation never aliases the
/// environment that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation(pub [f32; OBS_DIM]);

impl Observation {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Goal direction `(dx, dy)`, each clamped to [-1, 1]
    pub fn goal_direction(&self) -> (f32, f32) {
        (self.0[OBS_DIM - 2], self.0[OBS_DIM - 1])
    }

    /// Value of one channel for the window cell at `(view_row, view_col)`
    pub fn channel(&self, view_row: usize, view_col: usize, channel: usize) -> f32 {
        self.0[(view_row * VIEW_SIZE + view_col) * CHANNELS + channel]
    }
}

impl Default for Observation {
    fn default() -> Self {
        Self([0.0; OBS_DIM])
    }
}

/// Encode the 5x5 window around `position` plus the goal-direction signal
///
/// Layout: index `(vr * 5 + vc) * 3 + ch` for window cell `(vr, vc)`, then
/// `dx` and `dy`. The direction divides by the grid size, not the window size,
/// so it saturates far from the goal.
pub fn create_observation(
    maze: &MazeConfig,
    position: Cell,
    visited: &HashSet<Cell>,
) -> Observation {
    let mut obs = Observation::default();
    let half = (VIEW_SIZE / 2) as i32;

    for dr in -half..=half {
        for dc in -half..=half {
            let base = (((dr + half) as usize) * VIEW_SIZE + (dc + half) as usize) * CHANNELS;

            let Some(cell) = position.offset(dr, dc, maze.rows, maze.cols) else {
                obs.0[base + WALL_CHANNEL] = 1.0;
                continue;
            };
            if maze.is_wall(cell) {
                obs.0[base + WALL_CHANNEL] = 1.0;
            }
            if cell == maze.goal {
                obs.0[base + GOAL_CHANNEL] = 1.0;
            }
            if visited.contains(&cell) {
                obs.0[base + VISITED_CHANNEL] = 1.0;
            }
        }
    }

    let dx = (maze.goal.col as f32 - position.col as f32) / maze.cols.max(1) as f32;
    let dy = (maze.goal.row as f32 - position.row as f32) / maze.rows.max(1) as f32;
    obs.0[OBS_DIM - 2] = dx.clamp(-1.0, 1.0);
    obs.0[OBS_DIM - 1] = dy.clamp(-1.0, 1.0);

    obs
}

/// Stack observations into a `[n, OBS_DIM]` tensor
pub fn observation_batch<B: Backend>(observations: &[Observation], device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = observations
        .iter()
        .flat_map(|obs| obs.0.iter().copied())
        .collect();
    let data = TensorData::new(flat, [observations.len(), OBS_DIM]);

    Tensor::<B, 2>::from_data(data, device)
}
