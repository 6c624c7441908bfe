//! Episode state machine shared by training, greedy previews and evaluation

use crate::maze::Cell;
use std::collections::HashMap;

/// Visits to a single cell after which a rollout counts as stuck
pub const STUCK_LIMIT: u32 = 10;

/// Lifecycle of one episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStatus {
    Running,
    ReachedGoal,
    Stuck,
    StepCap,
}

impl EpisodeStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, EpisodeStatus::Running)
    }

    pub fn reached_goal(&self) -> bool {
        matches!(self, EpisodeStatus::ReachedGoal)
    }
}

/// Tracks the visited path, per-cell visit counts and the step budget
///
/// The start cell counts as one visit. Goal takes precedence over the stuck
/// check, which takes precedence over the step cap.
#[derive(Debug, Clone)]
pub struct RolloutTracker {
    path: Vec<Cell>,
    visit_counts: HashMap<Cell, u32>,
    step_cap: usize,
    stuck_limit: Option<u32>,
    status: EpisodeStatus,
}

impl RolloutTracker {
    pub fn new(start: Cell, step_cap: usize, stuck_limit: Option<u32>) -> Self {
        Self {
            path: vec![start],
            visit_counts: HashMap::from([(start, 1)]),
            step_cap,
            stuck_limit,
            status: if step_cap == 0 {
                EpisodeStatus::StepCap
            } else {
                EpisodeStatus::Running
            },
        }
    }

    /// Record the cell reached by one step and return the new status
    pub fn record(&mut self, cell: Cell, terminated: bool) -> EpisodeStatus {
        self.path.push(cell);
        let count = {
            let entry = self.visit_counts.entry(cell).or_insert(0);
            *entry += 1;
            *entry
        };

        self.status = if terminated {
            EpisodeStatus::ReachedGoal
        } else if self.stuck_limit.is_some_and(|limit| count >= limit) {
            EpisodeStatus::Stuck
        } else if self.steps() >= self.step_cap {
            EpisodeStatus::StepCap
        } else {
            EpisodeStatus::Running
        };
        self.status
    }

    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// Steps taken so far
    pub fn steps(&self) -> usize {
        self.path.len() - 1
    }

    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    pub fn into_path(self) -> Vec<Cell> {
        self.path
    }
}
