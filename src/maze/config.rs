use super::cell::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A maze as drawn by the editor or produced by the generator
///
/// Every cell is exactly one of wall, start, goal or drivable road. The config
/// is immutable once a run has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMazeConfig")]
pub struct MazeConfig {
    /// Number of grid rows
    #[serde(rename = "num_rows")]
    pub rows: usize,
    /// Number of grid columns
    #[serde(rename = "num_cols")]
    pub cols: usize,
    /// Blocked cells
    pub walls: BTreeSet<Cell>,
    pub start: Cell,
    pub goal: Cell,
}

impl MazeConfig {
    /// Create an open maze with start at the top-left and goal at the bottom-right
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            walls: BTreeSet::new(),
            start: Cell::new(0, 0),
            goal: Cell::new(rows.saturating_sub(1), cols.saturating_sub(1)),
        }
    }

    pub fn with_walls(mut self, walls: impl IntoIterator<Item = Cell>) -> Self {
        self.walls = walls.into_iter().collect();
        self
    }

    pub fn with_endpoints(mut self, start: Cell, goal: Cell) -> Self {
        self.start = start;
        self.goal = goal;
        self
    }

    /// Whether `cell` lies on the grid
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn is_wall(&self, cell: Cell) -> bool {
        self.walls.contains(&cell)
    }

    pub fn area(&self) -> usize {
        self.rows * self.cols
    }

    /// Per-episode step budget used by training and evaluation
    pub fn step_cap(&self) -> usize {
        self.area() * 4
    }
}

#[derive(Deserialize)]
struct RawMazeConfig {
    num_rows: usize,
    num_cols: usize,
    #[serde(default)]
    walls: BTreeSet<Cell>,
    #[serde(default)]
    start: Option<Cell>,
    #[serde(default)]
    goal: Option<Cell>,
}

impl From<RawMazeConfig> for MazeConfig {
    fn from(raw: RawMazeConfig) -> Self {
        let defaults = MazeConfig::new(raw.num_rows, raw.num_cols);
        Self {
            walls: raw.walls,
            start: raw.start.unwrap_or(defaults.start),
            goal: raw.goal.unwrap_or(defaults.goal),
            ..defaults
        }
    }
}
