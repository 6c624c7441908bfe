//! Breadth-first shortest-path oracle and the maze validation gate

use super::cell::Cell;
use super::config::MazeConfig;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A shortest route between two cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath {
    /// Number of moves, `path.len() - 1`
    pub length: usize,
    /// Cells from start to goal inclusive
    pub path: Vec<Cell>,
}

/// Breadth-first search over 4-connected road cells
///
/// Returns `None` when `start` or `goal` is off the grid or a wall, or when no
/// route exists.
/// Neighbors are expanded in Up, Right, Down, Left order.
pub fn bfs_shortest_path(
    rows: usize,
    cols: usize,
    walls: &BTreeSet<Cell>,
    start: Cell,
    goal: Cell,
) -> Option<ShortestPath> {
    let on_grid = |cell: Cell| cell.row < rows && cell.col < cols;
    if !on_grid(start) || !on_grid(goal) {
        return None;
    }
    if walls.contains(&start) || walls.contains(&goal) {
        return None;
    }

    let mut parents: HashMap<Cell, Cell> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    parents.insert(start, start);

    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            let mut path = vec![cell];
            let mut cursor = cell;
            while cursor != start {
                cursor = parents[&cursor];
                path.push(cursor);
            }
            path.reverse();
            return Some(ShortestPath {
                length: path.len() - 1,
                path,
            });
        }

        for next in cell.neighbors(rows, cols) {
            if !walls.contains(&next) && !parents.contains_key(&next) {
                parents.insert(next, cell);
                queue.push_back(next);
            }
        }
    }

    None
}

/// Outcome of the validation gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeValidation {
    pub valid: bool,
    pub message: String,
    pub shortest_path_length: Option<usize>,
}

impl MazeValidation {
    fn rejected(message: &str) -> Self {
        Self {
            valid: false,
            message: message.to_string(),
            shortest_path_length: None,
        }
    }

    /// Shortest length on success, the message as an error otherwise
    pub fn into_result(self) -> Result<usize, EngineError> {
        match (self.valid, self.shortest_path_length) {
            (true, Some(length)) => Ok(length),
            _ => Err(EngineError::InvalidMaze(self.message)),
        }
    }
}

/// Check a maze before training, testing or playing on it
pub fn validate_maze(maze: &MazeConfig) -> MazeValidation {
    if !maze.contains(maze.start) {
        return MazeValidation::rejected("start cell is outside the maze");
    }
    if !maze.contains(maze.goal) {
        return MazeValidation::rejected("goal cell is outside the maze");
    }
    if maze.is_wall(maze.start) {
        return MazeValidation::rejected("start cell is a wall");
    }
    if maze.is_wall(maze.goal) {
        return MazeValidation::rejected("goal cell is a wall");
    }

    match bfs_shortest_path(maze.rows, maze.cols, &maze.walls, maze.start, maze.goal) {
        Some(route) => MazeValidation {
            valid: true,
            message: format!("OK: shortest route is {} steps", route.length),
            shortest_path_length: Some(route.length),
        },
        None => MazeValidation::rejected("no road connects start to goal"),
    }
}
