//! Maze model, shortest-path oracle and procedural generation
//!
//! This module has no I/O or tensor dependencies. It is shared by the
//! environment (maze layout), the trainer (validation gate) and the evaluator
//! (seeded test mazes and the optimal-length baseline).

pub mod cell;
pub mod config;
pub mod generator;
pub mod solver;

pub use cell::{Cell, Direction};
pub use config::MazeConfig;
pub use generator::{GenerateOptions, generate_random_maze, test_maze};
pub use solver::{MazeValidation, ShortestPath, bfs_shortest_path, validate_maze};
