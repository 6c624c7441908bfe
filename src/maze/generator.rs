//! Constrained procedural maze generation
//!
//! A maze is grown as a road network: a goal-biased random walk from start to
//! goal, followed by a few dead-end branches. Every added cell is rejected if
//! it would put two intersections next to each other or complete a 2x2 block
//! of road. Whatever is not road becomes wall.

use super::cell::Cell;
use super::config::MazeConfig;
use super::solver::bfs_shortest_path;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_pcg::Pcg64;
use std::collections::BTreeSet;

/// Draws for random endpoints before falling back to opposite corners
const ENDPOINT_DRAWS: usize = 200;

/// Options for [`generate_random_maze`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Sample start and goal from the grid perimeter
    pub random_endpoints: bool,
    /// Attempts before the L-shaped fallback
    pub max_attempts: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            random_endpoints: false,
            max_attempts: 30,
        }
    }
}

impl GenerateOptions {
    pub fn with_random_endpoints(mut self) -> Self {
        self.random_endpoints = true;
        self
    }
}

/// Generate a maze whose goal is always reachable from its start
///
/// Retries up to `max_attempts` times with fresh endpoints and a fresh walk,
/// then falls back to an L-shaped road along the top row and right column.
pub fn generate_random_maze<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    options: &GenerateOptions,
    rng: &mut R,
) -> MazeConfig {
    for _ in 0..options.max_attempts {
        let (start, goal) = if options.random_endpoints {
            pick_random_endpoints(rows, cols, rng)
        } else {
            corner_endpoints(rows, cols)
        };

        let Some(roads) = generate_road_network(rows, cols, start, goal, rng) else {
            continue;
        };
        if !satisfies_constraints(&roads, rows, cols) {
            continue;
        }

        let maze = MazeConfig::new(rows, cols)
            .with_endpoints(start, goal)
            .with_walls(walls_from_roads(&roads, rows, cols));
        if bfs_shortest_path(rows, cols, &maze.walls, start, goal).is_some() {
            return maze;
        }
    }

    fallback_maze(rows, cols)
}

/// Deterministic evaluation maze for a grid size and test index
///
/// The same `(rows, cols, index)` always yields the same maze.
pub fn test_maze(rows: usize, cols: usize, index: usize) -> MazeConfig {
    let seed = (rows * 10_000 + cols * 100 + index + 1) as u64;
    let mut rng = Pcg64::seed_from_u64(seed);
    generate_random_maze(
        rows,
        cols,
        &GenerateOptions::default().with_random_endpoints(),
        &mut rng,
    )
}

fn corner_endpoints(rows: usize, cols: usize) -> (Cell, Cell) {
    (
        Cell::new(0, 0),
        Cell::new(rows.saturating_sub(1), cols.saturating_sub(1)),
    )
}

fn fallback_maze(rows: usize, cols: usize) -> MazeConfig {
    let (start, goal) = corner_endpoints(rows, cols);
    let mut roads: BTreeSet<Cell> = (0..cols).map(|col| Cell::new(0, col)).collect();
    roads.extend((0..rows).map(|row| Cell::new(row, cols.saturating_sub(1))));

    MazeConfig::new(rows, cols)
        .with_endpoints(start, goal)
        .with_walls(walls_from_roads(&roads, rows, cols))
}

fn pick_random_endpoints<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> (Cell, Cell) {
    let perimeter: Vec<Cell> = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| Cell::new(row, col)))
        .filter(|cell| {
            cell.row == 0 || cell.row + 1 == rows || cell.col == 0 || cell.col + 1 == cols
        })
        .collect();
    let min_distance = rows.max(cols) / 2;

    for _ in 0..ENDPOINT_DRAWS {
        let (Some(&start), Some(&goal)) = (perimeter.choose(rng), perimeter.choose(rng)) else {
            break;
        };
        if start != goal && start.manhattan(goal) >= min_distance {
            return (start, goal);
        }
    }

    corner_endpoints(rows, cols)
}

fn generate_road_network<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    start: Cell,
    goal: Cell,
    rng: &mut R,
) -> Option<BTreeSet<Cell>> {
    let mut roads = BTreeSet::from([start, goal]);
    let mut visited_main = BTreeSet::from([start]);
    let mut pos = start;

    // Main road: random walk biased toward the goal
    for _ in 0..rows * cols * 3 {
        if pos == goal {
            break;
        }

        let candidates: Vec<Cell> = pos
            .neighbors(rows, cols)
            .filter(|&next| {
                !visited_main.contains(&next) && can_extend(next, &roads, rows, cols)
            })
            .collect();

        if candidates.is_empty() {
            let restarts: Vec<Cell> = roads
                .iter()
                .flat_map(|road| road.neighbors(rows, cols))
                .filter(|&next| {
                    !visited_main.contains(&next) && can_extend(next, &roads, rows, cols)
                })
                .collect();
            let Some(&restart) = restarts.choose(rng) else {
                break;
            };
            pos = restart;
        } else {
            let weights = candidates
                .iter()
                .map(|cell| 1.0 / (cell.manhattan(goal) as f64 + 1.0));
            let Ok(distribution) = WeightedIndex::new(weights) else {
                break;
            };
            pos = candidates[distribution.sample(rng)];
        }
        roads.insert(pos);
        visited_main.insert(pos);
    }

    let walls = walls_from_roads(&roads, rows, cols);
    bfs_shortest_path(rows, cols, &walls, start, goal)?;

    // Branches: dead ends sprouting from the main road
    let branch_count = rng.gen_range(2..=4);
    let mut branch_roots: Vec<Cell> = roads
        .iter()
        .copied()
        .filter(|&cell| cell != start && cell != goal)
        .collect();

    for _ in 0..branch_count {
        let Some(&root) = branch_roots.choose(rng) else {
            break;
        };
        let branch_len = rng.gen_range(2..=rows.saturating_sub(2).max(3));
        let mut tip = root;

        for _ in 0..branch_len {
            let candidates: Vec<Cell> = tip
                .neighbors(rows, cols)
                .filter(|&next| !roads.contains(&next) && can_extend(next, &roads, rows, cols))
                .collect();
            let Some(&next) = candidates.choose(rng) else {
                break;
            };
            tip = next;
            roads.insert(tip);
            branch_roots.push(tip);
        }
    }

    Some(roads)
}

fn can_extend(cell: Cell, roads: &BTreeSet<Cell>, rows: usize, cols: usize) -> bool {
    !would_create_adjacent_intersections(cell, roads, rows, cols)
        && !would_create_2x2_block(cell, roads)
}

fn satisfies_constraints(roads: &BTreeSet<Cell>, rows: usize, cols: usize) -> bool {
    if has_adjacent_intersections(roads, rows, cols) {
        return false;
    }

    let has_block = roads.iter().any(|&cell| {
        let mut without = roads.clone();
        without.remove(&cell);
        would_create_2x2_block(cell, &without)
    });
    if has_block {
        return false;
    }

    roads
        .iter()
        .all(|&cell| road_neighbor_count(cell, roads, rows, cols) >= 1)
}

fn walls_from_roads(roads: &BTreeSet<Cell>, rows: usize, cols: usize) -> BTreeSet<Cell> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| Cell::new(row, col)))
        .filter(|cell| !roads.contains(cell))
        .collect()
}

fn road_neighbor_count(cell: Cell, roads: &BTreeSet<Cell>, rows: usize, cols: usize) -> usize {
    cell.neighbors(rows, cols)
        .filter(|next| roads.contains(next))
        .count()
}

/// A road cell with three or more road neighbors
fn is_intersection(cell: Cell, roads: &BTreeSet<Cell>, rows: usize, cols: usize) -> bool {
    road_neighbor_count(cell, roads, rows, cols) >= 3
}

fn has_adjacent_intersections(roads: &BTreeSet<Cell>, rows: usize, cols: usize) -> bool {
    let intersections: BTreeSet<Cell> = roads
        .iter()
        .copied()
        .filter(|&cell| is_intersection(cell, roads, rows, cols))
        .collect();

    intersections.iter().any(|cell| {
        cell.neighbors(rows, cols)
            .any(|next| intersections.contains(&next))
    })
}

fn would_create_adjacent_intersections(
    cell: Cell,
    roads: &BTreeSet<Cell>,
    rows: usize,
    cols: usize,
) -> bool {
    let mut trial = roads.clone();
    trial.insert(cell);

    let mut to_check = vec![cell];
    to_check.extend(cell.neighbors(rows, cols).filter(|next| trial.contains(next)));

    to_check.into_iter().any(|checked| {
        is_intersection(checked, &trial, rows, cols)
            && checked.neighbors(rows, cols).any(|next| {
                trial.contains(&next) && is_intersection(next, &trial, rows, cols)
            })
    })
}

/// Whether `cell` would complete a 2x2 square of road with its neighbors
fn would_create_2x2_block(cell: Cell, roads: &BTreeSet<Cell>) -> bool {
    const CORNERS: [(i64, i64); 4] = [(-1, -1), (-1, 0), (0, -1), (0, 0)];

    CORNERS.iter().any(|&(dr, dc)| {
        let top = cell.row as i64 + dr;
        let left = cell.col as i64 + dc;
        (0..2).all(|r| {
            (0..2).all(|c| {
                let (row, col) = (top + r, left + c);
                if row == cell.row as i64 && col == cell.col as i64 {
                    return true;
                }
                row >= 0 && col >= 0 && roads.contains(&Cell::new(row as usize, col as usize))
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roads_of(maze: &MazeConfig) -> BTreeSet<Cell> {
        walls_from_roads(&maze.walls, maze.rows, maze.cols)
    }

    #[test]
    fn test_generated_mazes_are_always_solvable() {
        let mut rng = Pcg64::seed_from_u64(7);
        for rows in 5..=20 {
            for cols in 5..=20 {
                let maze = generate_random_maze(rows, cols, &GenerateOptions::default(), &mut rng);
                assert!(!maze.is_wall(maze.start), "{}x{} start on wall", rows, cols);
                assert!(!maze.is_wall(maze.goal), "{}x{} goal on wall", rows, cols);
                assert!(
                    bfs_shortest_path(rows, cols, &maze.walls, maze.start, maze.goal).is_some(),
                    "{}x{} maze is not solvable",
                    rows,
                    cols
                );
            }
        }
    }

    #[test]
    fn test_generated_roads_respect_constraints() {
        let mut rng = Pcg64::seed_from_u64(11);
        let options = GenerateOptions::default().with_random_endpoints();
        for size in [5, 8, 12] {
            let maze = generate_random_maze(size, size, &options, &mut rng);
            let roads = roads_of(&maze);
            assert!(satisfies_constraints(&roads, size, size));
        }
    }

    #[test]
    fn test_random_endpoints_on_perimeter() {
        let mut rng = Pcg64::seed_from_u64(3);
        for _ in 0..20 {
            let (start, goal) = pick_random_endpoints(9, 6, &mut rng);
            for cell in [start, goal] {
                assert!(cell.row == 0 || cell.row == 8 || cell.col == 0 || cell.col == 5);
            }
            assert_ne!(start, goal);
            assert!(start.manhattan(goal) >= 4);
        }
    }

    #[test]
    fn test_test_maze_is_deterministic() {
        for index in 0..3 {
            assert_eq!(test_maze(7, 9, index), test_maze(7, 9, index));
        }
    }

    #[test]
    fn test_test_maze_set_varies_by_index() {
        let mazes: Vec<MazeConfig> = (0..10).map(|index| test_maze(8, 8, index)).collect();
        assert!(mazes.iter().any(|maze| maze != &mazes[0]));
    }

    #[test]
    fn test_fallback_is_l_shaped() {
        let options = GenerateOptions {
            random_endpoints: false,
            max_attempts: 0,
        };
        let maze = generate_random_maze(4, 5, &options, &mut Pcg64::seed_from_u64(1));

        assert_eq!(maze.start, Cell::new(0, 0));
        assert_eq!(maze.goal, Cell::new(3, 4));
        let route = bfs_shortest_path(4, 5, &maze.walls, maze.start, maze.goal).unwrap();
        assert_eq!(route.length, 7);
        assert_eq!(maze.walls.len(), 20 - 8);
    }

    #[test]
    fn test_2x2_block_detection() {
        let roads: BTreeSet<Cell> = [Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0)]
            .into_iter()
            .collect();
        assert!(would_create_2x2_block(Cell::new(1, 1), &roads));
        assert!(!would_create_2x2_block(Cell::new(2, 2), &roads));
    }

    #[test]
    fn test_adjacent_intersections_detection() {
        // A plus sign centered at (1,1) plus a second arm that would make (1,2) a junction
        let roads: BTreeSet<Cell> = [
            Cell::new(0, 1),
            Cell::new(1, 0),
            Cell::new(1, 1),
            Cell::new(2, 1),
            Cell::new(1, 2),
            Cell::new(0, 2),
        ]
        .into_iter()
        .collect();
        assert!(would_create_adjacent_intersections(Cell::new(2, 2), &roads, 4, 4));
        assert!(!would_create_adjacent_intersections(Cell::new(3, 0), &roads, 4, 4));
    }
}
