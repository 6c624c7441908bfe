use serde::{Deserialize, Serialize};

/// A cell on the maze grid, addressed by row then column
///
/// Serialized as a `[row, col]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Move by a signed delta, returning `None` when the result leaves the grid
    pub fn offset(&self, dr: i32, dc: i32, rows: usize, cols: usize) -> Option<Self> {
        let row = self.row as i64 + dr as i64;
        let col = self.col as i64 + dc as i64;
        if row < 0 || col < 0 || row >= rows as i64 || col >= cols as i64 {
            return None;
        }
        Some(Self::new(row as usize, col as usize))
    }

    /// Move one cell in a direction, staying on the grid
    pub fn step(&self, direction: Direction, rows: usize, cols: usize) -> Option<Self> {
        let (dr, dc) = direction.delta();
        self.offset(dr, dc, rows, cols)
    }

    pub fn manhattan(&self, other: Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// In-bounds 4-neighbors in Up, Right, Down, Left order
    pub fn neighbors(&self, rows: usize, cols: usize) -> impl Iterator<Item = Cell> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.step(direction, rows, cols))
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl From<Cell> for (usize, usize) {
    fn from(cell: Cell) -> Self {
        (cell.row, cell.col)
    }
}

/// Direction the agent can drive
///
/// The discriminant is the action index used by the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Returns the delta (d_row, d_col) for moving in this direction
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }

    /// Convert a network action index; indices wrap modulo 4
    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx % Self::ALL.len()]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Arrow glyph used in evaluation events
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Right => "→",
            Direction::Down => "↓",
            Direction::Left => "←",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (0, 1));
        assert_eq!(Direction::Down.delta(), (1, 0));
        assert_eq!(Direction::Left.delta(), (0, -1));
    }

    #[test]
    fn test_action_index_mapping() {
        for (idx, direction) in Direction::ALL.iter().enumerate() {
            assert_eq!(Direction::from_index(idx), *direction);
            assert_eq!(direction.index(), idx);
        }
    }

    #[test]
    fn test_step_stays_in_bounds() {
        let corner = Cell::new(0, 0);
        assert_eq!(corner.step(Direction::Up, 3, 3), None);
        assert_eq!(corner.step(Direction::Left, 3, 3), None);
        assert_eq!(corner.step(Direction::Down, 3, 3), Some(Cell::new(1, 0)));
        assert_eq!(Cell::new(2, 2).step(Direction::Right, 3, 3), None);
    }

    #[test]
    fn test_neighbors_order() {
        let neighbors: Vec<Cell> = Cell::new(1, 1).neighbors(3, 3).collect();
        assert_eq!(
            neighbors,
            vec![
                Cell::new(0, 1),
                Cell::new(1, 2),
                Cell::new(2, 1),
                Cell::new(1, 0)
            ]
        );
    }

    #[test]
    fn test_cell_serializes_as_pair() {
        let json = serde_json::to_string(&Cell::new(2, 5)).unwrap();
        assert_eq!(json, "[2,5]");
        let cell: Cell = serde_json::from_str("[4,1]").unwrap();
        assert_eq!(cell, Cell::new(4, 1));
    }
}
