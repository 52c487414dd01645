use serde::{Deserialize, Serialize};

pub mod boxes;
pub mod clock;
pub mod config;
pub mod dog;
pub mod goose;
pub mod map;
pub mod model;

/// Represents a 2D coordinate. `x` is the column, `y` is the row (row 0 is the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns the position translated by `(dx, dy)`, or `None` if it would
    /// leave a square board of side `size`.
    pub fn offset(self, dx: isize, dy: isize, size: usize) -> Option<Position> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        (x < size && y < size).then_some(Position { x, y })
    }
}

/// Cardinal facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the `(dx, dy)` offset for one step in this direction.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}
