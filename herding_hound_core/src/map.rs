use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::Position;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Grid size must be greater than zero")]
    ZeroSize,
}

/// A square 2D board of side `size`.
///
/// Stores elements of type `T` in a flat vector using row-major order and is
/// addressed with [`Position`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    size: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new board filled by a generator function.
    ///
    /// The generator receives each cell's position in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ZeroSize`] if `size` is zero.
    pub fn from_generator<F>(size: usize, mut f: F) -> Result<Self, GridError>
    where
        F: FnMut(Position) -> T,
    {
        if size == 0 {
            return Err(GridError::ZeroSize);
        }
        let mut cells = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                cells.push(f(Position { x, y }));
            }
        }
        Ok(Grid { size, cells })
    }

    /// Returns the side length of the board.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Gets an immutable reference to the cell at the given position.
    ///
    /// Returns `None` if the position is off the board.
    pub fn get(&self, pos: Position) -> Option<&T> {
        if pos.x < self.size && pos.y < self.size {
            self.cells.get(pos.y * self.size + pos.x)
        } else {
            None
        }
    }

    /// Returns an iterator over the rows of the board, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.size)
    }
}

/// Allows indexing the board by [`Position`].
///
/// # Panics
///
/// Panics if the position is off the board.
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, pos: Position) -> &Self::Output {
        match self.get(pos) {
            Some(cell) => cell,
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size {}",
                pos.x, pos.y, self.size
            ),
        }
    }
}
