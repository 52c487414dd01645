use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Direction, Position};

/// The dog's alertness phase. Only an [`DogState::Awake`] dog catches the goose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DogState {
    Asleep,
    Alert,
    Awake,
}

impl DogState {
    /// The phase that follows this one: `Asleep -> Alert -> Awake -> Asleep`.
    pub const fn next(self) -> Self {
        match self {
            Self::Asleep => Self::Alert,
            Self::Alert => Self::Awake,
            Self::Awake => Self::Asleep,
        }
    }
}

const INITIAL_DIRECTION: Direction = Direction::Left;

/// The adversary. It never moves; it turns to face the goose and cycles
/// through its alertness phases when told to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dog {
    coord: Position,
    origin: Position,
    direction: Direction,
    state: DogState,
    vision_range: usize,
    grid_size: usize,
}

impl Dog {
    /// Creates a sleeping dog in the centre of the board.
    ///
    /// `vision_range` is capped at `grid_size`; no cell is farther away than that.
    pub fn new(grid_size: usize, vision_range: usize) -> Self {
        let origin = Position::new(grid_size / 2, grid_size / 2);
        Self {
            coord: origin,
            origin,
            direction: INITIAL_DIRECTION,
            state: DogState::Asleep,
            vision_range: vision_range.min(grid_size),
            grid_size,
        }
    }

    /// Returns the cell the dog sits on.
    pub fn coord(&self) -> Position {
        self.coord
    }

    /// Returns the way the dog is facing.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the current alertness phase.
    pub fn state(&self) -> DogState {
        self.state
    }

    /// Returns how many steps ahead the cone reaches.
    pub fn vision_range(&self) -> usize {
        self.vision_range
    }

    /// Forces the alertness phase.
    pub fn set_state(&mut self, state: DogState) {
        self.state = state;
    }

    /// Advances the alertness phase by exactly one step.
    pub fn refresh_state(&mut self) {
        let next = self.state.next();
        tracing::debug!(from = ?self.state, to = ?next, "dog state advanced");
        self.state = next;
    }

    /// Turns the dog toward the goose along the dominant axis.
    ///
    /// Horizontal wins ties. If the goose shares the dog's cell the facing is
    /// kept.
    pub fn refresh_direction(&mut self, goose: Position) {
        let dx = goose.x as isize - self.coord.x as isize;
        let dy = goose.y as isize - self.coord.y as isize;
        if dx == 0 && dy == 0 {
            return;
        }
        self.direction = if dx.abs() >= dy.abs() {
            if dx > 0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0 {
            Direction::Down
        } else {
            Direction::Up
        };
    }

    /// Cells inside the dog's vision cone, clipped to the board.
    ///
    /// The cone widens by one cell on each side per step away from the dog,
    /// up to `vision_range` steps. The dog's own cell is not included.
    pub fn visible_area(&self) -> BTreeSet<Position> {
        let (fx, fy) = self.direction.delta();
        // lateral axis, perpendicular to the facing
        let (lx, ly) = (fy, fx);
        let mut area = BTreeSet::new();
        for d in 1..=self.vision_range as isize {
            for side in -d..=d {
                let dx = fx * d + lx * side;
                let dy = fy * d + ly * side;
                if let Some(cell) = self.coord.offset(dx, dy, self.grid_size) {
                    area.insert(cell);
                }
            }
        }
        area
    }

    /// Puts the dog back to sleep at its origin, facing its initial direction.
    pub fn reset(&mut self) {
        self.coord = self.origin;
        self.direction = INITIAL_DIRECTION;
        self.state = DogState::Asleep;
    }
}
