use std::collections::BTreeSet;

use rand::Rng;

use crate::Position;

/// Placement attempts allowed per placeable box before settling for fewer.
const ATTEMPTS_PER_BOX: usize = 16;

/// Obstacle cells on the board and the cells they hide from the dog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boxes {
    grid_size: usize,
    box_count: usize,
    boxes: BTreeSet<Position>,
    shadows: BTreeSet<Position>,
}

impl Boxes {
    /// Creates an empty layout that will hold up to `box_count` boxes once generated.
    pub fn new(grid_size: usize, box_count: usize) -> Self {
        Self {
            grid_size,
            box_count,
            boxes: BTreeSet::new(),
            shadows: BTreeSet::new(),
        }
    }

    /// Returns the obstacle cells.
    pub fn boxes(&self) -> &BTreeSet<Position> {
        &self.boxes
    }

    /// Returns the cells hidden from the dog by an obstacle.
    pub fn shadows(&self) -> &BTreeSet<Position> {
        &self.shadows
    }

    /// Returns `true` if the cell is a box or lies in a box's shadow.
    pub fn blocks(&self, pos: Position) -> bool {
        self.boxes.contains(&pos) || self.shadows.contains(&pos)
    }

    /// Replaces the layout with a fresh random one.
    ///
    /// Boxes never land on a `reserved` cell or on the dog. If the board is
    /// too crowded the layout ends up with fewer boxes than requested.
    pub fn generate<R: Rng>(&mut self, rng: &mut R, dog: Position, reserved: &[Position]) {
        self.boxes.clear();
        let cells = self.grid_size.saturating_mul(self.grid_size);
        let blocked = reserved
            .iter()
            .chain(std::iter::once(&dog))
            .filter(|p| p.x < self.grid_size && p.y < self.grid_size)
            .collect::<BTreeSet<_>>()
            .len();
        let target = self.box_count.min(cells.saturating_sub(blocked));

        let max_attempts = target.saturating_mul(ATTEMPTS_PER_BOX);
        let mut attempts = 0;
        while self.boxes.len() < target && attempts < max_attempts {
            attempts += 1;
            let candidate = Position::new(
                rng.random_range(0..self.grid_size),
                rng.random_range(0..self.grid_size),
            );
            if candidate == dog || reserved.contains(&candidate) {
                continue;
            }
            self.boxes.insert(candidate);
        }

        if self.boxes.len() < self.box_count {
            tracing::warn!(
                requested = self.box_count,
                placed = self.boxes.len(),
                "board too crowded, placed fewer boxes"
            );
        }
        self.cast_shadows(dog);
    }

    /// Replaces the layout with the given box cells.
    pub fn place(&mut self, cells: impl IntoIterator<Item = Position>, dog: Position) {
        let size = self.grid_size;
        self.boxes = cells
            .into_iter()
            .filter(|p| p.x < size && p.y < size && *p != dog)
            .collect();
        self.cast_shadows(dog);
    }

    /// A cell is in shadow when the line from the dog to it crosses a box
    /// before reaching it.
    fn cast_shadows(&mut self, dog: Position) {
        self.shadows.clear();
        if self.boxes.is_empty() {
            return;
        }
        for y in 0..self.grid_size {
            for x in 0..self.grid_size {
                let cell = Position::new(x, y);
                if cell == dog || self.boxes.contains(&cell) {
                    continue;
                }
                let occluded = line_between(dog, cell)
                    .iter()
                    .any(|step| self.boxes.contains(step));
                if occluded {
                    self.shadows.insert(cell);
                }
            }
        }
    }
}

/// Cells on the Bresenham line from `from` to `to`, endpoints excluded.
fn line_between(from: Position, to: Position) -> Vec<Position> {
    let (mut x, mut y) = (from.x as isize, from.y as isize);
    let (tx, ty) = (to.x as isize, to.y as isize);
    let dx = (tx - x).abs();
    let dy = -(ty - y).abs();
    let sx = if x < tx { 1 } else { -1 };
    let sy = if y < ty { 1 } else { -1 };
    let mut err = dx + dy;
    let mut cells = Vec::new();

    loop {
        let e2 = 2 * err;
        if e2 >= dy {
            if x == tx {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == ty {
                break;
            }
            err += dx;
            y += sy;
        }
        if x == tx && y == ty {
            break;
        }
        cells.push(Position::new(x as usize, y as usize));
    }
    cells
}
