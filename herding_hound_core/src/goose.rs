use crate::Position;

/// The player-controlled entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goose {
    coord: Position,
    origin: Position,
    grid_size: usize,
}

impl Goose {
    /// Creates a goose standing on `origin` of a `grid_size` board.
    pub fn new(origin: Position, grid_size: usize) -> Self {
        Self {
            coord: origin,
            origin,
            grid_size,
        }
    }

    /// Returns the goose's current cell.
    pub fn coord(&self) -> Position {
        self.coord
    }

    /// Returns the cell the goose starts from and resets to.
    pub fn origin(&self) -> Position {
        self.origin
    }

    /// Moves the goose by `(dx, dy)`.
    ///
    /// Moves that would leave the board are rejected as a whole and the goose
    /// stays where it is. Returns whether the goose moved.
    pub fn move_by(&mut self, dx: isize, dy: isize) -> bool {
        match self.coord.offset(dx, dy, self.grid_size) {
            Some(target) if target != self.coord => {
                self.coord = target;
                true
            }
            _ => false,
        }
    }

    /// Sends the goose back to its origin.
    pub fn reset(&mut self) {
        self.coord = self.origin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_inside_the_board() {
        let mut goose = Goose::new(Position::new(0, 0), 4);
        assert!(goose.move_by(1, 0));
        assert!(goose.move_by(0, 2));
        assert_eq!(goose.coord(), Position::new(1, 2));
    }

    #[test]
    fn rejects_moves_off_the_board() {
        let mut goose = Goose::new(Position::new(0, 0), 3);
        assert!(!goose.move_by(-1, 0));
        assert!(!goose.move_by(0, -1));
        assert!(!goose.move_by(5, 0));
        assert_eq!(goose.coord(), Position::new(0, 0));

        goose.move_by(2, 2);
        assert!(!goose.move_by(1, 0));
        assert!(!goose.move_by(0, 1));
        assert_eq!(goose.coord(), Position::new(2, 2));
    }

    #[test]
    fn reset_returns_to_origin() {
        let mut goose = Goose::new(Position::new(0, 0), 5);
        goose.move_by(3, 1);
        goose.reset();
        assert_eq!(goose.coord(), goose.origin());
    }
}
