use std::{collections::BTreeSet, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Position,
    boxes::Boxes,
    clock::{Clock, SystemClock},
    config::GameConfig,
    dog::{Dog, DogState},
    goose::Goose,
    map::{Grid, GridError},
};

const START: Position = Position::new(0, 0);

/// Outcome of the game as seen at the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Ongoing,
    Won,
    Lost,
}

/// How a board cell should be presented to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Floor,
    Box,
    Shadow,
    /// Inside the dog's effective vision.
    Watched,
    Goal,
}

/// Rules engine for the Herding Hound minigame.
///
/// Owns the goose, the dog and the box layout, and derives visibility and the
/// game outcome from them. Callers drive it one tick or one input at a time.
#[derive(Debug)]
pub struct HerdingHoundModel<C: Clock = SystemClock> {
    goose: Goose,
    dog: Dog,
    boxes: Boxes,
    grid_size: usize,
    time_limit: Duration,
    start_time: Duration,
    started: bool,
    rng: StdRng,
    clock: C,
}

impl HerdingHoundModel<SystemClock> {
    /// Creates a game on a `grid_size` board with default settings and the wall clock.
    pub fn new(grid_size: usize) -> Result<Self, GridError> {
        let config = GameConfig {
            grid_size,
            ..GameConfig::default()
        };
        Self::from_config(&config, SystemClock::new())
    }
}

impl<C: Clock> HerdingHoundModel<C> {
    pub fn from_config(config: &GameConfig, clock: C) -> Result<Self, GridError> {
        let grid_size = config.grid_size;
        if grid_size == 0 {
            return Err(GridError::ZeroSize);
        }
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut model = Self {
            goose: Goose::new(START, grid_size),
            dog: Dog::new(grid_size, config.vision_range()),
            boxes: Boxes::new(grid_size, config.box_count()),
            grid_size,
            time_limit: config.time_limit(),
            start_time: clock.now(),
            started: false,
            rng: StdRng::seed_from_u64(seed),
            clock,
        };
        model.generate_boxes();
        model.dog.refresh_direction(model.goose.coord());
        tracing::debug!(grid_size, seed, boxes = model.boxes.boxes().len(), "game created");
        Ok(model)
    }

    /// Display name of the minigame.
    pub fn name(&self) -> &'static str {
        "Herding Hound"
    }

    /// Returns the player's goose.
    pub fn goose(&self) -> &Goose {
        &self.goose
    }

    /// Returns the dog.
    pub fn dog(&self) -> &Dog {
        &self.dog
    }

    /// Returns the current box layout.
    pub fn boxes(&self) -> &Boxes {
        &self.boxes
    }

    /// Returns the side length of the board.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Returns the cells hidden behind boxes.
    pub fn shadows(&self) -> &BTreeSet<Position> {
        self.boxes.shadows()
    }

    /// Returns the obstacle cells.
    pub fn box_cells(&self) -> &BTreeSet<Position> {
        self.boxes.boxes()
    }

    /// The cell the goose must reach: bottom-left corner.
    pub fn win_cell(&self) -> Position {
        Position::new(START.x, self.grid_size - 1)
    }

    /// Returns `true` between [`Self::start_game`] and the next [`Self::reset_game`].
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Starts (or restarts) the countdown. Entity positions are left alone.
    pub fn start_game(&mut self) {
        self.start_time = self.clock.now();
        self.started = true;
        tracing::info!(limit_ms = self.time_limit.as_millis() as u64, "game started");
    }

    /// Puts every entity back at its starting point, draws a new box layout
    /// and stops the countdown.
    pub fn reset_game(&mut self) {
        self.goose.reset();
        self.dog.reset();
        self.generate_boxes();
        self.dog.refresh_direction(self.goose.coord());
        self.started = false;
        tracing::debug!(boxes = self.boxes.boxes().len(), "game reset");
    }

    /// Replaces the random layout with a fixed set of box cells.
    pub fn place_boxes(&mut self, cells: impl IntoIterator<Item = Position>) {
        self.boxes.place(cells, self.dog.coord());
    }

    /// Time left before the goose runs out of time. The full limit until the
    /// game is started, never below zero afterwards.
    pub fn remaining_time(&self) -> Duration {
        if !self.started {
            return self.time_limit;
        }
        let elapsed = self.clock.now().saturating_sub(self.start_time);
        self.time_limit.saturating_sub(elapsed)
    }

    /// Cells the dog can actually see: its cone minus boxes and their shadows.
    pub fn visible(&self) -> BTreeSet<Position> {
        self.dog
            .visible_area()
            .into_iter()
            .filter(|cell| !self.boxes.blocks(*cell))
            .collect()
    }

    /// Timeout beats reaching the goal, which beats being caught.
    pub fn game_state(&self) -> GameState {
        if self.remaining_time().is_zero() {
            GameState::Lost
        } else if self.has_won() {
            GameState::Won
        } else if self.is_caught() {
            GameState::Lost
        } else {
            GameState::Ongoing
        }
    }

    /// Returns `true` once the game is won or lost.
    pub fn is_over(&self) -> bool {
        self.game_state() != GameState::Ongoing
    }

    fn has_won(&self) -> bool {
        self.goose.coord() == self.win_cell()
    }

    fn is_caught(&self) -> bool {
        self.dog.state() == DogState::Awake && self.visible().contains(&self.goose.coord())
    }

    /// Player move. Ignored once the game is over, when it would leave the
    /// board or when it would land on the dog. Returns whether the goose moved.
    pub fn move_goose(&mut self, dx: isize, dy: isize) -> bool {
        if self.is_over() {
            return false;
        }
        let moved = self.step_goose(dx, dy);
        self.dog.refresh_direction(self.goose.coord());
        moved
    }

    /// The dog's own cell lies outside its cone, so the goose may never stand on it.
    fn step_goose(&mut self, dx: isize, dy: isize) -> bool {
        let onto_dog = self
            .goose
            .coord()
            .offset(dx, dy, self.grid_size)
            .is_some_and(|target| target == self.dog.coord());
        !onto_dog && self.goose.move_by(dx, dy)
    }

    /// Scripted walk: right along the top row, down the right column, then
    /// left along the bottom row towards the goal.
    pub fn next_goose_move(&mut self) {
        let Position { x, y } = self.goose.coord();
        let last = self.grid_size - 1;
        if y == START.y && x < last {
            self.step_goose(1, 0);
        } else if x == last && y < last {
            self.step_goose(0, 1);
        } else if y == last && x > START.x {
            self.step_goose(-1, 0);
        }
        self.dog.refresh_direction(self.goose.coord());
    }

    /// Advances the dog one alertness phase and turns it toward the goose.
    pub fn next_dog_state(&mut self) {
        self.dog.refresh_state();
        self.dog.refresh_direction(self.goose.coord());
    }

    /// Forces the dog into `state` and turns it toward the goose.
    pub fn set_dog_state(&mut self, state: DogState) {
        self.dog.set_state(state);
        self.dog.refresh_direction(self.goose.coord());
    }

    /// Classifies every cell of the board for presentation.
    pub fn cell_grid(&self) -> Grid<CellKind> {
        let visible = self.visible();
        let win = self.win_cell();
        Grid::from_generator(self.grid_size, |pos| {
            if self.boxes.boxes().contains(&pos) {
                CellKind::Box
            } else if pos == win {
                CellKind::Goal
            } else if self.boxes.shadows().contains(&pos) {
                CellKind::Shadow
            } else if visible.contains(&pos) {
                CellKind::Watched
            } else {
                CellKind::Floor
            }
        })
        .unwrap_or_else(|_| unreachable!("grid size checked at construction"))
    }

    fn generate_boxes(&mut self) {
        let reserved = [START, self.win_cell()];
        self.boxes
            .generate(&mut self.rng, self.dog.coord(), &reserved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn model(grid_size: usize, box_count: usize) -> (HerdingHoundModel<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = GameConfig {
            grid_size,
            box_count: Some(box_count),
            seed: Some(11),
            ..GameConfig::default()
        };
        let model = HerdingHoundModel::from_config(&config, clock.clone()).unwrap();
        (model, clock)
    }

    #[test]
    fn zero_grid_is_rejected() {
        assert!(matches!(HerdingHoundModel::new(0), Err(GridError::ZeroSize)));
    }

    #[test]
    fn full_time_before_start() {
        let (model, clock) = model(5, 0);
        clock.advance(Duration::from_secs(90));
        assert_eq!(model.remaining_time(), Duration::from_millis(60_000));
        assert_eq!(model.game_state(), GameState::Ongoing);
    }

    #[test]
    fn countdown_floors_at_zero() {
        let (mut model, clock) = model(5, 0);
        clock.advance(Duration::from_secs(5));
        model.start_game();
        clock.advance(Duration::from_secs(20));
        assert_eq!(model.remaining_time(), Duration::from_secs(40));
        clock.advance(Duration::from_secs(100));
        assert_eq!(model.remaining_time(), Duration::ZERO);
        assert_eq!(model.game_state(), GameState::Lost);
        assert!(model.is_over());
    }

    #[test]
    fn start_does_not_move_entities() {
        let (mut model, _clock) = model(5, 0);
        model.move_goose(1, 0);
        model.start_game();
        assert_eq!(model.goose().coord(), Position::new(1, 0));
    }

    #[test]
    fn reset_stops_the_countdown() {
        let (mut model, clock) = model(5, 3);
        model.start_game();
        model.next_goose_move();
        model.next_dog_state();
        clock.advance(Duration::from_secs(10));
        model.reset_game();
        assert!(!model.is_started());
        assert_eq!(model.remaining_time(), Duration::from_secs(60));
        assert_eq!(model.goose().coord(), Position::new(0, 0));
        assert_eq!(model.dog().state(), DogState::Asleep);
    }

    #[test]
    fn timeout_beats_winning() {
        let (mut model, clock) = model(2, 0);
        model.start_game();
        model.move_goose(0, 1);
        assert_eq!(model.goose().coord(), model.win_cell());
        assert_eq!(model.game_state(), GameState::Won);
        clock.advance(Duration::from_secs(60));
        assert_eq!(model.game_state(), GameState::Lost);
    }

    #[test]
    fn goose_cannot_move_after_game_over() {
        let (mut model, _clock) = model(2, 0);
        model.move_goose(0, 1);
        assert!(model.is_over());
        assert!(!model.move_goose(1, 0));
        assert_eq!(model.goose().coord(), Position::new(0, 1));
    }

    #[test]
    fn only_awake_dog_catches() {
        let (mut model, _clock) = model(5, 0);
        model.move_goose(0, 1);
        assert!(model.visible().contains(&model.goose().coord()));
        assert_eq!(model.game_state(), GameState::Ongoing);
        model.next_dog_state();
        assert_eq!(model.dog().state(), DogState::Alert);
        assert_eq!(model.game_state(), GameState::Ongoing);
        model.next_dog_state();
        assert_eq!(model.game_state(), GameState::Lost);
    }

    #[test]
    fn hiding_behind_a_box() {
        let (mut model, _clock) = model(5, 0);
        model.place_boxes([Position::new(1, 2)]);
        model.move_goose(0, 2);
        model.set_dog_state(DogState::Awake);
        assert!(model.dog().visible_area().contains(&Position::new(0, 2)));
        assert!(!model.visible().contains(&Position::new(0, 2)));
        assert_eq!(model.game_state(), GameState::Ongoing);
    }

    #[test]
    fn cell_grid_marks_layout() {
        let (mut model, _clock) = model(5, 0);
        model.place_boxes([Position::new(1, 2)]);
        let grid = model.cell_grid();
        assert_eq!(grid[Position::new(1, 2)], CellKind::Box);
        assert_eq!(grid[Position::new(0, 4)], CellKind::Goal);
        assert_eq!(grid[Position::new(0, 2)], CellKind::Shadow);
        assert_eq!(grid[Position::new(0, 1)], CellKind::Watched);
        assert_eq!(grid[Position::new(4, 4)], CellKind::Floor);
    }

    #[test]
    fn goose_cannot_stand_on_the_dog() {
        let (mut game, _clock) = model(5, 0);
        assert!(game.move_goose(2, 1));
        assert_eq!(game.goose().coord(), Position::new(2, 1));
        assert!(!game.move_goose(0, 1));
        assert_eq!(game.goose().coord(), Position::new(2, 1));

        // on a 2x2 board the dog sits on the scripted path
        let (mut small, _clock) = model(2, 0);
        small.next_goose_move();
        assert_eq!(small.goose().coord(), Position::new(1, 0));
        small.next_goose_move();
        assert_eq!(small.goose().coord(), Position::new(1, 0));
    }

    #[test]
    fn reports_its_name() {
        let (model, _clock) = model(3, 0);
        assert_eq!(model.name(), "Herding Hound");
    }
}
