use std::time::Duration;

use herding_hound_core::{
    Position,
    clock::ManualClock,
    config::GameConfig,
    dog::DogState,
    model::{GameState, HerdingHoundModel},
};

fn game(grid_size: usize, box_count: usize, seed: u64) -> (HerdingHoundModel<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let config = GameConfig {
        grid_size,
        box_count: Some(box_count),
        seed: Some(seed),
        ..GameConfig::default()
    };
    let model = HerdingHoundModel::from_config(&config, clock.clone()).expect("valid config");
    (model, clock)
}

#[test]
fn stepping_out_of_cover_in_front_of_awake_dog_loses() {
    let (mut model, _clock) = game(5, 0, 1);
    // the goose starts hidden inside a box at its start cell
    model.place_boxes([Position::new(0, 0)]);
    model.start_game();
    model.set_dog_state(DogState::Awake);
    assert_eq!(model.game_state(), GameState::Ongoing);

    let target = Position::new(0, 1);
    assert!(model.visible().contains(&target));
    assert!(!model.shadows().contains(&target));

    assert!(model.move_goose(0, 1));
    assert_eq!(model.goose().coord(), target);
    assert_eq!(model.game_state(), GameState::Lost);
    assert!(model.is_over());
}

#[test]
fn scripted_walk_reaches_goal_while_dog_sleeps() {
    let (mut model, clock) = game(5, 5, 9);
    model.start_game();
    let mut steps = 0;
    while model.goose().coord() != Position::new(0, 4) {
        model.next_goose_move();
        clock.advance(Duration::from_millis(500));
        steps += 1;
        assert!(steps <= 12, "walk did not reach the goal");
        assert_eq!(model.dog().state(), DogState::Asleep);
    }
    assert_eq!(steps, 12);
    assert!(model.remaining_time() > Duration::ZERO);
    assert_eq!(model.game_state(), GameState::Won);
}

#[test]
fn scripted_walk_visits_the_border() {
    let (mut model, _clock) = game(3, 0, 2);
    let mut path = vec![model.goose().coord()];
    for _ in 0..6 {
        model.next_goose_move();
        path.push(model.goose().coord());
    }
    let expected: Vec<Position> = [(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (1, 2), (0, 2)]
        .into_iter()
        .map(|(x, y)| Position::new(x, y))
        .collect();
    assert_eq!(path, expected);

    // at the goal the walk stops
    model.next_goose_move();
    assert_eq!(model.goose().coord(), Position::new(0, 2));
}

#[test]
fn dog_tracks_the_goose_after_every_move() {
    let (mut model, _clock) = game(5, 0, 3);
    for _ in 0..4 {
        model.next_goose_move();
    }
    assert_eq!(model.goose().coord(), Position::new(4, 0));
    assert_eq!(model.dog().direction(), herding_hound_core::Direction::Right);
    for _ in 0..4 {
        model.next_goose_move();
    }
    assert_eq!(model.dog().direction(), herding_hound_core::Direction::Right);
    for _ in 0..3 {
        model.next_goose_move();
    }
    assert_eq!(model.goose().coord(), Position::new(1, 4));
    assert_eq!(model.dog().direction(), herding_hound_core::Direction::Down);
}

#[test]
fn dog_state_advances_one_step_per_call() {
    let (mut model, _clock) = game(5, 0, 4);
    let states: Vec<DogState> = (0..6)
        .map(|_| {
            model.next_dog_state();
            model.dog().state()
        })
        .collect();
    assert_eq!(
        states,
        vec![
            DogState::Alert,
            DogState::Awake,
            DogState::Asleep,
            DogState::Alert,
            DogState::Awake,
            DogState::Asleep,
        ]
    );
}

#[test]
fn reset_twice_matches_reset_once() {
    let (mut model, clock) = game(6, 4, 5);
    model.start_game();
    model.next_goose_move();
    model.next_dog_state();
    clock.advance(Duration::from_secs(3));

    model.reset_game();
    let once = (
        model.goose().coord(),
        model.dog().coord(),
        model.dog().state(),
        model.dog().direction(),
        model.remaining_time(),
        model.is_started(),
    );
    model.reset_game();
    let twice = (
        model.goose().coord(),
        model.dog().coord(),
        model.dog().state(),
        model.dog().direction(),
        model.remaining_time(),
        model.is_started(),
    );
    assert_eq!(once, twice);
    assert_eq!(once.4, Duration::from_secs(60));
}

#[test]
fn timeout_on_the_winning_step_is_a_loss() {
    let (mut model, clock) = game(3, 0, 6);
    model.start_game();
    for _ in 0..5 {
        model.next_goose_move();
    }
    assert_eq!(model.game_state(), GameState::Ongoing);
    clock.advance(Duration::from_secs(60));
    model.next_goose_move();
    assert_eq!(model.goose().coord(), model.win_cell());
    assert_eq!(model.game_state(), GameState::Lost);
}

#[test]
fn restarting_rearms_the_timer() {
    let (mut model, clock) = game(5, 0, 7);
    model.start_game();
    clock.advance(Duration::from_secs(45));
    assert_eq!(model.remaining_time(), Duration::from_secs(15));
    model.start_game();
    assert_eq!(model.remaining_time(), Duration::from_secs(60));
}

#[test]
fn oversized_settings_still_build_a_playable_game() {
    let clock = ManualClock::new();
    let config = GameConfig {
        grid_size: 5,
        box_count: Some(usize::MAX / 4 + 1),
        vision_range: Some(usize::MAX),
        seed: Some(1),
        ..GameConfig::default()
    };
    assert!(config.validate().is_err());

    let mut model = HerdingHoundModel::from_config(&config, clock).expect("non-zero grid");
    assert!(model.box_cells().len() <= 22);
    assert_eq!(model.dog().vision_range(), 5);
    model.set_dog_state(DogState::Awake);
    assert!(model.visible().len() <= 25);
    assert_ne!(model.game_state(), GameState::Won);
}
