use anyhow::{Context, Result};
use clap::Parser;
use herding_hound_core::{
    Direction as Facing, Position,
    clock::SystemClock,
    config::GameConfig,
    dog::DogState,
    model::{CellKind, GameState, HerdingHoundModel},
};
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::OpenOptions,
    io::{self, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Delay between scripted goose steps in demo mode.
const DEMO_STEP: Duration = Duration::from_millis(400);
/// How long the goose flashes after the game ends.
const BLINK_FOR: Duration = Duration::from_millis(2_000);
const BLINK_PERIOD: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML config file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,
    /// Board side length, overrides the config
    #[arg(short, long)]
    grid_size: Option<usize>,
    /// Seed for box layouts, overrides the config
    #[arg(short, long)]
    seed: Option<u64>,
    /// Let the goose walk the scripted path on its own
    #[arg(long)]
    demo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Pre-game countdown; the game starts at `until`.
    Countdown { until: Instant },
    Playing,
    /// The game ended at `since`; the goose blinks for a while.
    Over { won: bool, since: Instant },
}

/// Whether the goose is drawn at `elapsed` into the end-of-game blink.
fn blink_shown(elapsed: Duration) -> bool {
    elapsed >= BLINK_FOR || (elapsed.as_millis() / BLINK_PERIOD.as_millis()) % 2 == 1
}

struct App {
    /// The core game rules.
    model: HerdingHoundModel,
    config: GameConfig,
    phase: Phase,
    /// When the dog entered its current alertness phase.
    dog_phase_since: Instant,
    last_demo_step: Instant,
    demo: bool,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(config: GameConfig, demo: bool) -> Result<Self> {
        let model = HerdingHoundModel::from_config(&config, SystemClock::new())
            .context("Failed to create game")?;
        let now = Instant::now();
        Ok(App {
            phase: Phase::Countdown {
                until: now + Duration::from_secs(config.countdown_secs),
            },
            model,
            config,
            dog_phase_since: now,
            last_demo_step: now,
            demo,
            should_quit: false,
        })
    }

    /// How long the dog stays in its current phase.
    fn dog_phase_length(&self) -> Duration {
        let ms = match self.model.dog().state() {
            DogState::Asleep => self.config.asleep_ms,
            DogState::Alert => self.config.alert_ms,
            DogState::Awake => self.config.awake_ms,
        };
        Duration::from_millis(ms)
    }

    /// Handles one step of the game loop.
    fn tick(&mut self) {
        let now = Instant::now();
        match self.phase {
            Phase::Countdown { until } => {
                if now >= until {
                    self.model.start_game();
                    self.dog_phase_since = now;
                    self.last_demo_step = now;
                    self.phase = Phase::Playing;
                }
            }
            Phase::Playing => {
                if self.demo && now.duration_since(self.last_demo_step) >= DEMO_STEP {
                    self.model.next_goose_move();
                    self.last_demo_step = now;
                }
                if now.duration_since(self.dog_phase_since) >= self.dog_phase_length() {
                    self.model.next_dog_state();
                    self.dog_phase_since = now;
                }
                self.check_over();
            }
            Phase::Over { .. } => {}
        }
    }

    fn move_goose(&mut self, dx: isize, dy: isize) {
        if self.phase == Phase::Playing && !self.demo {
            self.model.move_goose(dx, dy);
            self.check_over();
        }
    }

    fn check_over(&mut self) {
        match self.model.game_state() {
            GameState::Ongoing => {}
            state => {
                let won = state == GameState::Won;
                tracing::info!(
                    won,
                    goose = ?self.model.goose().coord(),
                    remaining_ms = self.model.remaining_time().as_millis() as u64,
                    "game over"
                );
                self.phase = Phase::Over {
                    won,
                    since: Instant::now(),
                };
            }
        }
    }

    fn restart(&mut self) {
        self.model.reset_game();
        self.phase = Phase::Countdown {
            until: Instant::now() + Duration::from_secs(self.config.countdown_secs),
        };
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_tracing();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(grid_size) = args.grid_size {
        config.grid_size = grid_size;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate().context("Invalid settings")?;

    // Create the application state before touching the terminal
    let mut app = App::new(config, args.demo)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    result
}

/// Logs go to a file so they never draw over the alternate screen.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_path = std::env::temp_dir().join("herding_hound.log");

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::info!(path = %log_path.display(), "Logging initialized");
        }
        Err(_) => tracing_subscriber::registry().with(env_filter).init(),
    }
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(app.config.tick_ms);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                        KeyCode::Char('r') => app.restart(),
                        KeyCode::Up | KeyCode::Char('w') => app.move_goose(0, -1),
                        KeyCode::Down | KeyCode::Char('s') => app.move_goose(0, 1),
                        KeyCode::Left | KeyCode::Char('a') => app.move_goose(-1, 0),
                        KeyCode::Right | KeyCode::Char('d') => app.move_goose(1, 0),
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Board
            Constraint::Length(4), // Status
            Constraint::Length(2), // Help
        ])
        .split(frame.area());

    render_board(frame, main_layout[0], app);
    render_status(frame, main_layout[1], app);

    let help_text = Paragraph::new("Arrows/WASD move, 'r' restart, 'q' or 'Esc' quit.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn dog_span(facing: Facing, state: DogState) -> Span<'static> {
    let glyph = match facing {
        Facing::Up => "▲ ",
        Facing::Down => "▼ ",
        Facing::Left => "◀ ",
        Facing::Right => "▶ ",
    };
    let color = match state {
        DogState::Asleep => Color::Blue,
        DogState::Alert => Color::Yellow,
        DogState::Awake => Color::Red,
    };
    Span::styled(glyph, Style::default().fg(color).bold())
}

/// Renders the board, two terminal columns per cell.
fn render_board(frame: &mut Frame, area: Rect, app: &App) {
    let model = &app.model;
    let cells = model.cell_grid();
    let goose = model.goose().coord();
    let dog = model.dog();
    let awake = dog.state() == DogState::Awake;
    let (goose_shown, goose_style) = match app.phase {
        Phase::Over { won, since } => (
            blink_shown(since.elapsed()),
            Style::default()
                .fg(if won { Color::Green } else { Color::Red })
                .bold(),
        ),
        _ => (true, Style::default().fg(Color::White).bold()),
    };

    let lines: Vec<Line> = cells
        .rows()
        .enumerate()
        .map(|(y, row)| {
            let spans: Vec<Span> = row
                .iter()
                .enumerate()
                .map(|(x, kind)| {
                    let pos = Position::new(x, y);
                    if pos == goose && goose_shown {
                        Span::styled("G ", goose_style)
                    } else if pos == dog.coord() {
                        dog_span(dog.direction(), dog.state())
                    } else {
                        match kind {
                            CellKind::Floor => Span::raw("· "),
                            CellKind::Box => {
                                Span::styled("■ ", Style::default().fg(Color::Rgb(160, 110, 60)))
                            }
                            CellKind::Shadow => {
                                Span::styled("░ ", Style::default().fg(Color::DarkGray))
                            }
                            CellKind::Watched if awake => {
                                Span::styled("· ", Style::default().bg(Color::Red))
                            }
                            CellKind::Watched => {
                                Span::styled("· ", Style::default().fg(Color::Yellow))
                            }
                            CellKind::Goal => Span::styled("⚑ ", Style::default().fg(Color::Green)),
                        }
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let board = Paragraph::new(lines)
        .block(Block::default().title(model.name()).borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(board, area);
}

/// Renders the timer, dog phase and game messages.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let remaining = app.model.remaining_time();
    let timer = Span::styled(
        format!("Time: {:>2}s", remaining.as_secs()),
        if remaining < Duration::from_secs(10) {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        },
    );
    let dog = Span::raw(format!("   Dog: {:?}", app.model.dog().state()));

    let message = match app.phase {
        Phase::Countdown { until } => {
            let left = until.saturating_duration_since(Instant::now()).as_secs() + 1;
            Line::from(format!("Get ready... {left}"))
        }
        Phase::Playing => Line::from("Reach the flag without being seen by the awake dog."),
        Phase::Over { won: true, .. } => Line::from(Span::styled(
            "You won! Press 'r' to play again.",
            Style::default().fg(Color::Green).bold(),
        )),
        Phase::Over { won: false, .. } => Line::from(Span::styled(
            "You lost! Press 'r' to try again.",
            Style::default().fg(Color::Red).bold(),
        )),
    };

    let status = Paragraph::new(vec![Line::from(vec![timer, dog]), message])
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}
