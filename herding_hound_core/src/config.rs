use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

/// Errors raised while loading a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Tunables for a Herding Hound game and its driver.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub grid_size: usize,
    pub time_limit_ms: u64,
    /// Boxes per layout. Defaults to `grid_size`.
    pub box_count: Option<usize>,
    /// How many cells ahead the dog can see. Defaults to `grid_size`.
    pub vision_range: Option<usize>,
    /// Seed for box layouts. Random when absent.
    pub seed: Option<u64>,
    pub asleep_ms: u64,
    pub alert_ms: u64,
    pub awake_ms: u64,
    pub countdown_secs: u64,
    pub tick_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            time_limit_ms: 60_000,
            box_count: None,
            vision_range: None,
            seed: None,
            asleep_ms: 3_000,
            alert_ms: 1_000,
            awake_ms: 2_000,
            countdown_secs: 3,
            tick_ms: 100,
        }
    }
}

impl GameConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no game can be built from.
    ///
    /// An oversized `vision_range` is accepted; the dog's sight is capped by
    /// the board anyway.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::Invalid("grid_size must be greater than zero"));
        }
        if self.time_limit_ms == 0 {
            return Err(ConfigError::Invalid("time_limit_ms must be greater than zero"));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be greater than zero"));
        }
        let cells = self.grid_size.checked_mul(self.grid_size);
        if let (Some(count), Some(cells)) = (self.box_count, cells) {
            if count > cells {
                return Err(ConfigError::Invalid("box_count must fit on the board"));
            }
        }
        Ok(())
    }

    /// Boxes per layout, falling back to one per row.
    pub fn box_count(&self) -> usize {
        self.box_count.unwrap_or(self.grid_size)
    }

    /// Dog sight in cells, falling back to the board size.
    pub fn vision_range(&self) -> usize {
        self.vision_range.unwrap_or(self.grid_size)
    }

    /// The countdown length.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}
