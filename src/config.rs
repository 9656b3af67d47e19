//! Match configuration.
//!
//! [`GameConstants`] carries the tunable economy and budget numbers,
//! [`MatchConfig`] bundles them with the coin-flip seed and an optional turn
//! cap, and [`MatchFile`] is the JSON file the CLI accepts in place of
//! individual flags:
//!
//! ```json
//! { "bots": ["defender", "raider"], "map": "spiral.awap24m", "seed": 7 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Economy and compute-budget constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConstants {
    /// Health each side starts with.
    pub starting_health: u32,
    /// Balance each side starts with.
    pub starting_balance: f64,
    /// Income both sides receive every tick.
    pub passive_income: f64,
    /// Fraction of a tower's cost returned when it is sold.
    pub refund_ratio: f64,
    /// Income a ready farm pays its owner.
    pub farm_income: f64,
    /// Base of the reinforcer cooldown-reduction power.
    pub reinforcer_multiplier: f64,
    /// Compute budget each side starts with, in seconds.
    pub initial_budget_secs: f64,
    /// Compute budget added to each side every tick, in seconds.
    pub budget_increment_secs: f64,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            starting_health: 2500,
            starting_balance: 1500.0,
            passive_income: 10.0,
            refund_ratio: 0.8,
            farm_income: 20.0,
            reinforcer_multiplier: 1.2,
            initial_budget_secs: 10.0,
            budget_increment_secs: 0.01,
        }
    }
}

impl GameConstants {
    /// Starting compute budget.
    #[must_use]
    pub fn initial_budget(&self) -> Duration {
        secs(self.initial_budget_secs)
    }

    /// Per-tick compute budget increment.
    #[must_use]
    pub fn budget_increment(&self) -> Duration {
        secs(self.budget_increment_secs)
    }
}

/// Negative or non-finite values clamp to zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Configuration for one match (or every match of a series).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    /// Economy and budget constants.
    pub constants: GameConstants,
    /// Seed for the terminal coin flip of the tie-break chain.
    pub seed: u64,
    /// Safety cap on ticks; `None` runs until a side loses.
    pub max_turns: Option<u32>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            constants: GameConstants::default(),
            seed: 0,
            max_turns: None,
        }
    }
}

/// On-disk match description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFile {
    /// Strategy names, blue first.
    pub bots: [String; 2],
    /// Path of the map file, relative to the match file's directory.
    pub map: PathBuf,
    /// Coin-flip seed.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Overrides for the default constants.
    #[serde(default)]
    pub constants: Option<GameConstants>,
    /// Turn cap.
    #[serde(default)]
    pub max_turns: Option<u32>,
}

impl MatchFile {
    /// Resolve into a [`MatchConfig`], using `default_seed` when none is given.
    #[must_use]
    pub fn to_config(&self, default_seed: u64) -> MatchConfig {
        MatchConfig {
            constants: self.constants.unwrap_or_default(),
            seed: self.seed.unwrap_or(default_seed),
            max_turns: self.max_turns,
        }
    }
}

/// Load a match file. A relative `map` path is resolved against the file's
/// directory.
///
/// # Errors
///
/// Returns [`MatchError::Config`] if the file cannot be read or parsed.
pub fn load_match_file(path: &Path) -> Result<MatchFile, MatchError> {
    let config_error = |message: String| MatchError::Config {
        path: path.to_path_buf(),
        message,
    };
    let text = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let mut file: MatchFile =
        serde_json::from_str(&text).map_err(|e| config_error(e.to_string()))?;
    if file.map.is_relative() {
        if let Some(dir) = path.parent() {
            file.map = dir.join(&file.map);
        }
    }
    Ok(file)
}
