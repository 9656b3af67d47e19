//! CLI command implementations for Debrisfall.

pub(crate) mod bots;
pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod series;
pub(crate) mod validate;

mod output;

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use debrisfall::config::load_match_file;
use debrisfall::{Contender, Map, MatchConfig};

/// Output format for `run` and `series`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Match setup shared by `run` and `series`.
///
/// Flags override the values in `--config`.
#[derive(Debug, Args)]
pub(crate) struct SetupArgs {
    /// Blue strategy name
    #[arg(long)]
    blue: Option<String>,

    /// Red strategy name
    #[arg(long)]
    red: Option<String>,

    /// Map file
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Coin-flip seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop after this many ticks and decide by tie-break
    #[arg(short = 't', long)]
    max_turns: Option<u32>,

    /// JSON match file: {"bots": [blue, red], "map": "...", "seed": n}
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// A fully resolved match setup.
pub(crate) struct Setup {
    pub(crate) blue: Contender,
    pub(crate) red: Contender,
    pub(crate) map: Arc<Map>,
    pub(crate) config: MatchConfig,
}

impl SetupArgs {
    /// Merge flags with the optional match file and load everything.
    pub(crate) fn resolve(self) -> Result<Setup, CliError> {
        let file = self.config.as_deref().map(load_match_file).transpose()?;

        let [file_blue, file_red] = file
            .as_ref()
            .map(|f| f.bots.clone().map(Some))
            .unwrap_or_default();
        let blue = self
            .blue
            .or(file_blue)
            .ok_or_else(|| CliError::new("no blue strategy given (use --blue or --config)"))?;
        let red = self
            .red
            .or(file_red)
            .ok_or_else(|| CliError::new("no red strategy given (use --red or --config)"))?;
        let map_path = self
            .map
            .or_else(|| file.as_ref().map(|f| f.map.clone()))
            .ok_or_else(|| CliError::new("no map given (use --map or --config)"))?;

        let mut config = file
            .as_ref()
            .map_or_else(MatchConfig::default, |f| f.to_config(0));
        let file_seed = file.as_ref().and_then(|f| f.seed);
        config.seed = self.seed.or(file_seed).unwrap_or_else(random_seed);
        if self.max_turns.is_some() {
            config.max_turns = self.max_turns;
        }

        Ok(Setup {
            blue: Contender::builtin(&blue)?,
            red: Contender::builtin(&red)?,
            map: Arc::new(Map::load(&map_path)?),
            config,
        })
    }
}

fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(42, |d| d.as_secs() ^ u64::from(d.subsec_nanos()))
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<debrisfall::MatchError> for CliError {
    fn from(e: debrisfall::MatchError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<debrisfall::MapError> for CliError {
    fn from(e: debrisfall::MapError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<debrisfall::ReplayError> for CliError {
    fn from(e: debrisfall::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}
