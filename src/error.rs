//! Error types for the simulator.
//!
//! Errors fall into three tiers:
//! - [`ControllerError`]: in-band contract violations raised to strategy code.
//!   Recoverable inside a strategy; otherwise the side fails the tick.
//! - [`EngineError`]: internal invariant violations. Always fatal to the match.
//! - [`MapError`] / [`MatchError`]: load-time and setup failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::game::{DebrisId, TowerId, TowerKind};

/// Map loading and geometry extraction failures.
#[derive(Debug, Error)]
pub enum MapError {
    /// The map file could not be read.
    #[error("failed to read map {path}: {source}")]
    Io {
        /// Path of the map file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The grid line is not a nested list of quoted codes.
    #[error("malformed map grid: {0}")]
    Malformed(String),
    /// The grid has no rows or no columns.
    #[error("map grid is empty")]
    Empty,
    /// Rows have differing lengths.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Offending row (file order).
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// No boundary PATH cell with exactly one PATH neighbour.
    #[error("map has no path endpoints")]
    NoEndpoints,
    /// A PATH cell touches more than two PATH cells.
    #[error("path branches at ({x}, {y})")]
    BranchingPath {
        /// Cartesian x of the branching cell.
        x: i32,
        /// Cartesian y of the branching cell.
        y: i32,
    },
    /// Some PATH cells are not reachable from the lane entry.
    #[error("{unreached} path cells are disconnected from the lane")]
    DisconnectedPath {
        /// Number of PATH cells never visited.
        unreached: usize,
    },
}

/// Engine-internal invariant violation.
///
/// These never originate from strategy input; seeing one means the engine
/// itself is wrong, so the match is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An internally generated debris reference did not resolve.
    #[error("tried to damage non-existent debris {0}")]
    UnknownDebris(DebrisId),
    /// An internally generated tower reference did not resolve.
    #[error("tried to access non-existent tower {0}")]
    UnknownTower(TowerId),
    /// Re-applying a committed command to the authoritative state failed.
    #[error("command buffer diverged from world state: {0}")]
    Divergence(String),
}

/// Contract violation raised by a [`Controller`](crate::game::Controller) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The tower id does not name one of the caller's towers.
    #[error("invalid tower id {0}")]
    UnknownTower(TowerId),
    /// The debris id does not name debris on the caller's lane.
    #[error("invalid debris id {0}")]
    UnknownDebris(DebrisId),
    /// The action requires a different tower kind.
    #[error("tower {id} is a {found}, expected a {expected}")]
    WrongTowerKind {
        /// Tower the action was attempted with.
        id: TowerId,
        /// Kind the action requires.
        expected: TowerKind,
        /// Kind the tower actually is.
        found: TowerKind,
    },
    /// A mutation was called while its `can_*` check is false.
    #[error("{0} called but its precondition is false")]
    Precondition(&'static str),
    /// The engine hit an internal fault while serving the call.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Failure to construct a strategy for a side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("strategy failed to initialize: {0}")]
pub struct StrategyInitError(pub String);

/// Setup and fatal match failures.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The map could not be loaded.
    #[error(transparent)]
    Map(#[from] MapError),
    /// No strategy is registered under this name.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    /// The engine aborted the match.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// A match configuration file could not be loaded.
    #[error("invalid match config {path}: {message}")]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

/// Replay persistence failures.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Reading or writing the replay file failed.
    #[error("replay I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The replay file is not valid replay JSON.
    #[error("replay decode error: {0}")]
    Json(#[from] serde_json::Error),
}
