// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Debrisfall: a deterministic two-sided lane-defense simulator for
//! programming competitions.
//!
//! Two strategies each defend their own copy of a single lane against
//! debris, build towers, and pay to inject debris onto the other lane.
//! The engine provides:
//! - Bit-exact deterministic world updates
//! - Wall-clock compute budgets per side
//! - Snapshot-and-replay isolation of strategy code
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Tournament (match driver, series) │
//! ├─────────────────────────────────────┤
//! │   Sandbox (deadline-bounded calls)  │
//! ├─────────────────────────────────────┤
//! │   Controller  →  command buffer     │
//! ├─────────────────────────────────────┤
//! │   World state, map, pricing         │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod replay;
pub mod sandbox;
pub mod strategy;
pub mod tournament;

pub use config::{GameConstants, MatchConfig};
pub use error::{ControllerError, EngineError, MapError, MatchError, ReplayError};

// Re-export key game types at crate root for convenience
pub use game::{Controller, Coord, Map, Side, SidePair, TileType, TowerKind, WorldState};
pub use replay::Replay;
pub use strategy::{Contender, Strategy};
pub use tournament::{EndReason, MatchResult, TieBreak, run_match, run_series};
