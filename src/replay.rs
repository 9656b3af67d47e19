//! Match replay log.
//!
//! A replay is an ordered list of per-tick [`TickRecord`]s followed by one
//! [`ReplayMetadata`] record. Records are plain snapshots: positions,
//! health and cooldowns as they stood at the end of the tick, plus the
//! attacks each side made during it.
//!
//! Replays are stored as JSON:
//!
//! ```json
//! { "ticks": [ { "turn": 1, ... } ], "metadata": { "game_name": "...", ... } }
//! ```

mod render;
mod text;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use render::render_board;
pub use text::render_tick;

use crate::error::ReplayError;
use crate::game::{AttackEvent, Coord, Map, Side, SidePair, TowerKind, WorldState};

/// One tower as it stood at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerRecord {
    /// Tower id.
    pub id: u32,
    /// Tower kind.
    pub kind: TowerKind,
    /// Cartesian x.
    pub x: i32,
    /// Cartesian y.
    pub y: i32,
    /// Full cooldown period of the kind.
    pub max_cooldown: f64,
    /// Remaining cooldown.
    pub cooldown: f64,
}

/// One debris unit as it stood at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebrisRecord {
    /// Debris id.
    pub id: u32,
    /// Cartesian x.
    pub x: i32,
    /// Cartesian y.
    pub y: i32,
    /// Health at spawn.
    pub max_health: u32,
    /// Remaining health.
    pub health: u32,
    /// Ticks between steps.
    pub max_cooldown: u32,
    /// Ticks until the next step.
    pub cooldown: u32,
    /// Injected by the opponent.
    pub sent_by_opponent: bool,
}

/// Everything that happened to both sides in one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Turn number.
    pub turn: u32,
    /// Balances.
    pub balance: SidePair<f64>,
    /// Base health.
    pub health: SidePair<u32>,
    /// Remaining compute budget in seconds.
    pub time_remaining: SidePair<f64>,
    /// Towers per side, in id order.
    pub towers: SidePair<Vec<TowerRecord>>,
    /// Debris per lane, in id order.
    pub debris: SidePair<Vec<DebrisRecord>>,
    /// Attacks made this tick.
    pub attacks: SidePair<Vec<AttackEvent>>,
}

impl TickRecord {
    /// Snapshot the world at the end of a tick.
    #[must_use]
    pub fn capture(world: &WorldState) -> Self {
        let towers = SidePair::from_fn(|side| {
            world
                .towers(side)
                .map(|t| TowerRecord {
                    id: t.id.0,
                    kind: t.kind,
                    x: t.position.x,
                    y: t.position.y,
                    max_cooldown: t.kind.stats().cooldown,
                    cooldown: t.cooldown,
                })
                .collect()
        });
        let debris = SidePair::from_fn(|side| {
            world
                .debris(side)
                .map(|d| DebrisRecord {
                    id: d.id.0,
                    x: d.position.x,
                    y: d.position.y,
                    max_health: d.max_health,
                    health: d.health,
                    max_cooldown: d.max_cooldown,
                    cooldown: d.cooldown,
                    sent_by_opponent: d.sent_by_opponent,
                })
                .collect()
        });
        Self {
            turn: world.turn(),
            balance: SidePair::from_fn(|side| world.side(side).balance),
            health: SidePair::from_fn(|side| world.side(side).health),
            time_remaining: SidePair::from_fn(|side| {
                world.side(side).time_remaining.as_secs_f64()
            }),
            towers,
            debris,
            attacks: SidePair::from_fn(|side| world.attacks(side).to_vec()),
        }
    }
}

/// Trailing record identifying the match and its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayMetadata {
    /// `"<blue>-<red>-<map>"`.
    pub game_name: String,
    /// Map name.
    pub map_name: String,
    /// Map width.
    pub width: i32,
    /// Map height.
    pub height: i32,
    /// Lane from entry to exit.
    pub path: Vec<Coord>,
    /// Blue strategy name.
    pub blue_bot: String,
    /// Red strategy name.
    pub red_bot: String,
    /// Winning side.
    pub winner: Side,
    /// Normalized scores, blue first.
    pub scores: [f64; 2],
}

impl ReplayMetadata {
    /// Describe a finished match.
    #[must_use]
    pub fn new(map: &Map, blue_bot: &str, red_bot: &str, winner: Side) -> Self {
        let scores = match winner {
            Side::Blue => [1.0, 0.0],
            Side::Red => [0.0, 1.0],
        };
        Self {
            game_name: format!("{blue_bot}-{red_bot}-{}", map.name()),
            map_name: map.name().to_string(),
            width: map.width(),
            height: map.height(),
            path: map.path().to_vec(),
            blue_bot: blue_bot.to_string(),
            red_bot: red_bot.to_string(),
            winner,
            scores,
        }
    }
}

/// A complete match log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Per-tick records in turn order.
    pub ticks: Vec<TickRecord>,
    /// Match identity and result.
    pub metadata: ReplayMetadata,
}

impl Replay {
    /// Record for `turn`, if the match reached it.
    #[must_use]
    pub fn tick(&self, turn: u32) -> Option<&TickRecord> {
        self.ticks.iter().find(|t| t.turn == turn)
    }

    /// Write the replay as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a replay written by [`Replay::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or not replay JSON.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
