//! Game layer for Debrisfall.
//!
//! Implements the simulation kernel:
//! - Map with tiles (path, space, asteroids) and the extracted lane
//! - Towers and debris
//! - World state and its per-tick environment steps
//! - Injection pricing and the natural debris schedule
//! - Controller: the capability interface strategies act through

mod controller;
mod economy;
mod entity;
mod invariants;
mod map;
mod path;
mod schedule;
mod side;
mod state;

pub use controller::{Command, Controller, SnipePriority};
pub use economy::{MIN_INJECTION_COST, debris_cost};
pub use entity::{
    Debris, DebrisId, IdAllocator, NEW_TOWER_COOLDOWN, Tower, TowerId, TowerKind, TowerStats,
};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use map::{Coord, Map, TileType};
pub use path::extract_path;
pub use schedule::debris_schedule;
pub use side::{Injection, Side, SidePair, SideState};
pub use state::{AttackEvent, WorldState};
