//! Towers and debris.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{Coord, Side};

/// Identifier of a tower, unique within one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TowerId(pub u32);

/// Identifier of a debris unit, unique within one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebrisId(pub u32);

impl fmt::Display for TowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DebrisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Match-scoped id source shared by towers and debris.
///
/// Ids increase monotonically and are never reused, so two matches running
/// side by side never observe each other's numbering.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Create an allocator starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    fn bump(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Allocate a fresh tower id.
    pub fn tower(&mut self) -> TowerId {
        TowerId(self.bump())
    }

    /// Allocate a fresh debris id.
    pub fn debris(&mut self) -> DebrisId {
        DebrisId(self.bump())
    }
}

/// Fixed per-kind tower statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowerStats {
    /// Build cost.
    pub cost: u32,
    /// Squared range.
    pub range_squared: i64,
    /// Cooldown period after acting.
    pub cooldown: f64,
    /// Damage per hit.
    pub damage: u32,
}

/// Kind of tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Generates income every cooldown period.
    Farm,
    /// Long range, single target.
    Gunship,
    /// Short range, hits every debris in range.
    Bomber,
    /// Speeds up cooldown recovery of nearby towers.
    Reinforcer,
}

impl TowerKind {
    /// All kinds, in declaration order.
    pub const ALL: [TowerKind; 4] = [
        TowerKind::Farm,
        TowerKind::Gunship,
        TowerKind::Bomber,
        TowerKind::Reinforcer,
    ];

    /// Fixed statistics for this kind.
    #[must_use]
    pub const fn stats(self) -> TowerStats {
        match self {
            TowerKind::Farm => TowerStats {
                cost: 2000,
                range_squared: 0,
                cooldown: 10.0,
                damage: 0,
            },
            TowerKind::Gunship => TowerStats {
                cost: 1000,
                range_squared: 60,
                cooldown: 20.0,
                damage: 25,
            },
            TowerKind::Bomber => TowerStats {
                cost: 1750,
                range_squared: 10,
                cooldown: 15.0,
                damage: 6,
            },
            TowerKind::Reinforcer => TowerStats {
                cost: 3000,
                range_squared: 5,
                cooldown: 0.0,
                damage: 0,
            },
        }
    }

    /// Build cost.
    #[must_use]
    pub const fn cost(self) -> u32 {
        self.stats().cost
    }

    /// Squared range.
    #[must_use]
    pub const fn range_squared(self) -> i64 {
        self.stats().range_squared
    }

    /// Lowercase name used in replays and messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TowerKind::Farm => "farm",
            TowerKind::Gunship => "gunship",
            TowerKind::Bomber => "bomber",
            TowerKind::Reinforcer => "reinforcer",
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cooldown a freshly built tower starts with.
pub const NEW_TOWER_COOLDOWN: f64 = 1.0;

/// A placed tower.
#[derive(Debug, Clone, PartialEq)]
pub struct Tower {
    /// Unique id.
    pub id: TowerId,
    /// Owning side.
    pub side: Side,
    /// Kind, fixed at build time.
    pub kind: TowerKind,
    /// Position, fixed at build time.
    pub position: Coord,
    /// Remaining cooldown; ready at zero.
    pub cooldown: f64,
}

impl Tower {
    /// Create a tower with the default not-ready cooldown.
    #[must_use]
    pub const fn new(id: TowerId, side: Side, kind: TowerKind, position: Coord) -> Self {
        Self {
            id,
            side,
            kind,
            position,
            cooldown: NEW_TOWER_COOLDOWN,
        }
    }

    /// True when the tower can act this tick.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Restart the cooldown at the kind's full period.
    pub fn reset_cooldown(&mut self) {
        self.cooldown = self.kind.stats().cooldown;
    }

    /// True when `target` lies within this tower's squared range.
    #[must_use]
    pub fn in_range(&self, target: Coord) -> bool {
        self.position.distance_squared(target) <= self.kind.range_squared()
    }
}

/// A debris unit travelling along one side's lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debris {
    /// Unique id.
    pub id: DebrisId,
    /// Side whose lane it travels (and whose health it damages on arrival).
    pub side: Side,
    /// Current position.
    pub position: Coord,
    /// Index into the lane.
    pub progress: usize,
    /// Remaining health.
    pub health: u32,
    /// Health at spawn.
    pub max_health: u32,
    /// Ticks between steps.
    pub max_cooldown: u32,
    /// Ticks until the next step.
    pub cooldown: u32,
    /// True if injected by the opponent rather than the natural schedule.
    pub sent_by_opponent: bool,
}

impl Debris {
    /// Create debris at the lane entry.
    #[must_use]
    pub const fn new(
        id: DebrisId,
        side: Side,
        entry: Coord,
        cooldown: u32,
        health: u32,
        sent_by_opponent: bool,
    ) -> Self {
        Self {
            id,
            side,
            position: entry,
            progress: 0,
            health,
            max_health: health,
            max_cooldown: cooldown,
            cooldown,
            sent_by_opponent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_across_kinds() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.tower(), TowerId(0));
        assert_eq!(ids.debris(), DebrisId(1));
        assert_eq!(ids.tower(), TowerId(2));
    }

    #[test]
    fn test_new_tower_not_ready() {
        let tower = Tower::new(TowerId(0), Side::Blue, TowerKind::Gunship, Coord::new(0, 0));
        assert!(!tower.is_ready());
    }

    #[test]
    fn test_tower_range() {
        let tower = Tower::new(TowerId(0), Side::Blue, TowerKind::Bomber, Coord::new(0, 0));
        assert!(tower.in_range(Coord::new(3, 1)));
        assert!(!tower.in_range(Coord::new(3, 2)));
    }

    #[test]
    fn test_kind_costs() {
        assert_eq!(TowerKind::Farm.cost(), 2000);
        assert_eq!(TowerKind::Gunship.cost(), 1000);
        assert_eq!(TowerKind::Bomber.cost(), 1750);
        assert_eq!(TowerKind::Reinforcer.cost(), 3000);
    }

    #[test]
    fn test_debris_spawns_at_entry() {
        let debris = Debris::new(DebrisId(4), Side::Red, Coord::new(1, 2), 20, 10, false);
        assert_eq!(debris.progress, 0);
        assert_eq!(debris.health, debris.max_health);
        assert_eq!(debris.cooldown, debris.max_cooldown);
    }
}
