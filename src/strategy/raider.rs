//! Injection-heavy offense behind a thin gunship screen.

use crate::error::{ControllerError, StrategyInitError};
use crate::game::{Controller, Coord, Map, SnipePriority, TowerKind};
use crate::strategy::{Strategy, rank_by_coverage};

/// Gunships kept for defense before any raiding starts.
const SCREEN_SIZE: usize = 2;
/// Cooldown of every injected unit.
const RAID_COOLDOWN: u32 = 4;
/// Weakest unit worth paying the injection floor for.
const MIN_RAID_HEALTH: u32 = 101;
/// Search ceiling for injected health.
const MAX_RAID_HEALTH: u32 = 20_000;

/// Sends the strongest affordable injection whenever the slot is free.
#[derive(Debug, Clone)]
pub struct Raider {
    screen_spots: Vec<Coord>,
}

impl Raider {
    /// Plan gunship placements for `map`.
    #[must_use]
    pub fn new(map: &Map) -> Self {
        Self {
            screen_spots: rank_by_coverage(map, TowerKind::Gunship.range_squared()),
        }
    }

    /// Registry constructor.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn create(map: &Map) -> Result<Box<dyn Strategy>, StrategyInitError> {
        Ok(Box::new(Self::new(map)))
    }

    /// Largest health whose injection `rc` can afford, if any reaches
    /// [`MIN_RAID_HEALTH`].
    fn strongest_affordable(rc: &Controller) -> Option<u32> {
        if !rc.can_send_debris(RAID_COOLDOWN, MIN_RAID_HEALTH) {
            return None;
        }
        let (mut lo, mut hi) = (MIN_RAID_HEALTH, MAX_RAID_HEALTH);
        while lo < hi {
            let mid = lo + (hi - lo).div_ceil(2);
            if rc.can_send_debris(RAID_COOLDOWN, mid) {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Some(lo)
    }
}

impl Strategy for Raider {
    fn play_turn(&mut self, rc: &mut Controller) -> Result<(), ControllerError> {
        let ally = rc.ally_side();
        let gunships: Vec<_> = rc
            .towers(ally)
            .into_iter()
            .filter(|t| t.kind == TowerKind::Gunship)
            .collect();
        for gunship in &gunships {
            rc.auto_snipe(gunship.id, SnipePriority::Strong)?;
        }

        if gunships.len() < SCREEN_SIZE {
            let spot = self
                .screen_spots
                .iter()
                .copied()
                .find(|at| rc.can_build_tower(TowerKind::Gunship, at.x, at.y));
            if let Some(at) = spot {
                rc.build_tower(TowerKind::Gunship, at.x, at.y)?;
            }
            return Ok(());
        }

        if let Some(health) = Self::strongest_affordable(rc) {
            rc.send_debris(RAID_COOLDOWN, health)?;
        }
        Ok(())
    }
}
