//! Economy-first lane defense.
//!
//! Builds along a fixed order, placing gunships and bombers on the cells
//! that cover the most lane and farms on the cells that cover the least.
//! Every tick each gunship snipes the lead debris and each bomber fires if
//! anything is in range.

use std::cmp::Reverse;

use crate::error::{ControllerError, StrategyInitError};
use crate::game::{Controller, Coord, Map, SnipePriority, TowerKind};
use crate::strategy::{Strategy, rank_by_coverage};

const BUILD_ORDER: [TowerKind; 8] = [
    TowerKind::Gunship,
    TowerKind::Bomber,
    TowerKind::Farm,
    TowerKind::Gunship,
    TowerKind::Farm,
    TowerKind::Bomber,
    TowerKind::Gunship,
    TowerKind::Reinforcer,
];

/// Lane defender with a fixed build order.
#[derive(Debug, Clone)]
pub struct Defender {
    gunship_spots: Vec<Coord>,
    bomber_spots: Vec<Coord>,
    farm_spots: Vec<Coord>,
    step: usize,
}

impl Defender {
    /// Plan placements for `map`.
    #[must_use]
    pub fn new(map: &Map) -> Self {
        let gunship_spots = rank_by_coverage(map, TowerKind::Gunship.range_squared());
        let bomber_spots = rank_by_coverage(map, TowerKind::Bomber.range_squared());
        let mut farm_spots: Vec<Coord> = map
            .iter()
            .filter(|&(at, _)| map.is_space(at.x, at.y))
            .map(|(at, _)| at)
            .collect();
        farm_spots.sort_by_key(|&at| {
            let nearest = map
                .path()
                .iter()
                .map(|cell| cell.distance_squared(at))
                .min()
                .unwrap_or(0);
            Reverse(nearest)
        });
        Self {
            gunship_spots,
            bomber_spots,
            farm_spots,
            step: 0,
        }
    }

    /// Registry constructor.
    ///
    /// # Errors
    ///
    /// Fails if the map has no buildable cell.
    pub fn create(map: &Map) -> Result<Box<dyn Strategy>, StrategyInitError> {
        let defender = Self::new(map);
        if defender.farm_spots.is_empty() {
            return Err(StrategyInitError(format!(
                "map {} has no buildable cells",
                map.name()
            )));
        }
        Ok(Box::new(defender))
    }

    fn spots(&self, kind: TowerKind) -> &[Coord] {
        match kind {
            TowerKind::Farm => &self.farm_spots,
            TowerKind::Bomber => &self.bomber_spots,
            TowerKind::Gunship | TowerKind::Reinforcer => &self.gunship_spots,
        }
    }

    fn build_next(&mut self, rc: &mut Controller) -> Result<(), ControllerError> {
        let kind = BUILD_ORDER[self.step % BUILD_ORDER.len()];
        let ally = rc.ally_side();
        let Some(spot) = self
            .spots(kind)
            .iter()
            .copied()
            .find(|at| rc.is_placeable(ally, at.x, at.y))
        else {
            // No room for this kind; move on.
            self.step += 1;
            return Ok(());
        };
        if rc.can_build_tower(kind, spot.x, spot.y) {
            rc.build_tower(kind, spot.x, spot.y)?;
            self.step += 1;
        }
        Ok(())
    }
}

impl Strategy for Defender {
    fn play_turn(&mut self, rc: &mut Controller) -> Result<(), ControllerError> {
        for tower in rc.towers(rc.ally_side()) {
            match tower.kind {
                TowerKind::Gunship => rc.auto_snipe(tower.id, SnipePriority::First)?,
                TowerKind::Bomber => rc.auto_bomb(tower.id)?,
                TowerKind::Farm | TowerKind::Reinforcer => {}
            }
        }
        self.build_next(rc)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::GameConstants;
    use crate::game::{Side, WorldState};

    fn map() -> Map {
        Map::from_ascii("lane", &["SSSPSSS", "SSSPSSS", "SSSPSSS", "SSSPSSS"]).unwrap()
    }

    #[test]
    fn test_farms_placed_far_from_lane() {
        let defender = Defender::new(&map());
        assert_eq!(defender.farm_spots[0].x % 6, 0);
        assert_eq!(defender.gunship_spots.len(), 24);
    }

    #[test]
    fn test_builds_first_gunship() {
        let world = WorldState::new(Arc::new(map()), GameConstants::default());
        let mut rc = Controller::new(Side::Blue, world);
        let mut defender = Defender::new(&map());
        defender.play_turn(&mut rc).unwrap();
        let towers = rc.towers(Side::Blue);
        assert_eq!(towers.len(), 1);
        assert_eq!(towers[0].kind, TowerKind::Gunship);
        // Next in line is a bomber, unaffordable with the 500 left.
        defender.play_turn(&mut rc).unwrap();
        assert_eq!(rc.towers(Side::Blue).len(), 1);
    }

    #[test]
    fn test_rejects_map_without_space() {
        let solid = Map::from_ascii("solid", &["RPR", "RPR"]).unwrap();
        assert!(Defender::create(&solid).is_err());
    }
}
