//! Property-based tests for pricing, lane extraction and placement.
//!
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use debrisfall::game::{MIN_INJECTION_COST, debris_cost};
use debrisfall::{GameConstants, Map, Side, TowerKind, WorldState};

/// Serpentine lane: full rows of PATH joined by a single PATH cell at
/// alternating ends.
fn serpentine(width: usize, stripes: usize) -> Vec<String> {
    let mut rows = Vec::with_capacity(stripes * 2 - 1);
    for stripe in 0..stripes {
        rows.push("P".repeat(width));
        if stripe + 1 < stripes {
            let spaces = "S".repeat(width - 1);
            if stripe % 2 == 0 {
                rows.push(format!("{spaces}P"));
            } else {
                rows.push(format!("P{spaces}"));
            }
        }
    }
    rows
}

fn kind() -> impl Strategy<Value = TowerKind> {
    prop::sample::select(TowerKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Tougher debris never costs less.
    #[test]
    fn prop_cost_non_decreasing_in_health(
        cooldown in 1u32..60,
        health in 1u32..5000,
        extra in 0u32..500,
    ) {
        prop_assert!(debris_cost(cooldown, health) <= debris_cost(cooldown, health + extra));
    }

    /// Slower debris never costs more.
    #[test]
    fn prop_cost_non_increasing_in_cooldown(
        cooldown in 1u32..60,
        health in 1u32..5000,
        extra in 0u32..60,
    ) {
        prop_assert!(debris_cost(cooldown + extra, health) <= debris_cost(cooldown, health));
    }

    /// No injection is cheaper than the floor.
    #[test]
    fn prop_cost_floored(cooldown in 0u32..1000, health in 0u32..100_000) {
        prop_assert!(debris_cost(cooldown, health) >= MIN_INJECTION_COST);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// A straight lane of `len` cells yields exactly those cells, entry at the top.
    #[test]
    fn prop_straight_lane_length(len in 2usize..60, pad in 0usize..4) {
        let side = "S".repeat(pad);
        let row = format!("{side}P{side}");
        let rows: Vec<&str> = std::iter::repeat_n(row.as_str(), len).collect();
        let map = Map::from_ascii("straight", &rows).unwrap();

        prop_assert_eq!(map.path_length(), len);
        let entry = map.entry();
        let top = i32::try_from(len - 1).unwrap();
        prop_assert_eq!((entry.x, entry.y), (i32::try_from(pad).unwrap(), top));
        let unique: HashSet<_> = map.path().iter().copied().collect();
        prop_assert_eq!(unique.len(), len);
    }

    /// A serpentine lane visits every PATH cell once, each step to a neighbour.
    #[test]
    fn prop_serpentine_lane_visits_every_cell(width in 2usize..12, stripes in 1usize..8) {
        let rows = serpentine(width, stripes);
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let map = Map::from_ascii("snake", &rows).unwrap();

        let expected = stripes * width + (stripes - 1);
        prop_assert_eq!(map.path_length(), expected);

        let unique: HashSet<_> = map.path().iter().copied().collect();
        prop_assert_eq!(unique.len(), expected);
        for step in map.path().windows(2) {
            prop_assert_eq!(step[0].distance_squared(step[1]), 1);
        }
        for cell in map.path() {
            prop_assert!(map.is_path(cell.x, cell.y));
        }
    }

    /// Only empty SPACE cells inside the map accept towers.
    #[test]
    fn prop_placeability(x in -3i32..8, y in -3i32..8, kind in kind()) {
        let map = Map::from_ascii("field", &["SSRSS", "PPPPP", "SSSSS", "SRSSS"]).unwrap();
        let mut world = WorldState::new(Arc::new(map.clone()), GameConstants::default());
        world.side_mut(Side::Blue).balance = 100_000.0;

        let placeable = world.is_placeable(Side::Blue, x, y);
        prop_assert_eq!(placeable, map.is_space(x, y));

        if placeable {
            world.build_tower(Side::Blue, kind, x, y).unwrap();
            prop_assert!(!world.is_placeable(Side::Blue, x, y));
            // Each side has its own board.
            prop_assert!(world.is_placeable(Side::Red, x, y));
        } else {
            prop_assert!(world.build_tower(Side::Blue, kind, x, y).is_err());
        }
    }

    /// Selling refunds exactly the configured share of the cost and frees the cell.
    #[test]
    fn prop_sell_refund(kind in kind(), x in 0i32..3, balance in 3000.0f64..50_000.0) {
        let map = Map::from_ascii("strip", &["SSS", "PPP", "SSS"]).unwrap();
        let constants = GameConstants::default();
        let mut world = WorldState::new(Arc::new(map), constants);
        world.side_mut(Side::Red).balance = balance;

        let id = world.build_tower(Side::Red, kind, x, 0).unwrap();
        let after_build = world.side(Side::Red).balance;
        prop_assert!((after_build - (balance - f64::from(kind.cost()))).abs() < 1e-9);

        let refund = world.sell_tower(Side::Red, id).unwrap();
        prop_assert!((refund - f64::from(kind.cost()) * constants.refund_ratio).abs() < 1e-9);
        prop_assert!((world.side(Side::Red).balance - (after_build + refund)).abs() < 1e-9);
        prop_assert!(world.is_placeable(Side::Red, x, 0));
        prop_assert!(world.sell_tower(Side::Red, id).is_err());
    }
}
