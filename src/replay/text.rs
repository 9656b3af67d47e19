//! Plain-text tick summaries.
//!
//! ```text
//! === TURN 42 ===
//! blue: health 2490  balance 1920.0  budget 9.873s  towers 3  debris 2  attacks 1
//! red:  health 2500  balance  310.0  budget 9.990s  towers 1  debris 4  attacks 0
//! ```

#![allow(clippy::format_push_string)]

use crate::game::{AttackEvent, Side};
use crate::replay::TickRecord;

/// One block of text describing `record`.
#[must_use]
pub fn render_tick(record: &TickRecord) -> String {
    let mut output = format!("=== TURN {} ===\n", record.turn);
    for side in Side::ALL {
        let label = format!("{side}:");
        output.push_str(&format!(
            "{label:<5} health {:>4}  balance {:>7.1}  budget {:.3}s  towers {}  debris {}  attacks {}\n",
            record.health[side],
            record.balance[side],
            record.time_remaining[side],
            record.towers[side].len(),
            record.debris[side].len(),
            record.attacks[side].len(),
        ));
        for attack in &record.attacks[side] {
            output.push_str(&format!("  {}\n", describe(attack)));
        }
    }
    output
}

fn describe(attack: &AttackEvent) -> String {
    match attack {
        AttackEvent::Snipe { from, to } => {
            format!("snipe ({}, {}) -> ({}, {})", from.x, from.y, to.x, to.y)
        }
        AttackEvent::Bomb { at } => format!("bomb at ({}, {})", at.x, at.y),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::GameConstants;
    use crate::game::{Map, TowerKind, WorldState};

    #[test]
    fn test_render_tick() {
        let rows: Vec<&str> = std::iter::repeat_n("SPS", 4).collect();
        let map = Map::from_ascii("lane", &rows).unwrap();
        let mut world = WorldState::new(Arc::new(map), GameConstants::default());
        world.start_tick();
        let gun = world.build_tower(Side::Blue, TowerKind::Gunship, 0, 3).unwrap();
        let target = world.spawn_debris(Side::Blue, 5, 30, false);
        world.decay_cooldowns();
        world.snipe(Side::Blue, gun, target).unwrap();

        let text = render_tick(&TickRecord::capture(&world));
        assert!(text.starts_with("=== TURN 1 ===\n"));
        assert!(text.contains("blue: health 2500  balance   500.0"));
        assert!(text.contains("towers 1  debris 1  attacks 1"));
        assert!(text.contains("snipe (0, 3) -> (1, 3)"));
        assert!(text.contains("red:  health 2500"));
    }
}
