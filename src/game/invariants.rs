//! World invariants - sanity checks that detect engine bugs.
//!
//! Every mutation path validates its inputs, so these should never fire.
//! The match driver asserts them after each tick in debug builds.

use std::collections::HashSet;

use crate::game::{Coord, Side, WorldState};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all world invariants.
///
/// Returns every violation found, or an empty list if the state is sound.
#[must_use]
pub fn check_invariants(state: &WorldState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut report = |message: String| violations.push(InvariantViolation { message });

    let map = state.map();
    let path = map.path();
    let mut ids = HashSet::new();

    for side in Side::ALL {
        let resources = state.side(side);
        if !resources.balance.is_finite() || resources.balance < 0.0 {
            report(format!("{side} balance {} is not a valid amount", resources.balance));
        }
        if resources.health > state.constants().starting_health {
            report(format!(
                "{side} health {} exceeds starting health {}",
                resources.health,
                state.constants().starting_health
            ));
        }

        let mut cells: HashSet<Coord> = HashSet::new();
        for tower in state.towers(side) {
            if !ids.insert(tower.id.0) {
                report(format!("id {} is used more than once", tower.id));
            }
            if tower.side != side {
                report(format!("tower {} is filed under {side} but owned by {}", tower.id, tower.side));
            }
            if !map.is_space(tower.position.x, tower.position.y) {
                report(format!("tower {} stands on a non-space cell {:?}", tower.id, tower.position));
            }
            if !cells.insert(tower.position) {
                report(format!("{side} has two towers at {:?}", tower.position));
            }
            if !tower.cooldown.is_finite() || tower.cooldown < 0.0 {
                report(format!("tower {} has cooldown {}", tower.id, tower.cooldown));
            }
        }

        for debris in state.debris(side) {
            if !ids.insert(debris.id.0) {
                report(format!("id {} is used more than once", debris.id));
            }
            if debris.side != side {
                report(format!("debris {} is filed under {side} but owned by {}", debris.id, debris.side));
            }
            if debris.health == 0 || debris.health > debris.max_health {
                report(format!(
                    "debris {} has health {} of {}",
                    debris.id, debris.health, debris.max_health
                ));
            }
            if debris.cooldown > debris.max_cooldown {
                report(format!(
                    "debris {} has cooldown {} above its period {}",
                    debris.id, debris.cooldown, debris.max_cooldown
                ));
            }
            match path.get(debris.progress) {
                Some(&at) if at == debris.position => {}
                Some(&at) => report(format!(
                    "debris {} is at {:?} but its progress points to {at:?}",
                    debris.id, debris.position
                )),
                None => report(format!(
                    "debris {} progress {} is past the lane end",
                    debris.id, debris.progress
                )),
            }
        }
    }

    violations
}

/// Assert all world invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &WorldState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("World invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &WorldState) {}
