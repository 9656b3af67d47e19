//! Authoritative world state.
//!
//! [`WorldState`] owns every entity and per-side resource of one match. The
//! tick pipeline drives it through the environment steps (`spawn_*`,
//! `decay_cooldowns`, `advance_debris`, ...), while strategy actions go
//! through the validating methods (`build_tower`, `snipe`, ...) that the
//! [`Controller`](crate::game::Controller) calls on its private snapshot and
//! the pipeline later replays on the real state.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::GameConstants;
use crate::error::{ControllerError, EngineError};
use crate::game::economy::debris_cost;
use crate::game::schedule::debris_schedule;
use crate::game::{
    Coord, Debris, DebrisId, IdAllocator, Injection, Map, Side, SidePair, SideState, Tower,
    TowerId, TowerKind,
};

/// An attack performed this tick, kept for the replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttackEvent {
    /// Single-target shot from a gunship.
    Snipe {
        /// Tower position.
        from: Coord,
        /// Target position.
        to: Coord,
    },
    /// Area blast centred on a bomber.
    Bomb {
        /// Tower position.
        at: Coord,
    },
}

/// Currency amounts are fractional after refunds.
#[allow(clippy::cast_precision_loss)]
fn currency(amount: u64) -> f64 {
    amount as f64
}

/// Complete mutable state of one match.
#[derive(Debug, Clone)]
pub struct WorldState {
    map: Arc<Map>,
    constants: GameConstants,
    turn: u32,
    sides: SidePair<SideState>,
    towers: SidePair<BTreeMap<TowerId, Tower>>,
    debris: SidePair<BTreeMap<DebrisId, Debris>>,
    attacks: SidePair<Vec<AttackEvent>>,
    ids: IdAllocator,
}

impl WorldState {
    /// Create the state at turn 0 with starting resources for both sides.
    #[must_use]
    pub fn new(map: Arc<Map>, constants: GameConstants) -> Self {
        let start = SideState::new(
            constants.starting_balance,
            constants.starting_health,
            constants.initial_budget(),
        );
        Self {
            map,
            constants,
            turn: 0,
            sides: SidePair::new(start.clone(), start),
            towers: SidePair::default(),
            debris: SidePair::default(),
            attacks: SidePair::default(),
            ids: IdAllocator::new(),
        }
    }

    /// The match map.
    #[must_use]
    pub fn map(&self) -> &Arc<Map> {
        &self.map
    }

    /// Constants this match runs with.
    #[must_use]
    pub const fn constants(&self) -> &GameConstants {
        &self.constants
    }

    /// Current turn number (1 on the first tick).
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Resources of one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &SideState {
        &self.sides[side]
    }

    /// Mutable resources of one side.
    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        &mut self.sides[side]
    }

    /// Towers owned by `side`, in id order.
    pub fn towers(&self, side: Side) -> impl Iterator<Item = &Tower> + '_ {
        self.towers[side].values()
    }

    /// Look up one of `side`'s towers.
    #[must_use]
    pub fn tower(&self, side: Side, id: TowerId) -> Option<&Tower> {
        self.towers[side].get(&id)
    }

    /// Debris on `side`'s lane, in id order.
    pub fn debris(&self, side: Side) -> impl Iterator<Item = &Debris> + '_ {
        self.debris[side].values()
    }

    /// Look up debris on `side`'s lane.
    #[must_use]
    pub fn find_debris(&self, side: Side, id: DebrisId) -> Option<&Debris> {
        self.debris[side].get(&id)
    }

    /// Attacks `side` made this tick.
    #[must_use]
    pub fn attacks(&self, side: Side) -> &[AttackEvent] {
        &self.attacks[side]
    }

    /// Balance plus the nominal cost of every owned tower.
    #[must_use]
    pub fn net_worth(&self, side: Side) -> f64 {
        let towers: u64 = self.towers(side).map(|t| u64::from(t.kind.cost())).sum();
        self.sides[side].balance + currency(towers)
    }

    /// True once either side has no health left.
    #[must_use]
    pub fn any_defeated(&self) -> bool {
        Side::ALL.iter().any(|&s| self.sides[s].is_defeated())
    }

    // ---- tick pipeline steps ----

    /// Clear this tick's attack logs and advance the turn counter.
    pub fn start_tick(&mut self) {
        for side in Side::ALL {
            self.attacks[side].clear();
        }
        self.turn += 1;
    }

    /// Create debris at the lane entry of `side`.
    pub fn spawn_debris(
        &mut self,
        side: Side,
        cooldown: u32,
        health: u32,
        sent_by_opponent: bool,
    ) -> DebrisId {
        let id = self.ids.debris();
        let entry = self.map.entry();
        let debris = Debris::new(id, side, entry, cooldown, health, sent_by_opponent);
        self.debris[side].insert(id, debris);
        id
    }

    /// Spawn this turn's scheduled debris on both lanes.
    pub fn spawn_natural_debris(&mut self) {
        if let Some((cooldown, health)) = debris_schedule(self.turn) {
            for side in Side::ALL {
                self.spawn_debris(side, cooldown, health, false);
            }
        }
    }

    /// Spawn each side's pending injection on the opposing lane.
    pub fn resolve_injections(&mut self) {
        for side in Side::ALL {
            if let Some(Injection { cooldown, health }) = self.sides[side].pending_injection.take() {
                self.spawn_debris(side.opponent(), cooldown, health, true);
            }
        }
    }

    /// Both sides earn the passive income.
    pub fn pay_passive_income(&mut self) {
        for side in Side::ALL {
            self.sides[side].balance += self.constants.passive_income;
        }
    }

    /// Tick every debris cooldown down by one and every tower cooldown down
    /// by its [`Self::tower_cooldown_reduction`], both floored at zero.
    pub fn decay_cooldowns(&mut self) {
        for side in Side::ALL {
            for debris in self.debris[side].values_mut() {
                debris.cooldown = debris.cooldown.saturating_sub(1);
            }

            let reductions: Vec<(TowerId, f64)> = self
                .towers(side)
                .filter_map(|t| {
                    self.tower_cooldown_reduction(side, t.id)
                        .ok()
                        .map(|reduction| (t.id, reduction))
                })
                .collect();
            for (id, reduction) in reductions {
                if let Some(tower) = self.towers[side].get_mut(&id) {
                    tower.cooldown = (tower.cooldown - reduction).max(0.0);
                }
            }
        }
    }

    /// Cooldown reduction applied to a tower each tick:
    /// `multiplier ^ (same-side reinforcers in range)`, counting the tower
    /// itself when it is a reinforcer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownTower`] if `id` is not one of `side`'s towers.
    pub fn tower_cooldown_reduction(&self, side: Side, id: TowerId) -> Result<f64, EngineError> {
        let at = self.tower(side, id).ok_or(EngineError::UnknownTower(id))?.position;
        let range = TowerKind::Reinforcer.range_squared();
        let n = self
            .towers(side)
            .filter(|t| t.kind == TowerKind::Reinforcer && t.position.distance_squared(at) <= range)
            .count();
        Ok(self
            .constants
            .reinforcer_multiplier
            .powi(i32::try_from(n).unwrap_or(i32::MAX)))
    }

    /// Move every debris whose cooldown has elapsed one cell along the lane.
    ///
    /// Debris stepping past the last cell is removed and its max health is
    /// subtracted from the lane owner's health.
    pub fn advance_debris(&mut self) {
        let map = Arc::clone(&self.map);
        let path = map.path();
        for side in Side::ALL {
            let mut arrived = Vec::new();
            for debris in self.debris[side].values_mut() {
                if debris.cooldown > 0 {
                    continue;
                }
                debris.cooldown = debris.max_cooldown;
                debris.progress += 1;
                match path.get(debris.progress) {
                    Some(&next) => debris.position = next,
                    None => arrived.push((debris.id, debris.max_health)),
                }
            }
            for (id, damage) in arrived {
                self.debris[side].remove(&id);
                self.sides[side].take_damage(damage);
            }
        }
    }

    /// Both sides gain budget for the coming invocation.
    pub fn accrue_budget(&mut self) {
        let increment = self.constants.budget_increment();
        for side in Side::ALL {
            self.sides[side].time_remaining += increment;
        }
    }

    /// Every ready farm pays its owner and restarts its cooldown.
    pub fn pay_farms(&mut self) {
        for side in Side::ALL {
            let mut income = 0.0;
            for tower in self.towers[side].values_mut() {
                if tower.kind == TowerKind::Farm && tower.is_ready() {
                    income += self.constants.farm_income;
                    tower.reset_cooldown();
                }
            }
            self.sides[side].balance += income;
        }
    }

    /// Subtract `amount` from a debris, removing it at zero health.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownDebris`] if no lane holds `id`. Callers
    /// validate ids first, so this indicates an engine bug.
    pub fn damage_debris(&mut self, id: DebrisId, amount: u32) -> Result<(), EngineError> {
        let side = Side::ALL
            .into_iter()
            .find(|&s| self.debris[s].contains_key(&id))
            .ok_or(EngineError::UnknownDebris(id))?;
        let lane = &mut self.debris[side];
        let dead = match lane.get_mut(&id) {
            Some(debris) => {
                debris.health = debris.health.saturating_sub(amount);
                debris.health == 0
            }
            None => return Err(EngineError::UnknownDebris(id)),
        };
        if dead {
            lane.remove(&id);
        }
        Ok(())
    }

    // ---- validated actions ----

    /// True if the cell is SPACE and holds no tower of `side`. Ignores cost.
    #[must_use]
    pub fn is_placeable(&self, side: Side, x: i32, y: i32) -> bool {
        self.map.is_space(x, y)
            && !self
                .towers(side)
                .any(|t| t.position == Coord::new(x, y))
    }

    /// True if `side` can afford `kind` and the cell is placeable.
    #[must_use]
    pub fn can_build_tower(&self, side: Side, kind: TowerKind, x: i32, y: i32) -> bool {
        self.sides[side].balance >= f64::from(kind.cost()) && self.is_placeable(side, x, y)
    }

    /// Build a tower for `side`, paying its cost.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Precondition`] if [`Self::can_build_tower`] is false.
    pub fn build_tower(
        &mut self,
        side: Side,
        kind: TowerKind,
        x: i32,
        y: i32,
    ) -> Result<TowerId, ControllerError> {
        if !self.can_build_tower(side, kind, x, y) {
            return Err(ControllerError::Precondition("build_tower"));
        }
        let id = self.ids.tower();
        self.sides[side].balance -= f64::from(kind.cost());
        self.towers[side].insert(id, Tower::new(id, side, kind, Coord::new(x, y)));
        Ok(id)
    }

    /// Remove one of `side`'s towers and refund part of its cost.
    /// Returns the refund.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownTower`] if `side` owns no such tower.
    pub fn sell_tower(&mut self, side: Side, id: TowerId) -> Result<f64, ControllerError> {
        let tower = self.towers[side]
            .remove(&id)
            .ok_or(ControllerError::UnknownTower(id))?;
        let refund = f64::from(tower.kind.cost()) * self.constants.refund_ratio;
        self.sides[side].balance += refund;
        Ok(refund)
    }

    fn own_tower(&self, side: Side, id: TowerId) -> Result<&Tower, ControllerError> {
        self.tower(side, id).ok_or(ControllerError::UnknownTower(id))
    }

    fn own_debris(&self, side: Side, id: DebrisId) -> Result<&Debris, ControllerError> {
        self.find_debris(side, id)
            .ok_or(ControllerError::UnknownDebris(id))
    }

    /// Whether `tower` can snipe `debris` right now.
    ///
    /// # Errors
    ///
    /// Fails if either id does not belong to `side`. A non-gunship, a tower
    /// on cooldown or a target out of range yields `Ok(false)`.
    pub fn can_snipe(
        &self,
        side: Side,
        tower: TowerId,
        debris: DebrisId,
    ) -> Result<bool, ControllerError> {
        let tower = self.own_tower(side, tower)?;
        let debris = self.own_debris(side, debris)?;
        Ok(tower.kind == TowerKind::Gunship && tower.is_ready() && tower.in_range(debris.position))
    }

    /// Fire a gunship at one debris.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::can_snipe`], or with [`ControllerError::Precondition`]
    /// when it returns false.
    pub fn snipe(
        &mut self,
        side: Side,
        tower: TowerId,
        debris: DebrisId,
    ) -> Result<(), ControllerError> {
        if !self.can_snipe(side, tower, debris)? {
            return Err(ControllerError::Precondition("snipe"));
        }
        let from = self.own_tower(side, tower)?.position;
        let to = self.own_debris(side, debris)?.position;
        if let Some(t) = self.towers[side].get_mut(&tower) {
            t.reset_cooldown();
        }
        self.attacks[side].push(AttackEvent::Snipe { from, to });
        self.damage_debris(debris, TowerKind::Gunship.stats().damage)?;
        Ok(())
    }

    /// Whether a bomber is off cooldown.
    ///
    /// # Errors
    ///
    /// Fails if `side` owns no such tower or it is not a bomber.
    pub fn can_bomb(&self, side: Side, tower: TowerId) -> Result<bool, ControllerError> {
        let t = self.own_tower(side, tower)?;
        if t.kind != TowerKind::Bomber {
            return Err(ControllerError::WrongTowerKind {
                id: tower,
                expected: TowerKind::Bomber,
                found: t.kind,
            });
        }
        Ok(t.is_ready())
    }

    /// Detonate a bomber, damaging every debris in range on `side`'s lane.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::can_bomb`], or with [`ControllerError::Precondition`]
    /// when it returns false.
    pub fn bomb(&mut self, side: Side, tower: TowerId) -> Result<(), ControllerError> {
        if !self.can_bomb(side, tower)? {
            return Err(ControllerError::Precondition("bomb"));
        }
        let bomber = self.own_tower(side, tower)?.clone();
        let targets: Vec<DebrisId> = self
            .debris(side)
            .filter(|d| bomber.in_range(d.position))
            .map(|d| d.id)
            .collect();
        if let Some(t) = self.towers[side].get_mut(&tower) {
            t.reset_cooldown();
        }
        self.attacks[side].push(AttackEvent::Bomb {
            at: bomber.position,
        });
        let damage = TowerKind::Bomber.stats().damage;
        for id in targets {
            self.damage_debris(id, damage)?;
        }
        Ok(())
    }

    /// Whether `side` may queue an injection now.
    #[must_use]
    pub fn can_send_debris(&self, side: Side, cooldown: u32, health: u32) -> bool {
        let state = &self.sides[side];
        state.pending_injection.is_none()
            && cooldown > 0
            && health > 0
            && state.balance >= currency(debris_cost(cooldown, health))
    }

    /// Pay for and queue an injection onto the opponent's lane.
    /// Returns the price paid.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Precondition`] if [`Self::can_send_debris`] is false.
    pub fn send_debris(
        &mut self,
        side: Side,
        cooldown: u32,
        health: u32,
    ) -> Result<u64, ControllerError> {
        if !self.can_send_debris(side, cooldown, health) {
            return Err(ControllerError::Precondition("send_debris"));
        }
        let cost = debris_cost(cooldown, health);
        let state = &mut self.sides[side];
        state.balance -= currency(cost);
        state.pending_injection = Some(Injection { cooldown, health });
        Ok(cost)
    }
}
