//! The capability interface handed to strategy code.
//!
//! A [`Controller`] is bound to one side for one invocation. It owns a
//! private snapshot of the world: queries read that snapshot and return
//! copies, mutations validate and apply against it and append a
//! [`Command`] to a buffer. Nothing the strategy does is visible to the
//! authoritative state until the pipeline replays the buffer with
//! [`Command::apply`], which only happens when the invocation completed in
//! time. An abandoned invocation keeps mutating a snapshot nobody reads.

use std::time::Duration;

use crate::error::{ControllerError, EngineError};
use crate::game::economy::debris_cost;
use crate::game::{Coord, Debris, DebrisId, Map, Side, Tower, TowerId, TowerKind, WorldState};

/// Target selection rule for [`Controller::auto_snipe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnipePriority {
    /// Furthest along the lane.
    First,
    /// Least far along the lane.
    Last,
    /// Closest to the gunship.
    Close,
    /// Lowest max health.
    Weak,
    /// Highest max health.
    Strong,
}

impl SnipePriority {
    /// Larger is preferred.
    fn key(self, debris: &Debris, tower: &Tower) -> i64 {
        let progress = i64::try_from(debris.progress).unwrap_or(i64::MAX);
        match self {
            SnipePriority::First => progress,
            SnipePriority::Last => -progress,
            SnipePriority::Close => -tower.position.distance_squared(debris.position),
            SnipePriority::Weak => -i64::from(debris.max_health),
            SnipePriority::Strong => i64::from(debris.max_health),
        }
    }
}

/// A committed strategy action, replayed onto the authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Build a tower; `id` is the id the snapshot allocated.
    Build {
        /// Tower kind.
        kind: TowerKind,
        /// Cartesian x.
        x: i32,
        /// Cartesian y.
        y: i32,
        /// Expected id.
        id: TowerId,
    },
    /// Sell a tower.
    Sell {
        /// Tower to sell.
        id: TowerId,
    },
    /// Snipe a resolved target.
    Snipe {
        /// Gunship.
        tower: TowerId,
        /// Target.
        debris: DebrisId,
    },
    /// Detonate a bomber.
    Bomb {
        /// Bomber.
        tower: TowerId,
    },
    /// Queue an injection.
    SendDebris {
        /// Cooldown of the injected unit.
        cooldown: u32,
        /// Health of the injected unit.
        health: u32,
    },
}

impl Command {
    /// Re-validate and apply this command for `side`.
    ///
    /// # Errors
    ///
    /// The snapshot accepted this command, so any rejection means the
    /// authoritative state diverged from it: [`EngineError::Divergence`].
    pub fn apply(self, world: &mut WorldState, side: Side) -> Result<(), EngineError> {
        let result = match self {
            Command::Build { kind, x, y, id } => match world.build_tower(side, kind, x, y) {
                Ok(built) if built == id => Ok(()),
                Ok(built) => {
                    return Err(EngineError::Divergence(format!(
                        "{side} built tower {built}, snapshot allocated {id}"
                    )));
                }
                Err(e) => Err(e),
            },
            Command::Sell { id } => world.sell_tower(side, id).map(|_| ()),
            Command::Snipe { tower, debris } => world.snipe(side, tower, debris),
            Command::Bomb { tower } => world.bomb(side, tower),
            Command::SendDebris { cooldown, health } => {
                world.send_debris(side, cooldown, health).map(|_| ())
            }
        };
        result.map_err(|e| match e {
            ControllerError::Engine(engine) => engine,
            other => EngineError::Divergence(format!("{side} {self:?}: {other}")),
        })
    }
}

/// Capability handle for one side's strategy invocation.
#[derive(Debug, Clone)]
pub struct Controller {
    side: Side,
    world: WorldState,
    commands: Vec<Command>,
    fault: Option<EngineError>,
}

impl Controller {
    /// Bind a controller to `side` over a private snapshot.
    #[must_use]
    pub fn new(side: Side, world: WorldState) -> Self {
        Self {
            side,
            world,
            commands: Vec::new(),
            fault: None,
        }
    }

    /// Commands committed so far.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// First engine fault observed while serving calls, if any.
    #[must_use]
    pub const fn fault(&self) -> Option<&EngineError> {
        self.fault.as_ref()
    }

    /// Consume the controller, yielding its command buffer and any fault.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Command>, Option<EngineError>) {
        (self.commands, self.fault)
    }

    /// Record an accepted command, or remember an engine fault.
    fn commit<T>(
        &mut self,
        result: Result<T, ControllerError>,
        command: impl FnOnce(&T) -> Command,
    ) -> Result<T, ControllerError> {
        match &result {
            Ok(value) => self.commands.push(command(value)),
            Err(ControllerError::Engine(e)) => {
                self.fault.get_or_insert_with(|| e.clone());
            }
            Err(_) => {}
        }
        result
    }

    // ---- queries ----

    /// The caller's side.
    #[must_use]
    pub const fn ally_side(&self) -> Side {
        self.side
    }

    /// The opposing side.
    #[must_use]
    pub const fn enemy_side(&self) -> Side {
        self.side.opponent()
    }

    /// Map geometry.
    #[must_use]
    pub fn map(&self) -> &Map {
        self.world.map()
    }

    /// Current turn number.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.world.turn()
    }

    /// Balance of `side`.
    #[must_use]
    pub fn balance(&self, side: Side) -> f64 {
        self.world.side(side).balance
    }

    /// Health of `side`.
    #[must_use]
    pub fn health(&self, side: Side) -> u32 {
        self.world.side(side).health
    }

    /// Budget `side` had when this tick's strategy invocations began.
    #[must_use]
    pub fn time_remaining(&self, side: Side) -> Duration {
        self.world.side(side).time_remaining
    }

    /// Price of an injection.
    #[must_use]
    pub fn debris_cost(&self, cooldown: u32, health: u32) -> u64 {
        debris_cost(cooldown, health)
    }

    /// All towers of `side`.
    #[must_use]
    pub fn towers(&self, side: Side) -> Vec<Tower> {
        self.world.towers(side).cloned().collect()
    }

    /// All debris on `side`'s lane.
    #[must_use]
    pub fn debris(&self, side: Side) -> Vec<Debris> {
        self.world.debris(side).cloned().collect()
    }

    /// Debris on `side`'s lane within squared radius `r2` of `(x, y)`.
    #[must_use]
    pub fn sense_debris_within_radius_squared(
        &self,
        side: Side,
        x: i32,
        y: i32,
        r2: i64,
    ) -> Vec<Debris> {
        let centre = Coord::new(x, y);
        self.world
            .debris(side)
            .filter(|d| d.position.distance_squared(centre) <= r2)
            .cloned()
            .collect()
    }

    /// Towers of `side` within squared radius `r2` of `(x, y)`.
    #[must_use]
    pub fn sense_towers_within_radius_squared(
        &self,
        side: Side,
        x: i32,
        y: i32,
        r2: i64,
    ) -> Vec<Tower> {
        let centre = Coord::new(x, y);
        self.world
            .towers(side)
            .filter(|t| t.position.distance_squared(centre) <= r2)
            .cloned()
            .collect()
    }

    fn own_tower(&self, id: TowerId) -> Result<&Tower, ControllerError> {
        self.world
            .tower(self.side, id)
            .ok_or(ControllerError::UnknownTower(id))
    }

    /// Debris on `side`'s lane within range of one of the caller's towers.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownTower`] if the caller owns no such tower.
    pub fn sense_debris_in_range_of_tower(
        &self,
        side: Side,
        tower: TowerId,
    ) -> Result<Vec<Debris>, ControllerError> {
        let t = self.own_tower(tower)?;
        Ok(self.sense_debris_within_radius_squared(
            side,
            t.position.x,
            t.position.y,
            t.kind.range_squared(),
        ))
    }

    /// Towers of `side` within range of one of the caller's towers.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownTower`] if the caller owns no such tower.
    pub fn sense_towers_in_range_of_tower(
        &self,
        side: Side,
        tower: TowerId,
    ) -> Result<Vec<Tower>, ControllerError> {
        let t = self.own_tower(tower)?;
        Ok(self.sense_towers_within_radius_squared(
            side,
            t.position.x,
            t.position.y,
            t.kind.range_squared(),
        ))
    }

    /// True if `side` could place a tower at `(x, y)`, ignoring cost.
    #[must_use]
    pub fn is_placeable(&self, side: Side, x: i32, y: i32) -> bool {
        self.world.is_placeable(side, x, y)
    }

    // ---- mutations ----

    /// True if the caller can afford `kind` and the cell is placeable.
    #[must_use]
    pub fn can_build_tower(&self, kind: TowerKind, x: i32, y: i32) -> bool {
        self.world.can_build_tower(self.side, kind, x, y)
    }

    /// Build a tower.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Precondition`] if [`Self::can_build_tower`] is false.
    pub fn build_tower(&mut self, kind: TowerKind, x: i32, y: i32) -> Result<TowerId, ControllerError> {
        let result = self.world.build_tower(self.side, kind, x, y);
        self.commit(result, |&id| Command::Build { kind, x, y, id })
    }

    /// Sell one of the caller's towers for a partial refund.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownTower`] if the caller owns no such tower.
    pub fn sell_tower(&mut self, id: TowerId) -> Result<(), ControllerError> {
        let result = self.world.sell_tower(self.side, id).map(|_| ());
        self.commit(result, |_| Command::Sell { id })
    }

    /// Whether `tower` can snipe `debris` now.
    ///
    /// # Errors
    ///
    /// Fails if either id is not the caller's. Non-gunships yield `Ok(false)`.
    pub fn can_snipe(&self, tower: TowerId, debris: DebrisId) -> Result<bool, ControllerError> {
        self.world.can_snipe(self.side, tower, debris)
    }

    /// Fire a gunship at a debris on the caller's lane.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::can_snipe`], or with [`ControllerError::Precondition`]
    /// when it returns false.
    pub fn snipe(&mut self, tower: TowerId, debris: DebrisId) -> Result<(), ControllerError> {
        let result = self.world.snipe(self.side, tower, debris);
        self.commit(result, |_| Command::Snipe { tower, debris })
    }

    /// Snipe the snipeable debris ranked highest by `priority`; no-op if none.
    ///
    /// # Errors
    ///
    /// Fails if the caller owns no such tower or it is not a gunship.
    pub fn auto_snipe(&mut self, tower: TowerId, priority: SnipePriority) -> Result<(), ControllerError> {
        let gunship = self.own_tower(tower)?;
        if gunship.kind != TowerKind::Gunship {
            return Err(ControllerError::WrongTowerKind {
                id: tower,
                expected: TowerKind::Gunship,
                found: gunship.kind,
            });
        }

        let mut best: Option<(i64, DebrisId)> = None;
        for debris in self.world.debris(self.side) {
            if !self.world.can_snipe(self.side, tower, debris.id)? {
                continue;
            }
            let key = priority.key(debris, gunship);
            if best.is_none_or(|(top, _)| key > top) {
                best = Some((key, debris.id));
            }
        }

        match best {
            Some((_, target)) => self.snipe(tower, target),
            None => Ok(()),
        }
    }

    /// Whether a bomber is off cooldown.
    ///
    /// # Errors
    ///
    /// Fails if the caller owns no such tower or it is not a bomber.
    pub fn can_bomb(&self, tower: TowerId) -> Result<bool, ControllerError> {
        self.world.can_bomb(self.side, tower)
    }

    /// Damage every debris on the caller's lane within the bomber's range.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::can_bomb`], or with [`ControllerError::Precondition`]
    /// when it returns false.
    pub fn bomb(&mut self, tower: TowerId) -> Result<(), ControllerError> {
        let result = self.world.bomb(self.side, tower);
        self.commit(result, |_| Command::Bomb { tower })
    }

    /// Bomb only if the bomber is ready and at least one debris is in range.
    ///
    /// # Errors
    ///
    /// Fails if the caller owns no such tower or it is not a bomber.
    pub fn auto_bomb(&mut self, tower: TowerId) -> Result<(), ControllerError> {
        if !self.can_bomb(tower)? {
            return Ok(());
        }
        if self.sense_debris_in_range_of_tower(self.side, tower)?.is_empty() {
            return Ok(());
        }
        self.bomb(tower)
    }

    /// Whether the caller may queue an injection now.
    #[must_use]
    pub fn can_send_debris(&self, cooldown: u32, health: u32) -> bool {
        self.world.can_send_debris(self.side, cooldown, health)
    }

    /// Pay for an injection that spawns on the opponent's lane next tick.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Precondition`] if [`Self::can_send_debris`] is false.
    pub fn send_debris(&mut self, cooldown: u32, health: u32) -> Result<(), ControllerError> {
        let result = self.world.send_debris(self.side, cooldown, health).map(|_| ());
        self.commit(result, |_| Command::SendDebris { cooldown, health })
    }
}
