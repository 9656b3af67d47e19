//! Match driver and series runner.
//!
//! Provides a pure function interface:
//! `(blue, red, map, config) -> MatchResult`.
//!
//! One tick runs the environment steps on the authoritative
//! [`WorldState`], then invokes blue and red in turn, each on a detached
//! thread bounded by its remaining compute budget (see [`crate::sandbox`]).
//! A completed invocation's command buffer is replayed onto the world; a
//! failed or abandoned one is discarded whole.
//!
//! # Determinism
//!
//! Given the same strategies, map and seed, a match that no side loses on
//! time always produces the same result.

use std::any::Any;
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::error::{MatchError, StrategyInitError};
use crate::game::{Controller, Map, Side, SidePair, WorldState, assert_invariants};
use crate::replay::{Replay, ReplayMetadata, TickRecord};
use crate::sandbox::{self, Invocation};
use crate::strategy::{Contender, Strategy};

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A side's health reached zero.
    HealthDepleted,
    /// Exactly one side failed its invocation.
    SideFailed,
    /// Both sides failed in the same tick.
    BothFailed,
    /// A side's strategy could not be constructed.
    ConstructionFailed,
    /// The configured turn cap was reached.
    TurnLimit,
}

/// Step of the tie-break chain that decided the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Higher remaining health.
    Health,
    /// Higher balance plus owned tower cost.
    NetWorth,
    /// Seeded coin flip.
    CoinFlip,
}

/// Final result of a match.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// The winning side. Every match has exactly one.
    pub winner: Side,
    /// What ended the match.
    pub reason: EndReason,
    /// Tie-break step used, if the chain was consulted.
    pub tie_break: Option<TieBreak>,
    /// Ticks played.
    pub turns: u32,
    /// Final health.
    pub health: SidePair<u32>,
    /// Final balance.
    pub balance: SidePair<f64>,
    /// Full replay log.
    pub replay: Replay,
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    winner: Side,
    reason: EndReason,
    tie_break: Option<TieBreak>,
}

impl Outcome {
    const fn win(winner: Side, reason: EndReason) -> Self {
        Self {
            winner,
            reason,
            tie_break: None,
        }
    }
}

/// Run a complete match between two contenders.
///
/// # Errors
///
/// Returns [`MatchError::Engine`] if the engine detects an internal fault.
/// Strategy failures never produce an error; they decide the match.
pub fn run_match(
    blue: &Contender,
    red: &Contender,
    map: Arc<Map>,
    config: &MatchConfig,
) -> Result<MatchResult, MatchError> {
    info!(
        blue = blue.name(),
        red = red.name(),
        map = map.name(),
        seed = config.seed,
        "match starting"
    );
    let runner = MatchRunner::new(blue, red, map, config);
    let result = runner.run()?;
    info!(
        winner = %result.winner,
        reason = ?result.reason,
        tie_break = ?result.tie_break,
        turns = result.turns,
        "match finished"
    );
    Ok(result)
}

/// Build a strategy, treating a panicking constructor as a failed one.
fn build_guarded(contender: &Contender, map: &Map) -> Result<Box<dyn Strategy>, StrategyInitError> {
    panic::catch_unwind(AssertUnwindSafe(|| contender.build(&Map::clone(map))))
        .unwrap_or_else(|payload| Err(StrategyInitError(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("constructor panicked: {detail}"),
        None => "constructor panicked".to_string(),
    }
}

/// Drives one match to completion.
struct MatchRunner {
    world: WorldState,
    strategies: SidePair<Option<Box<dyn Strategy>>>,
    names: SidePair<String>,
    config: MatchConfig,
    ticks: Vec<TickRecord>,
}

impl MatchRunner {
    fn new(blue: &Contender, red: &Contender, map: Arc<Map>, config: &MatchConfig) -> Self {
        let contenders = SidePair::new(blue, red);
        // Each side builds from its own copy of the geometry.
        let strategies = SidePair::from_fn(|side| {
            let contender = contenders[side];
            match build_guarded(contender, &map) {
                Ok(strategy) => Some(strategy),
                Err(e) => {
                    warn!(%side, bot = contender.name(), error = %e, "strategy construction failed");
                    None
                }
            }
        });
        Self {
            world: WorldState::new(map, config.constants),
            strategies,
            names: SidePair::from_fn(|side| contenders[side].name().to_string()),
            config: *config,
            ticks: Vec::new(),
        }
    }

    fn run(mut self) -> Result<MatchResult, MatchError> {
        let outcome = match (self.strategies.blue.is_some(), self.strategies.red.is_some()) {
            (true, true) => self.play()?,
            (true, false) => Outcome::win(Side::Blue, EndReason::ConstructionFailed),
            (false, true) => Outcome::win(Side::Red, EndReason::ConstructionFailed),
            (false, false) => self.tie_break(EndReason::ConstructionFailed),
        };
        Ok(self.finish(outcome))
    }

    fn play(&mut self) -> Result<Outcome, MatchError> {
        loop {
            if self
                .config
                .max_turns
                .is_some_and(|limit| self.world.turn() >= limit)
            {
                return Ok(self.tie_break(EndReason::TurnLimit));
            }
            if let Some(outcome) = self.tick()? {
                return Ok(outcome);
            }
        }
    }

    /// Run one tick. Returns the outcome if the match ended.
    fn tick(&mut self) -> Result<Option<Outcome>, MatchError> {
        self.world.start_tick();
        self.world.spawn_natural_debris();
        self.world.resolve_injections();
        self.world.pay_passive_income();
        self.world.decay_cooldowns();
        self.world.advance_debris();

        if self.world.any_defeated() {
            self.record();
            return Ok(Some(self.health_outcome()));
        }

        self.world.accrue_budget();
        self.world.pay_farms();

        let budgets = SidePair::from_fn(|side| self.world.side(side).time_remaining);
        let blue_ok = self.invoke(Side::Blue, &budgets)?;
        let red_ok = self.invoke(Side::Red, &budgets)?;
        assert_invariants(&self.world);
        self.record();

        debug!(
            turn = self.world.turn(),
            blue_health = self.world.side(Side::Blue).health,
            red_health = self.world.side(Side::Red).health,
            blue_balance = self.world.side(Side::Blue).balance,
            red_balance = self.world.side(Side::Red).balance,
            "tick"
        );

        Ok(match (blue_ok, red_ok) {
            (true, true) => None,
            (true, false) => Some(Outcome::win(Side::Blue, EndReason::SideFailed)),
            (false, true) => Some(Outcome::win(Side::Red, EndReason::SideFailed)),
            (false, false) => Some(self.tie_break(EndReason::BothFailed)),
        })
    }

    /// Invoke one side's strategy and apply its commands on success.
    /// Returns whether the side survived the tick.
    ///
    /// Both snapshots report the budgets from before either side ran.
    fn invoke(&mut self, side: Side, budgets: &SidePair<Duration>) -> Result<bool, MatchError> {
        let Some(strategy) = self.strategies[side].take() else {
            return Ok(false);
        };
        let turn = self.world.turn();
        let budget = budgets[side];
        let mut snapshot = self.world.clone();
        for s in Side::ALL {
            snapshot.side_mut(s).time_remaining = budgets[s];
        }
        let controller = Controller::new(side, snapshot);

        match sandbox::invoke(strategy, controller, budget) {
            Invocation::Completed {
                strategy,
                controller,
                elapsed,
                result,
            } => {
                let (commands, fault) = controller.into_parts();
                if let Some(fault) = fault {
                    return Err(fault.into());
                }
                self.strategies[side] = Some(strategy);
                if elapsed > budget {
                    warn!(%side, turn, ?elapsed, ?budget, "strategy overran its budget");
                    self.world.side_mut(side).time_remaining = Duration::ZERO;
                    return Ok(false);
                }
                self.world.side_mut(side).time_remaining = budget - elapsed;
                if let Err(e) = result {
                    warn!(%side, turn, error = %e, "strategy failed");
                    return Ok(false);
                }
                for command in commands {
                    command.apply(&mut self.world, side)?;
                }
                Ok(true)
            }
            Invocation::TimedOut => {
                warn!(%side, turn, ?budget, "strategy timed out");
                self.world.side_mut(side).time_remaining = Duration::ZERO;
                Ok(false)
            }
            Invocation::Faulted { reason } => {
                warn!(%side, turn, %reason, "strategy faulted");
                Ok(false)
            }
        }
    }

    fn record(&mut self) {
        self.ticks.push(TickRecord::capture(&self.world));
    }

    /// Winner once a side is at zero health.
    fn health_outcome(&self) -> Outcome {
        let blue = self.world.side(Side::Blue).is_defeated();
        let red = self.world.side(Side::Red).is_defeated();
        match (blue, red) {
            (true, true) => self.tie_break(EndReason::HealthDepleted),
            (true, false) => Outcome::win(Side::Red, EndReason::HealthDepleted),
            _ => Outcome::win(Side::Blue, EndReason::HealthDepleted),
        }
    }

    /// Health, then net worth, then a seeded coin flip.
    fn tie_break(&self, reason: EndReason) -> Outcome {
        let by_health = self
            .world
            .side(Side::Blue)
            .health
            .cmp(&self.world.side(Side::Red).health);
        let by_net_worth = self
            .world
            .net_worth(Side::Blue)
            .total_cmp(&self.world.net_worth(Side::Red));

        let (winner, step) = match (by_health, by_net_worth) {
            (Ordering::Greater, _) => (Side::Blue, TieBreak::Health),
            (Ordering::Less, _) => (Side::Red, TieBreak::Health),
            (Ordering::Equal, Ordering::Greater) => (Side::Blue, TieBreak::NetWorth),
            (Ordering::Equal, Ordering::Less) => (Side::Red, TieBreak::NetWorth),
            (Ordering::Equal, Ordering::Equal) => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
                let winner = if rng.gen_bool(0.5) { Side::Blue } else { Side::Red };
                (winner, TieBreak::CoinFlip)
            }
        };
        Outcome {
            winner,
            reason,
            tie_break: Some(step),
        }
    }

    fn finish(self, outcome: Outcome) -> MatchResult {
        let metadata = ReplayMetadata::new(
            self.world.map(),
            &self.names.blue,
            &self.names.red,
            outcome.winner,
        );
        MatchResult {
            winner: outcome.winner,
            reason: outcome.reason,
            tie_break: outcome.tie_break,
            turns: self.world.turn(),
            health: SidePair::from_fn(|side| self.world.side(side).health),
            balance: SidePair::from_fn(|side| self.world.side(side).balance),
            replay: Replay {
                ticks: self.ticks,
                metadata,
            },
        }
    }
}

/// Summary of one game in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesGame {
    /// Seed the game ran with.
    pub seed: u64,
    /// Winning side.
    pub winner: Side,
    /// What ended the game.
    pub reason: EndReason,
    /// Ticks played.
    pub turns: u32,
}

/// Aggregate result of a series.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    /// Per-game results in seed order.
    pub games: Vec<SeriesGame>,
    /// Wins per side.
    pub wins: SidePair<u32>,
}

impl SeriesSummary {
    /// Mean ticks per game.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_turns(&self) -> f64 {
        if self.games.is_empty() {
            return 0.0;
        }
        let total: u64 = self.games.iter().map(|g| u64::from(g.turns)).sum();
        total as f64 / self.games.len() as f64
    }
}

/// Run `games` matches in parallel with seeds `config.seed + i`.
///
/// `on_game` is called from worker threads as each game finishes.
///
/// # Errors
///
/// Returns the first engine error any game hit.
pub fn run_series<F>(
    blue: &Contender,
    red: &Contender,
    map: &Arc<Map>,
    config: &MatchConfig,
    games: u32,
    on_game: F,
) -> Result<SeriesSummary, MatchError>
where
    F: Fn(&SeriesGame) + Sync,
{
    let results: Vec<SeriesGame> = (0..games)
        .into_par_iter()
        .map(|i| -> Result<SeriesGame, MatchError> {
            let seed = config.seed.wrapping_add(u64::from(i));
            let game_config = MatchConfig { seed, ..*config };
            let result = run_match(blue, red, Arc::clone(map), &game_config)?;
            let game = SeriesGame {
                seed,
                winner: result.winner,
                reason: result.reason,
                turns: result.turns,
            };
            on_game(&game);
            Ok(game)
        })
        .collect::<Result<_, MatchError>>()?;

    let mut wins = SidePair::new(0, 0);
    for game in &results {
        wins[game.winner] += 1;
    }
    Ok(SeriesSummary {
        games: results,
        wins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConstants;
    use crate::error::{ControllerError, StrategyInitError};
    use crate::game::TowerKind;

    fn lane(len: usize) -> Arc<Map> {
        let rows: Vec<&str> = std::iter::repeat_n("SPS", len).collect();
        Arc::new(Map::from_ascii("lane", &rows).unwrap())
    }

    fn idle() -> Contender {
        Contender::builtin("idle").unwrap()
    }

    fn failing() -> Contender {
        Contender::new("failing", |_: &Map| {
            Ok(Box::new(|_: &mut Controller| -> Result<(), ControllerError> {
                Err(ControllerError::Precondition("test"))
            }) as Box<dyn Strategy>)
        })
    }

    fn broken() -> Contender {
        Contender::new("broken", |_: &Map| Err(StrategyInitError("no".to_string())))
    }

    #[test]
    fn test_turn_limit_uses_tie_break() {
        let config = MatchConfig {
            max_turns: Some(5),
            ..MatchConfig::default()
        };
        let result = run_match(&idle(), &idle(), lane(10), &config).unwrap();
        assert_eq!(result.reason, EndReason::TurnLimit);
        assert_eq!(result.tie_break, Some(TieBreak::CoinFlip));
        assert_eq!(result.turns, 5);
        assert_eq!(result.replay.ticks.len(), 5);
        assert!((result.balance.blue - 1550.0).abs() < 1e-9);
    }

    #[test]
    fn test_coin_flip_is_seeded() {
        let config = MatchConfig {
            max_turns: Some(1),
            seed: 42,
            ..MatchConfig::default()
        };
        let first = run_match(&idle(), &idle(), lane(5), &config).unwrap();
        let second = run_match(&idle(), &idle(), lane(5), &config).unwrap();
        assert_eq!(first.winner, second.winner);
    }

    #[test]
    fn test_net_worth_breaks_tie() {
        let builder = Contender::new("builder", |_: &Map| {
            Ok(Box::new(|rc: &mut Controller| -> Result<(), ControllerError> {
                // Alternate between building and selling one gunship.
                match rc.towers(rc.ally_side()).first() {
                    Some(tower) => rc.sell_tower(tower.id),
                    None => rc.build_tower(TowerKind::Gunship, 0, 0).map(|_| ()),
                }
            }) as Box<dyn Strategy>)
        });
        let config = MatchConfig {
            max_turns: Some(3),
            ..MatchConfig::default()
        };
        // Selling refunds 80%, so the builder ends poorer than idle.
        let result = run_match(&builder, &idle(), lane(10), &config).unwrap();
        assert_eq!(result.tie_break, Some(TieBreak::NetWorth));
        assert_eq!(result.winner, Side::Red);
    }

    #[test]
    fn test_single_failure_loses() {
        let result = run_match(&failing(), &idle(), lane(10), &MatchConfig::default()).unwrap();
        assert_eq!(result.winner, Side::Red);
        assert_eq!(result.reason, EndReason::SideFailed);
        assert_eq!(result.turns, 1);
        assert_eq!(result.replay.ticks.len(), 1);
    }

    #[test]
    fn test_double_failure_ties() {
        let result = run_match(&failing(), &failing(), lane(10), &MatchConfig::default()).unwrap();
        assert_eq!(result.reason, EndReason::BothFailed);
        assert!(result.tie_break.is_some());
    }

    #[test]
    fn test_construction_failure_forfeits() {
        let result = run_match(&idle(), &broken(), lane(10), &MatchConfig::default()).unwrap();
        assert_eq!(result.winner, Side::Blue);
        assert_eq!(result.reason, EndReason::ConstructionFailed);
        assert_eq!(result.turns, 0);
        assert!(result.replay.ticks.is_empty());
        assert_eq!(result.replay.metadata.winner, Side::Blue);

        let both = run_match(&broken(), &broken(), lane(10), &MatchConfig::default()).unwrap();
        assert_eq!(both.tie_break, Some(TieBreak::CoinFlip));
    }

    #[test]
    fn test_panicking_constructor_is_a_failed_build() {
        let panicky = Contender::new("panicky", |_: &Map| panic!("no lane for me"));
        let map = lane(10);
        let err = build_guarded(&panicky, &map).err().unwrap();
        assert_eq!(err.0, "constructor panicked: no lane for me");

        let formatted = Contender::new("formatted", |map: &Map| panic!("bad map {}", map.name()));
        let err = build_guarded(&formatted, &map).err().unwrap();
        assert_eq!(err.0, "constructor panicked: bad map lane");
    }

    #[test]
    fn test_zero_budget_times_out() {
        let config = MatchConfig {
            constants: GameConstants {
                initial_budget_secs: 0.0,
                budget_increment_secs: 0.0,
                ..GameConstants::default()
            },
            ..MatchConfig::default()
        };
        let result = run_match(&idle(), &idle(), lane(10), &config).unwrap();
        assert_eq!(result.reason, EndReason::BothFailed);
        assert_eq!(result.turns, 1);
    }

    #[test]
    fn test_series_counts_wins() {
        let config = MatchConfig {
            max_turns: Some(2),
            ..MatchConfig::default()
        };
        let seen = std::sync::atomic::AtomicU32::new(0);
        let summary = run_series(&idle(), &failing(), &lane(5), &config, 4, |_| {
            seen.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        })
        .unwrap();
        assert_eq!(summary.games.len(), 4);
        assert_eq!(summary.wins.blue, 4);
        assert_eq!(seen.into_inner(), 4);
        assert_eq!(summary.games[3].seed, 3);
        assert!((summary.average_turns() - 1.0).abs() < 1e-9);
    }
}
