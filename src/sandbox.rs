//! Deadline-bounded strategy invocation.
//!
//! Each invocation runs on its own detached thread and owns everything it
//! touches: the strategy and a [`Controller`] over a private snapshot. The
//! caller waits on a channel up to the side's remaining budget. If the
//! deadline passes the thread is abandoned. It may keep running, but it can
//! only ever mutate its own snapshot, which nobody reads again.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, bounded};

use crate::error::ControllerError;
use crate::game::Controller;
use crate::strategy::Strategy;

/// Outcome of one deadline-bounded invocation.
pub enum Invocation {
    /// The strategy returned before the deadline.
    Completed {
        /// The strategy, handed back for the next tick.
        strategy: Box<dyn Strategy>,
        /// Controller with the committed command buffer.
        controller: Controller,
        /// Time spent inside `play_turn`.
        elapsed: Duration,
        /// What `play_turn` returned.
        result: Result<(), ControllerError>,
    },
    /// The deadline passed first; the thread was abandoned.
    TimedOut,
    /// The thread died without reporting (panic) or could not be spawned.
    Faulted {
        /// Human-readable cause.
        reason: String,
    },
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed {
                controller,
                elapsed,
                result,
                ..
            } => f
                .debug_struct("Completed")
                .field("commands", &controller.commands().len())
                .field("elapsed", elapsed)
                .field("result", result)
                .finish_non_exhaustive(),
            Self::TimedOut => f.write_str("TimedOut"),
            Self::Faulted { reason } => f.debug_struct("Faulted").field("reason", reason).finish(),
        }
    }
}

struct Report {
    strategy: Box<dyn Strategy>,
    controller: Controller,
    elapsed: Duration,
    result: Result<(), ControllerError>,
}

/// Run `strategy` for one tick with a hard wall-clock deadline of `budget`.
/// An exhausted budget times out without running the strategy.
#[must_use]
pub fn invoke(
    mut strategy: Box<dyn Strategy>,
    mut controller: Controller,
    budget: Duration,
) -> Invocation {
    if budget.is_zero() {
        return Invocation::TimedOut;
    }
    let (tx, rx) = bounded::<Report>(1);
    let name = format!("strategy-{}-t{}", controller.ally_side(), controller.turn());

    let spawned = thread::Builder::new().name(name).spawn(move || {
        let start = Instant::now();
        let result = strategy.play_turn(&mut controller);
        let elapsed = start.elapsed();
        // The receiver is gone once the deadline passed.
        let _ = tx.send(Report {
            strategy,
            controller,
            elapsed,
            result,
        });
    });
    if let Err(e) = spawned {
        return Invocation::Faulted {
            reason: format!("failed to spawn strategy thread: {e}"),
        };
    }

    match rx.recv_timeout(budget) {
        Ok(report) => Invocation::Completed {
            strategy: report.strategy,
            controller: report.controller,
            elapsed: report.elapsed,
            result: report.result,
        },
        Err(RecvTimeoutError::Timeout) => Invocation::TimedOut,
        Err(RecvTimeoutError::Disconnected) => Invocation::Faulted {
            reason: "strategy panicked".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::GameConstants;
    use crate::game::{Map, Side, TowerKind, WorldState};

    fn controller() -> Controller {
        let map = Map::from_ascii("lane", &["SPS", "SPS", "SPS"]).unwrap();
        let world = WorldState::new(Arc::new(map), GameConstants::default());
        Controller::new(Side::Blue, world)
    }

    #[test]
    fn test_completed_returns_commands() {
        let strategy: Box<dyn Strategy> = Box::new(|rc: &mut Controller| {
            rc.build_tower(TowerKind::Gunship, 0, 0).map(|_| ())
        });
        match invoke(strategy, controller(), Duration::from_secs(5)) {
            Invocation::Completed {
                controller, result, ..
            } => {
                assert!(result.is_ok());
                assert_eq!(controller.commands().len(), 1);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_error_is_reported() {
        let strategy: Box<dyn Strategy> = Box::new(|rc: &mut Controller| {
            rc.build_tower(TowerKind::Farm, 0, 0).map(|_| ())
        });
        match invoke(strategy, controller(), Duration::from_secs(5)) {
            Invocation::Completed { result, .. } => {
                assert_eq!(result, Err(ControllerError::Precondition("build_tower")));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_slow_strategy_times_out() {
        let strategy: Box<dyn Strategy> = Box::new(|_: &mut Controller| -> Result<(), ControllerError> {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        });
        let start = Instant::now();
        let outcome = invoke(strategy, controller(), Duration::from_millis(20));
        assert!(matches!(outcome, Invocation::TimedOut));
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_zero_budget_never_runs() {
        let strategy: Box<dyn Strategy> = Box::new(|_: &mut Controller| -> Result<(), ControllerError> {
            panic!("must not run")
        });
        assert!(matches!(
            invoke(strategy, controller(), Duration::ZERO),
            Invocation::TimedOut
        ));
    }

    #[test]
    fn test_panic_is_a_fault() {
        let strategy: Box<dyn Strategy> = Box::new(|_: &mut Controller| -> Result<(), ControllerError> {
            panic!("strategy bug")
        });
        let outcome = invoke(strategy, controller(), Duration::from_secs(5));
        assert!(matches!(outcome, Invocation::Faulted { .. }));
    }
}
