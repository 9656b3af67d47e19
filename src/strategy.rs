//! Strategy contract and the built-in strategies.
//!
//! A strategy is constructed once per match from a copy of the map, then
//! handed a [`Controller`] once per tick. Returning an error, panicking or
//! overrunning the compute budget fails the side for that tick.
//!
//! Any `FnMut(&mut Controller) -> Result<(), ControllerError> + Send`
//! closure is a strategy, which keeps ad-hoc strategies in tests short.

mod defender;
mod idle;
mod raider;

use std::fmt;
use std::sync::Arc;

pub use defender::Defender;
pub use idle::Idle;
pub use raider::Raider;

use crate::error::{ControllerError, MatchError, StrategyInitError};
use crate::game::{Controller, Coord, Map};

/// Per-tick decision logic for one side.
pub trait Strategy: Send {
    /// Act for one tick through `rc`.
    ///
    /// # Errors
    ///
    /// Any contract violation the strategy does not handle itself.
    fn play_turn(&mut self, rc: &mut Controller) -> Result<(), ControllerError>;
}

impl<F> Strategy for F
where
    F: FnMut(&mut Controller) -> Result<(), ControllerError> + Send,
{
    fn play_turn(&mut self, rc: &mut Controller) -> Result<(), ControllerError> {
        self(rc)
    }
}

/// Constructor for a built-in strategy.
pub type StrategyFactory = fn(&Map) -> Result<Box<dyn Strategy>, StrategyInitError>;

/// A registered strategy.
#[derive(Debug, Clone, Copy)]
pub struct StrategyEntry {
    /// Name used on the command line.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Constructor.
    pub factory: StrategyFactory,
}

/// Built-in strategies, in listing order.
pub const BUILTIN_STRATEGIES: &[StrategyEntry] = &[
    StrategyEntry {
        name: "idle",
        description: "never acts",
        factory: Idle::create,
    },
    StrategyEntry {
        name: "defender",
        description: "farms, then covers the lane with gunships and bombers",
        factory: Defender::create,
    },
    StrategyEntry {
        name: "raider",
        description: "light defense, spends surplus on injections",
        factory: Raider::create,
    },
];

/// Look up a built-in strategy by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static StrategyEntry> {
    BUILTIN_STRATEGIES.iter().find(|entry| entry.name == name)
}

type DynFactory = dyn Fn(&Map) -> Result<Box<dyn Strategy>, StrategyInitError> + Send + Sync;

/// A named strategy constructor entered into a match.
#[derive(Clone)]
pub struct Contender {
    name: String,
    factory: Arc<DynFactory>,
}

impl fmt::Debug for Contender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contender")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Contender {
    /// Wrap an arbitrary constructor.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Map) -> Result<Box<dyn Strategy>, StrategyInitError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    /// A built-in strategy by name.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownStrategy`] if no strategy has that name.
    pub fn builtin(name: &str) -> Result<Self, MatchError> {
        let entry = lookup(name).ok_or_else(|| MatchError::UnknownStrategy(name.to_string()))?;
        Ok(Self::new(entry.name, entry.factory))
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Construct a fresh strategy instance for a match on `map`.
    ///
    /// # Errors
    ///
    /// Propagates the constructor's failure.
    pub fn build(&self, map: &Map) -> Result<Box<dyn Strategy>, StrategyInitError> {
        (self.factory)(map)
    }
}

/// SPACE cells ranked by how many lane cells lie within `range_squared`,
/// best first. Cells covering nothing are dropped.
pub(crate) fn rank_by_coverage(map: &Map, range_squared: i64) -> Vec<Coord> {
    let mut ranked: Vec<(usize, Coord)> = map
        .iter()
        .filter(|&(at, _)| map.is_space(at.x, at.y))
        .map(|(at, _)| {
            let covered = map
                .path()
                .iter()
                .filter(|cell| cell.distance_squared(at) <= range_squared)
                .count();
            (covered, at)
        })
        .filter(|&(covered, _)| covered > 0)
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked.into_iter().map(|(_, at)| at).collect()
}
