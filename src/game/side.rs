//! Side identity and per-side state.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One of the two match participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// First side; acts first each tick.
    Blue,
    /// Second side.
    Red,
}

impl Side {
    /// Both sides in acting order.
    pub const ALL: [Side; 2] = [Side::Blue, Side::Red];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        }
    }

    /// Lowercase name used in replays and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Side::Blue => "blue",
            Side::Red => "red",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A value held once per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePair<T> {
    /// Blue's value.
    pub blue: T,
    /// Red's value.
    pub red: T,
}

impl<T> SidePair<T> {
    /// Create a pair from both values.
    pub const fn new(blue: T, red: T) -> Self {
        Self { blue, red }
    }

    /// Build a pair by evaluating `f` for each side.
    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        let blue = f(Side::Blue);
        let red = f(Side::Red);
        Self { blue, red }
    }

    /// Map both values.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> SidePair<U> {
        SidePair {
            blue: f(self.blue),
            red: f(self.red),
        }
    }
}

impl<T> Index<Side> for SidePair<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Blue => &self.blue,
            Side::Red => &self.red,
        }
    }
}

impl<T> IndexMut<Side> for SidePair<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Blue => &mut self.blue,
            Side::Red => &mut self.red,
        }
    }
}

/// A paid request to spawn debris on the opponent's lane next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    /// Ticks between steps.
    pub cooldown: u32,
    /// Health of the spawned unit.
    pub health: u32,
}

/// Mutable state for one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideState {
    /// Currency balance; fractional after refunds.
    pub balance: f64,
    /// Remaining base health.
    pub health: u32,
    /// Remaining wall-clock compute budget.
    pub time_remaining: Duration,
    /// Outgoing injection awaiting next tick.
    pub pending_injection: Option<Injection>,
}

impl SideState {
    /// Create a side with starting resources.
    #[must_use]
    pub const fn new(balance: f64, health: u32, time_remaining: Duration) -> Self {
        Self {
            balance,
            health,
            time_remaining,
            pending_injection: None,
        }
    }

    /// Subtract damage from health, clamping at zero.
    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// True once health has reached zero.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.health == 0
    }
}
