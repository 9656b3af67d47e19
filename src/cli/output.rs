//! Output formatting utilities for CLI.

use std::fmt::Write;

use debrisfall::tournament::{EndReason, SeriesSummary, TieBreak};
use debrisfall::{MatchResult, Side};
use serde::Serialize;

/// JSON-serializable match result.
#[derive(Debug, Serialize)]
pub(super) struct JsonMatchResult<'a> {
    /// Coin-flip seed.
    pub(super) seed: u64,
    /// Winning side.
    pub(super) winner: Side,
    /// What ended the match.
    pub(super) reason: EndReason,
    /// Tie-break step, if consulted.
    pub(super) tie_break: Option<TieBreak>,
    /// Ticks played.
    pub(super) turns: u32,
    /// Blue's final state.
    pub(super) blue: JsonSideResult<'a>,
    /// Red's final state.
    pub(super) red: JsonSideResult<'a>,
}

/// JSON-serializable per-side result.
#[derive(Debug, Serialize)]
pub(super) struct JsonSideResult<'a> {
    /// Strategy name.
    pub(super) bot: &'a str,
    /// Final health.
    pub(super) health: u32,
    /// Final balance.
    pub(super) balance: f64,
}

impl<'a> JsonMatchResult<'a> {
    /// Create from a `MatchResult`.
    pub(super) fn from_result(result: &'a MatchResult, seed: u64) -> Self {
        let meta = &result.replay.metadata;
        Self {
            seed,
            winner: result.winner,
            reason: result.reason,
            tie_break: result.tie_break,
            turns: result.turns,
            blue: JsonSideResult {
                bot: &meta.blue_bot,
                health: result.health.blue,
                balance: result.balance.blue,
            },
            red: JsonSideResult {
                bot: &meta.red_bot,
                health: result.health.red,
                balance: result.balance.red,
            },
        }
    }
}

/// Format a match result as human-readable text.
pub(super) fn format_text(result: &MatchResult, seed: u64) -> String {
    let meta = &result.replay.metadata;
    let mut output = String::new();

    let _ = writeln!(output, "Match {} (seed: {seed})", meta.game_name);
    let winner_bot = match result.winner {
        Side::Blue => &meta.blue_bot,
        Side::Red => &meta.red_bot,
    };
    let _ = write!(output, "  Winner: {} ({winner_bot}) by {}", result.winner, reason_text(result.reason));
    if let Some(step) = result.tie_break {
        let _ = write!(output, ", decided on {}", tie_break_text(step));
    }
    output.push('\n');
    let _ = writeln!(output, "  Turns: {}\n", result.turns);

    for (side, bot) in [(Side::Blue, &meta.blue_bot), (Side::Red, &meta.red_bot)] {
        let _ = writeln!(
            output,
            "  {side:<4} {bot:<12} health {:>4}  balance {:>9.1}",
            result.health[side], result.balance[side]
        );
    }

    output
}

/// Format a series summary as human-readable text.
pub(super) fn format_series_text(summary: &SeriesSummary, blue: &str, red: &str) -> String {
    let mut output = String::new();
    let total = summary.games.len();
    let _ = writeln!(output, "Series: {blue} (blue) vs {red} (red), {total} games");

    for (side, bot) in [(Side::Blue, blue), (Side::Red, red)] {
        let wins = summary.wins[side];
        #[allow(clippy::cast_precision_loss)]
        let rate = if total == 0 {
            0.0
        } else {
            f64::from(wins) * 100.0 / total as f64
        };
        let _ = writeln!(output, "  {side:<4} {bot:<12} {wins:>5} wins ({rate:.1}%)");
    }

    let _ = writeln!(output, "  Average turns: {:.1}", summary.average_turns());
    output
}

fn reason_text(reason: EndReason) -> &'static str {
    match reason {
        EndReason::HealthDepleted => "health depletion",
        EndReason::SideFailed => "opponent failure",
        EndReason::BothFailed => "double failure",
        EndReason::ConstructionFailed => "forfeit",
        EndReason::TurnLimit => "turn limit",
    }
}

fn tie_break_text(step: TieBreak) -> &'static str {
    match step {
        TieBreak::Health => "health",
        TieBreak::NetWorth => "net worth",
        TieBreak::CoinFlip => "coin flip",
    }
}
