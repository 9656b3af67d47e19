//! Replay command implementation.

use std::path::Path;

use debrisfall::Side;
use debrisfall::replay::{Replay, render_board, render_tick};

use super::CliError;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the replay cannot be loaded or lacks the turn.
pub(crate) fn execute(path: &Path, turn: Option<u32>, board: bool) -> Result<(), CliError> {
    let replay = Replay::load(path)?;
    let meta = &replay.metadata;

    let ticks: Vec<_> = match turn {
        Some(t) => vec![
            replay
                .tick(t)
                .ok_or_else(|| CliError::new(format!("replay has no turn {t}")))?,
        ],
        None => replay.ticks.iter().collect(),
    };

    for record in ticks {
        print!("{}", render_tick(record));
        if board {
            for side in Side::ALL {
                println!("{side} lane:");
                print!("{}", render_board(meta, record, side));
            }
        }
        println!();
    }

    println!("=== RESULT ===");
    println!("{} on {} ({}x{}, lane {})", meta.game_name, meta.map_name, meta.width, meta.height, meta.path.len());
    println!("Winner: {} (scores {:.1} / {:.1})", meta.winner, meta.scores[0], meta.scores[1]);

    Ok(())
}
