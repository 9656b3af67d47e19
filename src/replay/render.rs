//! ASCII board renderer.

use std::collections::HashMap;
use std::fmt::Write;

use crate::game::{Coord, Side, TowerKind};
use crate::replay::{ReplayMetadata, TickRecord};

/// Render one side's board for a tick, top row first.
///
/// ```text
/// . = .
/// G o .
/// . = B
/// ```
///
/// `=` lane, `o` natural debris, `x` injected debris, `F`/`G`/`B`/`R`
/// towers. Replays do not record tile types, so every other cell is `.`.
#[must_use]
pub fn render_board(meta: &ReplayMetadata, record: &TickRecord, side: Side) -> String {
    let towers: HashMap<Coord, TowerKind> = record.towers[side]
        .iter()
        .map(|t| (Coord::new(t.x, t.y), t.kind))
        .collect();
    let debris: HashMap<Coord, bool> = record.debris[side]
        .iter()
        .map(|d| (Coord::new(d.x, d.y), d.sent_by_opponent))
        .collect();

    let mut output = String::new();
    for y in (0..meta.height).rev() {
        let row: Vec<String> = (0..meta.width)
            .map(|x| glyph(meta, &towers, &debris, Coord::new(x, y)).to_string())
            .collect();
        let _ = writeln!(output, "{}", row.join(" "));
    }
    output
}

fn glyph(
    meta: &ReplayMetadata,
    towers: &HashMap<Coord, TowerKind>,
    debris: &HashMap<Coord, bool>,
    at: Coord,
) -> char {
    if let Some(kind) = towers.get(&at) {
        return match kind {
            TowerKind::Farm => 'F',
            TowerKind::Gunship => 'G',
            TowerKind::Bomber => 'B',
            TowerKind::Reinforcer => 'R',
        };
    }
    match debris.get(&at) {
        Some(true) => 'x',
        Some(false) => 'o',
        None if meta.path.contains(&at) => '=',
        None => '.',
    }
}
