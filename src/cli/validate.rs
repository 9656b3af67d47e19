//! Map validation command implementation.

use std::path::Path;

use debrisfall::{Map, TileType};

use super::CliError;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the map cannot be read or has no valid lane.
pub(crate) fn execute(path: &Path) -> Result<(), CliError> {
    println!("Validating: {}", path.display());
    println!();

    let map = Map::load(path)?;
    let count = |kind: TileType| map.iter().filter(|&(_, t)| t == kind).count();

    println!("Summary:");
    println!("  Name:        {}", map.name());
    println!("  Size:        {}x{}", map.width(), map.height());
    println!("  Lane length: {}", map.path_length());
    if let (Some(entry), Some(exit)) = (map.path().first(), map.path().last()) {
        println!("  Entry:       ({}, {})", entry.x, entry.y);
        println!("  Exit:        ({}, {})", exit.x, exit.y);
    }
    println!("  Space tiles: {}", count(TileType::Space));
    println!("  Asteroids:   {}", count(TileType::Asteroid));
    println!();
    println!("Validation successful!");

    Ok(())
}
