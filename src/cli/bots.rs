//! CLI command listing built-in strategies.

use debrisfall::strategy::BUILTIN_STRATEGIES;

/// Execute the `bots` command.
pub(crate) fn execute() {
    println!("{:<12} Description", "Name");
    println!("{:-<12} {:-<40}", "", "");
    for entry in BUILTIN_STRATEGIES {
        println!("{:<12} {}", entry.name, entry.description);
    }
}
