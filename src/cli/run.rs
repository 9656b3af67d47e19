//! Run command implementation.

use std::path::PathBuf;

use debrisfall::run_match;

use super::output::{JsonMatchResult, format_text};
use super::{CliError, OutputFormat, SetupArgs};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if setup fails, the engine aborts, or the replay
/// cannot be saved.
pub(crate) fn execute(
    setup: SetupArgs,
    format: OutputFormat,
    save: Option<PathBuf>,
) -> Result<(), CliError> {
    let setup = setup.resolve()?;
    let seed = setup.config.seed;
    let result = run_match(&setup.blue, &setup.red, setup.map, &setup.config)?;

    if let Some(path) = save {
        result
            .replay
            .save(&path)
            .map_err(|e| CliError::new(format!("Failed to save replay: {e}")))?;
        if format == OutputFormat::Text {
            println!("Replay saved to: {}", path.display());
            println!();
        }
    }

    match format {
        OutputFormat::Text => print!("{}", format_text(&result, seed)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonMatchResult::from_result(&result, seed))?;
            println!("{json}");
        }
    }

    Ok(())
}
