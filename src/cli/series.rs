//! Series command implementation.

use std::time::Instant;

use debrisfall::run_series;
use indicatif::{ProgressBar, ProgressStyle};

use super::output::format_series_text;
use super::{CliError, OutputFormat, SetupArgs};

/// Execute the series command.
///
/// # Errors
///
/// Returns an error if setup fails or any match hits an engine fault.
pub(crate) fn execute(
    setup: SetupArgs,
    games: u32,
    threads: Option<usize>,
    format: OutputFormat,
    progress: bool,
) -> Result<(), CliError> {
    let setup = setup.resolve()?;

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let pb = if progress {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .map_err(|e| CliError::new(format!("bad progress template: {e}")))?
            .progress_chars("=>-");
        Some(ProgressBar::new(u64::from(games)).with_style(style))
    } else {
        None
    };

    let start = Instant::now();
    let summary = run_series(
        &setup.blue,
        &setup.red,
        &setup.map,
        &setup.config,
        games,
        |_| {
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        },
    )?;
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    let duration = start.elapsed();

    match format {
        OutputFormat::Text => {
            println!();
            print!(
                "{}",
                format_series_text(&summary, setup.blue.name(), setup.red.name())
            );
            #[allow(clippy::cast_precision_loss)]
            let per_sec = if duration.as_secs_f64() > 0.0 {
                summary.games.len() as f64 / duration.as_secs_f64()
            } else {
                0.0
            };
            println!(
                "Duration: {:.2}s ({per_sec:.1} games/sec)",
                duration.as_secs_f64()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
