mod bootstrap;

use anyhow::Result;
use clap::Parser;
use sessions_core::models::Stats;
use sessions_core::settings::Settings;
use sessions_data::export;
use sessions_data::pipeline::process_path;

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("event-sessions v{} starting", env!("CARGO_PKG_VERSION"));

    let stats = run(&settings)?;

    if settings.stats_json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!("Done.");
        for (name, value) in stats.entries() {
            println!("{}: {}", name, value);
        }
    }

    Ok(())
}

/// Process the input file and write every requested table.
///
/// Nothing is written when the input cannot be read.
fn run(settings: &Settings) -> Result<Stats> {
    tracing::info!("Reading events from {}", settings.input.display());
    let output = process_path(&settings.input)?;

    export::write_sessions(&settings.out, &output.sessions, settings.delimiter)?;
    export::write_skipped(&settings.skips_out, &output.skipped, settings.delimiter)?;
    if let Some(path) = &settings.events_out {
        export::write_events(path, &output.events, settings.delimiter)?;
    }

    for (reason, count) in output.reason_counts() {
        tracing::info!("Skipped {} record(s): {}", count, reason);
    }
    tracing::info!(
        "Wrote {} session(s) to {} and {} skipped record(s) to {}",
        output.sessions.len(),
        settings.out.display(),
        output.skipped.len(),
        settings.skips_out.display()
    );

    Ok(output.stats)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
