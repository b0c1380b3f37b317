mod bootstrap;
mod report;

use anyhow::{Context, Result};
use swim_core::settings::{ConfigFile, Settings};
use swim_data::analysis::analyze_export;
use swim_data::writer::write_results;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Swim analyzer v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings.analysis_config()?;
    match config.date_filter.describe() {
        Some(filter) => tracing::info!("Date filtering applied: {}", filter),
        None => tracing::info!("Analyzing all dates"),
    }
    tracing::info!(
        "Rest threshold {}s, lap {} m, pace per {} m, timezone {}",
        config.rest_threshold_seconds,
        config.lap_distance_meters,
        config.pace_reference_distance_meters,
        config.timezone.name()
    );

    let result = analyze_export(&settings.input, &config)
        .with_context(|| format!("analysing {}", settings.input.display()))?;
    tracing::info!(
        "{} workouts, {} swimming, {} laps, {} sets (load {:.2}s, transform {:.2}s)",
        result.metadata.workouts_total,
        result.metadata.swim_workouts,
        result.metadata.laps_processed,
        result.metadata.sets_created,
        result.metadata.load_time_seconds,
        result.metadata.transform_time_seconds
    );

    write_results(&result, &config, &settings.workouts_csv, &settings.sets_csv)
        .context("saving results")?;

    if settings.save_config {
        let path = settings.config_path();
        ConfigFile::from(&settings).save_to(&path)?;
        tracing::info!("Saved configuration to {}", path.display());
    }

    if !settings.quiet {
        print!(
            "{}",
            report::render_report(&result, &config, &settings.workouts_csv, &settings.sets_csv)
        );
    }

    tracing::info!("Analysis completed");
    Ok(())
}
