//! Analysis pipeline.
//!
//! Read → extract → sort → segment → aggregate, returning an
//! [`AnalysisResult`] ready for the writer and the console report. Nothing
//! is written here.

use std::path::Path;
use std::time::Instant;

use swim_core::error::Result;
use swim_core::models::{SetSummary, WorkoutSummary};
use swim_core::settings::AnalysisConfig;
use tracing::info;

use crate::aggregator::SetAggregator;
use crate::extractor::extract;
use crate::reader::{load_workouts, RawWorkout};
use crate::segmenter::{sort_laps, SetSegmenter};

// ── Public types ──────────────────────────────────────────────────────────────

/// Counts and timings for one run. Logged only.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// Workouts of any type in the export.
    pub workouts_total: usize,
    /// Swimming workouts left after the date filter.
    pub swim_workouts: usize,
    /// Lap events across those workouts.
    pub laps_processed: usize,
    /// Sets produced by segmentation.
    pub sets_created: usize,
    /// Wall-clock seconds spent reading the export.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent extracting, segmenting and aggregating.
    pub transform_time_seconds: f64,
}

/// The complete output of [`analyze_export`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub workouts: Vec<WorkoutSummary>,
    /// One row per set, ordered by set start.
    pub sets: Vec<SetSummary>,
    pub metadata: AnalysisMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline on the export at `path` (a file or a directory
/// containing `export.xml`).
///
/// Any read or extraction error aborts the run.
pub fn analyze_export(path: &Path, config: &AnalysisConfig) -> Result<AnalysisResult> {
    let load_start = Instant::now();
    let raw = load_workouts(path)?;
    let load_time = load_start.elapsed().as_secs_f64();
    info!("Loaded {} workouts in {:.2}s", raw.len(), load_time);

    let mut result = analyze_workouts(&raw, config)?;
    result.metadata.load_time_seconds = load_time;
    Ok(result)
}

/// Run everything after reading on already-parsed workouts.
pub fn analyze_workouts(raw: &[RawWorkout], config: &AnalysisConfig) -> Result<AnalysisResult> {
    let transform_start = Instant::now();

    let extraction = extract(raw, config)?;
    let swim_workouts = extraction.workouts.len();
    info!("Found {} swimming workouts", swim_workouts);

    let mut laps = extraction.laps;
    let laps_processed = laps.len();
    sort_laps(&mut laps);
    info!("Processing {} laps", laps_processed);

    let sets = SetSegmenter::from_config(config).segment(laps);
    let summaries = SetAggregator::aggregate_all(&sets, config);
    info!(
        "Created {} sets (rest threshold {}s)",
        summaries.len(),
        config.rest_threshold_seconds
    );

    let metadata = AnalysisMetadata {
        workouts_total: raw.len(),
        swim_workouts,
        laps_processed,
        sets_created: summaries.len(),
        load_time_seconds: 0.0,
        transform_time_seconds: transform_start.elapsed().as_secs_f64(),
    };

    Ok(AnalysisResult {
        workouts: extraction.workouts,
        sets: summaries,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
