//! Per-set statistics.
//!
//! Reduces each [`SwimSet`] to a [`SetSummary`] row and sums rows into run
//! totals for the console report.

use std::collections::BTreeSet;

use swim_core::error::{Result, SwimError};
use swim_core::models::{SetSummary, SwimSet};
use swim_core::settings::AnalysisConfig;
use tracing::debug;

// ── SetTotals ─────────────────────────────────────────────────────────────────

/// Sums across every set of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetTotals {
    pub set_count: usize,
    pub lap_count: usize,
    pub distance_meters: f64,
    pub total_time_seconds: f64,
}

// ── SetAggregator ─────────────────────────────────────────────────────────────

/// Stateless helper that turns sets into summary rows.
pub struct SetAggregator;

impl SetAggregator {
    /// Summarise one set.
    pub fn aggregate(
        set: &SwimSet,
        lap_distance_meters: f64,
        pace_reference_meters: f64,
    ) -> SetSummary {
        let lap_count = set.lap_count();
        let total_time_seconds: f64 = set.laps.iter().map(|lap| lap.duration_seconds).sum();
        let distance_meters = lap_count as f64 * lap_distance_meters;

        let pace_seconds_per_reference =
            match Self::pace(total_time_seconds, distance_meters, pace_reference_meters) {
                Ok(pace) => Some(pace),
                Err(err) => {
                    debug!("Set at {}: {}", set.start_time(), err);
                    None
                }
            };

        SetSummary {
            set_start_time: set.start_time(),
            lap_count,
            total_time_seconds,
            distance_meters,
            pace_seconds_per_reference,
            avg_swolf: Self::mean_swolf(set),
            stroke_combo: Self::stroke_combo(set),
        }
    }

    /// Summarise every set, in order, with the distances from `config`.
    pub fn aggregate_all(sets: &[SwimSet], config: &AnalysisConfig) -> Vec<SetSummary> {
        sets.iter()
            .map(|set| {
                Self::aggregate(
                    set,
                    config.lap_distance_meters,
                    config.pace_reference_distance_meters,
                )
            })
            .collect()
    }

    /// Seconds per `reference_meters`.
    ///
    /// Fails with [`SwimError::DivisionUndefined`] when the distance in
    /// reference units is zero or not finite.
    pub fn pace(total_seconds: f64, distance_meters: f64, reference_meters: f64) -> Result<f64> {
        let units = distance_meters / reference_meters;
        if units == 0.0 || !units.is_finite() {
            return Err(SwimError::DivisionUndefined(format!(
                "pace over {} m in {} m units",
                distance_meters, reference_meters
            )));
        }
        Ok(total_seconds / units)
    }

    /// Mean of the SWOLF scores that are present.
    pub fn mean_swolf(set: &SwimSet) -> Option<f64> {
        let scores: Vec<f64> = set.laps.iter().filter_map(|lap| lap.swolf_score).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// Distinct stroke labels, sorted and joined with `/`.
    pub fn stroke_combo(set: &SwimSet) -> String {
        let labels: BTreeSet<String> = set
            .laps
            .iter()
            .filter_map(|lap| lap.stroke_style.as_ref())
            .map(|style| style.label())
            .collect();
        labels.into_iter().collect::<Vec<_>>().join("/")
    }

    /// Sum the rows of a run into a single [`SetTotals`].
    pub fn calculate_totals(summaries: &[SetSummary]) -> SetTotals {
        let mut totals = SetTotals::default();
        for summary in summaries {
            totals.set_count += 1;
            totals.lap_count += summary.lap_count;
            totals.distance_meters += summary.distance_meters;
            totals.total_time_seconds += summary.total_time_seconds;
        }
        totals
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
