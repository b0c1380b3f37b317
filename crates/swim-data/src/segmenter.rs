//! Rest-gap set segmentation.
//!
//! Splits a chronologically sorted lap sequence into [`SwimSet`]s: a lap
//! whose start lies more than the rest threshold after the previous lap's
//! start opens a new set.

use chrono::{DateTime, FixedOffset};
use swim_core::models::{Lap, SwimSet};
use swim_core::settings::AnalysisConfig;
use tracing::debug;

/// Stable sort of laps by start time. Equal timestamps keep input order.
pub fn sort_laps(laps: &mut [Lap]) {
    laps.sort_by_key(|lap| lap.timestamp);
}

// ── SetSegmenter ──────────────────────────────────────────────────────────────

/// Groups sorted laps into sets separated by rest gaps.
#[derive(Debug, Clone, Copy)]
pub struct SetSegmenter {
    /// Largest start-to-start gap (seconds) that still joins the current set.
    rest_threshold_seconds: f64,
}

impl SetSegmenter {
    pub fn new(rest_threshold_seconds: f64) -> Self {
        Self {
            rest_threshold_seconds,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.rest_threshold_seconds)
    }

    /// Partition `laps` into sets.
    ///
    /// `laps` must already be sorted with [`sort_laps`]. The first lap always
    /// opens a set; each later lap joins the current set unless its gap to
    /// the previous lap exceeds the threshold. Empty input gives no sets.
    pub fn segment(&self, laps: Vec<Lap>) -> Vec<SwimSet> {
        let lap_count = laps.len();
        let mut sets: Vec<SwimSet> = Vec::new();
        let mut current: Option<SwimSet> = None;

        for lap in laps {
            match current.as_mut() {
                Some(set) if !self.is_rest(set.last_start_time(), lap.timestamp) => {
                    set.laps.push(lap);
                }
                _ => {
                    if let Some(done) = current.take() {
                        sets.push(done);
                    }
                    current = Some(SwimSet::new(lap));
                }
            }
        }

        if let Some(done) = current {
            sets.push(done);
        }

        debug!(
            "SetSegmenter: created {} sets from {} laps (threshold {}s)",
            sets.len(),
            lap_count,
            self.rest_threshold_seconds
        );
        sets
    }

    fn is_rest(&self, previous: DateTime<FixedOffset>, next: DateTime<FixedOffset>) -> bool {
        gap_seconds(previous, next) > self.rest_threshold_seconds
    }
}

/// Start-to-start gap in fractional seconds.
pub fn gap_seconds(previous: DateTime<FixedOffset>, next: DateTime<FixedOffset>) -> f64 {
    let delta = next - previous;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
