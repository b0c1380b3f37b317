//! Typed extraction from raw export records.
//!
//! Applies the swim-activity and date filters, then converts each swimming
//! workout into a [`WorkoutSummary`] and each of its lap events into a
//! [`Lap`]. Stroke style and SWOLF are read from the event metadata here,
//! once, so later stages only see typed fields.

use swim_core::error::{Result, SwimError};
use swim_core::healthkit::{
    is_swim_activity, ACTIVE_ENERGY_BURNED, DISTANCE_SWIMMING, HEART_RATE, LAP_EVENT_TYPE,
    STROKE_STYLE_KEY, SWOLF_KEY,
};
use swim_core::models::{Lap, StrokeStyle, WorkoutSummary};
use swim_core::settings::AnalysisConfig;
use swim_core::time_utils::parse_health_timestamp;
use tracing::{debug, warn};

use crate::reader::{RawEvent, RawWorkout};

/// Workouts and laps that survived filtering.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// One summary per swimming workout, in export order.
    pub workouts: Vec<WorkoutSummary>,
    /// Every lap of those workouts, in export order (not yet sorted).
    pub laps: Vec<Lap>,
}

/// Extract swimming workouts and their laps from `raw`.
///
/// Any malformed workout or lap aborts the whole extraction.
pub fn extract(raw: &[RawWorkout], config: &AnalysisConfig) -> Result<Extraction> {
    let mut extraction = Extraction::default();

    for workout in raw {
        if !is_swim_activity(&workout.activity_type) {
            continue;
        }

        let start_str = workout.start_date.as_deref().ok_or_else(|| {
            SwimError::MalformedInput("swimming workout without startDate".to_string())
        })?;
        let start = parse_health_timestamp(start_str)?;

        let local_date = config.timezone.local_datetime(&start).date();
        if !config.date_filter.matches(local_date) {
            continue;
        }

        extraction.workouts.push(workout_summary(workout, start)?);

        let before = extraction.laps.len();
        for event in &workout.events {
            if event.event_type == LAP_EVENT_TYPE {
                extraction.laps.push(lap_from_event(event)?);
            }
        }
        debug!(
            "Workout {}: {} laps",
            start_str,
            extraction.laps.len() - before
        );
    }

    Ok(extraction)
}

/// Build a [`Lap`] from a lap event.
pub fn lap_from_event(event: &RawEvent) -> Result<Lap> {
    let date = event
        .date
        .as_deref()
        .ok_or_else(|| SwimError::MalformedInput("lap event without date".to_string()))?;
    let timestamp = parse_health_timestamp(date)?;

    let duration_seconds = match event.duration.as_deref() {
        Some(value) => duration_to_seconds(
            parse_number("lap duration", value)?,
            event.duration_unit.as_deref(),
        )?,
        None => 0.0,
    };

    let mut stroke_style = None;
    let mut swolf_score = None;
    for entry in &event.metadata {
        if entry.key == STROKE_STYLE_KEY {
            stroke_style = Some(StrokeStyle::from_code(&entry.value));
        } else if entry.key == SWOLF_KEY {
            swolf_score = Some(parse_number("SWOLF score", &entry.value)?);
        }
    }

    Ok(Lap {
        timestamp,
        duration_seconds,
        stroke_style,
        swolf_score,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn workout_summary(
    workout: &RawWorkout,
    start: chrono::DateTime<chrono::FixedOffset>,
) -> Result<WorkoutSummary> {
    let end_str = workout.end_date.as_deref().ok_or_else(|| {
        SwimError::MalformedInput("swimming workout without endDate".to_string())
    })?;
    let end = parse_health_timestamp(end_str)?;

    let duration_minutes = match workout.duration.as_deref() {
        Some(value) => {
            duration_to_seconds(
                parse_number("workout duration", value)?,
                workout.duration_unit.as_deref(),
            )? / 60.0
        }
        None => 0.0,
    };

    let mut distance_meters = None;
    let mut calories_kcal = None;
    let mut avg_heart_rate_bpm = None;

    for stat in &workout.statistics {
        match stat.stat_type.as_str() {
            DISTANCE_SWIMMING => {
                distance_meters = optional_number("distance", stat.sum.as_deref())?
                    .map(|v| distance_to_meters(v, stat.unit.as_deref()));
            }
            ACTIVE_ENERGY_BURNED => {
                calories_kcal = optional_number("active energy", stat.sum.as_deref())?
                    .map(|v| energy_to_kcal(v, stat.unit.as_deref()));
            }
            HEART_RATE => {
                avg_heart_rate_bpm = optional_number("heart rate", stat.average.as_deref())?;
            }
            _ => {}
        }
    }

    if distance_meters.is_none() {
        distance_meters = optional_number("totalDistance", workout.total_distance.as_deref())?
            .map(|v| distance_to_meters(v, workout.total_distance_unit.as_deref()));
    }
    if calories_kcal.is_none() {
        calories_kcal =
            optional_number("totalEnergyBurned", workout.total_energy_burned.as_deref())?
                .map(|v| energy_to_kcal(v, workout.total_energy_burned_unit.as_deref()));
    }

    Ok(WorkoutSummary {
        start,
        end,
        duration_minutes,
        distance_meters,
        calories_kcal,
        avg_heart_rate_bpm,
    })
}

/// Parse a numeric attribute or metadata value.
///
/// Only the first whitespace-separated token is read, so values carrying a
/// trailing unit (`"42 count"`) are accepted.
fn parse_number(field: &str, value: &str) -> Result<f64> {
    value
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            SwimError::MalformedInput(format!("{} is not a number: {:?}", field, value))
        })
}

fn optional_number(field: &str, value: Option<&str>) -> Result<Option<f64>> {
    value.map(|v| parse_number(field, v)).transpose()
}

/// Convert a duration to seconds. HealthKit's default unit is minutes.
fn duration_to_seconds(value: f64, unit: Option<&str>) -> Result<f64> {
    let factor = match unit.unwrap_or("min") {
        "min" => 60.0,
        "s" | "sec" => 1.0,
        "ms" => 0.001,
        "hr" | "h" => 3600.0,
        other => {
            return Err(SwimError::MalformedInput(format!(
                "unknown duration unit: {:?}",
                other
            )))
        }
    };
    Ok(value * factor)
}

fn distance_to_meters(value: f64, unit: Option<&str>) -> f64 {
    match unit.unwrap_or("m") {
        "m" => value,
        "km" => value * 1000.0,
        "yd" => value * 0.9144,
        "mi" => value * 1609.344,
        other => {
            warn!("Unknown distance unit {:?}; keeping raw value", other);
            value
        }
    }
}

fn energy_to_kcal(value: f64, unit: Option<&str>) -> f64 {
    match unit.unwrap_or("kcal") {
        "kcal" | "Cal" => value,
        "kJ" => value / 4.184,
        other => {
            warn!("Unknown energy unit {:?}; keeping raw value", other);
            value
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{MetadataEntry, RawStatistic};
    use swim_core::settings::DateFilter;

    fn lap_event(date: &str, minutes: &str, stroke: Option<&str>, swolf: Option<&str>) -> RawEvent {
        let mut metadata = Vec::new();
        if let Some(code) = stroke {
            metadata.push(MetadataEntry {
                key: STROKE_STYLE_KEY.to_string(),
                value: code.to_string(),
            });
        }
        if let Some(score) = swolf {
            metadata.push(MetadataEntry {
                key: SWOLF_KEY.to_string(),
                value: score.to_string(),
            });
        }
        RawEvent {
            event_type: LAP_EVENT_TYPE.to_string(),
            date: Some(date.to_string()),
            duration: Some(minutes.to_string()),
            duration_unit: Some("min".to_string()),
            metadata,
        }
    }

    fn swim_workout(start: &str, events: Vec<RawEvent>) -> RawWorkout {
        RawWorkout {
            activity_type: "HKWorkoutActivityTypeSwimming".to_string(),
            start_date: Some(start.to_string()),
            end_date: Some(start.to_string()),
            duration: Some("30".to_string()),
            duration_unit: Some("min".to_string()),
            events,
            ..Default::default()
        }
    }

    // ── extract ───────────────────────────────────────────────────────────────

    #[test]
    fn test_extract_skips_non_swim_workouts() {
        let mut run = swim_workout("2024-05-01 07:00:00 +0900", vec![]);
        run.activity_type = "HKWorkoutActivityTypeRunning".to_string();
        run.start_date = None;

        let extraction = extract(&[run], &AnalysisConfig::default()).unwrap();
        assert!(extraction.workouts.is_empty());
        assert!(extraction.laps.is_empty());
    }

    #[test]
    fn test_extract_collects_laps_only() {
        let mut segment = lap_event("2024-05-01 07:00:00 +0900", "5", None, None);
        segment.event_type = "HKWorkoutEventTypeSegment".to_string();
        let workout = swim_workout(
            "2024-05-01 07:00:00 +0900",
            vec![
                lap_event("2024-05-01 07:00:00 +0900", "0.5", Some("2"), Some("40")),
                segment,
                lap_event("2024-05-01 07:00:40 +0900", "0.5", Some("3"), None),
            ],
        );

        let extraction = extract(&[workout], &AnalysisConfig::default()).unwrap();
        assert_eq!(extraction.workouts.len(), 1);
        assert_eq!(extraction.laps.len(), 2);
        assert_eq!(extraction.laps[0].stroke_style, Some(StrokeStyle::Freestyle));
        assert_eq!(extraction.laps[0].swolf_score, Some(40.0));
        assert_eq!(extraction.laps[1].stroke_style, Some(StrokeStyle::Backstroke));
        assert_eq!(extraction.laps[1].swolf_score, None);
    }

    #[test]
    fn test_extract_date_filter() {
        let may = swim_workout(
            "2024-05-01 07:00:00 +0900",
            vec![lap_event("2024-05-01 07:00:00 +0900", "0.5", None, None)],
        );
        let june = swim_workout(
            "2024-06-01 07:00:00 +0900",
            vec![lap_event("2024-06-01 07:00:00 +0900", "0.5", None, None)],
        );
        let config = AnalysisConfig {
            date_filter: DateFilter {
                month: Some(6),
                ..Default::default()
            },
            ..Default::default()
        };

        let extraction = extract(&[may, june], &config).unwrap();
        assert_eq!(extraction.workouts.len(), 1);
        assert_eq!(extraction.laps.len(), 1);
        assert_eq!(
            extraction.laps[0].timestamp,
            parse_health_timestamp("2024-06-01 07:00:00 +0900").unwrap()
        );
    }

    #[test]
    fn test_extract_date_filter_uses_configured_zone() {
        // 07:00 on the 1st in Tokyo is still the 30th of April in UTC.
        let workout = swim_workout("2024-05-01 07:00:00 +0900", vec![]);
        let config = AnalysisConfig {
            date_filter: DateFilter {
                day: Some(1),
                ..Default::default()
            },
            timezone: swim_core::time_utils::DisplayZone::parse("UTC").unwrap(),
            ..Default::default()
        };
        let extraction = extract(&[workout], &config).unwrap();
        assert!(extraction.workouts.is_empty());
    }

    #[test]
    fn test_extract_missing_workout_start_is_malformed() {
        let mut workout = swim_workout("2024-05-01 07:00:00 +0900", vec![]);
        workout.start_date = None;
        let err = extract(&[workout], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SwimError::MalformedInput(_)));
    }

    #[test]
    fn test_extract_lap_without_date_aborts() {
        let mut bad = lap_event("2024-05-01 07:00:00 +0900", "0.5", None, None);
        bad.date = None;
        let workout = swim_workout(
            "2024-05-01 07:00:00 +0900",
            vec![lap_event("2024-05-01 07:00:00 +0900", "0.5", None, None), bad],
        );
        let err = extract(&[workout], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, SwimError::MalformedInput(_)));
    }

    // ── lap_from_event ────────────────────────────────────────────────────────

    #[test]
    fn test_lap_duration_converted_to_seconds() {
        let lap = lap_from_event(&lap_event("2024-05-01 07:00:00 +0900", "0.75", None, None))
            .unwrap();
        assert!((lap.duration_seconds - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_lap_duration_in_seconds_unit() {
        let mut event = lap_event("2024-05-01 07:00:00 +0900", "42", None, None);
        event.duration_unit = Some("s".to_string());
        let lap = lap_from_event(&event).unwrap();
        assert!((lap.duration_seconds - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_lap_missing_duration_is_zero() {
        let mut event = lap_event("2024-05-01 07:00:00 +0900", "1", None, None);
        event.duration = None;
        assert_eq!(lap_from_event(&event).unwrap().duration_seconds, 0.0);
    }

    #[test]
    fn test_lap_unknown_stroke_code() {
        let lap = lap_from_event(&lap_event("2024-05-01 07:00:00 +0900", "1", Some("7"), None))
            .unwrap();
        assert_eq!(lap.stroke_style.unwrap().label(), "Unknown (7)");
    }

    #[test]
    fn test_lap_swolf_with_unit_suffix() {
        let lap = lap_from_event(&lap_event(
            "2024-05-01 07:00:00 +0900",
            "1",
            None,
            Some("38 count"),
        ))
        .unwrap();
        assert_eq!(lap.swolf_score, Some(38.0));
    }

    #[test]
    fn test_lap_bad_swolf_is_malformed() {
        let err = lap_from_event(&lap_event(
            "2024-05-01 07:00:00 +0900",
            "1",
            None,
            Some("fast"),
        ))
        .unwrap_err();
        assert!(matches!(err, SwimError::MalformedInput(_)));
    }

    #[test]
    fn test_lap_bad_timestamp_is_error() {
        let err = lap_from_event(&lap_event("sometime", "1", None, None)).unwrap_err();
        assert!(matches!(err, SwimError::TimestampParse(_)));
    }

    // ── workout_summary ───────────────────────────────────────────────────────

    #[test]
    fn test_workout_summary_reads_statistics() {
        let mut workout = swim_workout("2024-05-01 07:00:00 +0900", vec![]);
        workout.statistics = vec![
            RawStatistic {
                stat_type: DISTANCE_SWIMMING.to_string(),
                sum: Some("1500".to_string()),
                unit: Some("m".to_string()),
                ..Default::default()
            },
            RawStatistic {
                stat_type: ACTIVE_ENERGY_BURNED.to_string(),
                sum: Some("320.5".to_string()),
                unit: Some("kcal".to_string()),
                ..Default::default()
            },
            RawStatistic {
                stat_type: HEART_RATE.to_string(),
                average: Some("131".to_string()),
                unit: Some("count/min".to_string()),
                ..Default::default()
            },
        ];

        let start = parse_health_timestamp("2024-05-01 07:00:00 +0900").unwrap();
        let summary = workout_summary(&workout, start).unwrap();
        assert_eq!(summary.duration_minutes, 30.0);
        assert_eq!(summary.distance_meters, Some(1500.0));
        assert_eq!(summary.calories_kcal, Some(320.5));
        assert_eq!(summary.avg_heart_rate_bpm, Some(131.0));
    }

    #[test]
    fn test_workout_summary_missing_statistics_are_undefined() {
        let workout = swim_workout("2024-05-01 07:00:00 +0900", vec![]);
        let start = parse_health_timestamp("2024-05-01 07:00:00 +0900").unwrap();
        let summary = workout_summary(&workout, start).unwrap();
        assert!(summary.distance_meters.is_none());
        assert!(summary.calories_kcal.is_none());
        assert!(summary.avg_heart_rate_bpm.is_none());
    }

    #[test]
    fn test_workout_summary_legacy_totals_with_units() {
        let mut workout = swim_workout("2024-05-01 07:00:00 +0900", vec![]);
        workout.total_distance = Some("1".to_string());
        workout.total_distance_unit = Some("km".to_string());
        workout.total_energy_burned = Some("418.4".to_string());
        workout.total_energy_burned_unit = Some("kJ".to_string());

        let start = parse_health_timestamp("2024-05-01 07:00:00 +0900").unwrap();
        let summary = workout_summary(&workout, start).unwrap();
        assert_eq!(summary.distance_meters, Some(1000.0));
        assert!((summary.calories_kcal.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_unknown_unit_is_malformed() {
        assert!(duration_to_seconds(1.0, Some("fortnight")).is_err());
        assert_eq!(duration_to_seconds(2.0, Some("hr")).unwrap(), 7200.0);
    }
}
