//! CSV output for the workout and set tables.
//!
//! Set times, SWOLF and pace are floored to one decimal place; set distance
//! and workout values are written as computed. Undefined values become empty
//! fields. Both files are written to temporary siblings and renamed into
//! place only after both were written in full.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use swim_core::error::Result;
use swim_core::formatting::format_measurement;
use swim_core::models::{SetSummary, WorkoutSummary};
use swim_core::settings::AnalysisConfig;
use swim_core::time_utils::DisplayZone;
use tracing::{info, warn};

use crate::analysis::AnalysisResult;

/// Workout table columns.
pub const WORKOUT_HEADER: [&str; 6] = [
    "start",
    "end",
    "duration_min",
    "distance_m",
    "calories_kcal",
    "avg_hr",
];

// ── Rows ──────────────────────────────────────────────────────────────────────

/// Set table columns; the pace column carries the reference distance.
pub fn set_header(config: &AnalysisConfig) -> Vec<String> {
    vec![
        "set_start_time".to_string(),
        "total_time_sec".to_string(),
        "avg_swolf".to_string(),
        "stroke_combo".to_string(),
        "lap_count".to_string(),
        "distance_m".to_string(),
        config.pace_column(),
    ]
}

pub fn set_row(summary: &SetSummary, zone: &DisplayZone) -> Vec<String> {
    vec![
        zone.format(&summary.set_start_time),
        format_measurement(Some(summary.total_time_seconds)),
        format_measurement(summary.avg_swolf),
        summary.stroke_combo.clone(),
        summary.lap_count.to_string(),
        raw_field(Some(summary.distance_meters)),
        format_measurement(summary.pace_seconds_per_reference),
    ]
}

pub fn workout_row(workout: &WorkoutSummary, zone: &DisplayZone) -> Vec<String> {
    vec![
        zone.format(&workout.start),
        zone.format(&workout.end),
        raw_field(Some(workout.duration_minutes)),
        raw_field(workout.distance_meters),
        raw_field(workout.calories_kcal),
        raw_field(workout.avg_heart_rate_bpm),
    ]
}

fn raw_field(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

// ── Writers ───────────────────────────────────────────────────────────────────

/// Write the set table (header included) to `out`.
pub fn write_sets<W: Write>(
    out: W,
    sets: &[SetSummary],
    config: &AnalysisConfig,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(set_header(config))?;
    for summary in sets {
        writer.write_record(set_row(summary, &config.timezone))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the workout table (header included) to `out`.
pub fn write_workouts<W: Write>(
    out: W,
    workouts: &[WorkoutSummary],
    zone: &DisplayZone,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(WORKOUT_HEADER)?;
    for workout in workouts {
        writer.write_record(workout_row(workout, zone))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write both tables for `result`.
///
/// Either both files are replaced or neither is.
pub fn write_results(
    result: &AnalysisResult,
    config: &AnalysisConfig,
    workouts_path: &Path,
    sets_path: &Path,
) -> Result<()> {
    let workouts_tmp = tmp_sibling(workouts_path);
    let sets_tmp = tmp_sibling(sets_path);

    let written = write_file(&workouts_tmp, |file| {
        write_workouts(file, &result.workouts, &config.timezone)
    })
    .and_then(|_| write_file(&sets_tmp, |file| write_sets(file, &result.sets, config)));

    if let Err(err) = written {
        remove_quietly(&workouts_tmp);
        remove_quietly(&sets_tmp);
        return Err(err);
    }

    if let Err(err) = std::fs::rename(&workouts_tmp, workouts_path) {
        remove_quietly(&workouts_tmp);
        remove_quietly(&sets_tmp);
        return Err(err.into());
    }
    if let Err(err) = std::fs::rename(&sets_tmp, sets_path) {
        remove_quietly(&sets_tmp);
        return Err(err.into());
    }

    info!(
        "Wrote {} workouts to {} and {} sets to {}",
        result.workouts.len(),
        workouts_path.display(),
        result.sets.len(),
        sets_path.display()
    );
    Ok(())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_file(
    path: &Path,
    body: impl FnOnce(std::io::BufWriter<std::fs::File>) -> Result<()>,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    body(std::io::BufWriter::new(file))
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(err) = std::fs::remove_file(path) {
            warn!("Could not remove {}: {}", path.display(), err);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisMetadata;
    use chrono::DateTime;
    use tempfile::TempDir;

    fn ts(s: &str) -> chrono::DateTime<chrono::FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sample_set() -> SetSummary {
        SetSummary {
            set_start_time: ts("2024-05-01T07:00:00+09:00"),
            lap_count: 3,
            total_time_seconds: 97.58,
            distance_meters: 75.0,
            pace_seconds_per_reference: Some(65.0533),
            avg_swolf: None,
            stroke_combo: "Backstroke/Freestyle".to_string(),
        }
    }

    fn sample_workout() -> WorkoutSummary {
        WorkoutSummary {
            start: ts("2024-05-01T07:00:00+09:00"),
            end: ts("2024-05-01T07:45:10+09:00"),
            duration_minutes: 45.1666,
            distance_meters: Some(1500.0),
            calories_kcal: None,
            avg_heart_rate_bpm: Some(128.25),
        }
    }

    fn result_of(workouts: Vec<WorkoutSummary>, sets: Vec<SetSummary>) -> AnalysisResult {
        AnalysisResult {
            workouts,
            sets,
            metadata: AnalysisMetadata::default(),
        }
    }

    fn sets_csv(sets: &[SetSummary], config: &AnalysisConfig) -> String {
        let mut buf = Vec::new();
        write_sets(&mut buf, sets, config).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ── rows ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_set_row_floors_and_blanks() {
        let row = set_row(&sample_set(), &DisplayZone::Source);
        assert_eq!(
            row,
            vec![
                "2024-05-01 07:00:00",
                "97.5",
                "",
                "Backstroke/Freestyle",
                "3",
                "75",
                "65",
            ]
        );
    }

    #[test]
    fn test_set_row_distance_is_not_floored() {
        let summary = SetSummary {
            lap_count: 3,
            distance_meters: 3.0 * 22.86,
            ..sample_set()
        };
        let row = set_row(&summary, &DisplayZone::Source);
        assert_eq!(row[5], (3.0 * 22.86).to_string());
        assert_eq!(row[5].parse::<f64>().unwrap(), 3.0 * 22.86);
    }

    #[test]
    fn test_workout_row_keeps_raw_values() {
        let row = workout_row(&sample_workout(), &DisplayZone::Source);
        assert_eq!(
            row,
            vec![
                "2024-05-01 07:00:00",
                "2024-05-01 07:45:10",
                "45.1666",
                "1500",
                "",
                "128.25",
            ]
        );
    }

    #[test]
    fn test_set_header_follows_pace_reference() {
        let config = AnalysisConfig {
            pace_reference_distance_meters: 100.0,
            ..Default::default()
        };
        assert_eq!(set_header(&config)[6], "pace_sec_per_100m");
    }

    // ── write_sets / write_workouts ───────────────────────────────────────────

    #[test]
    fn test_write_sets_empty_is_header_only() {
        let out = sets_csv(&[], &AnalysisConfig::default());
        assert_eq!(
            out,
            "set_start_time,total_time_sec,avg_swolf,stroke_combo,lap_count,distance_m,pace_sec_per_50m\n"
        );
    }

    #[test]
    fn test_write_sets_row() {
        let out = sets_csv(&[sample_set()], &AnalysisConfig::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "2024-05-01 07:00:00,97.5,,Backstroke/Freestyle,3,75,65"
        );
    }

    #[test]
    fn test_write_workouts_empty_is_header_only() {
        let mut buf = Vec::new();
        write_workouts(&mut buf, &[], &DisplayZone::Source).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "start,end,duration_min,distance_m,calories_kcal,avg_hr\n"
        );
    }

    // ── write_results ─────────────────────────────────────────────────────────

    #[test]
    fn test_write_results_creates_both_files() {
        let dir = TempDir::new().unwrap();
        let workouts_path = dir.path().join("swimming_summary.csv");
        let sets_path = dir.path().join("swimming_sets_by_rest.csv");
        let result = result_of(vec![sample_workout()], vec![sample_set()]);

        write_results(&result, &AnalysisConfig::default(), &workouts_path, &sets_path).unwrap();

        let workouts = std::fs::read_to_string(&workouts_path).unwrap();
        let sets = std::fs::read_to_string(&sets_path).unwrap();
        assert_eq!(workouts.lines().count(), 2);
        assert_eq!(sets.lines().count(), 2);
        assert!(!tmp_sibling(&workouts_path).exists());
        assert!(!tmp_sibling(&sets_path).exists());
    }

    #[test]
    fn test_write_results_is_byte_identical_on_rerun() {
        let dir = TempDir::new().unwrap();
        let workouts_path = dir.path().join("w.csv");
        let sets_path = dir.path().join("s.csv");
        let result = result_of(vec![sample_workout()], vec![sample_set()]);
        let config = AnalysisConfig::default();

        write_results(&result, &config, &workouts_path, &sets_path).unwrap();
        let first = std::fs::read(&sets_path).unwrap();
        write_results(&result, &config, &workouts_path, &sets_path).unwrap();
        assert_eq!(std::fs::read(&sets_path).unwrap(), first);
    }

    #[test]
    fn test_write_results_failure_leaves_existing_files() {
        let dir = TempDir::new().unwrap();
        let workouts_path = dir.path().join("w.csv");
        std::fs::write(&workouts_path, "old").unwrap();
        let sets_path = dir.path().join("missing-dir").join("s.csv");
        let result = result_of(vec![sample_workout()], vec![sample_set()]);

        assert!(
            write_results(&result, &AnalysisConfig::default(), &workouts_path, &sets_path)
                .is_err()
        );
        assert_eq!(std::fs::read_to_string(&workouts_path).unwrap(), "old");
        assert!(!tmp_sibling(&workouts_path).exists());
    }

    #[test]
    fn test_write_results_named_zone() {
        let dir = TempDir::new().unwrap();
        let workouts_path = dir.path().join("w.csv");
        let sets_path = dir.path().join("s.csv");
        let config = AnalysisConfig {
            timezone: DisplayZone::parse("UTC").unwrap(),
            ..Default::default()
        };

        write_results(
            &result_of(vec![], vec![sample_set()]),
            &config,
            &workouts_path,
            &sets_path,
        )
        .unwrap();
        let sets = std::fs::read_to_string(&sets_path).unwrap();
        assert!(sets.contains("2024-04-30 22:00:00"));
    }
}
