//! Plain-text console report.

use std::path::Path;

use swim_core::formatting::{format_clock, format_measurement};
use swim_core::settings::AnalysisConfig;
use swim_data::aggregator::SetAggregator;
use swim_data::analysis::AnalysisResult;
use swim_data::writer::{set_header, set_row, workout_row, WORKOUT_HEADER};

/// Render the report printed after a successful run.
pub fn render_report(
    result: &AnalysisResult,
    config: &AnalysisConfig,
    workouts_path: &Path,
    sets_path: &Path,
) -> String {
    let zone = &config.timezone;

    let workout_rows: Vec<Vec<String>> = result
        .workouts
        .iter()
        .map(|w| workout_row(w, zone))
        .collect();
    let header: Vec<String> = WORKOUT_HEADER.iter().map(|h| h.to_string()).collect();
    let set_rows: Vec<Vec<String>> = result.sets.iter().map(|s| set_row(s, zone)).collect();
    let totals = SetAggregator::calculate_totals(&result.sets);

    let sections = [
        format!(
            "Swimming workouts: {} (of {} workouts)\n",
            result.metadata.swim_workouts, result.metadata.workouts_total
        ),
        render_table(&header, &workout_rows),
        format!(
            "\nSets by rest (threshold {}s, {} laps):\n",
            config.rest_threshold_seconds, result.metadata.laps_processed
        ),
        render_table(&set_header(config), &set_rows),
        format!(
            "\nTotal: {} sets, {} laps, {} m in {}\n",
            totals.set_count,
            totals.lap_count,
            format_measurement(Some(totals.distance_meters)),
            format_clock(Some(totals.total_time_seconds))
        ),
        "\nResults saved:\n".to_string(),
        format!("  - Workout summary: {}\n", workouts_path.display()),
        format!("  - Set analysis: {}\n", sets_path.display()),
    ];
    sections.concat()
}

/// Left-aligned columns padded to the widest cell; `(none)` when empty.
pub fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, header, &widths);
    if rows.is_empty() {
        out.push_str("(none)\n");
    }
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use swim_core::models::SetSummary;
    use swim_data::analysis::AnalysisMetadata;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(
            &strings(&["a", "bb"]),
            &[strings(&["long", "x"]), strings(&["s", "yy"])],
        );
        assert_eq!(table, "a     bb\nlong  x\ns     yy\n");
    }

    #[test]
    fn test_render_table_empty() {
        assert_eq!(render_table(&strings(&["a"]), &[]), "a\n(none)\n");
    }

    #[test]
    fn test_render_report_totals() {
        let result = AnalysisResult {
            workouts: vec![],
            sets: vec![SetSummary {
                set_start_time: DateTime::parse_from_rfc3339("2024-05-01T07:00:00+09:00")
                    .unwrap(),
                lap_count: 4,
                total_time_seconds: 130.0,
                distance_meters: 100.0,
                pace_seconds_per_reference: Some(65.0),
                avg_swolf: Some(41.0),
                stroke_combo: "Freestyle".to_string(),
            }],
            metadata: AnalysisMetadata {
                workouts_total: 3,
                swim_workouts: 1,
                laps_processed: 4,
                sets_created: 1,
                ..Default::default()
            },
        };

        let report = render_report(
            &result,
            &AnalysisConfig::default(),
            Path::new("w.csv"),
            Path::new("s.csv"),
        );
        assert!(report.contains("Swimming workouts: 1 (of 3 workouts)"));
        assert!(report.contains("2024-05-01 07:00:00"));
        assert!(report.contains("Total: 1 sets, 4 laps, 100 m in 2:10.0"));
        assert!(report.contains("  - Set analysis: s.csv"));
    }

    #[test]
    fn test_render_report_section_order() {
        let result = AnalysisResult {
            workouts: vec![],
            sets: vec![],
            metadata: AnalysisMetadata::default(),
        };
        let report = render_report(
            &result,
            &AnalysisConfig::default(),
            Path::new("w.csv"),
            Path::new("s.csv"),
        );
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Swimming workouts: 0 (of 0 workouts)");
        assert_eq!(lines[1], "start  end  duration_min  distance_m  calories_kcal  avg_hr");
        assert_eq!(lines[2], "(none)");
        assert_eq!(lines[4], "Sets by rest (threshold 30s, 0 laps):");
        assert_eq!(*lines.last().unwrap(), "  - Set analysis: s.csv");
        assert!(report.ends_with('\n'));
    }
}
