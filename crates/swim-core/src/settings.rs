use chrono::{Datelike, NaiveDate};
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SwimError};
use crate::time_utils::DisplayZone;

pub const DEFAULT_REST_THRESHOLD_SECONDS: f64 = 30.0;
pub const DEFAULT_LAP_DISTANCE_METERS: f64 = 25.0;
pub const DEFAULT_PACE_REFERENCE_METERS: f64 = 50.0;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Rest-based swim set analysis for Apple Health exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "swim-analyzer",
    about = "Rest-based swim set analysis for Apple Health exports",
    version
)]
pub struct Settings {
    /// Path to export.xml, or a directory containing it
    #[arg(default_value = "apple_health_export/export.xml")]
    pub input: PathBuf,

    /// Output CSV for the per-workout summary
    #[arg(long, default_value = "swimming_summary.csv")]
    pub workouts_csv: PathBuf,

    /// Output CSV for the per-set summary
    #[arg(long, default_value = "swimming_sets_by_rest.csv")]
    pub sets_csv: PathBuf,

    /// Rest between lap starts (seconds) above which a new set begins
    #[arg(long, default_value = "30")]
    pub rest_threshold: f64,

    /// Pool length in metres
    #[arg(long, default_value = "25")]
    pub lap_distance: f64,

    /// Reference distance for pace (metres)
    #[arg(long, default_value = "50")]
    pub pace_distance: f64,

    /// Only analyse workouts from this year
    #[arg(long)]
    pub year: Option<i32>,

    /// Only analyse workouts from this month (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Only analyse workouts from this day of the month (1-31)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=31))]
    pub day: Option<u32>,

    /// Timezone for dates: "source", "local" or an IANA name
    #[arg(long, default_value = "source")]
    pub timezone: String,

    /// JSON config file (defaults to ~/.swim-analyzer/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective parameters back to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Do not print result tables to stdout
    #[arg(long)]
    pub quiet: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Parameters persisted in the JSON config file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workouts_csv: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets_csv: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_threshold_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap_distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace_reference_distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl ConfigFile {
    /// Return the default path to the config file.
    /// Uses `~/.swim-analyzer/config.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".swim-analyzer").join("config.json")
    }

    /// Load the config file at `path`.
    ///
    /// A missing file yields `Ok(None)`; a file that exists but cannot be read
    /// or parsed is a configuration error.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| SwimError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SwimError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Atomically write the config to `path`, creating parent directories if
    /// needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }
}

// ── DateFilter ─────────────────────────────────────────────────────────────────

/// Calendar filter on workout start dates; each component is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl DateFilter {
    /// `true` when every set component equals the date's component.
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.year.map_or(true, |y| date.year() == y)
            && self.month.map_or(true, |m| date.month() == m)
            && self.day.map_or(true, |d| date.day() == d)
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }

    /// Human-readable summary, e.g. `"Year: 2024, Month: 5"`.
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(y) = self.year {
            parts.push(format!("Year: {}", y));
        }
        if let Some(m) = self.month {
            parts.push(format!("Month: {}", m));
        }
        if let Some(d) = self.day {
            parts.push(format!("Day: {}", d));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

// ── AnalysisConfig ─────────────────────────────────────────────────────────────

/// Everything the extraction, segmentation and aggregation steps need.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Start-to-start gap (seconds) above which a new set begins.
    pub rest_threshold_seconds: f64,
    /// Distance credited for each lap.
    pub lap_distance_meters: f64,
    /// Distance that pace is expressed against.
    pub pace_reference_distance_meters: f64,
    pub date_filter: DateFilter,
    pub timezone: DisplayZone,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rest_threshold_seconds: DEFAULT_REST_THRESHOLD_SECONDS,
            lap_distance_meters: DEFAULT_LAP_DISTANCE_METERS,
            pace_reference_distance_meters: DEFAULT_PACE_REFERENCE_METERS,
            date_filter: DateFilter::default(),
            timezone: DisplayZone::Source,
        }
    }
}

impl AnalysisConfig {
    /// Reject values that would make segmentation or pace meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.rest_threshold_seconds.is_finite() || self.rest_threshold_seconds < 0.0 {
            return Err(SwimError::Config(format!(
                "rest threshold must be a non-negative number of seconds, got {}",
                self.rest_threshold_seconds
            )));
        }
        if !self.lap_distance_meters.is_finite() || self.lap_distance_meters <= 0.0 {
            return Err(SwimError::Config(format!(
                "lap distance must be positive, got {}",
                self.lap_distance_meters
            )));
        }
        if !self.pace_reference_distance_meters.is_finite()
            || self.pace_reference_distance_meters <= 0.0
        {
            return Err(SwimError::Config(format!(
                "pace reference distance must be positive, got {}",
                self.pace_reference_distance_meters
            )));
        }
        if let Some(m) = self.date_filter.month {
            if !(1..=12).contains(&m) {
                return Err(SwimError::Config(format!("month out of range: {}", m)));
            }
        }
        if let Some(d) = self.date_filter.day {
            if !(1..=31).contains(&d) {
                return Err(SwimError::Config(format!("day out of range: {}", d)));
            }
        }
        Ok(())
    }

    /// Column label for pace, e.g. `"pace_sec_per_50m"`.
    pub fn pace_column(&self) -> String {
        format!("pace_sec_per_{}m", self.pace_reference_distance_meters)
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and merge the config file underneath them.
    pub fn load() -> Result<Self> {
        Self::load_impl(std::env::args_os().collect(), &ConfigFile::config_path())
    }

    /// Full implementation; accepts args and the default config path so that
    /// tests can redirect to a temporary directory.
    ///
    /// `--config` replaces `default_config_path`. Values given on the command
    /// line win over the file, and file values win over built-in defaults.
    pub fn load_impl(args: Vec<std::ffi::OsString>, default_config_path: &Path) -> Result<Self> {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        // Parse into the typed struct using the same args.
        let mut settings = Settings::parse_from(args);

        let config_path = settings
            .config
            .clone()
            .unwrap_or_else(|| default_config_path.to_path_buf());

        if let Some(file) = ConfigFile::load_from(&config_path)? {
            settings.merge_file(file, &matches);
        } else if settings.config.is_some() {
            return Err(SwimError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        Ok(settings)
    }

    /// Path the config file is read from and saved to.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(ConfigFile::config_path)
    }

    /// Build the validated [`AnalysisConfig`] for this run.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let config = AnalysisConfig {
            rest_threshold_seconds: self.rest_threshold,
            lap_distance_meters: self.lap_distance,
            pace_reference_distance_meters: self.pace_distance,
            date_filter: DateFilter {
                year: self.year,
                month: self.month,
                day: self.day,
            },
            timezone: DisplayZone::parse(&self.timezone)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fill every field not given on the command line from `file`.
    fn merge_file(&mut self, file: ConfigFile, matches: &clap::ArgMatches) {
        // NOTE: clap stores the arg id using the *field name* (underscores),
        // not the long-flag spelling (hyphens).
        if !is_arg_explicitly_set(matches, "input") {
            if let Some(v) = file.input {
                self.input = v;
            }
        }
        if !is_arg_explicitly_set(matches, "workouts_csv") {
            if let Some(v) = file.workouts_csv {
                self.workouts_csv = v;
            }
        }
        if !is_arg_explicitly_set(matches, "sets_csv") {
            if let Some(v) = file.sets_csv {
                self.sets_csv = v;
            }
        }
        if !is_arg_explicitly_set(matches, "rest_threshold") {
            if let Some(v) = file.rest_threshold_seconds {
                self.rest_threshold = v;
            }
        }
        if !is_arg_explicitly_set(matches, "lap_distance") {
            if let Some(v) = file.lap_distance_meters {
                self.lap_distance = v;
            }
        }
        if !is_arg_explicitly_set(matches, "pace_distance") {
            if let Some(v) = file.pace_reference_distance_meters {
                self.pace_distance = v;
            }
        }
        if !is_arg_explicitly_set(matches, "timezone") {
            if let Some(v) = file.timezone {
                self.timezone = v;
            }
        }
        if self.year.is_none() {
            self.year = file.year;
        }
        if self.month.is_none() {
            self.month = file.month;
        }
        if self.day.is_none() {
            self.day = file.day;
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for ConfigFile {
    fn from(s: &Settings) -> Self {
        ConfigFile {
            input: Some(s.input.clone()),
            workouts_csv: Some(s.workouts_csv.clone()),
            sets_csv: Some(s.sets_csv.clone()),
            rest_threshold_seconds: Some(s.rest_threshold),
            lap_distance_meters: Some(s.lap_distance),
            pace_reference_distance_meters: Some(s.pace_distance),
            year: s.year,
            month: s.month,
            day: s.day,
            timezone: Some(s.timezone.clone()),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
