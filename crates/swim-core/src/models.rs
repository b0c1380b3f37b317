use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stroke style recorded on a lap event (`HKSwimmingStrokeStyle`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrokeStyle {
    Mixed,
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    /// Kickboard and drill laps.
    Drill,
    /// A code HealthKit emitted that has no known mapping.
    Unknown(String),
}

impl StrokeStyle {
    /// Map a raw HealthKit stroke code to a [`StrokeStyle`].
    ///
    /// ```
    /// use swim_core::models::StrokeStyle;
    ///
    /// assert_eq!(StrokeStyle::from_code("2"), StrokeStyle::Freestyle);
    /// assert_eq!(StrokeStyle::from_code("9").label(), "Unknown (9)");
    /// ```
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::Mixed,
            "2" => Self::Freestyle,
            "3" => Self::Backstroke,
            "4" => Self::Breaststroke,
            "5" => Self::Butterfly,
            "6" => Self::Drill,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Human-readable label used in tables and stroke combinations.
    pub fn label(&self) -> String {
        match self {
            Self::Mixed => "Mixed".to_string(),
            Self::Freestyle => "Freestyle".to_string(),
            Self::Backstroke => "Backstroke".to_string(),
            Self::Breaststroke => "Breaststroke".to_string(),
            Self::Butterfly => "Butterfly".to_string(),
            Self::Drill => "Other/Drill".to_string(),
            Self::Unknown(code) => format!("Unknown ({})", code),
        }
    }
}

impl fmt::Display for StrokeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One recorded swimming interval, built once from a lap event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Start of the lap, carrying the UTC offset it was recorded with.
    pub timestamp: DateTime<FixedOffset>,
    /// Lap duration in seconds.
    pub duration_seconds: f64,
    /// Stroke style, when the device recorded one.
    #[serde(default)]
    pub stroke_style: Option<StrokeStyle>,
    /// SWOLF score, when the device recorded one.
    #[serde(default)]
    pub swolf_score: Option<f64>,
}

/// A maximal run of consecutive laps without a rest gap over the threshold.
///
/// Always holds at least one lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimSet {
    pub laps: Vec<Lap>,
}

impl SwimSet {
    /// Open a set with its first lap.
    pub fn new(first: Lap) -> Self {
        Self { laps: vec![first] }
    }

    /// Start time of the first lap.
    pub fn start_time(&self) -> DateTime<FixedOffset> {
        self.laps[0].timestamp
    }

    /// Start time of the last lap.
    pub fn last_start_time(&self) -> DateTime<FixedOffset> {
        self.laps[self.laps.len() - 1].timestamp
    }

    pub fn lap_count(&self) -> usize {
        self.laps.len()
    }
}

/// Aggregate statistics for one [`SwimSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSummary {
    /// Start time of the set's first lap.
    pub set_start_time: DateTime<FixedOffset>,
    /// Number of laps in the set (at least 1).
    pub lap_count: usize,
    /// Summed lap durations in seconds.
    pub total_time_seconds: f64,
    /// `lap_count × lap_distance`.
    pub distance_meters: f64,
    /// Seconds per pace reference distance; `None` when undefined.
    pub pace_seconds_per_reference: Option<f64>,
    /// Mean of the laps' SWOLF scores; `None` when no lap has one.
    pub avg_swolf: Option<f64>,
    /// Distinct stroke labels, sorted and joined with `/`.
    pub stroke_combo: String,
}

/// One swimming workout as recorded by HealthKit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// Workout duration in minutes.
    pub duration_minutes: f64,
    /// Total swimming distance in metres.
    pub distance_meters: Option<f64>,
    /// Active energy burned in kilocalories.
    pub calories_kcal: Option<f64>,
    /// Average heart rate in beats per minute.
    pub avg_heart_rate_bpm: Option<f64>,
}
