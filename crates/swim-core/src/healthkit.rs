//! HealthKit identifiers found in an Apple Health `export.xml`.

/// Workout activity types treated as swimming.
pub const SWIM_ACTIVITY_TYPES: &[&str] = &[
    "HKWorkoutActivityTypeSwimming",
    "HKWorkoutActivityTypePoolSwimming",
    "HKWorkoutActivityTypeOpenWaterSwimming",
];

pub const DISTANCE_SWIMMING: &str = "HKQuantityTypeIdentifierDistanceSwimming";
pub const ACTIVE_ENERGY_BURNED: &str = "HKQuantityTypeIdentifierActiveEnergyBurned";
pub const HEART_RATE: &str = "HKQuantityTypeIdentifierHeartRate";

/// Workout event type marking one pool length.
pub const LAP_EVENT_TYPE: &str = "HKWorkoutEventTypeLap";

pub const STROKE_STYLE_KEY: &str = "HKSwimmingStrokeStyle";
pub const SWOLF_KEY: &str = "HKSWOLFScore";

/// `true` when `activity_type` is one of [`SWIM_ACTIVITY_TYPES`].
pub fn is_swim_activity(activity_type: &str) -> bool {
    SWIM_ACTIVITY_TYPES.contains(&activity_type)
}
