use chrono::{DateTime, FixedOffset, NaiveDateTime};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Result, SwimError};

/// Wall-clock layout used for every timestamp written to the output tables.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly, no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse a HealthKit timestamp, keeping the UTC offset it was recorded with.
///
/// HealthKit writes `"2024-05-01 07:30:12 +0900"`. RFC 3339 strings are
/// accepted too, and offset-less date-times are read as UTC.
pub fn parse_health_timestamp(s: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SwimError::TimestampParse(s.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    Err(SwimError::TimestampParse(s.to_string()))
}

// ── DisplayZone ───────────────────────────────────────────────────────────────

/// Timezone used to turn instants into wall-clock times for filtering and
/// display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// Keep the offset each timestamp was recorded with.
    #[default]
    Source,
    /// Convert every timestamp into this IANA zone.
    Named(Tz),
}

impl DisplayZone {
    /// Resolve a zone setting: `"source"`, `"local"` or an IANA name.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "" | "source" => Ok(Self::Source),
            "local" => {
                let system = get_system_timezone();
                let tz = system.parse::<Tz>().unwrap_or_else(|_| {
                    warn!(
                        "DisplayZone: unrecognised system timezone \"{}\", falling back to UTC",
                        system
                    );
                    Tz::UTC
                });
                Ok(Self::Named(tz))
            }
            _ => name
                .trim()
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|_| SwimError::Config(format!("unknown timezone \"{}\"", name))),
        }
    }

    /// The wall-clock time of `dt` in this zone.
    pub fn local_datetime(&self, dt: &DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            Self::Source => dt.naive_local(),
            Self::Named(tz) => dt.with_timezone(tz).naive_local(),
        }
    }

    /// Render `dt` as `"%Y-%m-%d %H:%M:%S"` wall-clock time in this zone.
    pub fn format(&self, dt: &DateTime<FixedOffset>) -> String {
        self.local_datetime(dt).format(DISPLAY_FORMAT).to_string()
    }

    /// Setting name that round-trips through [`DisplayZone::parse`].
    pub fn name(&self) -> String {
        match self {
            Self::Source => "source".to_string(),
            Self::Named(tz) => tz.name().to_string(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
