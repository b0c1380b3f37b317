/// Floor a value to one decimal place.
///
/// Non-finite values pass through unchanged.
///
/// # Examples
///
/// ```
/// use swim_core::formatting::floor_to_tenth;
///
/// assert_eq!(floor_to_tenth(62.59), 62.5);
/// assert_eq!(floor_to_tenth(60.0), 60.0);
/// assert_eq!(floor_to_tenth(-1.25), -1.3);
/// ```
pub fn floor_to_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    // Absorb float noise sitting just below a tenth boundary.
    let scaled = value * 10.0;
    let epsilon = f64::EPSILON * scaled.abs();
    (scaled + epsilon).floor() / 10.0
}

/// Render an optional measurement for tabular output.
///
/// `None` becomes an empty field; defined values are floored to one decimal
/// place and printed without a trailing `.0`.
///
/// # Examples
///
/// ```
/// use swim_core::formatting::format_measurement;
///
/// assert_eq!(format_measurement(Some(62.57)), "62.5");
/// assert_eq!(format_measurement(Some(75.0)),  "75");
/// assert_eq!(format_measurement(None),        "");
/// ```
pub fn format_measurement(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{}", floor_to_tenth(v)),
        _ => String::new(),
    }
}

/// Format a number of seconds as a stopwatch reading, `m:ss.t`.
///
/// Returns `"-"` for undefined or negative input.
///
/// # Examples
///
/// ```
/// use swim_core::formatting::format_clock;
///
/// assert_eq!(format_clock(Some(65.37)), "1:05.3");
/// assert_eq!(format_clock(Some(9.0)),   "0:09.0");
/// assert_eq!(format_clock(None),        "-");
/// ```
pub fn format_clock(seconds: Option<f64>) -> String {
    let Some(secs) = seconds.filter(|s| s.is_finite() && *s >= 0.0) else {
        return "-".to_string();
    };
    let tenths = (floor_to_tenth(secs) * 10.0).round() as u64;
    let minutes = tenths / 600;
    let rem = tenths % 600;
    format!("{}:{:02}.{}", minutes, rem / 10, rem % 10)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
