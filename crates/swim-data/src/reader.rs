//! Apple Health export discovery and loading.
//!
//! Streams `export.xml` with `quick-xml` and keeps only the `<Workout>`
//! subtrees, returned as [`RawWorkout`] records whose attribute values are
//! still unparsed strings. Typing happens in [`crate::extractor`].

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use swim_core::error::{Result, SwimError};
use tracing::{debug, warn};

/// File name Apple Health uses for the main export document.
pub const EXPORT_FILE_NAME: &str = "export.xml";

// ── Raw records ───────────────────────────────────────────────────────────────

/// A `<MetadataEntry key=".." value=".."/>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// A `<WorkoutStatistics>` element that is a direct child of a workout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStatistic {
    pub stat_type: String,
    pub sum: Option<String>,
    pub average: Option<String>,
    pub unit: Option<String>,
}

/// A `<WorkoutEvent>` element and its metadata children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvent {
    pub event_type: String,
    pub date: Option<String>,
    pub duration: Option<String>,
    pub duration_unit: Option<String>,
    pub metadata: Vec<MetadataEntry>,
}

/// A `<Workout>` element with the children the analysis needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWorkout {
    pub activity_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration: Option<String>,
    pub duration_unit: Option<String>,
    /// Legacy summary attributes, present on exports from older iOS versions.
    pub total_distance: Option<String>,
    pub total_distance_unit: Option<String>,
    pub total_energy_burned: Option<String>,
    pub total_energy_burned_unit: Option<String>,
    pub statistics: Vec<RawStatistic>,
    pub events: Vec<RawEvent>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Resolve `path` to an export document.
///
/// A file path is returned as-is. A directory is searched recursively for
/// `export.xml`; the shallowest match (then the first by path) wins.
pub fn find_export_file(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if !path.is_dir() {
        warn!("Export path does not exist: {}", path.display());
        return Err(SwimError::ExportNotFound(path.to_path_buf()));
    }

    let mut candidates: Vec<(usize, PathBuf)> = walkdir::WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == EXPORT_FILE_NAME)
        .map(|entry| (entry.depth(), entry.into_path()))
        .collect();

    candidates.sort();
    candidates
        .into_iter()
        .next()
        .map(|(_, p)| p)
        .ok_or_else(|| SwimError::ExportNotFound(path.to_path_buf()))
}

/// Locate and parse the export at `path`, returning every workout in it.
pub fn load_workouts(path: &Path) -> Result<Vec<RawWorkout>> {
    let export_path = find_export_file(path)?;
    let file = std::fs::File::open(&export_path).map_err(|source| SwimError::FileRead {
        path: export_path.clone(),
        source,
    })?;

    let workouts = parse_workouts(std::io::BufReader::new(file))?;
    debug!(
        "Loaded {} workouts from {}",
        workouts.len(),
        export_path.display()
    );
    Ok(workouts)
}

/// Parse every `<Workout>` element from an XML stream.
///
/// Elements outside workouts (health records, correlations, ...) are skipped
/// without being materialised.
pub fn parse_workouts<R: BufRead>(reader: R) -> Result<Vec<RawWorkout>> {
    let mut xml = quick_xml::Reader::from_reader(reader);
    let mut buf = Vec::new();

    let mut workouts: Vec<RawWorkout> = Vec::new();
    let mut current: Option<RawWorkout> = None;
    // Names of the elements open below the current workout.
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut open_event: Option<RawEvent> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if let Some(workout) = current.as_mut() {
                    let direct_child = open.is_empty();
                    handle_child(&e, direct_child, workout, &mut open_event, false)?;
                    open.push(e.name().as_ref().to_vec());
                } else if e.name().as_ref() == b"Workout" {
                    current = Some(workout_from(&e)?);
                }
            }
            Event::Empty(e) => {
                if let Some(workout) = current.as_mut() {
                    let direct_child = open.is_empty();
                    handle_child(&e, direct_child, workout, &mut open_event, true)?;
                } else if e.name().as_ref() == b"Workout" {
                    workouts.push(workout_from(&e)?);
                }
            }
            Event::End(_) => {
                if let Some(mut workout) = current.take() {
                    match open.pop() {
                        None => workouts.push(workout),
                        Some(name) => {
                            if name == b"WorkoutEvent" && open.is_empty() {
                                if let Some(event) = open_event.take() {
                                    workout.events.push(event);
                                }
                            }
                            current = Some(workout);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if current.is_some() {
        return Err(SwimError::MalformedInput(
            "export ended inside an unclosed <Workout>".to_string(),
        ));
    }

    Ok(workouts)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Collect an element's attributes, unescaping their values.
fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn workout_from(e: &BytesStart<'_>) -> Result<RawWorkout> {
    let mut attrs = attributes(e)?;
    Ok(RawWorkout {
        activity_type: attrs.remove("workoutActivityType").unwrap_or_default(),
        start_date: attrs.remove("startDate"),
        end_date: attrs.remove("endDate"),
        duration: attrs.remove("duration"),
        duration_unit: attrs.remove("durationUnit"),
        total_distance: attrs.remove("totalDistance"),
        total_distance_unit: attrs.remove("totalDistanceUnit"),
        total_energy_burned: attrs.remove("totalEnergyBurned"),
        total_energy_burned_unit: attrs.remove("totalEnergyBurnedUnit"),
        statistics: Vec::new(),
        events: Vec::new(),
    })
}

/// Attach one element found inside a workout.
///
/// Events and statistics are read only as direct children of the workout;
/// copies nested under `<WorkoutActivity>` are skipped.
/// `self_closing` events have no children and are stored immediately;
/// otherwise the event stays open until its end tag.
fn handle_child(
    e: &BytesStart<'_>,
    direct_child: bool,
    workout: &mut RawWorkout,
    open_event: &mut Option<RawEvent>,
    self_closing: bool,
) -> Result<()> {
    match e.name().as_ref() {
        b"WorkoutEvent" if direct_child => {
            let mut attrs = attributes(e)?;
            let event = RawEvent {
                event_type: attrs.remove("type").unwrap_or_default(),
                date: attrs.remove("date"),
                duration: attrs.remove("duration"),
                duration_unit: attrs.remove("durationUnit"),
                metadata: Vec::new(),
            };
            if self_closing {
                workout.events.push(event);
            } else {
                *open_event = Some(event);
            }
        }
        b"WorkoutStatistics" if direct_child => {
            let mut attrs = attributes(e)?;
            workout.statistics.push(RawStatistic {
                stat_type: attrs.remove("type").unwrap_or_default(),
                sum: attrs.remove("sum"),
                average: attrs.remove("average"),
                unit: attrs.remove("unit"),
            });
        }
        b"MetadataEntry" => {
            // Workout-level metadata is not used.
            if let Some(event) = open_event.as_mut() {
                let mut attrs = attributes(e)?;
                if let (Some(key), Some(value)) = (attrs.remove("key"), attrs.remove("value")) {
                    event.metadata.push(MetadataEntry { key, value });
                }
            }
        }
        _ => {}
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
