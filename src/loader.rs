use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::CompletionPolicy;
use crate::models::EventRow;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "Missing columns: {}. Ensure the dataset includes: {}",
        .missing.join(", "),
        .required.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        required: Vec<String>,
    },

    #[error("Record {record}: column {column} holds '{value}', expected a number")]
    InvalidValue {
        record: usize,
        column: &'static str,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// The uploaded table after validation and parsing.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub columns: Vec<String>,
    pub events: Vec<EventRow>,
    /// Rows dropped because they had no `user_id` to group by.
    pub skipped_rows: usize,
}

impl EventTable {
    pub fn user_count(&self) -> usize {
        self.events
            .iter()
            .map(|event| event.user_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[derive(serde::Deserialize)]
struct CsvRow {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    lesson_id: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    playback_minutes: Option<String>,
    #[serde(default)]
    actual_hours: Option<String>,
    #[serde(default)]
    speed: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default, rename = "_pause")]
    pause: Option<String>,
    #[serde(default, rename = "_seek")]
    seek: Option<String>,
    #[serde(default, rename = "_pb_type")]
    pb_type: Option<String>,
    #[serde(default)]
    topic_title: Option<String>,
}

pub fn load_events(path: &Path, policy: CompletionPolicy) -> Result<EventTable, LoadError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    let table = read_events(file, policy)?;
    info!(
        path = %path.display(),
        rows = table.events.len(),
        skipped = table.skipped_rows,
        "loaded playback events"
    );
    Ok(table)
}

/// Reads a delimited table, checking the policy's required columns first.
pub fn read_events<R: std::io::Read>(
    input: R,
    policy: CompletionPolicy,
) -> Result<EventTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    check_columns(&columns, policy)?;

    let mut events = Vec::new();
    let mut skipped_rows = 0usize;

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let record = index + 1;
        let row = result?;

        let Some(user_id) = row.user_id.filter(|id| !id.trim().is_empty()) else {
            warn!(record, "skipping row without user_id");
            skipped_rows += 1;
            continue;
        };

        events.push(EventRow {
            user_id,
            lesson_id: row.lesson_id.filter(|id| !id.trim().is_empty()),
            start_time: row.start_time.unwrap_or_default(),
            end_time: row.end_time.unwrap_or_default(),
            playback_minutes: parse_float(record, "playback_minutes", row.playback_minutes)?,
            actual_hours: parse_float(record, "actual_hours", row.actual_hours)?,
            speed: parse_float(record, "speed", row.speed)?,
            duration: parse_float(record, "duration", row.duration)?,
            pause: parse_count(record, "_pause", row.pause)?,
            seek: parse_count(record, "_seek", row.seek)?,
            pb_type: parse_count(record, "_pb_type", row.pb_type)?,
            topic_title: row.topic_title.filter(|title| !title.trim().is_empty()),
        });
    }

    Ok(EventTable {
        columns,
        events,
        skipped_rows,
    })
}

fn check_columns(columns: &[String], policy: CompletionPolicy) -> Result<(), LoadError> {
    let required = policy.required_columns();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !columns.iter().any(|column| column == *name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns {
            missing,
            required: required.iter().map(|name| name.to_string()).collect(),
        })
    }
}

fn parse_float(
    record: usize,
    column: &'static str,
    cell: Option<String>,
) -> Result<Option<f64>, LoadError> {
    let Some(raw) = cell.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };

    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(LoadError::InvalidValue {
            record,
            column,
            value: raw,
        }),
    }
}

/// Counts and codes accept integers and integral floats such as `2.0`.
fn parse_count(
    record: usize,
    column: &'static str,
    cell: Option<String>,
) -> Result<Option<i64>, LoadError> {
    let Some(raw) = cell.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };

    let value = raw.trim();
    if let Ok(parsed) = value.parse::<i64>() {
        return Ok(Some(parsed));
    }

    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_nan() => Ok(None),
        Ok(parsed)
            if parsed.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&parsed) =>
        {
            Ok(Some(parsed as i64))
        }
        _ => Err(LoadError::InvalidValue {
            record,
            column,
            value: raw,
        }),
    }
}
