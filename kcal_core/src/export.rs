//! Export of the workout history as JSON or CSV text.
//!
//! Both exports are complete snapshots in collection order. CSV dates are
//! rendered for the viewer (local time zone, configurable date pattern).

use crate::{Error, Result, WorkoutRecord};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Header row of the CSV export
pub const CSV_HEADERS: [&str; 5] = [
    "Date",
    "Workout Type",
    "Duration (min)",
    "Calories",
    "Intensity",
];

/// How record dates are shown to the viewer
#[derive(Clone, Debug)]
pub struct DateStyle {
    pattern: String,
    utc: bool,
}

impl DateStyle {
    /// Local-time rendering with a strftime `pattern`
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Config(format!("invalid date format '{}'", pattern)));
        }
        Ok(Self {
            pattern,
            utc: false,
        })
    }

    /// Render in UTC instead of the local time zone
    pub fn in_utc(mut self) -> Self {
        self.utc = true;
        self
    }

    pub fn render(&self, at: DateTime<Utc>) -> String {
        if self.utc {
            at.format(&self.pattern).to_string()
        } else {
            at.with_timezone(&Local).format(&self.pattern).to_string()
        }
    }
}

impl Default for DateStyle {
    /// Short US-style date, e.g. `3/14/2025`
    fn default() -> Self {
        Self {
            pattern: "%-m/%-d/%Y".into(),
            utc: false,
        }
    }
}

/// Supported export formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// `workout-data-YYYY-MM-DD.<ext>`
    pub fn default_file_name(&self, date: NaiveDate) -> String {
        format!("workout-data-{}.{}", date.format("%Y-%m-%d"), self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::Config(format!(
                "unknown export format '{}' (expected json or csv)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Pretty-printed JSON array (2-space indent)
pub fn to_json(records: &[WorkoutRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Workout type as a one-line CSV field
///
/// Validated input never carries control characters, but a hand-edited
/// history file can; they are flattened to spaces so every record stays on
/// its own line.
fn single_line(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Header plus one row per record, `\n`-separated, no trailing newline
pub fn to_csv(records: &[WorkoutRecord], dates: &DateStyle) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record([
            dates.render(record.recorded_at()),
            single_line(record.workout_type()),
            record.duration_minutes().to_string(),
            record.calories().to_string(),
            record.display_intensity().as_str().to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}
