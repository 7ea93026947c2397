use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::Weekday;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::clock;
use crate::schedule::{Activity, WeeklySchedule};

/// One entry as written in a timetable file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceActivity {
    #[serde(rename = "Start")]
    pub start: String,

    #[serde(rename = "Duration")]
    pub duration: String,

    #[serde(rename = "Activity")]
    pub activity: String,

    #[serde(rename = "Dates", default)]
    pub dates: Option<Vec<String>>,
}

/// Weekday name or Sunday-based number, mapped to that day's entries.
pub type SourceTimetable = BTreeMap<String, Vec<SourceActivity>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimetableFormat {
    Json,
    Toml,
}

impl TimetableFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_timetable(path: &Path) -> anyhow::Result<WeeklySchedule> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read timetable {}", path.display()))?;
    let format = TimetableFormat::from_path(path);
    let schedule = parse_timetable_str(&raw, format)
        .with_context(|| format!("failed to load timetable {}", path.display()))?;

    info!(
        activities = schedule.len(),
        ?format,
        "loaded timetable"
    );
    Ok(schedule)
}

pub fn parse_timetable_str(raw: &str, format: TimetableFormat) -> anyhow::Result<WeeklySchedule> {
    let source: SourceTimetable = match format {
        TimetableFormat::Json => {
            serde_json::from_str(raw).context("timetable is not valid JSON")?
        }
        TimetableFormat::Toml => toml::from_str(raw).context("timetable is not valid TOML")?,
    };
    schedule_from_source(source)
}

pub fn schedule_from_source(source: SourceTimetable) -> anyhow::Result<WeeklySchedule> {
    let mut schedule = WeeklySchedule::new();
    let mut seen: HashMap<Weekday, String> = HashMap::new();

    for (key, entries) in source {
        let weekday = resolve_weekday_key(&key)
            .ok_or_else(|| anyhow!("unknown weekday key in timetable: {key}"))?;
        // One key per weekday; sorted keys cannot keep file order across aliases.
        if let Some(first) = seen.insert(weekday, key.clone()) {
            return Err(anyhow!(
                "timetable lists {weekday} under both {first:?} and {key:?}"
            ));
        }
        debug!(key = %key, weekday = ?weekday, entries = entries.len(), "timetable day");

        for entry in entries {
            if clock::parse_clock_to_fractional_hours(&entry.start).is_none() {
                warn!(
                    activity = %entry.activity,
                    start = %entry.start,
                    "start is not a clock time; activity will not be placed on the hour grid"
                );
            }
            if let Some(dates) = &entry.dates {
                for date in dates {
                    if clock::parse_date_key(date).is_none() {
                        warn!(activity = %entry.activity, date = %date, "date is not YYYY-MM-DD");
                    }
                }
            }

            let mut activity =
                Activity::new(weekday, &entry.start, &entry.duration, &entry.activity);
            if let Some(dates) = entry.dates {
                activity = activity.with_dates(dates);
            }
            schedule.push(activity);
        }
    }

    Ok(schedule)
}

fn resolve_weekday_key(key: &str) -> Option<Weekday> {
    let trimmed = key.trim();
    let number = match trimmed.parse::<u32>() {
        Ok(n) => n,
        Err(_) => clock::weekday_number(trimmed)?,
    };
    clock::weekday_from_number(number)
}
