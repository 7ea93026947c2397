use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::trace;

use crate::clock;
use crate::grid::add_days;

/// One recurring entry of the weekly timetable.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub weekday: Weekday,
    /// Wall-clock start, `HH:MM` or `HH:MM:SS`.
    pub start: String,
    /// Elapsed time in the same clock format, added to `start`.
    pub duration: String,
    pub label: String,
    /// Explicit `YYYY-MM-DD` dates the activity is limited to.
    pub dates: Option<BTreeSet<String>>,
}

impl Activity {
    pub fn new(weekday: Weekday, start: &str, duration: &str, label: &str) -> Self {
        Self {
            weekday,
            start: start.to_string(),
            duration: duration.to_string(),
            label: label.to_string(),
            dates: None,
        }
    }

    pub fn with_dates<I, S>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dates = Some(dates.into_iter().map(Into::into).collect());
        self
    }

    pub fn start_hours(&self) -> Option<f64> {
        clock::parse_clock_to_fractional_hours(&self.start)
    }

    pub fn duration_hours(&self) -> f64 {
        clock::duration_hours_or_default(&self.duration)
    }

    pub fn end_hours(&self) -> Option<f64> {
        self.start_hours().map(|start| start + self.duration_hours())
    }

    /// `HH:MM` start label; the raw start string when it cannot be parsed.
    pub fn start_label(&self) -> String {
        clock::format_clock(&self.start).unwrap_or_else(|| self.start.clone())
    }

    /// Whether the explicit date list (if any) admits `key`.
    pub fn occurs_on_key(&self, key: &str) -> bool {
        match &self.dates {
            Some(dates) => dates.contains(key),
            None => true,
        }
    }
}

/// How the optional `dates` list of an activity is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRestriction {
    /// Activities with a date list only occur on the listed dates.
    #[default]
    Enforce,
    /// Date lists are ignored and every activity recurs weekly.
    Ignore,
}

impl DateRestriction {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "enforce" | "on" | "yes" | "true" | "1" => Some(Self::Enforce),
            "ignore" | "off" | "no" | "false" | "0" => Some(Self::Ignore),
            _ => None,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::Ignore => "ignore",
        }
    }
}

/// Activities grouped by weekday. All seven days are always present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklySchedule {
    days: [Vec<Activity>; 7],
    restriction: DateRestriction,
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_restriction(mut self, restriction: DateRestriction) -> Self {
        self.restriction = restriction;
        self
    }

    pub fn date_restriction(&self) -> DateRestriction {
        self.restriction
    }

    /// Appends an activity to the end of its weekday's list.
    pub fn push(&mut self, activity: Activity) {
        let idx = day_index(activity.weekday);
        self.days[idx].push(activity);
    }

    pub fn day(&self, weekday: Weekday) -> &[Activity] {
        &self.days[day_index(weekday)]
    }

    pub fn len(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }

    /// Activities occurring on `date`, in stored order.
    pub fn activities_on(&self, date: NaiveDate) -> Vec<&Activity> {
        let listed = self.day(date.weekday());
        if listed.is_empty() {
            return Vec::new();
        }

        match self.restriction {
            DateRestriction::Ignore => listed.iter().collect(),
            DateRestriction::Enforce => {
                let key = clock::to_date_key(&date);
                let found: Vec<&Activity> = listed
                    .iter()
                    .filter(|activity| activity.occurs_on_key(&key))
                    .collect();
                trace!(
                    date = %key,
                    listed = listed.len(),
                    kept = found.len(),
                    "applied date restriction"
                );
                found
            }
        }
    }

    /// `(date, activities)` for every date from `start` to `end`, inclusive.
    pub fn activities_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<(NaiveDate, Vec<&Activity>)> {
        let mut out = Vec::new();
        let mut day = start;
        while day <= end {
            out.push((day, self.activities_on(day)));
            let next = add_days(day, 1);
            if next == day {
                break;
            }
            day = next;
        }
        out
    }
}

fn day_index(weekday: Weekday) -> usize {
    weekday.num_days_from_sunday() as usize
}
