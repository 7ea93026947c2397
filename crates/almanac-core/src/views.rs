//! Per-granularity queries behind the Day, Week, Month and Year views.
//!
//! The current view and focus date are owned by the caller and passed in;
//! nothing here keeps state between calls except [`PopupState`], which the
//! caller holds.

use chrono::{
  Datelike,
  NaiveDate
};

use crate::clock;
use crate::grid::{
  self,
  CalendarGrid
};
use crate::schedule::{
  Activity,
  WeeklySchedule
};

pub const HOURS_PER_DAY: u32 = 24;
pub const DEFAULT_PREVIEW_LIMIT: usize =
  2;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
pub enum ViewMode {
  Day,
  #[default]
  Week,
  Month,
  Year
}

impl ViewMode {
  pub fn all() -> [Self; 4] {
    [
      Self::Day,
      Self::Week,
      Self::Month,
      Self::Year
    ]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Day => "day",
      | Self::Week => "week",
      | Self::Month => "month",
      | Self::Year => "year"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Day => "Day",
      | Self::Week => "Week",
      | Self::Month => "Month",
      | Self::Year => "Year"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "day" => Some(Self::Day),
      | "week" => Some(Self::Week),
      | "month" => Some(Self::Month),
      | "year" => Some(Self::Year),
      | _ => None
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Navigation {
  Previous,
  Today,
  Next
}

/// Moves `focus` one step of `view` in the direction of `nav`.
///
/// Month and year steps keep the day of month where possible and clamp it
/// to the length of the target month otherwise.
pub fn navigate(
  focus: NaiveDate,
  view: ViewMode,
  nav: Navigation,
  today: NaiveDate
) -> NaiveDate {
  let step = match nav {
    | Navigation::Today => return today,
    | Navigation::Previous => -1,
    | Navigation::Next => 1
  };

  let moved = match view {
    | ViewMode::Day => {
      grid::checked_add_days(focus, step)
    }
    | ViewMode::Week => {
      grid::checked_add_days(
        focus,
        step * 7
      )
    }
    | ViewMode::Month => {
      shift_months(focus, step as i32)
    }
    | ViewMode::Year => {
      shift_years(focus, step as i32)
    }
  }
  .unwrap_or(focus);

  tracing::debug!(
    from = %focus,
    to = %moved,
    view = view.as_key(),
    "navigated"
  );
  moved
}

/// `date` moved by whole years, clamping Feb 29 to Feb 28. `None` when the
/// result is out of range.
pub fn shift_years(
  date: NaiveDate,
  years: i32
) -> Option<NaiveDate> {
  let year =
    date.year().checked_add(years)?;
  let month = date.month();
  let day = date.day().min(
    grid::days_in_month(year, month)?
  );
  NaiveDate::from_ymd_opt(
    year, month, day
  )
}

/// `date` moved by whole months, clamping the day to the target month.
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> Option<NaiveDate> {
  let index = i64::from(date.year()) * 12
    + i64::from(date.month0())
    + i64::from(months);
  let year =
    i32::try_from(index.div_euclid(12))
      .ok()?;
  let month =
    index.rem_euclid(12) as u32 + 1;
  let day = date.day().min(
    grid::days_in_month(year, month)?
  );
  NaiveDate::from_ymd_opt(
    year, month, day
  )
}

/// The Week view always shows the Monday-started week holding `date`.
pub fn week_focus(
  date: NaiveDate
) -> NaiveDate {
  grid::start_of_week(date)
}

pub fn week_dates(
  date: NaiveDate
) -> [NaiveDate; 7] {
  let start = week_focus(date);
  let mut out = [start; 7];
  for (offset, day) in
    out.iter_mut().enumerate()
  {
    *day = grid::add_days(
      start,
      offset as i64
    );
  }
  out
}

#[must_use]
pub fn is_today(
  date: NaiveDate,
  today: NaiveDate
) -> bool {
  clock::is_same_calendar_day(
    &date, &today
  )
}

/// An activity positioned on the hour axis of a day.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedActivity<'a> {
  pub activity:       &'a Activity,
  pub start_hours:    f64,
  pub duration_hours: f64,
  /// Fraction of the slot elapsed before the activity starts.
  pub offset_in_slot: f64
}

impl PlacedActivity<'_> {
  pub fn end_hours(&self) -> f64 {
    self.start_hours
      + self.duration_hours
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourSlot<'a> {
  pub hour:       u32,
  pub from:       String,
  pub to:         String,
  pub activities: Vec<PlacedActivity<'a>>
}

/// Twenty-four one-hour slots for `date` with each activity placed in the
/// slot its start falls in. Activities without a parsable start are left
/// out.
pub fn day_slots<'a>(
  schedule: &'a WeeklySchedule,
  date: NaiveDate
) -> Vec<HourSlot<'a>> {
  let mut slots: Vec<HourSlot<'a>> = (0
    ..HOURS_PER_DAY)
    .map(|hour| {
      HourSlot {
        hour,
        from: clock::hour_label(hour),
        to: clock::hour_label(hour + 1),
        activities: Vec::new()
      }
    })
    .collect();

  for activity in
    schedule.activities_on(date)
  {
    let Some(start) =
      activity.start_hours()
    else {
      tracing::warn!(
        label = %activity.label,
        start = %activity.start,
        "activity start is not a clock time; not placed"
      );
      continue;
    };

    let hour = start.floor();
    if !(0.0..f64::from(HOURS_PER_DAY))
      .contains(&hour)
    {
      tracing::warn!(
        label = %activity.label,
        start,
        "activity starts outside the day"
      );
      continue;
    }

    slots[hour as usize].activities.push(
      PlacedActivity {
        activity,
        start_hours: start,
        duration_hours: activity
          .duration_hours(),
        offset_in_slot: start - hour
      }
    );
  }

  slots
}

/// Labels for the 25 slot boundaries, ending on `00:00` again.
pub fn time_labels() -> Vec<String> {
  (0..HOURS_PER_DAY)
    .map(clock::hour_label)
    .chain(std::iter::once(
      clock::hour_label(0)
    ))
    .collect()
}

/// `"HH:MM, Label"` line used by month previews and popups.
pub fn activity_line(
  activity: &Activity
) -> String {
  format!(
    "{}, {}",
    activity.start_label(),
    activity.label
  )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCell {
  pub key:      usize,
  pub date:     NaiveDate,
  pub in_month: bool,
  pub previews: Vec<String>,
  /// Activities beyond the preview limit.
  pub overflow: Option<usize>
}

impl MonthCell {
  pub fn overflow_line(
    &self
  ) -> Option<String> {
    self
      .overflow
      .map(|n| format!("{n} more..."))
  }
}

pub fn month_cells(
  schedule: &WeeklySchedule,
  grid: &CalendarGrid,
  preview_limit: usize
) -> Vec<MonthCell> {
  grid
    .dates()
    .enumerate()
    .map(|(key, date)| {
      let activities =
        schedule.activities_on(date);
      let previews = activities
        .iter()
        .take(preview_limit)
        .map(|a| activity_line(a))
        .collect();
      let remaining = activities
        .len()
        .saturating_sub(preview_limit);
      MonthCell {
        key,
        date,
        in_month: grid
          .is_in_month(date),
        previews,
        overflow: (remaining > 0)
          .then_some(remaining)
      }
    })
    .collect()
}

/// Which month cell, if any, has its detail popup open.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct PopupState {
  open: Option<usize>
}

impl PopupState {
  pub fn open_key(self) -> Option<usize> {
    self.open
  }

  /// Clicking the open cell closes it; any other cell opens instead.
  pub fn toggle(&mut self, key: usize) {
    self.open = if self.open == Some(key)
    {
      None
    } else {
      Some(key)
    };
  }

  pub fn date_in(
    self,
    grid: &CalendarGrid
  ) -> Option<NaiveDate> {
    self.open.and_then(|key| grid.cell(key))
  }
}

pub fn popup_lines(
  schedule: &WeeklySchedule,
  date: NaiveDate
) -> Vec<String> {
  schedule
    .activities_on(date)
    .into_iter()
    .map(activity_line)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearMonth {
  pub grid:           CalendarGrid,
  pub activity_count: usize
}

/// Month grids of `year` with the number of activity occurrences that fall
/// inside each month.
pub fn year_overview(
  schedule: &WeeklySchedule,
  year: i32
) -> Vec<YearMonth> {
  grid::build_year_grid(year)
    .into_iter()
    .map(|grid| {
      let activity_count = grid
        .dates()
        .filter(|d| grid.is_in_month(*d))
        .map(|d| {
          schedule.activities_on(d).len()
        })
        .sum();
      YearMonth {
        grid,
        activity_count
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{
    Month,
    NaiveDate,
    Weekday
  };

  use super::*;
  use crate::grid::build_month_grid;
  use crate::schedule::{
    Activity,
    WeeklySchedule
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn timetable() -> WeeklySchedule {
    let mut schedule =
      WeeklySchedule::new();
    for (start, label) in [
      ("09:00:00", "Algorithms"),
      ("09:30:00", "Tutorial"),
      ("13:15:00", "Databases"),
      ("17:00:00", "Football")
    ] {
      schedule.push(Activity::new(
        Weekday::Mon,
        start,
        "01:00",
        label
      ));
    }
    schedule.push(Activity::new(
      Weekday::Fri,
      "later",
      "01:00",
      "Unscheduled"
    ));
    schedule
  }

  #[test]
  fn view_keys_round_trip() {
    for view in ViewMode::all() {
      assert_eq!(
        ViewMode::from_key(
          view.as_key()
        ),
        Some(view)
      );
    }
    assert_eq!(
      ViewMode::default(),
      ViewMode::Week
    );
    assert_eq!(
      ViewMode::from_key("quarter"),
      None
    );
  }

  #[test]
  fn navigation_steps_by_view() {
    let focus = date(2023, 1, 31);
    let today = date(2023, 6, 1);
    assert_eq!(
      navigate(
        focus,
        ViewMode::Day,
        Navigation::Next,
        today
      ),
      date(2023, 2, 1)
    );
    assert_eq!(
      navigate(
        focus,
        ViewMode::Week,
        Navigation::Previous,
        today
      ),
      date(2023, 1, 24)
    );
    assert_eq!(
      navigate(
        focus,
        ViewMode::Month,
        Navigation::Next,
        today
      ),
      date(2023, 2, 28)
    );
    assert_eq!(
      navigate(
        date(2024, 2, 29),
        ViewMode::Year,
        Navigation::Next,
        today
      ),
      date(2025, 2, 28)
    );
    assert_eq!(
      navigate(
        focus,
        ViewMode::Month,
        Navigation::Today,
        today
      ),
      today
    );
    assert_eq!(
      navigate(
        date(2023, 1, 15),
        ViewMode::Month,
        Navigation::Previous,
        today
      ),
      date(2022, 12, 15)
    );
  }

  #[test]
  fn shifts_report_the_range_limit() {
    assert_eq!(
      shift_months(date(2023, 1, 31), -13),
      Some(date(2021, 12, 31))
    );
    assert_eq!(
      shift_months(date(2023, 2, 8), 24),
      Some(date(2025, 2, 8))
    );
    assert_eq!(
      shift_months(
        date(2023, 2, 8),
        i32::MAX
      ),
      None
    );
    assert_eq!(
      shift_years(
        date(2023, 2, 8),
        i32::MAX
      ),
      None
    );

    // Navigation holds still at the edge
    // of the calendar.
    assert_eq!(
      navigate(
        NaiveDate::MAX,
        ViewMode::Day,
        Navigation::Next,
        NaiveDate::MAX
      ),
      NaiveDate::MAX
    );
  }

  #[test]
  fn week_rounds_to_monday() {
    assert_eq!(
      week_focus(date(2023, 2, 5)),
      date(2023, 1, 30)
    );
    let days = week_dates(date(2023, 2, 1));
    assert_eq!(days[0], date(2023, 1, 30));
    assert_eq!(days[6], date(2023, 2, 5));
  }

  #[test]
  fn slots_cover_the_day() {
    let schedule = timetable();
    let slots =
      day_slots(&schedule, date(2023, 2, 6));
    assert_eq!(slots.len(), 24);
    assert_eq!(slots[0].from, "00:00");
    assert_eq!(slots[23].to, "24:00");

    assert_eq!(
      slots[9].activities.len(),
      2
    );
    let tutorial = &slots[9].activities[1];
    assert_eq!(
      tutorial.activity.label,
      "Tutorial"
    );
    assert_eq!(
      tutorial.offset_in_slot,
      0.5
    );
    assert_eq!(tutorial.end_hours(), 10.5);
    assert_eq!(
      slots[13].activities[0]
        .offset_in_slot,
      0.25
    );
  }

  #[test]
  fn unparsable_starts_are_not_placed() {
    let schedule = timetable();
    let slots =
      day_slots(&schedule, date(2023, 2, 10));
    assert!(
      slots
        .iter()
        .all(|s| s.activities.is_empty())
    );
  }

  #[test]
  fn boundary_labels_wrap_to_midnight() {
    let labels = time_labels();
    assert_eq!(labels.len(), 25);
    assert_eq!(labels[0], "00:00");
    assert_eq!(labels[23], "23:00");
    assert_eq!(labels[24], "00:00");
  }

  #[test]
  fn month_cells_preview_two_then_count() {
    let schedule = timetable();
    let grid = build_month_grid(
      2023,
      Month::February
    )
    .expect("valid month");
    let cells = month_cells(
      &schedule,
      &grid,
      DEFAULT_PREVIEW_LIMIT
    );
    assert_eq!(cells.len(), 35);
    assert!(!cells[0].in_month);

    let monday = &cells[7];
    assert_eq!(monday.date, date(2023, 2, 6));
    assert_eq!(
      monday.previews,
      vec![
        "09:00, Algorithms".to_string(),
        "09:30, Tutorial".to_string()
      ]
    );
    assert_eq!(
      monday.overflow_line(),
      Some("2 more...".to_string())
    );

    let friday = &cells[11];
    assert_eq!(
      friday.previews,
      vec![
        "later, Unscheduled".to_string()
      ]
    );
    assert_eq!(friday.overflow, None);
  }

  #[test]
  fn popup_toggles_per_cell() {
    let grid = build_month_grid(
      2023,
      Month::February
    )
    .expect("valid month");
    let mut popup =
      PopupState::default();
    popup.toggle(7);
    assert_eq!(popup.open_key(), Some(7));
    assert_eq!(
      popup.date_in(&grid),
      Some(date(2023, 2, 6))
    );
    popup.toggle(8);
    assert_eq!(popup.open_key(), Some(8));
    popup.toggle(8);
    assert_eq!(popup.open_key(), None);
    assert_eq!(popup.date_in(&grid), None);
  }

  #[test]
  fn popup_lists_every_activity() {
    let schedule = timetable();
    let lines = popup_lines(
      &schedule,
      date(2023, 2, 6)
    );
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "17:00, Football");
  }

  #[test]
  fn year_overview_counts_in_month_days() {
    let schedule = timetable();
    let year =
      year_overview(&schedule, 2023);
    assert_eq!(year.len(), 12);
    // February 2023 has four Mondays and four Fridays.
    assert_eq!(
      year[1].activity_count,
      4 * 4 + 4
    );
  }

  #[test]
  fn today_marker_matches_calendar_day() {
    let today = date(2023, 2, 6);
    assert!(is_today(today, today));
    assert!(!is_today(
      date(2023, 2, 7),
      today
    ));
  }
}
