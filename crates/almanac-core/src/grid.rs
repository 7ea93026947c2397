//! Month and year layout on a Monday-first grid.

use chrono::{
  Datelike,
  Month,
  NaiveDate,
  TimeDelta,
  Weekday
};

use crate::clock;

const GRID_WEEKS: usize = 6;
const MIN_WEEKS: usize = 4;

/// Weeks of a displayed month, each Monday through Sunday.
///
/// Cells outside the target month are real dates from the neighbouring
/// months, not placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
  pub year:  i32,
  pub month: Month,
  weeks:     Vec<[NaiveDate; 7]>
}

impl CalendarGrid {
  pub fn weeks(&self) -> &[[NaiveDate; 7]] {
    &self.weeks
  }

  pub fn week_count(&self) -> usize {
    self.weeks.len()
  }

  pub fn dates(
    &self
  ) -> impl Iterator<Item = NaiveDate> + '_
  {
    self.weeks.iter().flatten().copied()
  }

  pub fn first(&self) -> Option<NaiveDate> {
    self.weeks.first().map(|week| week[0])
  }

  pub fn last(&self) -> Option<NaiveDate> {
    self.weeks.last().map(|week| week[6])
  }

  pub fn is_in_month(
    &self,
    date: NaiveDate
  ) -> bool {
    date.year() == self.year
      && date.month()
        == self.month.number_from_month()
  }

  /// Date under cell `key`, where `key = week * 7 + column`.
  pub fn cell(
    &self,
    key: usize
  ) -> Option<NaiveDate> {
    self
      .weeks
      .get(key / 7)
      .map(|week| week[key % 7])
  }

  pub fn position_of(
    &self,
    date: NaiveDate
  ) -> Option<usize> {
    self.dates().position(|d| d == date)
  }
}

/// Lays out `month` of `year` as four to six Monday-first weeks.
///
/// Forty-two candidate days are generated from the Monday on or before the
/// first of the month. From the fifth week on, the first week lying wholly
/// outside the month is dropped together with every week after it.
///
/// Returns `None` when the month or one of its neighbouring days falls
/// outside the range chrono can represent (roughly years ±262000).
#[tracing::instrument(level = "trace")]
pub fn build_month_grid(
  year: i32,
  month: Month
) -> Option<CalendarGrid> {
  let first = first_day_of_month(
    year,
    month.number_from_month()
  )?;
  let offset = i64::from(
    first
      .weekday()
      .num_days_from_monday()
  );

  let mut weeks: Vec<[NaiveDate; 7]> =
    Vec::with_capacity(GRID_WEEKS);
  for w in 0..GRID_WEEKS {
    let mut week = [first; 7];
    for (col, cell) in
      week.iter_mut().enumerate()
    {
      let i = (w * 7 + col) as i64;
      *cell = checked_add_days(
        first,
        i - offset
      )?;
    }

    let foreign = week.iter().all(|d| {
      d.month()
        != month.number_from_month()
    });
    if w >= MIN_WEEKS && foreign {
      break;
    }
    weeks.push(week);
  }

  tracing::trace!(
    year,
    month = month.name(),
    weeks = weeks.len(),
    "built month grid"
  );

  Some(CalendarGrid {
    year,
    month,
    weeks
  })
}

/// Same as [`build_month_grid`] with a January = 0 month index.
pub fn build_month_grid_index(
  year: i32,
  month0: u32
) -> Option<CalendarGrid> {
  clock::month_from_number(month0)
    .and_then(|month| {
      build_month_grid(year, month)
    })
}

/// All twelve month grids of `year`. Empty when the year is out of range.
pub fn build_year_grid(
  year: i32
) -> Vec<CalendarGrid> {
  (0..12)
    .filter_map(|m| {
      build_month_grid_index(year, m)
    })
    .collect()
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  if month >= 12 {
    return NaiveDate::from_ymd_opt(
      year, 12, 31
    );
  }
  first_day_of_month(year, month + 1)?
    .pred_opt()
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> Option<u32> {
  last_day_of_month(year, month)
    .map(|d| d.day())
}

/// `date` moved by `days`, or `None` past the representable range.
pub fn checked_add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  TimeDelta::try_days(days).and_then(
    |delta| {
      date.checked_add_signed(delta)
    }
  )
}

/// Like [`checked_add_days`], staying on `date` at the range limits.
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  checked_add_days(date, days)
    .unwrap_or(date)
}

/// Monday on or before `day`.
pub fn start_of_week(
  day: NaiveDate
) -> NaiveDate {
  let diff = i64::from(
    day
      .weekday()
      .num_days_from_monday()
  );
  add_days(day, -diff)
}

#[must_use]
pub fn is_week_start(
  day: NaiveDate
) -> bool {
  day.weekday() == Weekday::Mon
}
