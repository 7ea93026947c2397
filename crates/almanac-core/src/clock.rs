//! Conversions between the clock strings stored in a timetable, fractional
//! hour offsets, weekday/month names and `YYYY-MM-DD` date keys.

use std::sync::OnceLock;

use chrono::{
  Datelike,
  Month,
  NaiveDate,
  Weekday
};
use regex::Regex;

/// Hours assumed for an activity whose duration cannot be parsed.
pub const DEFAULT_DURATION_HOURS: f64 =
  1.0;

const WEEKDAY_NAMES: [&str; 7] = [
  "Sunday",
  "Monday",
  "Tuesday",
  "Wednesday",
  "Thursday",
  "Friday",
  "Saturday"
];

const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December"
];

/// Name of the weekday numbered from Sunday = 0.
#[must_use]
pub fn weekday_name(
  n: u32
) -> Option<&'static str> {
  WEEKDAY_NAMES
    .get(n as usize)
    .copied()
}

/// Sunday-based number of a weekday name. Accepts full names and
/// three-letter abbreviations in any case.
#[must_use]
pub fn weekday_number(
  name: &str
) -> Option<u32> {
  lookup_name(&WEEKDAY_NAMES, name)
}

#[must_use]
pub fn weekday_from_number(
  n: u32
) -> Option<Weekday> {
  match n {
    | 0 => Some(Weekday::Sun),
    | 1 => Some(Weekday::Mon),
    | 2 => Some(Weekday::Tue),
    | 3 => Some(Weekday::Wed),
    | 4 => Some(Weekday::Thu),
    | 5 => Some(Weekday::Fri),
    | 6 => Some(Weekday::Sat),
    | _ => None
  }
}

/// Name of the month numbered from January = 0.
#[must_use]
pub fn month_name(
  n: u32
) -> Option<&'static str> {
  MONTH_NAMES.get(n as usize).copied()
}

/// January-based (0) number of a month name.
#[must_use]
pub fn month_number(
  name: &str
) -> Option<u32> {
  lookup_name(&MONTH_NAMES, name)
}

#[must_use]
pub fn month_from_number(
  n: u32
) -> Option<Month> {
  if n > 11 {
    return None;
  }
  Month::try_from((n + 1) as u8).ok()
}

fn lookup_name(
  table: &[&str],
  name: &str
) -> Option<u32> {
  let needle =
    name.trim().to_ascii_lowercase();
  if needle.len() < 3 {
    return None;
  }

  table
    .iter()
    .position(|candidate| {
      let candidate =
        candidate.to_ascii_lowercase();
      candidate == needle
        || (needle.len() == 3
          && candidate
            .starts_with(&needle))
    })
    .map(|idx| idx as u32)
}

/// Formats the calendar fields of `date` as `YYYY-MM-DD`.
///
/// The fields are read from the date as given, so a local date never
/// shifts across midnight the way a UTC conversion would.
#[must_use]
pub fn to_date_key<D: Datelike>(
  date: &D
) -> String {
  format!(
    "{:04}-{:02}-{:02}",
    date.year(),
    date.month(),
    date.day()
  )
}

#[must_use]
pub fn parse_date_key(
  key: &str
) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(
    key.trim(),
    "%Y-%m-%d"
  )
  .ok()
}

fn digit_runs() -> Option<&'static Regex>
{
  static DIGITS: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  DIGITS
    .get_or_init(|| {
      Regex::new(r"\d+").ok()
    })
    .as_ref()
}

/// First two numeric groups of a clock string, as `(hours, minutes)`.
fn clock_parts(
  clock: &str
) -> Option<(u32, u32)> {
  let mut runs = digit_runs()?
    .find_iter(clock)
    .map(|m| m.as_str().parse::<u32>());
  let hours = runs.next()?.ok()?;
  let minutes = runs.next()?.ok()?;
  Some((hours, minutes))
}

/// `"HH:MM"` or `"HH:MM:SS"` to `hours + minutes / 60`.
///
/// Returns `None` when fewer than two numeric groups are present. Seconds
/// are ignored.
#[must_use]
pub fn parse_clock_to_fractional_hours(
  clock: &str
) -> Option<f64> {
  let (hours, minutes) =
    clock_parts(clock)?;
  Some(
    f64::from(hours)
      + f64::from(minutes) / 60.0
  )
}

/// Duration in hours, falling back to exactly one hour when the clock
/// string is unparsable.
#[must_use]
pub fn duration_hours_or_default(
  clock: &str
) -> f64 {
  parse_clock_to_fractional_hours(clock)
    .unwrap_or(DEFAULT_DURATION_HOURS)
}

#[must_use]
pub fn zero_pad(n: u32) -> String {
  format!("{n:02}")
}

/// `HH:MM` label for a stored start time, dropping any seconds.
#[must_use]
pub fn format_clock(
  clock: &str
) -> Option<String> {
  let (hours, minutes) =
    clock_parts(clock)?;
  Some(format!(
    "{}:{}",
    zero_pad(hours),
    zero_pad(minutes)
  ))
}

/// `HH:MM` for a fractional hour offset, e.g. `10.5` becomes `10:30`.
/// Offsets past midnight keep counting (`25:00`).
#[must_use]
pub fn format_fractional_hours(
  hours: f64
) -> String {
  let total_minutes =
    (hours.max(0.0) * 60.0).round()
      as u32;
  format!(
    "{}:{}",
    zero_pad(total_minutes / 60),
    zero_pad(total_minutes % 60)
  )
}

#[must_use]
pub fn hour_label(hour: u32) -> String {
  format!("{}:00", zero_pad(hour))
}

#[must_use]
pub fn is_same_calendar_day<
  A: Datelike,
  B: Datelike
>(
  a: &A,
  b: &B
) -> bool {
  a.year() == b.year()
    && a.month() == b.month()
    && a.day() == b.day()
}

#[cfg(test)]
mod tests {
  use chrono::{
    Month,
    NaiveDate,
    NaiveDateTime,
    Weekday
  };

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn weekday_tables_are_bidirectional()
  {
    for n in 0..7 {
      let name = weekday_name(n)
        .expect("weekday in range");
      assert_eq!(
        weekday_number(name),
        Some(n)
      );
    }
    assert_eq!(
      weekday_name(0),
      Some("Sunday")
    );
    assert_eq!(
      weekday_number("saturday"),
      Some(6)
    );
    assert_eq!(
      weekday_number("Thu"),
      Some(4)
    );
    assert_eq!(weekday_name(7), None);
    assert_eq!(
      weekday_number("Funday"),
      None
    );
  }

  #[test]
  fn month_tables_are_bidirectional() {
    for n in 0..12 {
      let name = month_name(n)
        .expect("month in range");
      assert_eq!(
        month_number(name),
        Some(n)
      );
    }
    assert_eq!(
      month_name(10),
      Some("November")
    );
    assert_eq!(
      month_name(11),
      Some("December")
    );
    assert_eq!(month_name(12), None);
    assert_eq!(
      month_number("sep"),
      Some(8)
    );
  }

  #[test]
  fn numbers_bridge_to_chrono() {
    assert_eq!(
      weekday_from_number(0),
      Some(Weekday::Sun)
    );
    assert_eq!(
      weekday_from_number(6),
      Some(Weekday::Sat)
    );
    assert_eq!(
      weekday_from_number(7),
      None
    );
    assert_eq!(
      month_from_number(0),
      Some(Month::January)
    );
    assert_eq!(
      month_from_number(11),
      Some(Month::December)
    );
    assert_eq!(
      month_from_number(12),
      None
    );
  }

  #[test]
  fn date_keys_match_iso_dates() {
    let leap = date(2024, 2, 29);
    assert_eq!(
      to_date_key(&leap),
      "2024-02-29"
    );
    assert_eq!(
      to_date_key(&date(2023, 2, 28)),
      "2023-02-28"
    );

    for year in [2023, 2024] {
      for month in 1..=12 {
        let d = date(year, month, 1);
        let key = to_date_key(&d);
        assert_eq!(
          key,
          d.format("%Y-%m-%d")
            .to_string()
        );
        assert_eq!(
          parse_date_key(&key),
          Some(d)
        );
      }
    }
  }

  #[test]
  fn date_key_uses_local_fields_near_midnight()
   {
    let late = NaiveDateTime::parse_from_str(
      "2022-12-17 23:59:30",
      "%Y-%m-%d %H:%M:%S"
    )
    .expect("valid datetime");
    assert_eq!(
      to_date_key(&late),
      "2022-12-17"
    );
  }

  #[test]
  fn parses_clock_strings() {
    assert_eq!(
      parse_clock_to_fractional_hours(
        "17:30"
      ),
      Some(17.5)
    );
    assert_eq!(
      parse_clock_to_fractional_hours(
        "09:00:00"
      ),
      Some(9.0)
    );
    assert_eq!(
      parse_clock_to_fractional_hours(
        "01:15"
      ),
      Some(1.25)
    );
    assert_eq!(
      parse_clock_to_fractional_hours(
        "noon"
      ),
      None
    );
    assert_eq!(
      parse_clock_to_fractional_hours(
        "17"
      ),
      None
    );
  }

  #[test]
  fn malformed_duration_defaults_to_one_hour()
   {
    assert_eq!(
      duration_hours_or_default("??"),
      1.0
    );
    assert_eq!(
      duration_hours_or_default(
        "02:30"
      ),
      2.5
    );
  }

  #[test]
  fn pads_and_formats_labels() {
    assert_eq!(zero_pad(0), "00");
    assert_eq!(zero_pad(7), "07");
    assert_eq!(zero_pad(59), "59");
    assert_eq!(
      format_clock("09:05:00"),
      Some("09:05".to_string())
    );
    assert_eq!(
      format_clock("9:5"),
      Some("09:05".to_string())
    );
    assert_eq!(format_clock(""), None);
    assert_eq!(hour_label(3), "03:00");
    assert_eq!(
      format_fractional_hours(10.5),
      "10:30"
    );
    assert_eq!(
      format_fractional_hours(
        13.0 + 15.0 / 60.0
      ),
      "13:15"
    );
    assert_eq!(
      format_fractional_hours(24.0),
      "24:00"
    );
  }

  #[test]
  fn same_calendar_day_ignores_time() {
    let morning =
      date(2023, 3, 1)
        .and_hms_opt(8, 0, 0)
        .expect("valid time");
    let evening =
      date(2023, 3, 1)
        .and_hms_opt(22, 30, 0)
        .expect("valid time");
    assert!(is_same_calendar_day(
      &morning, &evening
    ));
    assert!(is_same_calendar_day(
      &morning,
      &date(2023, 3, 1)
    ));
    assert!(!is_same_calendar_day(
      &morning,
      &date(2024, 3, 1)
    ));
  }
}
