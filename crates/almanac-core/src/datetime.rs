use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Local,
  NaiveDate,
  Weekday
};
use regex::Regex;

use crate::clock;
use crate::grid::{
  add_days,
  checked_add_days,
  first_day_of_month
};
use crate::views::{
  shift_months,
  shift_years
};

/// The local calendar date right now. Sampled once per invocation and
/// passed down; nothing below this caches it.
#[must_use]
pub fn local_today() -> NaiveDate {
  Local::now().date_naive()
}

#[tracing::instrument(skip(today))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" | "now" => {
      return Ok(today);
    }
    | "tomorrow" => {
      return Ok(add_days(today, 1));
    }
    | "yesterday" => {
      return Ok(add_days(today, -1));
    }
    | _ => {}
  }

  if token.len() == 4
    && token
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    let year: i32 =
      token.parse().context(
        "invalid 4-digit year"
      )?;
    return NaiveDate::from_ymd_opt(
      year, 1, 1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid year value: {year}"
      )
    });
  }

  if let Some(target_weekday) =
    clock::weekday_number(&lower)
      .and_then(
        clock::weekday_from_number
      )
  {
    return Ok(next_weekday_date(
      today,
      target_weekday
    ));
  }

  if let Some(month0) =
    clock::month_number(&lower)
  {
    return first_day_of_month(
      today.year(),
      month0 + 1
    )
    .ok_or_else(|| {
      anyhow!(
        "year {} is out of range",
        today.year()
      )
    });
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwmy])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(token)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let signed = if sign == "-" {
      -num
    } else {
      num
    };

    let date = match unit {
      | "d" => {
        checked_add_days(today, signed)
      }
      | "w" => signed
        .checked_mul(7)
        .and_then(|days| {
          checked_add_days(today, days)
        }),
      | "m" => i32::try_from(signed)
        .ok()
        .and_then(|months| {
          shift_months(today, months)
        }),
      | "y" => i32::try_from(signed)
        .ok()
        .and_then(|years| {
          shift_years(today, years)
        }),
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ));
      }
    }
    .ok_or_else(|| {
      anyhow!(
        "relative offset out of \
         range: {token}"
      )
    })?;
    return Ok(date);
  }

  if let Some(date) =
    clock::parse_date_key(token)
  {
    return Ok(date);
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      &format!("{token}-01"),
      "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, \
     4-digit year, weekday names (e.g. \
     monday), month names (e.g. \
     march), +Nd/-Nw/+Nm/-Ny, \
     YYYY-MM-DD, YYYY-MM"
  })
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  add_days(from, delta)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::parse_date_expr;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  // 2026-02-17 is a Tuesday.
  fn today() -> NaiveDate {
    date(2026, 2, 17)
  }

  #[test]
  fn parses_relative_words() {
    assert_eq!(
      parse_date_expr("Today", today())
        .expect("today"),
      today()
    );
    assert_eq!(
      parse_date_expr(
        "tomorrow",
        today()
      )
      .expect("tomorrow"),
      date(2026, 2, 18)
    );
    assert_eq!(
      parse_date_expr(
        "yesterday",
        today()
      )
      .expect("yesterday"),
      date(2026, 2, 16)
    );
  }

  #[test]
  fn parses_four_digit_year() {
    assert_eq!(
      parse_date_expr("2028", today())
        .expect("parse year"),
      date(2028, 1, 1)
    );
  }

  #[test]
  fn parses_weekday_name() {
    assert_eq!(
      parse_date_expr(
        "wednesday",
        today()
      )
      .expect("parse weekday"),
      date(2026, 2, 18)
    );
    assert_eq!(
      parse_date_expr("tue", today())
        .expect("parse weekday"),
      date(2026, 2, 24)
    );
  }

  #[test]
  fn parses_month_name() {
    assert_eq!(
      parse_date_expr("march", today())
        .expect("parse month"),
      date(2026, 3, 1)
    );
  }

  #[test]
  fn parses_relative_steps() {
    assert_eq!(
      parse_date_expr("+2w", today())
        .expect("weeks"),
      date(2026, 3, 3)
    );
    assert_eq!(
      parse_date_expr("-1m", today())
        .expect("months"),
      date(2026, 1, 17)
    );
    assert_eq!(
      parse_date_expr("+10d", today())
        .expect("days"),
      date(2026, 2, 27)
    );
  }

  #[test]
  fn parses_iso_forms() {
    assert_eq!(
      parse_date_expr(
        "2024-02-29",
        today()
      )
      .expect("iso date"),
      date(2024, 2, 29)
    );
    assert_eq!(
      parse_date_expr("2023-01", today())
        .expect("iso month"),
      date(2023, 1, 1)
    );
  }

  #[test]
  fn rejects_garbage() {
    let err =
      parse_date_expr("someday", today())
        .expect_err("garbage");
    assert!(
      format!("{err:#}")
        .contains("unrecognized")
    );
  }

  #[test]
  fn oversized_offsets_are_errors() {
    for expr in [
      "+2000000000000000000w",
      "+2147483647m",
      "-2147483648m",
      "+200000000000000d",
      "+1000000000d",
      "+3000000y",
      "+99999999999999999999d"
    ] {
      let err =
        parse_date_expr(expr, today())
          .expect_err(expr);
      assert!(
        format!("{err:#}")
          .contains("out of range")
          || format!("{err:#}")
            .contains("invalid relative"),
        "{expr}: {err:#}"
      );
    }
  }
}
