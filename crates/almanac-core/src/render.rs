use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::clock;
use crate::config::Config;
use crate::grid::CalendarGrid;
use crate::schedule::Activity;
use crate::views::{self, HourSlot, MonthCell, YearMonth};

const MONTH_CELL_WIDTH: usize = 18;
const WEEKDAY_HEADERS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => io::stdout().is_terminal(),
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn print_line(&mut self, text: &str) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{text}")?;
        Ok(())
    }

    pub fn print_table(&mut self, headers: Vec<String>, rows: Vec<Vec<String>>) -> anyhow::Result<()> {
        write_table(io::stdout().lock(), headers, rows)
    }

    #[tracing::instrument(skip(self, slots, today))]
    pub fn print_day(&mut self, date: NaiveDate, slots: &[HourSlot<'_>], today: NaiveDate) -> anyhow::Result<()> {
        self.write_day(io::stdout().lock(), date, slots, today)
    }

    #[tracing::instrument(skip(self, days, today))]
    pub fn print_week(&mut self, days: &[(NaiveDate, Vec<&Activity>)], today: NaiveDate) -> anyhow::Result<()> {
        self.write_week(io::stdout().lock(), days, today)
    }

    #[tracing::instrument(skip(self, grid, cells, today), fields(year = grid.year, month = grid.month.name()))]
    pub fn print_month(&mut self, grid: &CalendarGrid, cells: &[MonthCell], today: NaiveDate) -> anyhow::Result<()> {
        self.write_month(io::stdout().lock(), grid, cells, today)
    }

    #[tracing::instrument(skip(self, months, today))]
    pub fn print_year(&mut self, year: i32, months: &[YearMonth], today: NaiveDate) -> anyhow::Result<()> {
        self.write_year(io::stdout().lock(), year, months, today)
    }

    #[tracing::instrument(skip(self, lines))]
    pub fn print_activities(&mut self, date: NaiveDate, lines: &[String]) -> anyhow::Result<()> {
        self.write_activities(io::stdout().lock(), date, lines)
    }

    pub fn write_day<W: Write>(
        &self,
        mut out: W,
        date: NaiveDate,
        slots: &[HourSlot<'_>],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.day_title(date, today))?;

        let rows: Vec<Vec<String>> = slots
            .iter()
            .map(|slot| {
                let entries = slot
                    .activities
                    .iter()
                    .map(|placed| {
                        format!(
                            "{}-{} {}",
                            placed.activity.start_label(),
                            clock::format_fractional_hours(placed.end_hours()),
                            placed.activity.label
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                vec![format!("{}-{}", slot.from, slot.to), entries]
            })
            .collect();

        write_table(&mut out, vec!["Time".to_string(), "Activities".to_string()], rows)
    }

    pub fn write_week<W: Write>(
        &self,
        mut out: W,
        days: &[(NaiveDate, Vec<&Activity>)],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        if let (Some((first, _)), Some((last, _))) = (days.first(), days.last()) {
            writeln!(
                out,
                "{}",
                self.paint(&format!("Week of {} to {}", clock::to_date_key(first), clock::to_date_key(last)), "1")
            )?;
        }

        let headers: Vec<String> = days
            .iter()
            .map(|(date, _)| {
                let label = date.format("%a %d").to_string();
                if views::is_today(*date, today) {
                    self.paint(&label, "7")
                } else {
                    label
                }
            })
            .collect::<Vec<_>>();

        let depth = days.iter().map(|(_, acts)| acts.len()).max().unwrap_or(0);
        let rows: Vec<Vec<String>> = (0..depth)
            .map(|row| {
                days.iter()
                    .map(|(_, acts)| {
                        acts.get(row)
                            .map(|activity| format!("{} {}", activity.start_label(), activity.label))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        write_table(&mut out, headers, rows)
    }

    pub fn write_month<W: Write>(
        &self,
        mut out: W,
        grid: &CalendarGrid,
        cells: &[MonthCell],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&format!("{} {}", grid.month.name(), grid.year), "1"))?;

        let headers: Vec<String> = WEEKDAY_HEADERS.iter().map(ToString::to_string).collect();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for week in cells.chunks(7) {
            rows.push(
                week.iter()
                    .map(|cell| {
                        let number = cell.date.day().to_string();
                        if views::is_today(cell.date, today) {
                            self.paint(&number, "7")
                        } else if !cell.in_month {
                            self.paint(&number, "2")
                        } else {
                            number
                        }
                    })
                    .collect(),
            );

            let depth = week
                .iter()
                .map(|cell| cell.previews.len() + usize::from(cell.overflow.is_some()))
                .max()
                .unwrap_or(0);
            for line in 0..depth {
                rows.push(
                    week.iter()
                        .map(|cell| {
                            let text = cell
                                .previews
                                .get(line)
                                .cloned()
                                .or_else(|| {
                                    (line == cell.previews.len())
                                        .then(|| cell.overflow_line())
                                        .flatten()
                                })
                                .unwrap_or_default();
                            truncate_to_width(&text, MONTH_CELL_WIDTH)
                        })
                        .collect(),
                );
            }
        }

        write_table(&mut out, headers, rows)
    }

    pub fn write_year<W: Write>(
        &self,
        mut out: W,
        year: i32,
        months: &[YearMonth],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&year.to_string(), "1"))?;

        for month in months {
            writeln!(out)?;
            writeln!(
                out,
                "{} ({} activities)",
                month.grid.month.name(),
                month.activity_count
            )?;

            let headers: Vec<String> = WEEKDAY_HEADERS.iter().map(|h| h[..2].to_string()).collect();
            let rows: Vec<Vec<String>> = month
                .grid
                .weeks()
                .iter()
                .map(|week| {
                    week.iter()
                        .map(|date| {
                            if !month.grid.is_in_month(*date) {
                                String::new()
                            } else if views::is_today(*date, today) {
                                self.paint(&date.day().to_string(), "7")
                            } else {
                                date.day().to_string()
                            }
                        })
                        .collect()
                })
                .collect();
            write_table(&mut out, headers, rows)?;
        }

        Ok(())
    }

    pub fn write_activities<W: Write>(&self, mut out: W, date: NaiveDate, lines: &[String]) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&clock::to_date_key(&date), "1"))?;
        if lines.is_empty() {
            writeln!(out, "No activities.")?;
        }
        for line in lines {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn day_title(&self, date: NaiveDate, today: NaiveDate) -> String {
        let weekday = clock::weekday_name(date.weekday().num_days_from_sunday()).unwrap_or_default();
        let title = format!("{weekday} {}", clock::to_date_key(&date));
        if views::is_today(date, today) {
            self.paint(&format!("{title} (today)"), "1")
        } else {
            self.paint(&title, "1")
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(header).as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write_padded(&mut writer, &headers[idx], widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = row.get(idx).map(String::as_str).unwrap_or("");
            write_padded(&mut writer, cell, widths[idx])?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn write_padded<W: Write>(writer: &mut W, cell: &str, width: usize) -> anyhow::Result<()> {
    let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
    let padding = width.saturating_sub(visible_width);
    write!(writer, "{}{} ", cell, " ".repeat(padding))?;
    Ok(())
}

fn truncate_to_width(text: &str, max: usize) -> String {
    if UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{Month, NaiveDate, Weekday};

    use super::{Renderer, strip_ansi, truncate_to_width};
    use crate::grid::build_month_grid;
    use crate::schedule::{Activity, WeeklySchedule};
    use crate::views;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn schedule() -> WeeklySchedule {
        let mut schedule = WeeklySchedule::new();
        schedule.push(Activity::new(Weekday::Mon, "09:00:00", "01:30", "Lab"));
        schedule.push(Activity::new(Weekday::Mon, "11:00:00", "01:00", "Lecture"));
        schedule.push(Activity::new(Weekday::Mon, "15:00:00", "01:00", "Seminar"));
        schedule
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn day_view_lists_slots_with_end_times() {
        let schedule = schedule();
        let monday = date(2023, 2, 6);
        let slots = views::day_slots(&schedule, monday);
        let text = render(|out| Renderer::plain().write_day(out, monday, &slots, monday));

        assert!(text.starts_with("Monday 2023-02-06 (today)"));
        assert!(text.contains("09:00-10:00 09:00-10:30 Lab"));
        assert!(text.contains("23:00-24:00"));
        // title, header, rule and 24 slots
        assert_eq!(text.lines().count(), 27);
    }

    #[test]
    fn week_view_has_seven_columns() {
        let schedule = schedule();
        let days = views::week_dates(date(2023, 2, 8))
            .into_iter()
            .map(|d| (d, schedule.activities_on(d)))
            .collect::<Vec<_>>();
        let text = render(|out| Renderer::plain().write_week(out, &days, date(2023, 1, 1)));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Week of 2023-02-06 to 2023-02-12");
        assert!(lines[1].starts_with("Mon 06"));
        assert!(lines[1].contains("Sun 12"));
        // title, header, rule, three Monday activities
        assert_eq!(lines.len(), 6);
        assert!(lines[5].starts_with("15:00 Seminar"));
    }

    #[test]
    fn month_view_shows_previews_and_overflow() {
        let schedule = schedule();
        let grid = build_month_grid(2023, Month::February).expect("valid month");
        let cells = views::month_cells(&schedule, &grid, 2);
        let text = render(|out| Renderer::plain().write_month(out, &grid, &cells, date(2023, 1, 1)));

        assert!(text.starts_with("February 2023"));
        assert!(text.contains("09:00, Lab"));
        assert!(text.contains("1 more..."));
        assert!(!text.contains("Seminar"));
    }

    #[test]
    fn year_view_prints_every_month() {
        let schedule = schedule();
        let months = views::year_overview(&schedule, 2023);
        let text = render(|out| Renderer::plain().write_year(out, 2023, &months, date(2023, 1, 1)));
        assert!(text.contains("January (15 activities)"));
        assert!(text.contains("December"));
    }

    #[test]
    fn empty_activity_list_is_reported() {
        let text = render(|out| Renderer::plain().write_activities(out, date(2023, 2, 5), &[]));
        assert_eq!(text, "2023-02-05\nNo activities.\n");
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("09:00, Algorithms", 8), "09:00, …");
        assert_eq!(strip_ansi("\x1b[7m6\x1b[0m"), "6");
    }
}
