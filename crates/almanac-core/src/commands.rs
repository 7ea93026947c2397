use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::datetime::parse_date_expr;
use crate::grid::build_month_grid;
use crate::render::Renderer;
use crate::schedule::WeeklySchedule;
use crate::views::{self, Navigation, ViewMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    View(ViewMode),
    Activities,
    Views,
    Help,
    Version,
}

impl Command {
    pub fn from_name(name: &str) -> anyhow::Result<Self> {
        if let Some(view) = ViewMode::from_key(name) {
            return Ok(Self::View(view));
        }
        match name {
            "activities" => Ok(Self::Activities),
            "views" => Ok(Self::Views),
            "help" => Ok(Self::Help),
            "version" => Ok(Self::Version),
            other => Err(anyhow!("unknown command: {other}")),
        }
    }

    /// Whether the command reads the timetable.
    pub fn needs_schedule(self) -> bool {
        matches!(self, Self::View(_) | Self::Activities)
    }

    /// Granularity used when stepping with `--prev` / `--next`.
    fn step_view(self) -> ViewMode {
        match self {
            Self::View(view) => view,
            _ => ViewMode::Day,
        }
    }
}

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "day",
        "week",
        "month",
        "year",
        "activities",
        "views",
        "help",
        "version",
    ]
}

/// Exact name, or the single command `token` is a prefix of.
pub fn expand_command_abbrev<'a>(token: &str, known: &[&'a str]) -> Option<&'a str> {
    if let Some(exact) = known.iter().copied().find(|name| *name == token) {
        return Some(exact);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Date the invocation looks at: the parsed date expression (or today),
/// moved one step when `--prev` / `--next` was given.
pub fn resolve_focus(
    inv: &Invocation,
    nav: Option<Navigation>,
    today: NaiveDate,
) -> anyhow::Result<NaiveDate> {
    let focus = match inv.date_expr.as_deref() {
        Some(expr) => parse_date_expr(expr, today)?,
        None => today,
    };

    Ok(match nav {
        Some(nav) => views::navigate(focus, inv.command.step_view(), nav, today),
        None => focus,
    })
}

#[instrument(skip(schedule, cfg, renderer, inv, today))]
pub fn dispatch(
    schedule: Option<&WeeklySchedule>,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
    nav: Option<Navigation>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    debug!(command = ?inv.command, date = ?inv.date_expr, "dispatching command");

    match inv.command {
        Command::Views => cmd_views(renderer, cfg),
        Command::Help => cmd_help(renderer),
        Command::Version => renderer.print_line(env!("CARGO_PKG_VERSION")),
        command => {
            let schedule =
                schedule.ok_or_else(|| anyhow!("{command:?} needs a loaded timetable"))?;
            let focus = resolve_focus(&inv, nav, today)?;
            match command {
                Command::View(ViewMode::Day) => cmd_day(schedule, renderer, focus, today),
                Command::View(ViewMode::Week) => cmd_week(schedule, renderer, focus, today),
                Command::View(ViewMode::Month) => cmd_month(schedule, cfg, renderer, focus, today),
                Command::View(ViewMode::Year) => cmd_year(schedule, renderer, focus, today),
                _ => cmd_activities(schedule, renderer, focus),
            }
        }
    }
}

#[instrument(skip(schedule, renderer, today))]
fn cmd_day(
    schedule: &WeeklySchedule,
    renderer: &mut Renderer,
    focus: NaiveDate,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command day");
    let slots = views::day_slots(schedule, focus);
    renderer.print_day(focus, &slots, today)
}

#[instrument(skip(schedule, renderer, today))]
fn cmd_week(
    schedule: &WeeklySchedule,
    renderer: &mut Renderer,
    focus: NaiveDate,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command week");
    let days = views::week_dates(focus)
        .into_iter()
        .map(|date| (date, schedule.activities_on(date)))
        .collect::<Vec<_>>();
    renderer.print_week(&days, today)
}

#[instrument(skip(schedule, cfg, renderer, today))]
fn cmd_month(
    schedule: &WeeklySchedule,
    cfg: &Config,
    renderer: &mut Renderer,
    focus: NaiveDate,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command month");
    let month = chrono::Month::try_from(focus.month() as u8)
        .map_err(|e| anyhow!("invalid month in {focus}: {e}"))?;
    let grid = build_month_grid(focus.year(), month)
        .ok_or_else(|| anyhow!("no month grid for {focus}"))?;
    let cells = views::month_cells(schedule, &grid, cfg.preview_limit()?);
    renderer.print_month(&grid, &cells, today)
}

#[instrument(skip(schedule, renderer, today))]
fn cmd_year(
    schedule: &WeeklySchedule,
    renderer: &mut Renderer,
    focus: NaiveDate,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command year");
    let months = views::year_overview(schedule, focus.year());
    renderer.print_year(focus.year(), &months, today)
}

#[instrument(skip(schedule, renderer))]
fn cmd_activities(
    schedule: &WeeklySchedule,
    renderer: &mut Renderer,
    focus: NaiveDate,
) -> anyhow::Result<()> {
    info!("command activities");
    let lines = views::popup_lines(schedule, focus);
    renderer.print_activities(focus, &lines)
}

fn cmd_views(renderer: &mut Renderer, cfg: &Config) -> anyhow::Result<()> {
    let default = cfg.default_view()?;
    let rows = ViewMode::all()
        .into_iter()
        .map(|view| {
            let marker = if view == default { "*" } else { "" };
            vec![
                view.as_key().to_string(),
                view.label().to_string(),
                marker.to_string(),
            ]
        })
        .collect();
    renderer.print_table(
        vec!["Key".to_string(), "View".to_string(), "Default".to_string()],
        rows,
    )
}

fn cmd_help(renderer: &mut Renderer) -> anyhow::Result<()> {
    renderer.print_line(
        "Usage: almanac [--prev|--next] [day|week|month|year|activities] [DATE]\n\
         Other commands: views, help, version\n\
         DATE: today, tomorrow, yesterday, YYYY, YYYY-MM, YYYY-MM-DD, weekday or month names, +Nd/-Nw/+Nm/-Ny",
    )
}
