//! Weekly timetable projection: which recurring activities fall on a date,
//! Monday-first month grids, clock-string conversions, and a small CLI that
//! renders Day, Week, Month and Year views in the terminal.

pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod grid;
pub mod layout;
pub mod render;
pub mod schedule;
pub mod timetable;
pub mod views;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use grid::{
  CalendarGrid,
  build_month_grid
};
pub use schedule::{
  Activity,
  DateRestriction,
  WeeklySchedule
};
pub use views::ViewMode;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.almanacrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .iter()
        .map(|kv| {
          (
            kv.key.clone(),
            kv.value.clone()
          )
        })
    )
  );

  let nav = cli.navigation();
  let inv = cli::Invocation::parse(
    &cfg,
    cli.rest.clone()
  )?;

  let schedule =
    if inv.command.needs_schedule() {
      let path =
        config::resolve_timetable_path(
          &cfg,
          cli.timetable.as_deref()
        )
        .context(
          "failed to resolve timetable \
           path"
        )?;
      let schedule =
        timetable::load_timetable(
          &path
        )?
        .with_date_restriction(
          cfg.date_restriction()?
        );
      Some(schedule)
    } else {
      None
    };

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let today = datetime::local_today();

  commands::dispatch(
    schedule.as_ref(),
    &cfg,
    &mut renderer,
    inv,
    nav,
    today
  )?;

  info!("done");
  Ok(())
}
