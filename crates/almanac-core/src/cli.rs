use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::clock;
use crate::commands::{Command, expand_command_abbrev, known_command_names};
use crate::config::Config;
use crate::views::Navigation;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: weekly timetable viewer for the terminal",
    disable_help_subcommand = true,
    arg_required_else_help = false
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "almanacrc")]
    pub almanacrc: Option<PathBuf>,

    #[arg(long = "timetable")]
    pub timetable: Option<PathBuf>,

    /// Step one view back from the requested date.
    #[arg(long = "prev", conflicts_with = "next")]
    pub prev: bool,

    /// Step one view forward from the requested date.
    #[arg(long = "next")]
    pub next: bool,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

impl GlobalCli {
    pub fn navigation(&self) -> Option<Navigation> {
        if self.prev {
            Some(Navigation::Previous)
        } else if self.next {
            Some(Navigation::Next)
        } else {
            None
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub date_expr: Option<String>,
}

impl Invocation {
    /// `[COMMAND] [DATE]`, where a missing command falls back to
    /// `default.view` and a leading token that is not a command is taken as
    /// the date.
    #[tracing::instrument(skip(cfg, rest))]
    pub fn parse(cfg: &Config, rest: Vec<OsString>) -> anyhow::Result<Self> {
        let tokens: Vec<String> = rest
            .into_iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();

        let known = known_command_names();
        let (command, date_tokens) = match tokens.first().and_then(|first| command_token(first, &known)) {
            Some(name) => (Command::from_name(name)?, &tokens[1..]),
            None => (Command::View(cfg.default_view()?), &tokens[..]),
        };

        if date_tokens.len() > 1 {
            return Err(anyhow!(
                "expected at most one date after the command, got: {}",
                date_tokens.join(" ")
            ));
        }

        let date_expr = date_tokens.first().cloned();
        debug!(?command, date = ?date_expr, "parsed invocation");

        Ok(Self { command, date_expr })
    }
}

/// Weekday and month names are dates unless spelled exactly as a command,
/// so `mon` means Monday rather than `month`.
fn command_token<'a>(token: &str, known: &[&'a str]) -> Option<&'a str> {
    let lower = token.to_ascii_lowercase();
    let date_word = clock::weekday_number(&lower).is_some() || clock::month_number(&lower).is_some();
    if date_word && !known.iter().any(|name| *name == lower) {
        return None;
    }
    expand_command_abbrev(&lower, known)
}
