//! Line-oriented interactive session.
//!
//! Each command line is one interaction: it updates the query, then the whole
//! pipeline re-runs against the cached dataset and the dashboard is printed.

use chrono::NaiveDate;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::article::Granularity;
use crate::cache::DatasetCache;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::pipeline::{self, Query};
use crate::rank::RankWindow;
use crate::report::Renderer;
use crate::selection::Selection;

pub const HELP: &str = "\
Commands:
  agencies A,B,...        include only these agencies
  reset                   include every agency
  granularity G           year, month, week or day
  range START END         days as YYYY-MM-DD, '-' for the default bound
  rank LOW HIGH           show agencies ranked LOW through HIGH
  refresh                 reload the dataset from its source
  show                    print the dashboard again
  help                    print this help
  quit                    leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Agencies(Vec<String>),
    Reset,
    Granularity(Granularity),
    Range(Option<NaiveDate>, Option<NaiveDate>),
    Rank(usize, usize),
    Refresh,
    Show,
    Help,
    Quit,
}

fn parse_bound(value: &str) -> Result<Option<NaiveDate>> {
    if value == "-" {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::InvalidCommand(format!("'{}' is not a YYYY-MM-DD date", value)))
}

fn parse_rank(value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| Error::InvalidCommand(format!("'{}' is not a rank", value)))
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Command::Show);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (name.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("agencies" | "agency", list) => Command::Agencies(
                list.join(" ")
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            ("reset", []) => Command::Reset,
            ("granularity", [value]) => Command::Granularity(value.parse()?),
            ("range", [start, end]) => Command::Range(parse_bound(start)?, parse_bound(end)?),
            ("rank", [low, high]) => Command::Rank(parse_rank(low)?, parse_rank(high)?),
            ("refresh", []) => Command::Refresh,
            ("show", []) => Command::Show,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => {
                return Err(Error::InvalidCommand(format!(
                    "'{}' (type 'help' for the list of commands)",
                    line.trim()
                )))
            }
        };
        Ok(command)
    }
}

/// Per-session controls. Lives as long as the session; nothing is persisted.
#[derive(Debug, Clone)]
pub struct Session {
    query: Query,
}

impl Session {
    pub fn new(query: Query) -> Self {
        Session { query }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Applies a state-changing command. Other commands leave the query as is.
    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::Agencies(list) => self.query.selection.set(list.iter().cloned()),
            Command::Reset => self.query.selection.reset(),
            Command::Granularity(g) => self.query.granularity = *g,
            Command::Range(from, to) => {
                self.query.from = *from;
                self.query.to = *to;
            }
            Command::Rank(low, high) => self.query.rank = Some(RankWindow::new(*low, *high)),
            Command::Refresh | Command::Show | Command::Help | Command::Quit => {}
        }
    }

    /// Called when a new snapshot replaces the old one. A changed agency list
    /// restarts the selection from "all agencies".
    pub fn on_new_snapshot(&mut self, dataset: &Dataset) {
        let unchanged = self
            .query
            .selection
            .available()
            .eq(dataset.agencies().iter().map(String::as_str));
        if !unchanged {
            info!(
                action = "reset",
                component = "session",
                agency_count = dataset.agencies().len(),
                "Agency list changed, selecting all agencies"
            );
            self.query.selection = Selection::all(dataset.agencies().iter().cloned());
        }
    }
}

/// Runs commands from `input` until it ends or `quit` is read.
///
/// Invalid commands are reported on `out` and leave the state untouched. A
/// failed dataset load ends the session with an error.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut Session,
    cache: &mut DatasetCache,
    renderer: &Renderer,
    input: R,
    out: &mut W,
) -> Result<()> {
    let mut dataset = cache.get()?;
    renderer.render(&pipeline::run(&dataset, session.query()), out)?;
    writeln!(out, "\nType 'help' for commands.")?;

    for line in input.lines() {
        let line = line?;
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                continue;
            }
        };
        debug!(action = "command", component = "session", command = ?command, "Processing command");

        let snapshot = match &command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            Command::Refresh => cache.refresh()?,
            _ => {
                session.apply(&command);
                cache.get()?
            }
        };

        if !Arc::ptr_eq(&snapshot, &dataset) {
            session.on_new_snapshot(&snapshot);
            dataset = snapshot;
        }
        renderer.render(&pipeline::run(&dataset, session.query()), out)?;
    }

    Ok(())
}
