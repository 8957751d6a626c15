//! Offline subcommands over the karma data file.
//!
//! Provides `snowkarma show <name>`, `snowkarma top` and `snowkarma check`
//! without starting the event loop.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use karma_core::{codec, AliasStore, DecodeError, ScoreRecord};
use serde::Serialize;

use crate::config::Config;

#[derive(Subcommand, Debug)]
pub enum KarmaCommands {
    /// Show one identity's karma
    Show {
        /// Any alias of the identity
        name: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the leaderboard
    Top {
        /// Number of entries (clamped to 1..=max_top)
        #[arg(short = 'n', long)]
        count: Option<i64>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate the data file
    Check,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecordView {
    pub name: String,
    pub aliases: Vec<String>,
    pub upvotes: u32,
    pub downvotes: u32,
    pub net: i64,
}

impl From<&ScoreRecord> for RecordView {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            name: record.active_alias().to_string(),
            aliases: record.aliases().to_vec(),
            upvotes: record.upvotes,
            downvotes: record.downvotes,
            net: record.net(),
        }
    }
}

/// What `check` found in a data file.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Records parsed before end of input or the first bad line.
    pub parsed: usize,
    /// Records kept after dropping duplicate aliases.
    pub kept: usize,
    pub stopped: Option<DecodeError>,
}

/// Load the data file into a fresh store. A missing file is an empty store.
pub fn load_store(path: &Path) -> Result<(AliasStore, CheckReport)> {
    let mut store = AliasStore::new();
    let mut report = CheckReport::default();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((store, report)),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to open {}", path.display()));
        }
    };

    let loaded = codec::decode(BufReader::new(file));
    report.parsed = loaded.records.len();
    report.stopped = loaded.stopped;
    for record in loaded.records {
        store.insert(record);
    }
    store.resort();
    report.kept = store.len();
    Ok((store, report))
}

pub fn handle_command(cmd: KarmaCommands, config: &Config) -> Result<()> {
    let path = config.data_file();
    let (store, report) = load_store(&path)?;

    match cmd {
        KarmaCommands::Show { name, json } => {
            let view = store
                .lookup(&name)
                .and_then(|id| store.get(id))
                .map(RecordView::from);
            match (view, json) {
                (Some(view), true) => println!("{}", serde_json::to_string_pretty(&view)?),
                (Some(view), false) => {
                    println!("Name:    {}", view.name);
                    println!("Aliases: {}", view.aliases.join(", "));
                    println!(
                        "Karma:   {} [+{}|-{}]",
                        view.net, view.upvotes, view.downvotes
                    );
                }
                (None, true) => println!("null"),
                (None, false) => println!("No karma recorded for: {name}"),
            }
        }

        KarmaCommands::Top { count, json } => {
            let requested = count.unwrap_or_else(|| {
                i64::try_from(config.karma.default_top).unwrap_or(i64::MAX)
            });
            let views = top_views(&store, config.karma.clamp_top(requested));

            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else if views.is_empty() {
                println!("No karma recorded yet.");
            } else {
                for (rank, view) in views.iter().enumerate() {
                    println!(
                        "{:>3}. {} {} [+{}|-{}]",
                        rank + 1,
                        view.name,
                        view.net,
                        view.upvotes,
                        view.downvotes
                    );
                }
            }
        }

        KarmaCommands::Check => {
            println!("Data file: {}", path.display());
            println!("{}", describe_check(&report));
            if report.stopped.is_some() {
                anyhow::bail!("data file is damaged");
            }
        }
    }

    Ok(())
}

pub fn top_views(store: &AliasStore, count: usize) -> Vec<RecordView> {
    store.top(count).map(RecordView::from).collect()
}

pub fn describe_check(report: &CheckReport) -> String {
    let mut text = format!("{} record(s) parsed", report.parsed);
    if report.kept != report.parsed {
        text.push_str(&format!(
            ", {} dropped for duplicate aliases",
            report.parsed - report.kept
        ));
    }
    match &report.stopped {
        Some(e) => text.push_str(&format!("; loading stopped at line {}: {e}", e.line())),
        None => text.push_str("; file is clean"),
    }
    text
}
