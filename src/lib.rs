//! Snowkarma: a console host for the karma module.
//!
//! Wires [`karma_core`] to a TOML config, a transcript-driven event loop
//! and a handful of offline subcommands.

pub mod channels;
pub mod config;
pub mod host;
pub mod karma_cli;
pub mod runtime;

pub use channels::{ChatEvent, TranscriptChannel};
pub use config::Config;
pub use host::{ConsoleHost, Dispatcher};
pub use runtime::{run, RunSummary};
