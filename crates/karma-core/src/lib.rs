//! Alias-aware karma tracking for Snowkarma
//!
//! This crate provides the reputation engine a chat bot embeds to turn
//! `name++` / `--name` gestures into persistent per-identity scores,
//! including alias resolution across nickname changes, vote policy,
//! leaderboard ordering, and the plain-text data file format.

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod leaderboard;
pub mod module;
pub mod policy;
pub mod record;
pub mod scanner;
pub mod store;

// Re-export commonly used types
pub use codec::{decode, encode, DecodeError, LoadReport, RecordLines};
pub use command::{parse_command, KarmaCommand};
pub use config::KarmaConfig;
pub use error::{KarmaError, Result};
pub use host::HostContext;
pub use leaderboard::Leaderboard;
pub use module::{KarmaModule, ModuleRequest, KARMA_GET};
pub use policy::{Rejection, VotePolicy};
pub use record::{Direction, RecordId, ScoreRecord};
pub use scanner::{scan, Gesture, GestureKind, Gestures};
pub use store::AliasStore;
