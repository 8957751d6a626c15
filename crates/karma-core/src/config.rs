//! Tunables for the karma module.

use serde::{Deserialize, Serialize};

/// Karma module configuration. Every field has a default, so an empty
/// `[karma]` table (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KarmaConfig {
    /// Minimum seconds between two applied votes from the same identity.
    pub cooldown_secs: u64,
    /// Message prefixes that upvote the following token. Matched
    /// case-insensitively at the start of a message, trailing space included.
    pub meme_prefixes: Vec<String>,
    /// Leaderboard length when `ktop` has no argument.
    pub default_top: usize,
    /// Upper clamp for the leaderboard length.
    pub max_top: usize,
    /// Command trigger characters (e.g. `\karma` and `!karma`).
    pub control_chars: Vec<String>,
}

impl Default for KarmaConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 60,
            meme_prefixes: vec!["!ytmnd ".to_string(), "!ytwnd ".to_string()],
            default_top: 3,
            max_top: 10,
            control_chars: vec!["\\".to_string(), "!".to_string()],
        }
    }
}

impl KarmaConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Clamp a requested leaderboard length into `1..=max_top`.
    pub fn clamp_top(&self, requested: i64) -> usize {
        let max = self.max_top.max(1);
        usize::try_from(requested).map_or(1, |n| n.clamp(1, max))
    }
}
