//! Score records: one per tracked identity, owning every alias it is known by.

use chrono::{DateTime, Utc};

/// Stable handle for a record inside an [`AliasStore`](crate::store::AliasStore).
///
/// Records are never removed during normal operation, so an id stays valid
/// until the store is cleared or reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Direction of a vote gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn is_up(self) -> bool {
        matches!(self, Direction::Up)
    }
}

/// Whether `name` can be stored as an alias: non-empty, with no `:` (the
/// data file's alias separator) and no whitespace.
pub fn is_valid_alias(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c == ':' || c.is_whitespace())
}

/// Karma for a single identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    /// Known aliases in the order they were first seen.
    aliases: Vec<String>,
    /// Index into `aliases` of the currently displayed name.
    active: usize,
    pub upvotes: u32,
    pub downvotes: u32,
    /// When this identity last *gave* an applied vote.
    pub last_give: Option<DateTime<Utc>>,
}

impl ScoreRecord {
    /// Create a record known by a single alias, with no votes.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            aliases: vec![alias.into()],
            active: 0,
            upvotes: 0,
            downvotes: 0,
            last_give: None,
        }
    }

    /// Rebuild a record from persisted fields. The last alias becomes active.
    ///
    /// Returns `None` when `aliases` is empty.
    pub fn restore(aliases: Vec<String>, upvotes: u32, downvotes: u32) -> Option<Self> {
        if aliases.is_empty() {
            return None;
        }
        let active = aliases.len() - 1;
        Some(Self {
            aliases,
            active,
            upvotes,
            downvotes,
            last_give: None,
        })
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_alias(&self) -> &str {
        &self.aliases[self.active]
    }

    /// Net karma, `upvotes - downvotes`.
    pub fn net(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    /// True when the record has never been voted on (nor paid a downvote cost).
    pub fn is_idle(&self) -> bool {
        self.upvotes == 0 && self.downvotes == 0
    }

    /// Position of `name` among the aliases, compared ASCII case-insensitively.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.aliases
            .iter()
            .position(|alias| alias.eq_ignore_ascii_case(name))
    }

    pub fn has_alias(&self, name: &str) -> bool {
        self.position_of(name).is_some()
    }

    /// Mark `name` as active, appending it first if unknown.
    ///
    /// Returns true when the alias was newly appended.
    pub(crate) fn touch_alias(&mut self, name: &str) -> bool {
        match self.position_of(name) {
            Some(pos) => {
                self.active = pos;
                false
            }
            None => {
                self.aliases.push(name.to_string());
                self.active = self.aliases.len() - 1;
                true
            }
        }
    }

    pub(crate) fn set_active(&mut self, pos: usize) {
        if pos < self.aliases.len() {
            self.active = pos;
        }
    }

    pub(crate) fn retain_aliases(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let active = self.active_alias().to_string();
        self.aliases.retain(|alias| keep(alias.as_str()));
        self.active = self
            .aliases
            .iter()
            .position(|alias| *alias == active)
            .unwrap_or_else(|| self.aliases.len().saturating_sub(1));
    }

    /// Whether this identity gave a vote less than `cooldown` before `now`.
    pub fn cooling_down(&self, now: DateTime<Utc>, cooldown: chrono::Duration) -> bool {
        self.last_give
            .map(|given| now.signed_duration_since(given) < cooldown)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_grammar() {
        assert!(is_valid_alias("alice"));
        assert!(is_valid_alias("[m]bob_|away"));
        assert!(!is_valid_alias(""));
        assert!(!is_valid_alias(":"));
        assert!(!is_valid_alias("a:b"));
        assert!(!is_valid_alias("two words"));
        assert!(!is_valid_alias("tab\there"));
    }

    #[test]
    fn new_record_is_active_under_its_name() {
        let record = ScoreRecord::new("alice");
        assert_eq!(record.aliases(), ["alice"]);
        assert_eq!(record.active_alias(), "alice");
        assert!(record.is_idle());
        assert_eq!(record.net(), 0);
    }

    #[test]
    fn touch_alias_appends_or_reactivates() {
        let mut record = ScoreRecord::new("alice");
        assert!(record.touch_alias("alice_away"));
        assert_eq!(record.active_alias(), "alice_away");

        assert!(!record.touch_alias("ALICE"));
        assert_eq!(record.active_index(), 0);
        assert_eq!(record.aliases().len(), 2);
    }

    #[test]
    fn restore_activates_last_alias() {
        let record =
            ScoreRecord::restore(vec!["bob".into(), "bobby".into()], 4, 1).unwrap();
        assert_eq!(record.active_alias(), "bobby");
        assert_eq!(record.net(), 3);
        assert!(ScoreRecord::restore(Vec::new(), 1, 1).is_none());
    }

    #[test]
    fn net_goes_negative() {
        let mut record = ScoreRecord::new("carol");
        record.downvotes = 7;
        record.upvotes = 2;
        assert_eq!(record.net(), -5);
    }

    #[test]
    fn cooldown_window() {
        let now = Utc::now();
        let mut record = ScoreRecord::new("dave");
        let window = chrono::Duration::seconds(60);
        assert!(!record.cooling_down(now, window));

        record.last_give = Some(now - chrono::Duration::seconds(59));
        assert!(record.cooling_down(now, window));

        record.last_give = Some(now - chrono::Duration::seconds(60));
        assert!(!record.cooling_down(now, window));
    }

    #[test]
    fn retain_aliases_keeps_active_when_possible() {
        let mut record =
            ScoreRecord::restore(vec!["a".into(), "b".into(), "c".into()], 1, 0).unwrap();
        record.set_active(1);
        record.retain_aliases(|alias| alias != "a");
        assert_eq!(record.aliases(), ["b", "c"]);
        assert_eq!(record.active_alias(), "b");
    }
}
