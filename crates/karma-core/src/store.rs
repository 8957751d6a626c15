//! Alias store: many alias strings, one score record.
//!
//! Every alias maps to at most one record. Lookups are exact matches,
//! ASCII case-insensitive, served from a case-folded index that is kept in
//! step with every alias mutation.

use std::collections::HashMap;

use crate::leaderboard::Leaderboard;
use crate::record::{is_valid_alias, RecordId, ScoreRecord};

/// Result of attaching an alias to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasChange {
    /// The alias was new and is now the record's active alias.
    Added,
    /// The record already knew the alias; it is active again.
    Reactivated,
    /// Another record owns the alias. That record is now active under it
    /// and the requested record is untouched.
    ClaimedBy(RecordId),
    /// The name cannot be stored as an alias; nothing changed.
    Invalid,
}

#[derive(Debug, Clone, Default)]
pub struct AliasStore {
    records: Vec<ScoreRecord>,
    index: HashMap<String, RecordId>,
    leaderboard: Leaderboard,
}

fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl AliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&ScoreRecord> {
        self.records.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: RecordId) -> Option<&mut ScoreRecord> {
        self.records.get_mut(id.0)
    }

    /// Records in creation order, with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &ScoreRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| (RecordId(idx), record))
    }

    /// Records in leaderboard order (as of the last re-sort).
    pub fn ranked(&self) -> impl Iterator<Item = &ScoreRecord> {
        self.leaderboard
            .iter()
            .filter_map(move |id| self.records.get(id.0))
    }

    /// Up to `n` records from the top of the leaderboard.
    pub fn top(&self, n: usize) -> impl Iterator<Item = &ScoreRecord> {
        self.leaderboard
            .top(n)
            .iter()
            .filter_map(move |id| self.records.get(id.0))
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Resolve `name` without touching any state.
    pub fn lookup(&self, name: &str) -> Option<RecordId> {
        self.index.get(&fold(name)).copied()
    }

    /// Resolve `name` to its record. With `mark_active`, the matched alias
    /// becomes the record's active alias.
    pub fn find_by_alias(&mut self, name: &str, mark_active: bool) -> Option<RecordId> {
        let id = self.lookup(name)?;
        if mark_active {
            if let Some(record) = self.records.get_mut(id.0) {
                if let Some(pos) = record.position_of(name) {
                    record.set_active(pos);
                }
            }
        }
        Some(id)
    }

    /// Resolve `name`, creating a fresh record for it when unknown.
    ///
    /// The returned record is active under `name` either way. Names that are
    /// not valid aliases are never tracked.
    pub fn get_or_create(&mut self, name: &str) -> Option<RecordId> {
        if !is_valid_alias(name) {
            tracing::debug!(alias = name, "karma: refusing unstorable alias");
            return None;
        }
        if let Some(id) = self.find_by_alias(name, true) {
            return Some(id);
        }

        let id = RecordId(self.records.len());
        self.records.push(ScoreRecord::new(name));
        self.index.insert(fold(name), id);
        self.leaderboard.resort(&self.records);
        tracing::debug!(alias = name, "karma: tracking new identity");
        Some(id)
    }

    /// Attach `name` to record `id`, or re-activate it if already known.
    pub fn add_alias(&mut self, id: RecordId, name: &str) -> AliasChange {
        if !is_valid_alias(name) {
            return AliasChange::Invalid;
        }
        match self.lookup(name) {
            Some(owner) if owner != id => {
                self.find_by_alias(name, true);
                AliasChange::ClaimedBy(owner)
            }
            _ => {
                let Some(record) = self.records.get_mut(id.0) else {
                    return AliasChange::Reactivated;
                };
                if record.touch_alias(name) {
                    self.index.insert(fold(name), id);
                    AliasChange::Added
                } else {
                    AliasChange::Reactivated
                }
            }
        }
    }

    /// Append a restored record without re-sorting.
    ///
    /// Invalid aliases and aliases already owned by another record are
    /// dropped from `record`; if nothing is left the record is discarded and
    /// `None` returned.
    pub fn insert(&mut self, mut record: ScoreRecord) -> Option<RecordId> {
        let index = &self.index;
        let mut seen: Vec<String> = Vec::new();
        record.retain_aliases(|alias| {
            if !is_valid_alias(alias) {
                tracing::warn!(alias, "karma: dropping unstorable alias");
                return false;
            }
            let key = fold(alias);
            if index.contains_key(&key) || seen.contains(&key) {
                tracing::warn!(alias, "karma: alias already claimed, dropping duplicate");
                false
            } else {
                seen.push(key);
                true
            }
        });
        if record.aliases().is_empty() {
            return None;
        }

        let id = RecordId(self.records.len());
        for key in seen {
            self.index.insert(key, id);
        }
        self.records.push(record);
        Some(id)
    }

    /// Recompute the leaderboard order.
    pub fn resort(&mut self) {
        self.leaderboard.resort(&self.records);
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
        self.leaderboard.clear();
    }
}
