//! Rules deciding whether a detected gesture changes anyone's karma.

use chrono::{DateTime, Utc};

use crate::config::KarmaConfig;
use crate::record::{Direction, RecordId};
use crate::scanner::Gesture;
use crate::store::AliasStore;

/// Why a gesture was ignored. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("gesture has no target")]
    EmptyTarget,
    #[error("voter targeted one of their own aliases")]
    SelfVote,
    #[error("target is not a known identity")]
    UnknownTarget,
}

#[derive(Debug, Clone)]
pub struct VotePolicy {
    cooldown: chrono::Duration,
}

impl VotePolicy {
    pub fn new(cooldown: chrono::Duration) -> Self {
        Self { cooldown }
    }

    pub fn from_config(config: &KarmaConfig) -> Self {
        Self::new(config.cooldown())
    }

    pub fn cooldown(&self) -> chrono::Duration {
        self.cooldown
    }

    /// Whether `actor` gave a vote too recently to give another at `now`.
    pub fn cooling_down(&self, store: &AliasStore, actor: RecordId, now: DateTime<Utc>) -> bool {
        store
            .get(actor)
            .is_some_and(|record| record.cooling_down(now, self.cooldown))
    }

    /// Resolve `target` to a record `actor` may vote on.
    ///
    /// Never creates records: an unknown target is rejected.
    pub fn judge(
        &self,
        store: &AliasStore,
        actor: RecordId,
        target: &str,
    ) -> Result<RecordId, Rejection> {
        if target.is_empty() {
            return Err(Rejection::EmptyTarget);
        }
        if store.get(actor).is_some_and(|record| record.has_alias(target)) {
            return Err(Rejection::SelfVote);
        }
        match store.lookup(target) {
            Some(id) if id == actor => Err(Rejection::SelfVote),
            Some(id) => Ok(id),
            None => Err(Rejection::UnknownTarget),
        }
    }

    /// Pull gestures until one is approved, logging each rejection.
    pub fn select<'a>(
        &self,
        store: &AliasStore,
        actor: RecordId,
        gestures: impl IntoIterator<Item = Gesture<'a>>,
    ) -> Option<(RecordId, Gesture<'a>)> {
        for gesture in gestures {
            match self.judge(store, actor, gesture.target) {
                Ok(target) => return Some((target, gesture)),
                Err(reason) => {
                    tracing::debug!(
                        target_alias = gesture.target,
                        offset = gesture.offset,
                        %reason,
                        "karma: gesture ignored"
                    );
                }
            }
        }
        None
    }

    /// Apply an approved vote.
    ///
    /// Downvoting also costs the voter one downvote of their own.
    pub fn apply(
        &self,
        store: &mut AliasStore,
        actor: RecordId,
        target: RecordId,
        direction: Direction,
        now: DateTime<Utc>,
    ) {
        if let Some(record) = store.get_mut(target) {
            match direction {
                Direction::Up => record.upvotes = record.upvotes.saturating_add(1),
                Direction::Down => record.downvotes = record.downvotes.saturating_add(1),
            }
        }
        if let Some(record) = store.get_mut(actor) {
            if direction == Direction::Down {
                record.downvotes = record.downvotes.saturating_add(1);
            }
            record.last_give = Some(now);
        }
    }
}

impl Default for VotePolicy {
    fn default() -> Self {
        Self::from_config(&KarmaConfig::default())
    }
}
