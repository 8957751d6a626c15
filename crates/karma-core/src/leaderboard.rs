//! Leaderboard ordering over score records.
//!
//! The order is derived state: a permutation of record ids sorted by net
//! karma, most positive first. It is recomputed explicitly after structural
//! changes (record creation, load) and before persistence, never on read.
//! The sort is stable against the previous order, so ties keep whatever
//! relative position they already had.

use crate::record::{RecordId, ScoreRecord};

#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    order: Vec<RecordId>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring newly appended records into the order and re-sort by net karma.
    pub fn resort(&mut self, records: &[ScoreRecord]) {
        // Records are append-only, so anything past the tracked length is new.
        for idx in self.order.len()..records.len() {
            self.order.push(RecordId(idx));
        }
        self.order.retain(|id| id.0 < records.len());
        self.order
            .sort_by(|a, b| records[b.0].net().cmp(&records[a.0].net()));
    }

    /// Up to `n` ids from the top of the current order.
    pub fn top(&self, n: usize) -> &[RecordId] {
        &self.order[..n.min(self.order.len())]
    }

    /// All ids in leaderboard order.
    pub fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, up: u32, down: u32) -> ScoreRecord {
        let mut r = ScoreRecord::new(name);
        r.upvotes = up;
        r.downvotes = down;
        r
    }

    #[test]
    fn ties_keep_insertion_order() {
        let records = vec![
            record("a", 5, 0),
            record("b", 0, 2),
            record("c", 5, 0),
            record("d", 0, 0),
        ];
        let mut board = Leaderboard::new();
        board.resort(&records);

        let top: Vec<usize> = board.top(3).iter().map(|id| id.index()).collect();
        assert_eq!(top, vec![0, 2, 3]);
    }

    #[test]
    fn top_truncates_to_available() {
        let records = vec![record("a", 1, 0), record("b", 2, 0)];
        let mut board = Leaderboard::new();
        board.resort(&records);
        assert_eq!(board.top(10).len(), 2);
        assert_eq!(board.top(10)[0].index(), 1);
        assert_eq!(board.iter().nth(1), Some(RecordId(0)));
    }

    #[test]
    fn resort_picks_up_new_records() {
        let mut records = vec![record("a", 1, 0)];
        let mut board = Leaderboard::new();
        board.resort(&records);
        assert_eq!(board.len(), 1);

        records.push(record("b", 3, 0));
        board.resort(&records);
        assert_eq!(board.len(), 2);
        assert_eq!(board.top(1)[0].index(), 1);
    }

    #[test]
    fn resort_is_stable_against_previous_order() {
        let mut records = vec![record("a", 1, 0), record("b", 2, 0)];
        let mut board = Leaderboard::new();
        board.resort(&records);
        // b now leads; once a catches up the tie must keep b first.
        records[0].upvotes = 2;
        board.resort(&records);
        let order: Vec<usize> = board.iter().map(|id| id.index()).collect();
        assert_eq!(order, vec![1, 0]);
    }
}
