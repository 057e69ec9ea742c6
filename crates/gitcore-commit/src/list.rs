//! The date-ordered commit work list.
//!
//! Date-ordered callers keep the list sorted descending by committer date so
//! the head is always the most recent commit; insertion is stable, placing a
//! new item after any existing items with the same date.

use std::collections::VecDeque;

use crate::store::{CommitId, CommitStore, ObjectSource};

#[derive(Debug, Clone, Default)]
pub struct CommitList {
    items: VecDeque<CommitId>,
}

impl CommitList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Prepend, ignoring date order.
    pub fn push_front(&mut self, id: CommitId) {
        self.items.push_front(id);
    }

    /// Append, ignoring date order.
    pub fn push_back(&mut self, id: CommitId) {
        self.items.push_back(id);
    }

    /// Insert before the first item whose date is strictly older, so equal
    /// dates keep insertion order.
    pub fn insert_by_date<S: ObjectSource>(&mut self, store: &CommitStore<S>, id: CommitId) {
        let date = store.node(id).date();
        let at = self
            .items
            .iter()
            .position(|&c| store.node(c).date() < date)
            .unwrap_or(self.items.len());
        self.items.insert(at, id);
    }

    /// Rebuild into descending date order by repeated dated insertion.
    pub fn sort_by_date<S: ObjectSource>(&mut self, store: &CommitStore<S>) {
        let drained: Vec<CommitId> = self.items.drain(..).collect();
        for id in drained {
            self.insert_by_date(store, id);
        }
    }

    /// Detach and return the head.
    pub fn pop(&mut self) -> Option<CommitId> {
        self.items.pop_front()
    }

    pub fn contains(&self, id: CommitId) -> bool {
        self.items.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = CommitId> + '_ {
        self.items.iter().copied()
    }

    pub fn into_vec(self) -> Vec<CommitId> {
        self.items.into()
    }
}

impl FromIterator<CommitId> for CommitList {
    fn from_iter<I: IntoIterator<Item = CommitId>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<CommitId> for CommitList {
    fn extend<I: IntoIterator<Item = CommitId>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}
