//! Chronological traversal over the commit DAG.

use crate::list::CommitList;
use crate::store::{CommitId, CommitStore, ObjectSource};

// Flag bits 0..15 belong to traversal callers; the merge-base engine owns
// 16..19. These two are the caller bits the user-format `%m` token reads.
pub const BOUNDARY: u32 = 1 << 5;
pub const SYMMETRIC_LEFT: u32 = 1 << 6;

/// Detach the most recent commit from a date-descending frontier and extend
/// the frontier through its parents. Each parent is parsed and, unless it
/// already carries `mark`, marked and inserted by date, so over a whole
/// walk every commit is emitted exactly once per mark, newest first.
///
/// A parent whose object cannot be parsed still enters the frontier, dated 0.
pub fn pop_most_recent<S: ObjectSource>(
    store: &mut CommitStore<S>,
    frontier: &mut CommitList,
    mark: u32,
) -> Option<CommitId> {
    let head = frontier.pop()?;
    let parents: Vec<CommitId> = store.node(head).parents().to_vec();
    for parent in parents {
        let _ = store.parse_commit(parent);
        if store.flags(parent) & mark == 0 {
            store.add_flags(parent, mark);
            frontier.insert_by_date(store, parent);
        }
    }
    Some(head)
}

/// Clear `mask` bits across the ancestor closure of `id`, visiting each
/// ancestor once: a parent whose bits are already clear implies its own
/// ancestors are clean too.
pub fn clear_marks<S: ObjectSource>(store: &mut CommitStore<S>, id: CommitId, mask: u32) {
    let mut pending = vec![id];
    while let Some(commit) = pending.pop() {
        store.remove_flags(commit, mask);
        let parents: Vec<CommitId> = store.node(commit).parents().to_vec();
        for parent in parents {
            if store.flags(parent) & mask != 0 {
                pending.push(parent);
            }
        }
    }
}
