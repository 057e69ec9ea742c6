//! In-place topological sort of a commit list.

use std::collections::HashMap;

use crate::list::CommitList;
use crate::store::{CommitId, CommitStore, ObjectSource};

/// Per-commit scratch for the sort: the number of children of this commit
/// that also occur in the list being sorted.
struct SortNode {
    indegree: u32,
}

/// Reorder `list` so every commit precedes all of its ancestors that are
/// also in the list.
///
/// With `lifo` the tie order among ready commits is the order their
/// indegree reached zero; without it, ready commits are taken newest first.
/// Membership is tracked in a side table keyed by node index, scoped to this
/// call. Sorting an already-sorted list is a no-op.
pub fn sort_in_topological_order<S: ObjectSource>(
    store: &CommitStore<S>,
    list: &mut CommitList,
    lifo: bool,
) {
    if list.is_empty() {
        return;
    }

    let mut scratch: HashMap<CommitId, SortNode> = list
        .iter()
        .map(|id| (id, SortNode { indegree: 0 }))
        .collect();

    // Count, for every commit, how many list members point at it.
    for id in list.iter() {
        for parent in store.node(id).parents() {
            if let Some(node) = scratch.get_mut(parent) {
                node.indegree += 1;
            }
        }
    }

    // Tips (indegree zero) seed the work queue in list order.
    let mut work = CommitList::new();
    for id in list.iter() {
        if scratch[&id].indegree == 0 {
            work.push_back(id);
        }
    }
    if !lifo {
        work.sort_by_date(store);
    }

    let mut sorted: Vec<CommitId> = Vec::with_capacity(list.len());
    while let Some(commit) = work.pop() {
        for &parent in store.node(commit).parents() {
            if let Some(node) = scratch.get_mut(&parent) {
                // A parent is enqueued only once all of its children in the
                // list have been emitted.
                node.indegree -= 1;
                if node.indegree == 0 {
                    if !lifo {
                        work.insert_by_date(store, parent);
                    } else {
                        work.push_front(parent);
                    }
                }
            }
        }
        scratch.remove(&commit);
        sorted.push(commit);
    }

    *list = sorted.into_iter().collect();
}
