//! Merge-base computation by flag painting.
//!
//! Commits reachable from the first input are painted `PARENT1`, from the
//! second `PARENT2`. A commit carrying both paints is a common ancestor; its
//! ancestors are painted `STALE` so only the best (lowest) common ancestors
//! survive.

use crate::list::CommitList;
use crate::store::{CommitId, CommitStore, ObjectSource};
use crate::walk::clear_marks;
use crate::GraphError;

// Flag bits 0..15 belong to traversal callers.
pub const PARENT1: u32 = 1 << 16;
pub const PARENT2: u32 = 1 << 17;
pub const STALE: u32 = 1 << 18;
pub const RESULT: u32 = 1 << 19;

/// Every bit the merge-base engine may leave behind.
pub const ALL_MARKS: u32 = PARENT1 | PARENT2 | STALE | RESULT;

fn interesting<S: ObjectSource>(store: &CommitStore<S>, list: &CommitList) -> bool {
    list.iter().any(|commit| store.flags(commit) & STALE == 0)
}

/// All best common ancestors of `one` and `two`, newest first.
///
/// Paint marks are left on the traversed nodes; callers either follow up
/// with [`clear_marks`] or go through [`get_merge_bases`]. `merge_bases(a, a)`
/// returns `[a]` without marking anything.
pub fn merge_bases<S: ObjectSource>(
    store: &mut CommitStore<S>,
    one: CommitId,
    two: CommitId,
) -> Result<Vec<CommitId>, GraphError> {
    if one == two {
        return Ok(vec![one]);
    }

    store.parse_commit(one)?;
    store.parse_commit(two)?;

    store.add_flags(one, PARENT1);
    store.add_flags(two, PARENT2);

    let mut list = CommitList::new();
    list.insert_by_date(store, one);
    list.insert_by_date(store, two);

    let mut result = CommitList::new();
    while interesting(store, &list) {
        let Some(commit) = list.pop() else {
            break;
        };

        let mut flags = store.flags(commit) & (PARENT1 | PARENT2 | STALE);
        if flags == (PARENT1 | PARENT2) {
            if store.flags(commit) & RESULT == 0 {
                store.add_flags(commit, RESULT);
                result.insert_by_date(store, commit);
            }
            // Ancestors of a found base cannot be best themselves.
            flags |= STALE;
        }

        let parents: Vec<CommitId> = store.node(commit).parents().to_vec();
        for parent in parents {
            if store.flags(parent) & flags == flags {
                continue;
            }
            let _ = store.parse_commit(parent);
            store.add_flags(parent, flags);
            list.insert_by_date(store, parent);
        }
    }

    // A result that has since gone stale is dominated by another.
    let mut survivors = CommitList::new();
    for commit in result.iter() {
        if store.flags(commit) & STALE == 0 {
            survivors.insert_by_date(store, commit);
        }
    }
    Ok(survivors.into_vec())
}

/// The independent merge bases of `one` and `two`: candidates that are not
/// ancestors of any other candidate, newest first.
///
/// With `cleanup` the paint bits are cleared before returning; when several
/// candidates force the pairwise reduction, marks are cleared regardless.
pub fn get_merge_bases<S: ObjectSource>(
    store: &mut CommitStore<S>,
    one: CommitId,
    two: CommitId,
    cleanup: bool,
) -> Result<Vec<CommitId>, GraphError> {
    let result = merge_bases(store, one, two)?;
    if one == two {
        return Ok(result);
    }
    if result.len() <= 1 {
        if cleanup {
            clear_marks(store, one, ALL_MARKS);
            clear_marks(store, two, ALL_MARKS);
        }
        return Ok(result);
    }

    // More than one candidate: drop every candidate that is an ancestor of
    // another, by recomputing merge bases pairwise.
    let mut candidates: Vec<Option<CommitId>> = result.into_iter().map(Some).collect();
    clear_marks(store, one, ALL_MARKS);
    clear_marks(store, two, ALL_MARKS);

    let count = candidates.len();
    for i in 0..count - 1 {
        for j in i + 1..count {
            let (Some(a), Some(b)) = (candidates[i], candidates[j]) else {
                continue;
            };
            let bases = merge_bases(store, a, b)?;
            clear_marks(store, a, ALL_MARKS);
            clear_marks(store, b, ALL_MARKS);
            for base in bases {
                if candidates[i] == Some(base) {
                    candidates[i] = None;
                }
                if candidates[j] == Some(base) {
                    candidates[j] = None;
                }
            }
        }
    }

    let mut independent = CommitList::new();
    for commit in candidates.into_iter().flatten() {
        independent.insert_by_date(store, commit);
    }
    Ok(independent.into_vec())
}

/// Whether `commit` is itself a merge base of `commit` and the single
/// reference, that is, an ancestor of it. Queries against more than one
/// reference are not implemented.
pub fn in_merge_bases<S: ObjectSource>(
    store: &mut CommitStore<S>,
    commit: CommitId,
    references: &[CommitId],
) -> Result<bool, GraphError> {
    let [reference] = references else {
        return Err(GraphError::NotImplemented(
            "in_merge_bases with multiple references",
        ));
    };
    let bases = get_merge_bases(store, commit, *reference, true)?;
    Ok(bases.contains(&commit))
}
