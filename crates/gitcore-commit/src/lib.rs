//! The commit graph core of a content-addressed object store.
//!
//! Given raw commit bytes (fetched by a surrounding [`ObjectSource`]), this
//! crate parses them into nodes of an interned DAG, applies graft/shallow
//! rewrites to parent sets, traverses the DAG in chronological or topological
//! order, computes merge bases, and renders commits into the classic
//! catalogue of presentation formats (`raw`, `medium`, `oneline`, `email`,
//! user templates, ...).
//!
//! The core holds no persistent state and performs no I/O of its own beyond
//! reading a configured graft file; all operations assume a single logical
//! thread of control.

mod graft;
mod interp;
mod list;
mod merge_base;
mod parse;
mod pretty;
mod store;
mod topo;
mod walk;

pub use graft::{read_graft_line, Graft, GraftFileReport, GraftTable};
pub use interp::format_commit_message;
pub use list::CommitList;
pub use merge_base::{
    get_merge_bases, in_merge_bases, merge_bases, ALL_MARKS, PARENT1, PARENT2, RESULT, STALE,
};
pub use pretty::{logmsg_reencode, pretty_print_commit, PrettyFormat, PrettyOptions};
pub use store::{CommitId, CommitNode, CommitStore, ObjectKind, ObjectSource};
pub use topo::sort_in_topological_order;
pub use walk::{clear_marks, pop_most_recent, BOUNDARY, SYMMETRIC_LEFT};

use bstr::BString;
use gitcore_hash::Oid;

/// Errors produced by the commit graph core.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("bogus commit object {oid}: {reason}")]
    BadCommit { oid: Oid, reason: &'static str },

    #[error("object {oid} is a {actual}, not a commit")]
    WrongKind { oid: Oid, actual: ObjectKind },

    #[error("could not read object {oid}")]
    ReadFail { oid: Oid },

    #[error("bad graft data: {0}")]
    BadGraft(BString),

    #[error("invalid pretty format: {0}")]
    BadFormat(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
