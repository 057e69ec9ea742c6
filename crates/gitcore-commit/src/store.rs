//! The object interner: hash → node identity.
//!
//! Nodes live in an arena and are addressed by stable [`CommitId`] indices;
//! two references to the same commit always carry the same index, so identity
//! comparison is index equality. Nodes are never destroyed.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use bstr::{BStr, BString};
use gitcore_hash::Oid;

use crate::graft::GraftTable;
use crate::GraphError;

/// The kinds of object a hash can resolve to. Only commits are materialised
/// as graph nodes; the other kinds exist so kind mismatches can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        })
    }
}

/// The narrow contract the surrounding object database must satisfy.
pub trait ObjectSource {
    /// Fetch the declared kind and raw content bytes of an object, with the
    /// storage header already stripped. `Ok(None)` means the object does not
    /// exist.
    fn read(&self, oid: &Oid) -> Result<Option<(ObjectKind, Vec<u8>)>, GraphError>;

    /// Follow tag indirection zero or more times, yielding the id of the
    /// first non-tag object. `Ok(None)` means the chain could not be
    /// resolved.
    fn deref_tag(&self, oid: &Oid) -> Result<Option<Oid>, GraphError>;
}

/// Stable arena index of an interned commit node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(u32);

/// An interned commit node.
///
/// `tree`, `parents` and `date` are only meaningful once `is_parsed()`
/// reports true; parsing is monotonic and never changes them afterwards.
/// A failed parse leaves the node unparsed, though `tree` may already have
/// been recorded.
#[derive(Debug)]
pub struct CommitNode {
    oid: Oid,
    kind: Option<ObjectKind>,
    pub(crate) parsed: bool,
    pub(crate) tree: Option<Oid>,
    pub(crate) parents: Vec<CommitId>,
    pub(crate) date: u64,
    flags: u32,
    buffer: Option<BString>,
}

impl CommitNode {
    fn new(oid: Oid, kind: Option<ObjectKind>) -> Self {
        Self {
            oid,
            kind,
            parsed: false,
            tree: None,
            parents: Vec::new(),
            date: 0,
            flags: 0,
            buffer: None,
        }
    }

    pub fn oid(&self) -> Oid {
        self.oid
    }

    pub fn kind(&self) -> Option<ObjectKind> {
        self.kind
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Root tree of the commit, once parsed.
    pub fn tree(&self) -> Option<Oid> {
        self.tree
    }

    /// Parents in header order; the first parent is distinguished.
    pub fn parents(&self) -> &[CommitId] {
        &self.parents
    }

    /// Committer timestamp in seconds since the epoch; 0 when unparseable.
    pub fn date(&self) -> u64 {
        self.date
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// The retained raw commit bytes, when buffer saving is enabled.
    pub fn buffer(&self) -> Option<&BStr> {
        self.buffer.as_ref().map(|b| BStr::new(b.as_slice()))
    }
}

/// The interner and owner of all per-process commit-graph state: the node
/// arena, the hash index, the graft table, and the parse-time toggles.
pub struct CommitStore<S> {
    source: S,
    nodes: Vec<CommitNode>,
    index: HashMap<Oid, CommitId>,
    grafts: GraftTable,
    save_commit_buffer: bool,
    track_object_refs: bool,
    object_refs: HashMap<Oid, Vec<Oid>>,
}

impl<S: ObjectSource> CommitStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            nodes: Vec::new(),
            index: HashMap::new(),
            grafts: GraftTable::new(),
            save_commit_buffer: true,
            track_object_refs: false,
            object_refs: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether raw commit bytes are retained on nodes after parsing.
    /// Defaults to on; the pretty-printer relies on the retained buffer.
    pub fn set_save_commit_buffer(&mut self, on: bool) {
        self.save_commit_buffer = on;
    }

    /// Whether a reverse object-refs index is built during parsing.
    pub fn set_track_object_refs(&mut self, on: bool) {
        self.track_object_refs = on;
    }

    /// Tell the store where its graft file lives. The file is loaded lazily,
    /// once, before the first graft lookup.
    pub fn set_graft_file(&mut self, path: impl Into<PathBuf>) {
        self.grafts.set_graft_file(path);
    }

    pub fn grafts(&self) -> &GraftTable {
        &self.grafts
    }

    pub fn grafts_mut(&mut self) -> &mut GraftTable {
        &mut self.grafts
    }

    /// Objects referenced by a parsed commit (tree first, then parents), when
    /// ref tracking is enabled.
    pub fn object_refs(&self, oid: &Oid) -> Option<&[Oid]> {
        self.object_refs.get(oid).map(Vec::as_slice)
    }

    pub fn node(&self, id: CommitId) -> &CommitNode {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: CommitId) -> &mut CommitNode {
        &mut self.nodes[id.0 as usize]
    }

    pub fn flags(&self, id: CommitId) -> u32 {
        self.node(id).flags
    }

    pub fn add_flags(&mut self, id: CommitId, bits: u32) {
        self.node_mut(id).flags |= bits;
    }

    pub fn remove_flags(&mut self, id: CommitId, bits: u32) {
        self.node_mut(id).flags &= !bits;
    }

    /// Number of interned nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The pre-existing node for a hash, if any.
    pub fn lookup(&self, oid: &Oid) -> Option<CommitId> {
        self.index.get(oid).copied()
    }

    /// Intern a hash, creating an empty node when absent. A known kind is
    /// recorded on first sight; an already-recorded kind is left alone.
    pub fn intern(&mut self, oid: Oid, kind: Option<ObjectKind>) -> CommitId {
        if let Some(&id) = self.index.get(&oid) {
            let node = self.node_mut(id);
            if node.kind.is_none() {
                node.kind = kind;
            }
            return id;
        }
        let id = CommitId(self.nodes.len() as u32);
        self.nodes.push(CommitNode::new(oid, kind));
        self.index.insert(oid, id);
        id
    }

    /// The interned node for a commit hash, created on demand. Fails with
    /// [`GraphError::WrongKind`] when the hash is already known to name a
    /// non-commit.
    pub fn lookup_commit(&mut self, oid: Oid) -> Result<CommitId, GraphError> {
        if let Some(&id) = self.index.get(&oid) {
            let node = self.node_mut(id);
            return match node.kind {
                None => {
                    node.kind = Some(ObjectKind::Commit);
                    Ok(id)
                }
                Some(ObjectKind::Commit) => Ok(id),
                Some(actual) => Err(GraphError::WrongKind { oid, actual }),
            };
        }
        Ok(self.intern(oid, Some(ObjectKind::Commit)))
    }

    /// Like [`lookup_commit`](Self::lookup_commit), but first dereferences
    /// tag indirection through the source.
    pub fn lookup_commit_reference(&mut self, oid: Oid) -> Result<CommitId, GraphError> {
        let peeled = self
            .source
            .deref_tag(&oid)?
            .ok_or(GraphError::ReadFail { oid })?;
        let (kind, _) = self
            .source
            .read(&peeled)?
            .ok_or(GraphError::ReadFail { oid: peeled })?;
        if kind != ObjectKind::Commit {
            return Err(GraphError::WrongKind { oid, actual: kind });
        }
        self.lookup_commit(peeled)
    }

    /// The quiet variant: an unresolvable or non-commit target yields
    /// `Ok(None)` instead of a diagnostic error.
    pub fn lookup_commit_reference_gently(
        &mut self,
        oid: Oid,
    ) -> Result<Option<CommitId>, GraphError> {
        let Some(peeled) = self.source.deref_tag(&oid)? else {
            return Ok(None);
        };
        let Some((kind, _)) = self.source.read(&peeled)? else {
            return Ok(None);
        };
        if kind != ObjectKind::Commit {
            return Ok(None);
        }
        Ok(Some(self.lookup_commit(peeled)?))
    }

    /// Fetch, kind-check and parse a commit. Safe to call redundantly; the
    /// raw bytes are retained on the node when buffer saving is on.
    pub fn parse_commit(&mut self, id: CommitId) -> Result<(), GraphError> {
        if self.node(id).parsed {
            return Ok(());
        }
        let oid = self.node(id).oid;
        let (kind, bytes) = self
            .source
            .read(&oid)?
            .ok_or(GraphError::ReadFail { oid })?;
        if kind != ObjectKind::Commit {
            return Err(GraphError::WrongKind { oid, actual: kind });
        }
        self.parse_commit_buffer(id, &bytes)?;
        if self.save_commit_buffer {
            self.node_mut(id).buffer = Some(BString::from(bytes));
        }
        Ok(())
    }

    /// The commit's raw bytes: the retained buffer when present, a fresh
    /// read otherwise.
    pub fn commit_bytes(&self, id: CommitId) -> Result<BString, GraphError> {
        let node = self.node(id);
        if let Some(buffer) = node.buffer() {
            return Ok(buffer.to_owned());
        }
        let oid = node.oid;
        let (kind, bytes) = self
            .source
            .read(&oid)?
            .ok_or(GraphError::ReadFail { oid })?;
        if kind != ObjectKind::Commit {
            return Err(GraphError::WrongKind { oid, actual: kind });
        }
        Ok(BString::from(bytes))
    }

    pub(crate) fn record_object_refs(&mut self, oid: Oid, refs: Vec<Oid>) {
        self.object_refs.insert(oid, refs);
    }

    pub(crate) fn track_object_refs(&self) -> bool {
        self.track_object_refs
    }
}
