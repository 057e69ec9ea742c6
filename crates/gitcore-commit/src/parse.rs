//! The commit object parser.
//!
//! Turns raw commit bytes into a populated node: tree pointer, parent list
//! (possibly rewritten by a registered graft), and committer date.

use gitcore_hash::Oid;

use crate::store::{CommitId, CommitStore, ObjectSource};
use crate::GraphError;

impl<S: ObjectSource> CommitStore<S> {
    /// Parse a commit object from `buf` into its node. The buffer is the
    /// textual commit body with the storage header already stripped.
    ///
    /// Grammar:
    ///
    /// ```text
    /// commit  := "tree " HEX "\n" parent* header* "\n" body
    /// parent  := "parent " HEX "\n"
    /// ```
    ///
    /// A registered graft overrides the textual parents; the parent lines
    /// are still validated and skipped. A parent hash whose interned node
    /// turns out not to be a commit is skipped silently. A second call on a
    /// parsed node is a no-op.
    pub fn parse_commit_buffer(&mut self, id: CommitId, buf: &[u8]) -> Result<(), GraphError> {
        if self.node(id).is_parsed() {
            return Ok(());
        }
        let oid = self.node(id).oid();
        let hex_len = oid.kind().hex_len();

        // "tree " + hex + "\n"
        let tree_line = 5 + hex_len + 1;
        if buf.len() < tree_line || &buf[..5] != b"tree " || buf[tree_line - 1] != b'\n' {
            return Err(GraphError::BadCommit {
                oid,
                reason: "missing tree header",
            });
        }
        let tree = Oid::from_hex_bytes(&buf[5..5 + hex_len]).map_err(|_| GraphError::BadCommit {
            oid,
            reason: "bad tree pointer",
        })?;
        self.node_mut(id).tree = Some(tree);

        self.grafts_mut().prepare()?;
        let graft = self.grafts().lookup(&oid).cloned();

        // "parent " + hex + "\n"
        let stride = hex_len + 8;
        let mut pos = tree_line;
        let mut parents: Vec<CommitId> = Vec::new();
        while buf.len() >= pos + 7 && &buf[pos..pos + 7] == b"parent " {
            if buf.len() < pos + stride || buf[pos + stride - 1] != b'\n' {
                return Err(GraphError::BadCommit {
                    oid,
                    reason: "bad parent line",
                });
            }
            let parent = Oid::from_hex_bytes(&buf[pos + 7..pos + 7 + hex_len]).map_err(|_| {
                GraphError::BadCommit {
                    oid,
                    reason: "bad parent line",
                }
            })?;
            pos += stride;
            if graft.is_some() {
                continue;
            }
            if let Ok(pid) = self.lookup_commit(parent) {
                parents.push(pid);
            }
        }
        if let Some(graft) = &graft {
            for &parent in graft.parent_oids() {
                if let Ok(pid) = self.lookup_commit(parent) {
                    parents.push(pid);
                }
            }
        }

        let date = parse_commit_date(&buf[pos..]);

        let node = self.node_mut(id);
        node.parents = parents;
        node.date = date;
        node.parsed = true;

        if self.track_object_refs() {
            let mut refs = Vec::with_capacity(1 + self.node(id).parents().len());
            refs.push(tree);
            for &p in self.node(id).parents() {
                refs.push(self.node(p).oid());
            }
            self.record_object_refs(oid, refs);
        }

        Ok(())
    }
}

/// Extract the committer timestamp from the header region following the
/// parent lines. Any structural surprise yields 0 rather than an error.
fn parse_commit_date(buf: &[u8]) -> u64 {
    if !buf.starts_with(b"author") {
        return 0;
    }
    let Some(eol) = buf.iter().position(|&b| b == b'\n') else {
        return 0;
    };
    let rest = &buf[eol + 1..];
    if !rest.starts_with(b"committer") {
        return 0;
    }
    let Some(gt) = rest.iter().position(|&b| b == b'>') else {
        return 0;
    };
    let mut tail = &rest[gt + 1..];
    while let [b' ' | b'\t', more @ ..] = tail {
        tail = more;
    }
    let digits: &[u8] = match tail.iter().position(|b| !b.is_ascii_digit()) {
        Some(end) => &tail[..end],
        None => tail,
    };
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}
