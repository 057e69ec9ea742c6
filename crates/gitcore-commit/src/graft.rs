//! The graft table: parent-set overrides and shallow markers.
//!
//! A graft rewrites the parent set of a designated commit at parse time. A
//! shallow marker is a graft with no parent list at all; the fetch protocol
//! uses these to declare history boundaries.

use std::io::Write;
use std::path::{Path, PathBuf};

use bstr::BString;
use gitcore_hash::{HashKind, Oid};

use crate::GraphError;

/// Graft lines (and records) longer than this are ill-formed.
const MAX_GRAFT_LINE: usize = 1024;

/// One parent-set override. `parents` of `None` marks the commit shallow;
/// `Some(vec![])` grafts it into a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graft {
    oid: Oid,
    parents: Option<Vec<Oid>>,
}

impl Graft {
    pub fn new(oid: Oid, parents: Vec<Oid>) -> Self {
        Self {
            oid,
            parents: Some(parents),
        }
    }

    /// A shallow marker: the commit's parents are hidden from traversal.
    pub fn shallow(oid: Oid) -> Self {
        Self { oid, parents: None }
    }

    pub fn oid(&self) -> Oid {
        self.oid
    }

    pub fn is_shallow(&self) -> bool {
        self.parents.is_none()
    }

    /// The override parents; empty for a shallow marker.
    pub fn parent_oids(&self) -> &[Oid] {
        self.parents.as_deref().unwrap_or(&[])
    }
}

/// Per-line outcome of loading a graft file.
#[derive(Debug, Default)]
pub struct GraftFileReport {
    /// Structurally valid records registered.
    pub loaded: usize,
    /// Valid records discarded because the hash was already registered.
    pub duplicates: usize,
    /// 1-based line numbers and contents of rejected lines.
    pub bad_lines: Vec<(usize, BString)>,
}

/// A sorted array of grafts keyed by commit hash, binary-searched on lookup.
#[derive(Debug, Default)]
pub struct GraftTable {
    entries: Vec<Graft>,
    graft_file: Option<PathBuf>,
    prepared: bool,
}

impl GraftTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Graft] {
        &self.entries
    }

    /// Configure the file [`prepare`](Self::prepare) will load.
    pub fn set_graft_file(&mut self, path: impl Into<PathBuf>) {
        self.graft_file = Some(path.into());
    }

    /// One-shot preparation: load the configured graft file, if any. A
    /// missing file is not an error. Subsequent calls do nothing.
    pub fn prepare(&mut self) -> Result<(), GraphError> {
        if self.prepared {
            return Ok(());
        }
        self.prepared = true;
        if let Some(path) = self.graft_file.clone() {
            match self.read_graft_file(&path) {
                Ok(_) => {}
                Err(GraphError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Insert at the sorted position. An existing entry for the same hash is
    /// replaced unless `ignore_dups` is set, in which case the new entry is
    /// discarded. Returns true when a duplicate was encountered.
    pub fn register(&mut self, graft: Graft, ignore_dups: bool) -> bool {
        match self
            .entries
            .binary_search_by(|entry| entry.oid.cmp(&graft.oid))
        {
            Ok(at) => {
                if !ignore_dups {
                    self.entries[at] = graft;
                }
                true
            }
            Err(at) => {
                self.entries.insert(at, graft);
                false
            }
        }
    }

    pub fn lookup(&self, oid: &Oid) -> Option<&Graft> {
        self.entries
            .binary_search_by(|entry| entry.oid.cmp(oid))
            .ok()
            .map(|at| &self.entries[at])
    }

    /// Remove the entry for a hash, compacting the array. Returns whether an
    /// entry existed.
    pub fn unregister(&mut self, oid: &Oid) -> bool {
        match self.entries.binary_search_by(|entry| entry.oid.cmp(oid)) {
            Ok(at) => {
                self.entries.remove(at);
                true
            }
            Err(_) => false,
        }
    }

    /// Load a graft file: one record per line, `#` comments and blank lines
    /// ignored, malformed lines dropped and reported, valid lines registered
    /// without replacing existing entries.
    pub fn read_graft_file(&mut self, path: &Path) -> Result<GraftFileReport, GraphError> {
        let text = std::fs::read(path)?;
        let mut report = GraftFileReport::default();
        for (idx, line) in text.split(|&b| b == b'\n').enumerate() {
            if line.len() > MAX_GRAFT_LINE {
                report.bad_lines.push((idx + 1, BString::from(line)));
                continue;
            }
            match read_graft_line(line) {
                Ok(None) => {}
                Ok(Some(graft)) => {
                    report.loaded += 1;
                    if self.register(graft, true) {
                        report.duplicates += 1;
                    }
                }
                Err(_) => report.bad_lines.push((idx + 1, BString::from(line))),
            }
        }
        Ok(report)
    }

    /// Write every shallow marker to `out`, either as `HEX LF` records or as
    /// pkt-line framed `shallow HEX` packets. Returns the number of records
    /// written; a write failure truncates the stream and stops the loop.
    pub fn write_shallow<W: Write>(&self, out: &mut W, pack_protocol: bool) -> usize {
        let mut count = 0;
        for graft in &self.entries {
            if !graft.is_shallow() {
                continue;
            }
            let hex = graft.oid.to_hex();
            if pack_protocol {
                // 4 hex digits of length, counting themselves.
                let frame_len = 4 + "shallow ".len() + hex.len();
                if write!(out, "{frame_len:04x}shallow {hex}").is_err() {
                    break;
                }
            } else {
                if out.write_all(hex.as_bytes()).is_err() {
                    break;
                }
                if out.write_all(b"\n").is_err() {
                    break;
                }
            }
            count += 1;
        }
        count
    }
}

/// Parse one graft-file line: `HEX (SP HEX)*`, all hashes the same width.
/// Comments and blank lines yield `Ok(None)`.
pub fn read_graft_line(line: &[u8]) -> Result<Option<Graft>, GraphError> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    if line.is_empty() || line[0] == b'#' {
        return Ok(None);
    }
    let bad = || GraphError::BadGraft(BString::from(line));

    let len = line.len();
    let kind = if (len + 1) % (HashKind::Sha1.hex_len() + 1) == 0 {
        HashKind::Sha1
    } else if (len + 1) % (HashKind::Sha256.hex_len() + 1) == 0 {
        HashKind::Sha256
    } else {
        return Err(bad());
    };
    let hex_len = kind.hex_len();

    let oid = Oid::from_hex_bytes(&line[..hex_len]).map_err(|_| bad())?;
    let mut parents = Vec::with_capacity((len + 1) / (hex_len + 1) - 1);
    let mut at = hex_len;
    while at < len {
        if line[at] != b' ' {
            return Err(bad());
        }
        let parent = Oid::from_hex_bytes(&line[at + 1..at + 1 + hex_len]).map_err(|_| bad())?;
        parents.push(parent);
        at += hex_len + 1;
    }
    Ok(Some(Graft::new(oid, parents)))
}
