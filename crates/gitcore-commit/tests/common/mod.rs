//! Shared helpers: an in-memory object source and commit-graph builders.
#![allow(dead_code)]

use std::collections::HashMap;

use bstr::BString;
use gitcore_commit::{CommitId, CommitStore, GraphError, ObjectKind, ObjectSource};
use gitcore_date::{Date, Identity};
use gitcore_hash::{HashKind, Oid};

/// An in-memory object database standing in for the surrounding store.
#[derive(Debug, Default)]
pub struct MemSource {
    objects: HashMap<Oid, (ObjectKind, Vec<u8>)>,
    tag_targets: HashMap<Oid, Oid>,
}

impl MemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, oid: Oid, kind: ObjectKind, bytes: Vec<u8>) {
        self.objects.insert(oid, (kind, bytes));
    }

    /// Register a tag object pointing at `target`.
    pub fn insert_tag(&mut self, tag: Oid, target: Oid) {
        let body = format!("object {}\ntype commit\ntag v0\n\n", target.to_hex());
        self.objects.insert(tag, (ObjectKind::Tag, body.into_bytes()));
        self.tag_targets.insert(tag, target);
    }
}

impl ObjectSource for MemSource {
    fn read(&self, oid: &Oid) -> Result<Option<(ObjectKind, Vec<u8>)>, GraphError> {
        Ok(self.objects.get(oid).cloned())
    }

    fn deref_tag(&self, oid: &Oid) -> Result<Option<Oid>, GraphError> {
        let mut current = *oid;
        while let Some(&target) = self.tag_targets.get(&current) {
            current = target;
        }
        Ok(self.objects.contains_key(&current).then_some(current))
    }
}

/// A SHA-1 id whose digest is `n` repeated.
pub fn oid(n: u8) -> Oid {
    Oid::from_bytes(HashKind::Sha1, &[n; 20]).unwrap()
}

/// A distinct id for commit `n`'s tree.
pub fn tree_oid(n: u8) -> Oid {
    let mut digest = [n; 20];
    digest[0] = !n;
    Oid::from_bytes(HashKind::Sha1, &digest).unwrap()
}

/// A UTC identity line for test commits.
pub fn ident(name: &str, email: &str, date: u64) -> Identity {
    Identity {
        name: BString::from(name),
        email: BString::from(email),
        date: Date::new(date as i64, 0),
    }
}

/// Serialise a commit object with the given tree, parents, committer date
/// and message. Author and committer share the date.
pub fn commit_buffer(tree: Oid, parents: &[Oid], date: u64, message: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(format!("tree {}\n", tree.to_hex()).as_bytes());
    for parent in parents {
        buf.extend_from_slice(format!("parent {}\n", parent.to_hex()).as_bytes());
    }
    buf.extend_from_slice(b"author ");
    buf.extend_from_slice(&ident("A U Thor", "author@example.com", date).to_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(b"committer ");
    buf.extend_from_slice(&ident("C O Mitter", "committer@example.com", date).to_bytes());
    buf.push(b'\n');
    buf.push(b'\n');
    buf.extend_from_slice(message.as_bytes());
    buf
}

/// Add commit `n` with the given parent numbers and date.
pub fn add_commit(source: &mut MemSource, n: u8, parents: &[u8], date: u64) -> Oid {
    let parent_oids: Vec<Oid> = parents.iter().map(|&p| oid(p)).collect();
    let buf = commit_buffer(tree_oid(n), &parent_oids, date, &format!("commit {n}\n"));
    source.insert(oid(n), ObjectKind::Commit, buf);
    oid(n)
}

/// Intern and parse a commit, returning its node id.
pub fn parsed(store: &mut CommitStore<MemSource>, oid: Oid) -> CommitId {
    let id = store.lookup_commit(oid).unwrap();
    store.parse_commit(id).unwrap();
    id
}

/// The hashes of a result list, for readable assertions.
pub fn oids_of(store: &CommitStore<MemSource>, ids: &[CommitId]) -> Vec<Oid> {
    ids.iter().map(|&id| store.node(id).oid()).collect()
}
