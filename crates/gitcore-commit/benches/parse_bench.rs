use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, Criterion};
use gitcore_commit::{
    merge_bases, pop_most_recent, CommitList, CommitStore, GraphError, ObjectKind, ObjectSource,
};
use gitcore_hash::{HashKind, Oid};

#[derive(Default)]
struct MemSource {
    objects: HashMap<Oid, (ObjectKind, Vec<u8>)>,
}

impl ObjectSource for MemSource {
    fn read(&self, oid: &Oid) -> Result<Option<(ObjectKind, Vec<u8>)>, GraphError> {
        Ok(self.objects.get(oid).cloned())
    }

    fn deref_tag(&self, oid: &Oid) -> Result<Option<Oid>, GraphError> {
        Ok(self.objects.contains_key(oid).then_some(*oid))
    }
}

fn oid(n: u32) -> Oid {
    let mut digest = [0u8; 20];
    digest[..4].copy_from_slice(&n.to_be_bytes());
    Oid::from_bytes(HashKind::Sha1, &digest).unwrap()
}

fn commit_bytes(tree: Oid, parents: &[Oid], date: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(format!("tree {}\n", tree.to_hex()).as_bytes());
    for parent in parents {
        buf.extend_from_slice(format!("parent {}\n", parent.to_hex()).as_bytes());
    }
    buf.extend_from_slice(
        format!("author Alice Author <alice@example.com> {date} +0000\n").as_bytes(),
    );
    buf.extend_from_slice(
        format!("committer Bob Committer <bob@example.com> {date} +0000\n").as_bytes(),
    );
    buf.extend_from_slice(b"\nImplement feature X\n\nWith full test coverage.\n");
    buf
}

/// A linear chain of `len` commits; returns the source and the tip.
fn chain_source(len: u32) -> (MemSource, Oid) {
    let mut source = MemSource::default();
    let tree = oid(0xffff_0000);
    let mut parent: Option<Oid> = None;
    for n in 1..=len {
        let parents: Vec<Oid> = parent.into_iter().collect();
        source
            .objects
            .insert(oid(n), (ObjectKind::Commit, commit_bytes(tree, &parents, 1000 + u64::from(n))));
        parent = Some(oid(n));
    }
    (source, oid(len))
}

fn graph_benchmarks(c: &mut Criterion) {
    c.bench_function("parse_commit_buffer", |b| {
        let (source, tip) = chain_source(1);
        let bytes = source.objects[&tip].1.clone();
        b.iter(|| {
            let mut store = CommitStore::new(MemSource::default());
            let id = store.lookup_commit(tip).unwrap();
            store.parse_commit_buffer(id, &bytes).unwrap();
        });
    });

    c.bench_function("walk_chain_1000", |b| {
        b.iter(|| {
            let (source, tip) = chain_source(1000);
            let mut store = CommitStore::new(source);
            let tip = store.lookup_commit(tip).unwrap();
            store.parse_commit(tip).unwrap();
            store.add_flags(tip, 1);
            let mut frontier = CommitList::new();
            frontier.insert_by_date(&store, tip);
            let mut count = 0;
            while pop_most_recent(&mut store, &mut frontier, 1).is_some() {
                count += 1;
            }
            assert_eq!(count, 1000);
        });
    });

    c.bench_function("merge_base_forked_200", |b| {
        b.iter(|| {
            // Two branches of 100 commits forking from a common chain.
            let (mut source, fork) = chain_source(100);
            let tree = oid(0xffff_0000);
            let mut left = fork;
            let mut right = fork;
            for n in 0..100u32 {
                let l = oid(0x1000 + n);
                let r = oid(0x2000 + n);
                source
                    .objects
                    .insert(l, (ObjectKind::Commit, commit_bytes(tree, &[left], 2000 + u64::from(n))));
                source
                    .objects
                    .insert(r, (ObjectKind::Commit, commit_bytes(tree, &[right], 2000 + u64::from(n))));
                left = l;
                right = r;
            }
            let mut store = CommitStore::new(source);
            let left = store.lookup_commit(left).unwrap();
            let right = store.lookup_commit(right).unwrap();
            let bases = merge_bases(&mut store, left, right).unwrap();
            assert_eq!(bases.len(), 1);
        });
    });
}

criterion_group!(benches, graph_benchmarks);
criterion_main!(benches);
