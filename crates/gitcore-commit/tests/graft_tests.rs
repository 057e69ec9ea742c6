//! Graft-table behaviour at the store level: parent rewriting, shallow
//! markers, and graft-file loading.

mod common;

use std::io::Write;

use common::{add_commit, commit_buffer, oid, oids_of, parsed, tree_oid, MemSource};
use gitcore_commit::{CommitStore, Graft, ObjectKind};

#[test]
fn graft_overrides_textual_parents() {
    let mut source = MemSource::new();
    add_commit(&mut source, 1, &[], 1000);
    add_commit(&mut source, 2, &[], 1100);
    let b = add_commit(&mut source, 3, &[1], 2000); // buffer says parent 1
    let mut store = CommitStore::new(source);

    store
        .grafts_mut()
        .register(Graft::new(oid(3), vec![oid(2)]), false);

    let b = parsed(&mut store, b);
    assert_eq!(oids_of(&store, store.node(b).parents()), vec![oid(2)]);
}

#[test]
fn shallow_graft_hides_all_parents() {
    let mut source = MemSource::new();
    add_commit(&mut source, 1, &[], 1000);
    let b = add_commit(&mut source, 2, &[1], 2000);
    let mut store = CommitStore::new(source);

    store.grafts_mut().register(Graft::shallow(oid(2)), false);

    let b = parsed(&mut store, b);
    assert!(store.node(b).parents().is_empty());

    let mut out = Vec::new();
    let count = store.grafts().write_shallow(&mut out, true);
    assert_eq!(count, 1);
    assert_eq!(out, format!("0034shallow {}", oid(2).to_hex()).into_bytes());
}

#[test]
fn graft_registered_after_parse_changes_nothing() {
    let mut source = MemSource::new();
    add_commit(&mut source, 1, &[], 1000);
    let b = add_commit(&mut source, 2, &[1], 2000);
    let mut store = CommitStore::new(source);

    let b = parsed(&mut store, b);
    store.grafts_mut().register(Graft::shallow(oid(2)), false);
    store.parse_commit(b).unwrap();

    assert_eq!(oids_of(&store, store.node(b).parents()), vec![oid(1)]);
}

#[test]
fn graft_file_is_loaded_lazily_and_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grafts");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "# rewrite commit 3 onto commit 2").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "{} {}", oid(3).to_hex(), oid(2).to_hex()).unwrap();
    drop(file);

    let mut source = MemSource::new();
    add_commit(&mut source, 1, &[], 1000);
    add_commit(&mut source, 2, &[], 1100);
    let b = add_commit(&mut source, 3, &[1], 2000);
    let mut store = CommitStore::new(source);
    store.set_graft_file(&path);

    let b = parsed(&mut store, b);
    assert_eq!(oids_of(&store, store.node(b).parents()), vec![oid(2)]);

    // Deleting the file after preparation must not matter.
    std::fs::remove_file(&path).unwrap();
    store.grafts_mut().prepare().unwrap();
    assert_eq!(store.grafts().len(), 1);
}

#[test]
fn missing_graft_file_is_not_an_error() {
    let mut source = MemSource::new();
    let r = add_commit(&mut source, 1, &[], 1000);
    let mut store = CommitStore::new(source);
    store.set_graft_file("/nonexistent/grafts");

    let r = parsed(&mut store, r);
    assert!(store.node(r).parents().is_empty());
}

#[test]
fn graft_file_report_counts_bad_lines_and_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grafts");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "# comment").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "{}", oid(1).to_hex()).unwrap();
    writeln!(file, "{} {}", oid(1).to_hex(), oid(9).to_hex()).unwrap(); // duplicate
    writeln!(file, "not a graft line").unwrap();
    writeln!(file, "{}xx", oid(2).to_hex()).unwrap();
    drop(file);

    let mut store = CommitStore::new(MemSource::new());
    let report = store.grafts_mut().read_graft_file(&path).unwrap();

    assert_eq!(report.loaded, 2);
    assert_eq!(report.duplicates, 1);
    let bad: Vec<usize> = report.bad_lines.iter().map(|(line, _)| *line).collect();
    assert_eq!(bad, vec![5, 6]);

    // The duplicate was discarded, keeping the original parentless entry.
    assert!(store
        .grafts()
        .lookup(&oid(1))
        .unwrap()
        .parent_oids()
        .is_empty());
}

#[test]
fn unregister_removes_shallow_marker() {
    let mut store = CommitStore::new(MemSource::new());
    store.grafts_mut().register(Graft::shallow(oid(1)), false);
    store.grafts_mut().register(Graft::shallow(oid(2)), false);

    assert!(store.grafts_mut().unregister(&oid(1)));
    let mut out = Vec::new();
    assert_eq!(store.grafts().write_shallow(&mut out, false), 1);
    assert_eq!(out, format!("{}\n", oid(2).to_hex()).into_bytes());
}

#[test]
fn graft_parents_need_no_loaded_objects() {
    // Graft parents are interned as bare nodes; nothing reads their bytes
    // until someone parses them.
    let mut source = MemSource::new();
    let b = add_commit(&mut source, 3, &[], 2000);
    let mut store = CommitStore::new(source);
    store
        .grafts_mut()
        .register(Graft::new(oid(3), vec![oid(7), oid(8)]), false);

    let b = parsed(&mut store, b);
    assert_eq!(
        oids_of(&store, store.node(b).parents()),
        vec![oid(7), oid(8)]
    );
    for &parent in store.node(b).parents() {
        assert!(!store.node(parent).is_parsed());
    }
}

#[test]
fn wrong_kind_object_is_rejected() {
    let mut source = MemSource::new();
    source.insert(oid(1), ObjectKind::Tree, b"subdir".to_vec());
    let mut store = CommitStore::new(source);

    let id = store.lookup_commit(oid(1)).unwrap();
    assert!(store.parse_commit(id).is_err());
}

#[test]
fn empty_buffer_is_a_bad_commit() {
    let mut source = MemSource::new();
    source.insert(oid(1), ObjectKind::Commit, Vec::new());
    let mut store = CommitStore::new(source);

    let id = store.lookup_commit(oid(1)).unwrap();
    assert!(store.parse_commit(id).is_err());
    assert!(!store.node(id).is_parsed());
}

#[test]
fn malformed_parent_line_fails_the_parse() {
    let mut source = MemSource::new();
    let mut buf = commit_buffer(tree_oid(1), &[], 1000, "x\n");
    let tree_line_len = "tree ".len() + 41;
    buf.splice(tree_line_len..tree_line_len, b"parent bogus\n".iter().copied());
    source.insert(oid(1), ObjectKind::Commit, buf);
    let mut store = CommitStore::new(source);

    let id = store.lookup_commit(oid(1)).unwrap();
    assert!(store.parse_commit(id).is_err());
    assert!(!store.node(id).is_parsed());
}

#[test]
fn parsing_is_idempotent() {
    let mut source = MemSource::new();
    let r = add_commit(&mut source, 1, &[], 1000);
    let b = add_commit(&mut source, 2, &[1], 2000);
    let mut store = CommitStore::new(source);
    let _ = r;

    let b = parsed(&mut store, b);
    let parents = store.node(b).parents().to_vec();
    let date = store.node(b).date();
    store.parse_commit(b).unwrap();
    assert_eq!(store.node(b).parents(), parents.as_slice());
    assert_eq!(store.node(b).date(), date);
}

#[test]
fn interning_yields_one_node_per_hash() {
    let mut source = MemSource::new();
    let r = add_commit(&mut source, 1, &[], 1000);
    let mut store = CommitStore::new(source);

    let first = store.lookup_commit(r).unwrap();
    let second = store.lookup_commit(r).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.len(), 1);
    assert_eq!(store.lookup(&r), Some(first));
}

#[test]
fn tag_reference_peels_to_the_commit() {
    let mut source = MemSource::new();
    let c = add_commit(&mut source, 1, &[], 1000);
    source.insert_tag(oid(9), c);
    let mut store = CommitStore::new(source);

    let id = store.lookup_commit_reference(oid(9)).unwrap();
    assert_eq!(store.node(id).oid(), c);

    let gently = store.lookup_commit_reference_gently(oid(9)).unwrap();
    assert_eq!(gently, Some(id));
}

#[test]
fn tag_to_non_commit_is_rejected_loudly_and_quietly() {
    let mut source = MemSource::new();
    source.insert(oid(1), ObjectKind::Blob, b"data".to_vec());
    source.insert_tag(oid(9), oid(1));
    let mut store = CommitStore::new(source);

    assert!(store.lookup_commit_reference(oid(9)).is_err());
    assert_eq!(store.lookup_commit_reference_gently(oid(9)).unwrap(), None);
}

#[test]
fn object_refs_are_tracked_on_request() {
    let mut source = MemSource::new();
    let r = add_commit(&mut source, 1, &[], 1000);
    let b = add_commit(&mut source, 2, &[1], 2000);
    let mut store = CommitStore::new(source);
    store.set_track_object_refs(true);

    let _ = parsed(&mut store, b);
    let refs = store.object_refs(&b).unwrap();
    assert_eq!(refs, &[tree_oid(2), r]);
}
