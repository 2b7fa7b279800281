//! Integration tests for change detection.

use std::fs;

use insight_analysis::change::{entry_now, ChangeDetector, ChangeStatus};

#[test]
fn single_byte_mutation_is_detected_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join(".insight/cache.json");
    fs::write(dir.path().join("app.py"), "print('hello')\n").unwrap();

    let mut first = ChangeDetector::new(dir.path(), &cache);
    first.load();
    let before = first.hash("app.py");
    assert_eq!(before, first.hash("app.py"));
    first
        .commit(vec![entry_now("app.py".into(), before.clone(), &["security"], vec![])], &[])
        .unwrap();

    fs::write(dir.path().join("app.py"), "print('hellp')\n").unwrap();

    let mut second = ChangeDetector::new(dir.path(), &cache);
    second.load();
    let after = second.hash("app.py");
    assert_ne!(before, after);
    assert_eq!(second.status("app.py", &after, &["security"]), ChangeStatus::Modified);
    assert_eq!(second.stats().modified, 1);
}

#[test]
fn corrupt_cache_forces_full_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache.json");
    fs::write(&cache, "\u{0}\u{1}garbage").unwrap();
    fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();

    let mut cd = ChangeDetector::new(dir.path(), &cache);
    cd.load();
    let digest = cd.hash("a.rs");
    assert_eq!(cd.status("a.rs", &digest, &[]), ChangeStatus::Added);
}

#[test]
fn invalidated_entries_are_removed_on_commit() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache.json");
    fs::write(dir.path().join("a.rs"), "x").unwrap();

    let mut cd = ChangeDetector::new(dir.path(), &cache);
    cd.load();
    let digest = cd.hash("a.rs");
    cd.commit(vec![entry_now("a.rs".into(), digest, &[], vec![])], &[])
        .unwrap();
    assert!(cd.cached("a.rs").is_some());

    cd.commit(Vec::new(), &["a.rs".to_string()]).unwrap();

    let mut reloaded = ChangeDetector::new(dir.path(), &cache);
    reloaded.load();
    assert!(reloaded.cached("a.rs").is_none());
}

#[test]
fn load_reads_the_cache_only_once() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache.json");
    fs::write(dir.path().join("a.rs"), "x").unwrap();

    let mut cd = ChangeDetector::new(dir.path(), &cache);
    cd.load();
    fs::write(&cache, "not json").unwrap();
    cd.load();
    let digest = cd.hash("a.rs");
    cd.commit(vec![entry_now("a.rs".into(), digest, &[], vec![])], &[])
        .unwrap();
    assert!(cd.cached("a.rs").is_some());
}
