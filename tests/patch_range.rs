use cslens::{ChangeApplier, EditRequest, ErrorKind};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn ten_lines() -> String {
    (1..=10).map(|n| format!("line {n}\n")).collect()
}

fn setup(contents: &str) -> (TempDir, ChangeApplier) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Notes.cs"), contents).unwrap();
    let applier = ChangeApplier::new(dir.path()).unwrap();
    (dir, applier)
}

fn read(dir: &Path) -> String {
    fs::read_to_string(dir.join("Notes.cs")).unwrap()
}

#[test]
fn range_replaces_whole_lines() {
    let (dir, mut applier) = setup(&ten_lines());
    let outcomes = applier
        .apply_changes(&[EditRequest::range("Notes.cs", 3, 5, "X")])
        .unwrap();
    assert!(outcomes[0].is_applied());

    let after = read(dir.path());
    let lines: Vec<_> = after.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[1], "line 2");
    assert_eq!(lines[2], "X");
    assert_eq!(lines[3], "line 6");
}

#[test]
fn multi_line_replacement_changes_the_line_count() {
    let (dir, mut applier) = setup(&ten_lines());
    applier
        .apply_changes(&[EditRequest::range("Notes.cs", 3, 5, "a\nb\nc\nd")])
        .unwrap();
    assert_eq!(read(dir.path()).lines().count(), 11);
}

#[test]
fn out_of_bounds_lines_fail_without_touching_the_file() {
    let original = ten_lines();
    let (dir, mut applier) = setup(&original);
    let outcomes = applier
        .apply_changes(&[
            EditRequest::range("Notes.cs", 0, 5, "X"),
            EditRequest::range("Notes.cs", 6, 5, "X"),
            EditRequest::range("Notes.cs", 5, 12, "X"),
        ])
        .unwrap();
    for outcome in &outcomes {
        assert_eq!(outcome.error_kind(), Some(ErrorKind::OutOfBounds));
    }
    assert_eq!(read(dir.path()), original);
}

#[test]
fn legacy_kind_names_are_ranges() {
    let (dir, mut applier) = setup("a\nb\nc\n");
    let mut single = EditRequest::range("Notes.cs", 1, 1, "A");
    single.change_type = "single".to_string();
    let mut multi = EditRequest::range("Notes.cs", 2, 3, "B");
    multi.change_type = "multi".to_string();
    let outcomes = applier.apply_changes(&[single, multi]).unwrap();
    assert!(outcomes.iter().all(|o| o.is_applied()));
    assert_eq!(read(dir.path()), "A\nB\n");
}

#[test]
fn blank_replacement_is_rejected() {
    let (dir, mut applier) = setup("a\nb\n");
    let outcomes = applier
        .apply_changes(&[EditRequest::range("Notes.cs", 1, 1, "   ")])
        .unwrap();
    assert_eq!(outcomes[0].error_kind(), Some(ErrorKind::InvalidRequest));
    assert_eq!(read(dir.path()), "a\nb\n");
}

#[test]
fn crlf_terminators_survive() {
    let (dir, mut applier) = setup("one\r\ntwo\r\nthree\r\n");
    applier
        .apply_changes(&[EditRequest::range("Notes.cs", 2, 2, "TWO")])
        .unwrap();
    assert_eq!(read(dir.path()), "one\r\nTWO\r\nthree\r\n");
}
