//! Crawl selection, ordering and lookup tests against real directory trees.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use runsheet_core::{CrawlError, LastMarker, ParseError, RunCrawler, SectionRow};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write `<root>/<dir>/<file>` with a minimal valid metadata document.
fn write_run(root: &assert_fs::TempDir, dir: &str, file: &str) {
    let doc = json!({
        "session": { "name": dir, "start": 100.0, "finish": 120.5 },
        "save": { "directory": format!("/data/emlode3_{dir}_tank7/{dir}") },
        "montage": { "rois": [] },
    });
    root.child(dir)
        .child(file)
        .write_str(&doc.to_string())
        .expect("write metadata");
}

fn run(root: &assert_fs::TempDir, dir: &str) {
    write_run(root, dir, &format!("{dir}.json"));
}

fn names(crawler: &RunCrawler, marker: Option<LastMarker>, stop: Option<u64>) -> Vec<String> {
    crawler
        .crawl(marker.as_ref(), stop)
        .expect("crawl")
        .map(|r| r.expect("parse").name)
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Root handling
// ---------------------------------------------------------------------------

#[test]
fn missing_root_is_directory_not_found() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let crawler = RunCrawler::new(root.path().join("nope"), "run");
    let err = crawler.crawl(None, None).unwrap_err();
    assert!(matches!(err, CrawlError::DirectoryNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("nope"));
}

#[test]
fn empty_root_yields_nothing() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let crawler = RunCrawler::new(root.path(), "run");
    assert!(names(&crawler, None, None).is_empty());
}

// ---------------------------------------------------------------------------
// 2. Keyword filter
// ---------------------------------------------------------------------------

#[test]
fn keyword_is_a_case_sensitive_substring() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    run(&root, "run_001");
    run(&root, "calib_002");
    run(&root, "RUN_003");
    root.child("run_004.txt").write_str("not a dir").expect("write");

    let crawler = RunCrawler::new(root.path(), "run");
    assert_eq!(names(&crawler, None, None), vec!["run_001"]);
}

// ---------------------------------------------------------------------------
// 3. Ordinal bounds
// ---------------------------------------------------------------------------

#[test]
fn lower_and_upper_bounds_are_exclusive_and_inclusive() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    for n in 1..=6 {
        run(&root, &format!("run_{n:03}"));
    }
    let crawler = RunCrawler::new(root.path(), "run");

    assert_eq!(
        names(&crawler, Some(LastMarker::from("run_002")), Some(4)),
        vec!["run_003", "run_004"]
    );
    assert_eq!(
        names(&crawler, Some(LastMarker::Ordinal(5)), None),
        vec!["run_006"]
    );
    assert!(names(&crawler, Some(LastMarker::Ordinal(6)), None).is_empty());
}

#[test]
fn unparsable_marker_disables_lower_bound() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    run(&root, "run_001");
    run(&root, "run_002");
    let crawler = RunCrawler::new(root.path(), "run");

    assert_eq!(
        names(&crawler, Some(LastMarker::from("name")), None),
        vec!["run_001", "run_002"]
    );
}

#[test]
fn stop_bound_applies_without_lower_bound() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    for n in 1..=3 {
        run(&root, &format!("run_{n:03}"));
    }
    let crawler = RunCrawler::new(root.path(), "run");
    assert_eq!(names(&crawler, None, Some(2)), vec!["run_001", "run_002"]);
}

#[test]
fn directories_without_ordinal_only_pass_unbounded_crawls() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    run(&root, "run_final");
    run(&root, "run_001");
    let crawler = RunCrawler::new(root.path(), "run");

    assert_eq!(names(&crawler, None, None), vec!["run_final", "run_001"]);
    assert_eq!(names(&crawler, Some(LastMarker::Ordinal(0)), None), vec!["run_001"]);
}

// ---------------------------------------------------------------------------
// 4. Ordering
// ---------------------------------------------------------------------------

#[test]
fn unpadded_ordinals_are_ordered_numerically() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    run(&root, "run_10");
    run(&root, "run_2");
    run(&root, "run_1");
    let crawler = RunCrawler::new(root.path(), "run");

    assert_eq!(names(&crawler, None, None), vec!["run_1", "run_2", "run_10"]);
    assert_eq!(names(&crawler, Some(LastMarker::from("run_2")), None), vec!["run_10"]);
}

#[test]
fn equal_ordinals_fall_back_to_name_order() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    run(&root, "run_b_1");
    run(&root, "run_a_1");
    let crawler = RunCrawler::new(root.path(), "run");
    assert_eq!(names(&crawler, None, None), vec!["run_a_1", "run_b_1"]);
}

// ---------------------------------------------------------------------------
// 5. Metadata lookup
// ---------------------------------------------------------------------------

#[test]
fn finished_json_is_used_without_dirname_json() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    write_run(&root, "run_001", "session_finished.json");
    let crawler = RunCrawler::new(root.path(), "run");

    let crawl = crawler.crawl(None, None).expect("crawl");
    assert_eq!(crawl.runs().len(), 1);
    assert!(crawl.runs()[0].metadata.ends_with("run_001/session_finished.json"));
}

#[test]
fn runs_without_metadata_are_skipped_silently() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    run(&root, "run_001");
    root.child("run_002").create_dir_all().expect("mkdir");
    root.child("run_002/notes.txt").write_str("x").expect("write");
    write_run(&root, "run_003", "a_finished.json");
    write_run(&root, "run_003", "b_finished.json");
    root.child("run_002").assert(predicate::path::is_dir());

    let crawler = RunCrawler::new(root.path(), "run");
    assert_eq!(names(&crawler, None, None), vec!["run_001"]);
}

// ---------------------------------------------------------------------------
// 6. Lazy parsing
// ---------------------------------------------------------------------------

#[test]
fn records_carry_directory_ordinal_and_parse_lazily() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    run(&root, "run_001");
    root.child("run_002/run_002.json").write_str("{ broken").expect("write");

    let crawler = RunCrawler::new(root.path(), "run");
    let mut crawl = crawler.crawl(None, None).expect("crawl");
    assert_eq!(crawl.len(), 2);

    let first = crawl.next().expect("first").expect("parse");
    assert_eq!(first.ordinal, Some(1));
    assert_eq!(first.elapsed_time, Some(20.5));

    let second = crawl.next().expect("second");
    assert!(matches!(second, Err(ParseError::Json { .. })));
    assert!(crawl.next().is_none());
}

#[test]
fn crawled_record_becomes_section_row() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let tiles: Vec<_> = (0..10).map(|i| json!({ "vetoed": i < 2 })).collect();
    let doc = json!({
        "session": {
            "name": "run_emlode3_tank7_005",
            "start": 100.0,
            "finish": 120.5,
            "tiles": tiles,
        },
        "save": { "directory": "/data/emlode3_run_tank7/run_emlode3_tank7_005" },
        "montage": { "rois": [[1, 2]] },
    });
    root.child("run_emlode3_tank7_005/run_emlode3_tank7_005.json")
        .write_str(&doc.to_string())
        .expect("write");

    let crawler = RunCrawler::new(root.path(), "emlode3");
    let record = crawler
        .crawl(None, None)
        .expect("crawl")
        .next()
        .expect("one run")
        .expect("parse");
    let row = SectionRow::from_record(record).expect("row");

    assert_eq!(row.number, 5);
    assert_eq!((row.emlode, row.tank), (3, 7));
    assert_eq!(row.elapsed_time, Some(20.5));
    assert_eq!(row.tile_count, Some(10));
    assert_eq!(row.veto_count, Some(2));
    assert_eq!(row.veto_percent, Some(0.2));
}
