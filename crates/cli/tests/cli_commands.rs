use std::fs;
use std::path::Path;

use predicates::prelude::*;
use serde_json::json;
use tagfix_core::db::ProjectLayout;
use tagfix_core::source::{DatabaseSnapshot, Segment, SegmentHandle};
use tempfile::tempdir;

fn sample_snapshot() -> DatabaseSnapshot {
    let mut snapshot = DatabaseSnapshot::new(0x1000, 0x3000)
        .with_function(0x1000, 0x1000, 0x1010)
        .with_function(0x1100, 0x1100, 0x1120)
        .with_function_tag(0x1000, "synopsis", json!("entry point"))
        .with_tag(0x1000, "__name__", json!("main"))
        .with_tag(0x1008, "comment", json!("loop"))
        .with_tag(0x1110, "note", json!("tail call"))
        .with_tag(0x2000, "comment", json!("table"))
        .with_custom_name(0x2010)
        .with_segment(Segment {
            handle: SegmentHandle(1),
            name: ".text".to_string(),
            start: 0x1000,
            end: 0x2000,
        })
        .with_segment(Segment {
            handle: SegmentHandle(2),
            name: ".data".to_string(),
            start: 0x2000,
            end: 0x3000,
        });
    snapshot.cursor = Some(0x2004);
    snapshot
}

/// `init-project` at `root` and replace the empty snapshot with the sample.
fn init_sample_project(root: &Path) {
    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("init-project")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("Sample")
        .assert()
        .success();

    let layout = ProjectLayout::new(root);
    let body = serde_json::to_string_pretty(&sample_snapshot()).expect("serialize snapshot");
    fs::write(&layout.snapshot_path, body).expect("write snapshot");
}

#[test]
fn init_project_uses_default_root_when_not_provided() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .current_dir(root)
        .arg("init-project")
        .arg("--name")
        .arg("TestProject")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized tagfix project"));

    let layout = ProjectLayout::new(root);
    assert!(layout.project_config_path.exists());
    assert!(layout.db_path.exists());
    assert!(layout.snapshot_path.exists());

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&layout.project_config_path).expect("config"))
            .expect("config json");
    assert_eq!(config["name"], "TestProject");
    assert_eq!(config["db"]["path"], ".tagfix/cache.db");
    assert_eq!(config["snapshot"]["path"], "database.json");
}

#[test]
fn init_project_keeps_an_existing_snapshot() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("image.yaml"), "bounds: [0, 16]\n").expect("write yaml");

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("init-project")
        .arg("--root")
        .arg(root)
        .arg("--snapshot")
        .arg("image.yaml")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(root.join("image.yaml")).expect("yaml"), "bounds: [0, 16]\n");
    assert!(!root.join("database.json").exists());
}

#[test]
fn everything_then_verification_succeeds() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_sample_project(root);

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("everything")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt the globals index and every function cache"))
        .stderr(predicate::str::contains(
            "updating the cache for the tags belonging to function (0x1000) : 1 of 2",
        ));

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("verify-index")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Index OK"));

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("verify-content")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("- 0x1000: OK"))
        .stdout(predicate::str::contains("- 0x1100: OK"))
        .stdout(predicate::str::contains("Verified 2 function cache(s)"));
}

#[test]
fn corrupted_cache_fails_content_verification() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_sample_project(root);

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("everything")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    let layout = ProjectLayout::new(root);
    let conn = rusqlite::Connection::open(&layout.db_path).expect("open db");
    conn.execute(
        "UPDATE contents_cache SET blob = ?1 WHERE function = ?2",
        rusqlite::params![r#"{"__tags__":{"comment":4},"__address__":{"0x1008":4}}"#, 0x1000i64],
    )
    .expect("corrupt cache");
    drop(conn);

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("verify-content")
        .arg("--root")
        .arg(root)
        .arg("--function")
        .arg("0x1004")
        .assert()
        .failure()
        .stdout(predicate::str::contains("- 0x1004: FAILED"))
        .stderr(predicate::str::contains(
            "expected to find 4 references to address 0x1008, whereas 1 was found",
        ));
}

#[test]
fn implicit_tags_and_history_are_recorded() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_sample_project(root);

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("customnames")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 1 custom name reference(s)"));

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("contents")
        .arg("--root")
        .arg(root)
        .arg("--function")
        .arg("0x2000")
        .assert()
        .success()
        .stdout(predicate::str::contains("Counted 0 address(es) and 0 tag name(s) for 0x2000"));

    let output = assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("history")
        .arg("--root")
        .arg(root)
        .arg("--json")
        .output()
        .expect("history output");
    assert!(output.status.success());
    let runs: serde_json::Value = serde_json::from_slice(&output.stdout).expect("history json");
    let runs = runs.as_array().expect("array");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["operation"], "customnames");
    assert_eq!(runs[0]["status"], "succeeded");
    assert_eq!(runs[1]["operation"], "contents");
    assert_eq!(runs[1]["detail"], "function 0x2000");
    assert_eq!(runs[1]["snapshot_hash"].as_str().map(str::len), Some(64));
}

#[test]
fn status_reports_cache_counts_as_json() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_sample_project(root);

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("all")
        .arg("--root")
        .arg(root)
        .assert()
        .success();

    let output = assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("status")
        .arg("--root")
        .arg(root)
        .arg("--json")
        .output()
        .expect("status output");
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).expect("status json");
    assert_eq!(status["name"], "Sample");
    assert_eq!(status["schema_version"], 2);
    assert_eq!(status["functions"], 2);
    assert_eq!(status["contents_caches"], 2);
    assert_eq!(status["global_names"], 2);
    assert_eq!(status["global_addresses"], 2);
    assert_eq!(status["recorded_operations"], 1);

    let layout = ProjectLayout::new(root);
    let expected = tagfix::snapshot_fingerprint(&layout.snapshot_path).expect("fingerprint");
    assert_eq!(status["snapshot_sha256"], expected.as_str());

    let output = assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("history")
        .arg("--root")
        .arg(root)
        .arg("--json")
        .output()
        .expect("history output");
    let runs: serde_json::Value = serde_json::from_slice(&output.stdout).expect("history json");
    assert_eq!(runs[0]["snapshot_hash"], expected.as_str());
}

#[test]
fn segments_are_listed_and_selected() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init_sample_project(root);

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("segments")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains(".text"))
        .stdout(predicate::str::contains(".data"));

    for selector in ["current", "#2", "0x2fff", ".data"] {
        let output = assert_cmd::cargo::cargo_bin_cmd!("tagfix")
            .arg("segments")
            .arg("--root")
            .arg(root)
            .arg("--select")
            .arg(selector)
            .arg("--json")
            .output()
            .expect("segments output");
        assert!(output.status.success(), "selector {selector}");
        let selected: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("segments json");
        assert_eq!(selected[0]["name"], ".data", "selector {selector}");
    }

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("segments")
        .arg("--root")
        .arg(root)
        .arg("--select")
        .arg(".bss")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to select segment '.bss'"));
}

#[test]
fn commands_fail_outside_a_project() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("tagfix")
        .arg("verify-index")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read project config"));
}
