//! End-to-end tests driving the `mt` binary against a temporary database.
//!
//! Every invocation is a fresh process, so these also cover persistence of
//! the session and the record collection between runs.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn mt(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mt"))
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("RUST_LOG")
        .env("MT_DATABASE_PATH", db_path(home))
        .args(args)
        .output()
        .expect("failed to run mt")
}

fn db_path(home: &Path) -> PathBuf {
    home.join("data").join("mt.db")
}

/// Runs `mt`, asserts success and returns stdout.
fn mt_ok(home: &Path, args: &[&str]) -> String {
    let output = mt(home, args);
    assert!(
        output.status.success(),
        "mt {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn stats_json(home: &Path) -> serde_json::Value {
    serde_json::from_str(&mt_ok(home, &["stats", "--json"])).unwrap()
}

#[test]
fn test_session_persists_between_invocations() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    let started = mt_ok(home, &["start"]);
    assert!(started.starts_with("Started tracking at "));
    assert!(db_path(home).exists(), "database should be created on first use");

    let status: serde_json::Value =
        serde_json::from_str(&mt_ok(home, &["status", "--json"])).unwrap();
    assert_eq!(status["state"], "running");

    assert!(mt_ok(home, &["start"]).starts_with("Already tracking"));
    assert!(mt_ok(home, &["pause"]).starts_with("Paused at "));

    let status: serde_json::Value =
        serde_json::from_str(&mt_ok(home, &["status", "--json"])).unwrap();
    assert_eq!(status["state"], "paused");

    mt_ok(home, &["resume"]);
    mt_ok(home, &["stop"]);

    let status: serde_json::Value =
        serde_json::from_str(&mt_ok(home, &["status", "--json"])).unwrap();
    assert_eq!(status["state"], "idle");
    assert_eq!(mt_ok(home, &["stop"]), "Not tracking.\n");
}

#[test]
fn test_reset_discards_session() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    mt_ok(home, &["start"]);
    assert_eq!(mt_ok(home, &["reset"]), "Session discarded.\n");
    assert_eq!(stats_json(home)["total_records"], 0);
}

#[test]
fn test_add_list_and_delete_records() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    let added = mt_ok(
        home,
        &["add", "--date", "2025-03-03", "--start", "09:00", "--end", "10:30"],
    );
    assert!(added.starts_with("Added 09:00-10:30 on 2025-03-03 (1.5h) as "));
    mt_ok(
        home,
        &["add", "--date", "2025-03-03", "--start", "13:00", "--end", "16:00"],
    );

    let listing = mt_ok(home, &["records", "--date", "2025-03-03"]);
    assert!(listing.starts_with("Monday, Mar 3, 2025\n"));
    assert!(listing.contains("#1  09:00-10:30"));
    assert!(listing.contains("#2  13:00-16:00"));
    assert!(listing.ends_with("Total: 4h 30m\n"));

    let stats = stats_json(home);
    assert_eq!(stats["total_records"], 2);
    assert_eq!(stats["effective_days"], 1);

    let id = added.trim_end().trim_end_matches('.').rsplit(' ').next().unwrap();
    assert_eq!(mt_ok(home, &["delete", id]), format!("Deleted {id}.\n"));
    assert_eq!(stats_json(home)["total_records"], 1);

    let missing = mt(home, &["delete", id]);
    assert!(!missing.status.success());
}

#[test]
fn test_add_rejects_reversed_times() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    let output = mt(
        home,
        &["add", "--date", "2025-03-03", "--start", "10:00", "--end", "09:00"],
    );
    assert!(!output.status.success());
    assert_eq!(stats_json(home)["total_records"], 0);
}

#[test]
fn test_export_then_import_into_fresh_database() {
    let source = TempDir::new().unwrap();
    mt_ok(
        source.path(),
        &["add", "--date", "2025-03-03", "--start", "09:00", "--end", "10:00"],
    );
    mt_ok(
        source.path(),
        &["add", "--date", "2025-03-04", "--start", "09:00", "--end", "13:00"],
    );

    let file = source.path().join("backup.json");
    let exported = mt_ok(source.path(), &["export", "-o", file.to_str().unwrap()]);
    assert!(exported.starts_with("Exported 2 records to "));

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(document["version"], "1.0.0");
    assert_eq!(document["records"].as_array().unwrap().len(), 2);

    let target = TempDir::new().unwrap();
    mt_ok(
        target.path(),
        &["add", "--date", "2025-01-01", "--start", "08:00", "--end", "08:30"],
    );
    let imported = mt_ok(
        target.path(),
        &["import", file.to_str().unwrap(), "--yes"],
    );
    assert_eq!(imported, "Imported 2 records.\n");

    let stats = stats_json(target.path());
    assert_eq!(stats["total_records"], 2);
    assert_eq!(stats["total_seconds"], 5 * 3600);
}

#[test]
fn test_import_rejects_invalid_file_without_changes() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    mt_ok(
        home,
        &["add", "--date", "2025-03-03", "--start", "09:00", "--end", "10:00"],
    );

    let file = home.join("broken.json");
    std::fs::write(&file, r#"{"records": [{"startTime": "nope"}]}"#).unwrap();

    let output = mt(home, &["import", file.to_str().unwrap(), "--yes"]);
    assert!(!output.status.success());
    assert_eq!(stats_json(home)["total_records"], 1);
}

#[test]
fn test_clear_removes_everything() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    mt_ok(
        home,
        &["add", "--date", "2025-03-03", "--start", "09:00", "--end", "10:00"],
    );
    mt_ok(home, &["start"]);

    assert_eq!(mt_ok(home, &["clear", "--yes"]), "Deleted 1 records.\n");

    assert_eq!(stats_json(home)["total_records"], 0);
    let status: serde_json::Value =
        serde_json::from_str(&mt_ok(home, &["status", "--json"])).unwrap();
    assert_eq!(status["state"], "idle");
}

#[test]
fn test_watch_exits_when_idle() {
    let temp = TempDir::new().unwrap();
    assert_eq!(mt_ok(temp.path(), &["watch"]), "Not tracking.\n");
}
