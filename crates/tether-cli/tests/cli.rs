use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

fn run_raw(db_path: &Path, args: &[&str]) -> Output {
    cargo_bin_cmd!("tether")
        .args(["--db-path", db_path.to_str().expect("db path")])
        .args(args)
        .output()
        .expect("run command")
}

fn run_cmd(db_path: &Path, args: &[&str]) -> String {
    let output = run_raw(db_path, args);
    assert!(output.status.success(), "command failed: {:?}", output);
    String::from_utf8(output.stdout).expect("utf8")
}

fn run_cmd_json(db_path: &Path, args: &[&str]) -> Value {
    let output = cargo_bin_cmd!("tether")
        .args(["--db-path", db_path.to_str().expect("db path"), "--json"])
        .args(args)
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("parse json")
}

#[test]
fn cli_add_show_duplicate_flow() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("tether.sqlite3");

    run_cmd(
        &db_path,
        &["add-contact", "--name", "Ann", "--telegram", "@ann"],
    );

    let shown = run_cmd(&db_path, &["show", "Ann"]);
    assert!(shown.contains("@ann"));

    let list = run_cmd_json(&db_path, &["list"]);
    let items = list.as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Ann");

    // exact duplicate is a conflict: exit code 4, no second row
    let dup = run_raw(&db_path, &["add-contact", "--name", "Ann"]);
    assert!(!dup.status.success());
    assert_eq!(dup.status.code(), Some(4));
    let stderr = String::from_utf8(dup.stderr).expect("utf8");
    assert!(stderr.contains("Ann"));
    let list = run_cmd_json(&db_path, &["list"]);
    assert_eq!(list.as_array().expect("array").len(), 1);

    // a lookup miss exits 2 and suggests close names
    let miss = run_raw(&db_path, &["show", "Anb"]);
    assert_eq!(miss.status.code(), Some(2));
    let stderr = String::from_utf8(miss.stderr).expect("utf8");
    assert!(stderr.contains("did you mean"));
    assert!(stderr.contains("Ann"));
}

#[test]
fn cli_log_and_stats_flow() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("tether.sqlite3");

    run_cmd(&db_path, &["add-contact", "--name", "Bob"]);
    run_cmd(
        &db_path,
        &["log", "add", "Bob", "coffee downtown", "--date", "2024-01-05"],
    );
    run_cmd(
        &db_path,
        &["log", "add", "Bob", "long call", "--date", "2024-01-06"],
    );

    let history = run_cmd(&db_path, &["log", "ls", "Bob"]);
    assert!(history.contains("2024-01-05"));
    assert!(history.contains("— 1: coffee downtown"));
    assert!(history.contains("— 2: long call"));

    // a tiny budget keeps only the newest entries
    let cut = run_cmd(&db_path, &["log", "ls", "Bob", "--budget", "30"]);
    assert!(!cut.contains("coffee downtown"));
    assert!(cut.contains("long call"));

    let stats = run_cmd(&db_path, &["stats"]);
    assert!(stats.contains("Bob"));
    assert!(stats.contains("days"));

    run_cmd(&db_path, &["log", "rm", "Bob", "1"]);
    let gone = run_raw(&db_path, &["log", "rm", "Bob", "1"]);
    assert_eq!(gone.status.code(), Some(2));
}

#[test]
fn cli_find_and_fuzzy_matching() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("tether.sqlite3");

    run_cmd(&db_path, &["add-contact", "--name", "Annette"]);
    run_cmd(&db_path, &["add-contact", "--name", "Ann"]);
    run_cmd(&db_path, &["add-contact", "--name", "Bob"]);

    let found = run_cmd_json(&db_path, &["find", "ann"]);
    let names: Vec<&str> = found
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_str().expect("string"))
        .collect();
    assert_eq!(names[0], "Ann");
    assert!(names.contains(&"Annette"));
    assert!(!names.contains(&"Bob"));
}

#[test]
fn cli_delete_is_idempotent() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("tether.sqlite3");

    run_cmd(&db_path, &["add-contact", "--name", "Carol"]);
    run_cmd(&db_path, &["delete", "Carol"]);
    let again = run_cmd(&db_path, &["delete", "Carol"]);
    assert!(again.contains("no contact named"));
}
