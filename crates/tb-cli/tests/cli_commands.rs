//! Integration tests for the CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A temp directory holding a small character: base stats and an event log
/// with an equipped sword and some lost HP.
fn test_character() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("base.json"),
        r#"{"Grade": 1, "肉体": 3, "Spirit": 2}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("events.json"),
        r#"[
  {
    "id": "00000000-0000-4000-8000-000000000001",
    "timestamp": "2025-01-01T00:00:00Z",
    "type": "ITEM_ADDED",
    "item": {
      "id": "sword",
      "name": "Sword",
      "category": "EQUIPMENT",
      "slot": "MainHand",
      "variants": {"default": {"modifiers": {"Combat": "{Body} * 2"}}}
    }
  },
  {
    "id": "00000000-0000-4000-8000-000000000002",
    "timestamp": "2025-01-01T00:01:00Z",
    "type": "ITEM_EQUIPPED",
    "item_id": "sword"
  },
  {
    "id": "00000000-0000-4000-8000-000000000003",
    "timestamp": "2025-01-01T00:02:00Z",
    "type": "EXPERIENCE_GAINED",
    "amount": 20
  },
  {
    "id": "00000000-0000-4000-8000-000000000004",
    "timestamp": "2025-01-01T00:03:00Z",
    "type": "RESOURCE_UPDATED",
    "resource_id": "HP",
    "change": {"mode": "modify", "delta": -5}
  },
  {
    "id": "00000000-0000-4000-8000-000000000005",
    "timestamp": "2025-01-01T00:04:00Z",
    "type": "TAG_ADDED",
    "tag": "hero"
  }
]"#,
    )
    .unwrap();
    dir
}

fn path(dir: &TempDir, name: &str) -> String {
    let p: PathBuf = dir.path().join(name);
    p.to_str().unwrap().to_string()
}

fn tb() -> Command {
    Command::cargo_bin("tb").unwrap()
}

// ---------------------------------------------------------------------------
// eval
// ---------------------------------------------------------------------------

#[test]
fn eval_plain_arithmetic() {
    tb().args(["eval", "(1 + 2) * 3"])
        .assert()
        .success()
        .stdout(predicate::str::diff("9\n"));
}

#[test]
fn eval_against_character() {
    let dir = test_character();
    tb().args([
        "eval",
        "{戦闘能力} + {HP}",
        "--events",
        &path(&dir, "events.json"),
        "--base",
        &path(&dir, "base.json"),
    ])
    .assert()
    .success()
    .stdout(predicate::str::diff("26\n"));
}

#[test]
fn eval_leading_minus() {
    tb().args(["eval", "-3 + 1"])
        .assert()
        .success()
        .stdout(predicate::str::diff("-2\n"));
}

#[test]
fn eval_syntax_error_fails() {
    tb().args(["eval", "1 +"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: calculation error"));
}

#[test]
fn eval_rejects_dice() {
    tb().args(["eval", "2d6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));
}

// ---------------------------------------------------------------------------
// roll
// ---------------------------------------------------------------------------

#[test]
fn roll_single_sided_die_is_critical() {
    tb().args(["roll", "1d1 + 2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3").and(predicate::str::contains("CRITICAL")));
}

#[test]
fn roll_with_seed_is_reproducible() {
    let first = tb().args(["roll", "3d6", "--seed", "42"]).output().unwrap();
    let second = tb().args(["roll", "3d6", "--seed", "42"]).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn roll_too_many_dice_fails() {
    tb().args(["roll", "5000d6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("too many dice"));
}

// ---------------------------------------------------------------------------
// state
// ---------------------------------------------------------------------------

#[test]
fn state_prints_sheet() {
    let dir = test_character();
    tb().args([
        "state",
        &path(&dir, "events.json"),
        "--base",
        &path(&dir, "base.json"),
    ])
    .assert()
    .success()
    .stdout(
        predicate::str::contains("Combat")
            .and(predicate::str::contains("Sword"))
            .and(predicate::str::contains("MainHand"))
            .and(predicate::str::contains("15/20"))
            .and(predicate::str::contains("hero")),
    );
}

#[test]
fn state_json() {
    let dir = test_character();
    let output = tb()
        .args([
            "state",
            &path(&dir, "events.json"),
            "--base",
            &path(&dir, "base.json"),
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let state: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["stats"]["Combat"], 6.0);
    assert_eq!(state["derived_stats"]["HP"], 20.0);
    assert_eq!(state["resource_values"]["HP"], 15.0);
    assert_eq!(state["exp"]["free"], 20);
    assert_eq!(state["equipment_slots"]["MainHand"], "sword");
}

#[test]
fn state_with_custom_rules() {
    let dir = test_character();
    fs::write(
        dir.path().join("rules.json"),
        r#"{"derived_formulas": {"Luck": "{Spirit} + 1"}, "implicit_resources": []}"#,
    )
    .unwrap();
    let output = tb()
        .args([
            "state",
            &path(&dir, "events.json"),
            "--base",
            &path(&dir, "base.json"),
            "--rules",
            &path(&dir, "rules.json"),
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let state: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["derived_stats"]["Luck"], 3.0);
    assert!(state["derived_stats"].get("HP").is_none());
}

#[test]
fn state_missing_file_fails() {
    tb().args(["state", "/nonexistent/events.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn state_bad_log_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("events.json"), "{not json").unwrap();
    tb().args(["state", &path(&dir, "events.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid event log"));
}

// ---------------------------------------------------------------------------
// chat
// ---------------------------------------------------------------------------

#[test]
fn chat_roll_with_description() {
    tb().args(["chat", "1d1 + 1 Attack", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attack").and(predicate::str::contains("2")));
}

#[test]
fn chat_resource_command() {
    let dir = test_character();
    tb().args([
        "chat",
        ":hp-3",
        "--events",
        &path(&dir, "events.json"),
        "--base",
        &path(&dir, "base.json"),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("HP: 12"));
}

#[test]
fn chat_rest_restores_hp() {
    let dir = test_character();
    tb().args([
        "chat",
        ":rest",
        "--events",
        &path(&dir, "events.json"),
        "--base",
        &path(&dir, "base.json"),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("HP: 20"));
}

#[test]
fn chat_unknown_resource_fails() {
    tb().args(["chat", ":ki=3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn chat_plain_text() {
    tb().args(["chat", "Hello world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello world"));
}
