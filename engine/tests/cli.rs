//! CLI tests for the `engine` binary.
//!
//! Spawns the binary and checks output and exit codes for valid, malformed
//! and rejected inputs.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use engine::exit_codes;
use engine::test_support::temp_store;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

fn engine_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_engine"))
}

#[test]
fn validate_reports_case_summary() {
    let output = engine_cmd()
        .arg("validate")
        .arg(fixture("cap-adult.toml"))
        .output()
        .expect("engine validate");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "ok: case=cap-adult version=1 findings=7 actions=4");
}

/// A prerequisite cycle is an authoring error: exit code INVALID with the cycle named.
#[test]
fn validate_rejects_cycle_with_invalid_code() {
    let temp = temp_store();
    let path = temp.path().join("cyclic.toml");
    let text = fs::read_to_string(fixture("cap-adult.toml"))
        .expect("read fixture")
        .replace(
            "id = \"hx-cough\"\ncategory = \"history\"",
            "id = \"hx-cough\"\ncategory = \"history\"\nprerequisites = [\"lab-culture\"]",
        );
    fs::write(&path, text).expect("write case");

    let output = engine_cmd()
        .arg("validate")
        .arg(&path)
        .output()
        .expect("engine validate");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("prerequisite cycle"), "{stderr}");
}

#[test]
fn frontier_lists_requestable_items() {
    let output = engine_cmd()
        .arg("frontier")
        .arg(fixture("cap-adult.toml"))
        .args(["--revealed", "hx-cough", "--used", "bronchoscopy"])
        .output()
        .expect("engine frontier");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let ids: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').nth(1))
        .collect();
    assert_eq!(ids, vec!["hx-smoking", "exam-crackles", "cbc", "cxr", "fluids"]);
}

/// Replay prints the score and persists records under `--store`.
#[test]
fn replay_prints_score_and_persists() {
    let temp = temp_store();
    let output = engine_cmd()
        .arg("replay")
        .arg(fixture("cap-adult.toml"))
        .arg(fixture("script-reference.toml"))
        .arg("--store")
        .arg(temp.path())
        .output()
        .expect("engine replay");

    assert_eq!(
        output.status.code(),
        Some(exit_codes::OK),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let score: serde_json::Value = serde_json::from_slice(&output.stdout).expect("score json");
    assert_eq!(score["points"], 100);
    assert_eq!(score["diagnosis"], "exact");
    assert!(temp.path().join("attempts/att-reference.json").exists());
    assert!(temp.path().join("scores/att-reference/r1.json").exists());
    assert!(temp.path().join("cases/cap-adult/v1.toml").exists());
}

/// A rejected step exits with REJECTED and names the unavailable action.
#[test]
fn replay_rejection_uses_rejected_code() {
    let output = engine_cmd()
        .arg("replay")
        .arg(fixture("cap-adult.toml"))
        .arg(fixture("script-rejected.toml"))
        .output()
        .expect("engine replay");

    assert_eq!(output.status.code(), Some(exit_codes::REJECTED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exam-crackles"), "{stderr}");
}

#[test]
fn replay_with_invalid_config_fails() {
    let temp = temp_store();
    let config = temp.path().join("config.toml");
    fs::write(&config, "[scoring]\naccuracy_weight = 0.9\n").expect("write config");

    let status = engine_cmd()
        .arg("replay")
        .arg(fixture("cap-adult.toml"))
        .arg(fixture("script-reference.toml"))
        .arg("--config")
        .arg(&config)
        .status()
        .expect("engine replay");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}
