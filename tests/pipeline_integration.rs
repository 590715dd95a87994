//! Integration tests for the patch pipeline
//!
//! Tests config loading, rule outcomes, and output files end to end

use hexpatch::config::{load_from_path, load_from_str, ConfigError, ConfigFormat};
use hexpatch::engine::{EngineOptions, ScanMode};
use hexpatch::pipeline::{self, PipelineError};
use hexpatch::{IoError, RuleResult, RuleSide};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a temp dir with an input file and a config pointing at it
fn setup_test_workspace(input: &[u8], replacements: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("firmware.bin");
    let output_path = dir.path().join("firmware.patched.bin");
    fs::write(&input_path, input).unwrap();

    let config = json_config(&input_path, &output_path, replacements);
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, config).unwrap();

    (dir, config_path)
}

fn json_config(input: &Path, output: &Path, replacements: &str) -> String {
    format!(
        r#"{{"input_file": {:?}, "output_file": {:?}, "replacements": {}}}"#,
        input.to_string_lossy(),
        output.to_string_lossy(),
        replacements
    )
}

#[test]
fn test_deadbeef_scenario() {
    let (dir, config_path) = setup_test_workspace(
        &[0xDE, 0xAD, 0xBE, 0xEF],
        r#"[{"old_hex": "DEAD", "new_hex": "BEEF"}]"#,
    );

    let outcome = pipeline::run_from_path(&config_path, EngineOptions::default()).unwrap();

    assert_eq!(outcome.report.outcomes[0].result, RuleResult::Applied(1));
    let written = fs::read(dir.path().join("firmware.patched.bin")).unwrap();
    assert_eq!(written, vec![0xBE, 0xEF, 0xBE, 0xEF]);
}

#[test]
fn test_length_mismatch_scenario_leaves_buffer_unchanged() {
    let (dir, config_path) = setup_test_workspace(
        &[0xAA, 0x00, 0xAA],
        r#"[{"old_hex": "AA", "new_hex": "BBBB"}]"#,
    );

    let outcome = pipeline::run_from_path(&config_path, EngineOptions::default()).unwrap();

    assert_eq!(
        outcome.report.outcomes[0].result,
        RuleResult::SkippedLengthMismatch {
            old_len: 1,
            new_len: 2
        }
    );
    assert!(!outcome.changed());
    let written = fs::read(dir.path().join("firmware.patched.bin")).unwrap();
    assert_eq!(written, vec![0xAA, 0x00, 0xAA]);
}

#[test]
fn test_mixed_rules_report_in_order() {
    let (_dir, config_path) = setup_test_workspace(
        &[0x0A, 0x00, 0x0A],
        r#"[
            {"old_hex": "0A", "new_hex": "0B"},
            {"old_hex": "", "new_hex": "0C"},
            {"old_hex": "0B", "new_hex": "0G"},
            {"old_hex": "0B", "new_hex": "0C"}
        ]"#,
    );

    let outcome = pipeline::run_from_path(&config_path, EngineOptions::default()).unwrap();
    let results: Vec<_> = outcome
        .report
        .outcomes
        .iter()
        .map(|o| o.result.clone())
        .collect();

    assert_eq!(results.len(), 4);
    assert_eq!(results[0], RuleResult::Applied(2));
    assert_eq!(results[1], RuleResult::SkippedEmpty);
    assert!(matches!(
        results[2],
        RuleResult::SkippedDecodeError {
            side: RuleSide::New,
            ..
        }
    ));
    // Sees rule 1's output
    assert_eq!(results[3], RuleResult::Applied(2));
    assert_eq!(outcome.patched, vec![0x0C, 0x00, 0x0C]);
    assert_eq!(outcome.report.total_replacements(), 4);
}

#[test]
fn test_rerun_is_deterministic() {
    let (dir, config_path) = setup_test_workspace(
        &[0x01, 0x02, 0x03, 0x01, 0x02],
        r#"[{"old_hex": "0102", "new_hex": "0201"}, {"old_hex": "03", "new_hex": "FF"}]"#,
    );

    let first = pipeline::run_from_path(&config_path, EngineOptions::default()).unwrap();
    let first_bytes = fs::read(dir.path().join("firmware.patched.bin")).unwrap();
    let second = pipeline::run_from_path(&config_path, EngineOptions::default()).unwrap();
    let second_bytes = fs::read(dir.path().join("firmware.patched.bin")).unwrap();

    assert_eq!(first.report, second.report);
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first_bytes, vec![0x02, 0x01, 0xFF, 0x02, 0x01]);
}

#[test]
fn test_swapped_rules_undo_patch() {
    let original = vec![0x11, 0xDE, 0xAD, 0x22];
    let (dir, config_path) =
        setup_test_workspace(&original, r#"[{"old_hex": "DEAD", "new_hex": "BEEF"}]"#);
    pipeline::run_from_path(&config_path, EngineOptions::default()).unwrap();

    let patched_path = dir.path().join("firmware.patched.bin");
    let restored_path = dir.path().join("restored.bin");
    let undo = json_config(
        &patched_path,
        &restored_path,
        r#"[{"old_hex": "BEEF", "new_hex": "DEAD"}]"#,
    );
    let undo_config = load_from_str(&undo, ConfigFormat::Json).unwrap();
    pipeline::run(&undo_config, EngineOptions::default()).unwrap();

    assert_eq!(fs::read(restored_path).unwrap(), original);
}

#[test]
fn test_in_place_patching() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("target.bin");
    fs::write(&path, [0x90u8, 0x90, 0xC3]).unwrap();

    let config = load_from_str(
        &json_config(&path, &path, r#"[{"old_hex": "90 90", "new_hex": "EB FE"}]"#),
        ConfigFormat::Json,
    )
    .unwrap();
    pipeline::run(&config, EngineOptions::default()).unwrap();

    assert_eq!(fs::read(&path).unwrap(), vec![0xEB, 0xFE, 0xC3]);
}

#[test]
fn test_pathological_rule_capped_in_restart_mode() {
    let (_dir, config_path) = setup_test_workspace(
        &[0x00, 0xAB, 0x00],
        r#"[{"old_hex": "AB", "new_hex": "AB"}, {"old_hex": "00", "new_hex": "11"}]"#,
    );
    let options = EngineOptions {
        mode: ScanMode::Restart,
        max_replacements: Some(1000),
    };

    let outcome = pipeline::run_from_path(&config_path, options).unwrap();

    assert_eq!(
        outcome.report.outcomes[0].result,
        RuleResult::LimitReached(1000)
    );
    // Later rules still run
    assert_eq!(outcome.report.outcomes[1].result, RuleResult::Applied(2));
    assert_eq!(outcome.patched, vec![0x11, 0xAB, 0x11]);
    assert_eq!(outcome.report.limited_rules(), 1);
}

#[test]
fn test_pathological_rule_terminates_in_continue_mode() {
    let (_dir, config_path) =
        setup_test_workspace(&[0xAB, 0xAB, 0x00], r#"[{"old_hex": "AB", "new_hex": "ABAB"}]"#);
    // Length mismatch wins before the engine ever sees it
    let outcome = pipeline::run_from_path(
        &config_path,
        EngineOptions {
            mode: ScanMode::Continue,
            max_replacements: None,
        },
    )
    .unwrap();
    assert!(outcome.report.outcomes[0].result.is_skipped());

    let (_dir, config_path) =
        setup_test_workspace(&[0xAB, 0xAB, 0x00], r#"[{"old_hex": "ABAB", "new_hex": "ABAB"}]"#);
    let outcome = pipeline::run_from_path(
        &config_path,
        EngineOptions {
            mode: ScanMode::Continue,
            max_replacements: None,
        },
    )
    .unwrap();
    assert_eq!(outcome.report.outcomes[0].result, RuleResult::Applied(1));
}

#[test]
fn test_empty_rule_list_copies_input() {
    let (dir, config_path) = setup_test_workspace(&[1, 2, 3], "[]");

    let outcome = pipeline::run_from_path(&config_path, EngineOptions::default()).unwrap();

    assert!(outcome.report.outcomes.is_empty());
    assert_eq!(
        fs::read(dir.path().join("firmware.patched.bin")).unwrap(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_check_does_not_write() {
    let (dir, config_path) = setup_test_workspace(
        &[0xAA, 0xAA, 0xAA],
        r#"[{"old_hex": "AAAA", "new_hex": "BBBB"}, {"old_hex": "A", "new_hex": "B"}]"#,
    );
    let config = load_from_path(&config_path).unwrap();

    let checks = pipeline::check(&config).unwrap();

    assert_eq!(checks[0].occurrences, 1);
    assert!(checks[0].is_valid());
    assert!(!checks[1].is_valid());
    assert!(!dir.path().join("firmware.patched.bin").exists());
}

#[test]
fn test_invalid_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{"input_file": "", "output_file": "x"}"#).unwrap();

    let err = pipeline::run_from_path(&config_path, EngineOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::Validation { .. })
    ));
}

#[test]
fn test_unwritable_output_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.bin");
    fs::write(&input, [0u8]).unwrap();
    let output = dir.path().join("no-such-dir").join("out.bin");

    let config = load_from_str(&json_config(&input, &output, "[]"), ConfigFormat::Json)
        .unwrap();
    let err = pipeline::run(&config, EngineOptions::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Io(IoError::Write { .. })));
}
