//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizreport() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizreport").unwrap();
    cmd.env_remove("QUIZREPORT_API_URL");
    cmd
}

/// A temp dir with `quizreport init` already run in it.
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    quizreport()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
    dir
}

fn json_stdout(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = quizreport()
        .current_dir(dir.path())
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success(), "{args:?} failed: {output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn init_creates_config_and_data() {
    let dir = TempDir::new().unwrap();
    quizreport()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizreport.toml"))
        .stdout(predicate::str::contains("Next steps:"));

    assert!(dir.path().join("quizreport.toml").exists());
    assert!(dir.path().join("quizreport-data/quizzes/wellbeing.json").exists());
    assert!(dir.path().join("quizreport-data/packets/stress.json").exists());
    assert!(dir.path().join("quizreport-data/attempts/attempt-2.json").exists());
}

#[test]
fn init_twice_skips_existing() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizreport.toml already exists, skipping."))
        .stdout(predicate::str::contains("quizreport-data/ already exists, skipping."));
}

#[test]
fn marks_lists_every_packet() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["marks", "--quiz", "wellbeing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sleep"))
        .stdout(predicate::str::contains("Stress"))
        .stdout(predicate::str::contains("Focus"));
}

#[test]
fn marks_unknown_quiz_fails() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["marks", "--quiz", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn scale_show_generates_from_marks_band() {
    let dir = initialized();
    let session = json_stdout(
        &dir,
        &["scale", "show", "--quiz", "wellbeing", "--packet", "focus", "--json"],
    );
    // Two 0..3 questions plus one legacy question worth 2.
    assert_eq!(session["marks"]["min_marks"], 2);
    assert_eq!(session["marks"]["max_marks"], 8);
    assert_eq!(session["origin"], "generated");
    assert_eq!(session["scale"].as_array().unwrap().len(), 4);
    assert_eq!(session["scale"][0]["min"], 2);
    assert_eq!(session["scale"][3]["max"], 8);
}

#[test]
fn scale_show_reports_saved_scale() {
    let dir = initialized();
    let session = json_stdout(
        &dir,
        &["scale", "show", "--quiz", "wellbeing", "--packet", "Stress", "--json"],
    );
    assert_eq!(session["origin"], "persisted");
    assert_eq!(session["enabled"], true);
    assert_eq!(session["scale"][2]["label"], "Overloaded");
}

#[test]
fn scale_show_with_pending_option_weight() {
    let dir = initialized();
    let session = json_stdout(
        &dir,
        &[
            "scale", "show", "--quiz", "wellbeing", "--packet", "sleep", "--option", "sleep-1:3=6",
            "--json",
        ],
    );
    assert_eq!(session["marks"]["max_marks"], 12);
}

#[test]
fn scale_save_applies_pending_edit() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args([
            "scale", "save", "--quiz", "wellbeing", "--packet", "sleep", "--set", "0.label=Restless",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 4 range(s) for Sleep (scale enabled)."));

    let session = json_stdout(
        &dir,
        &["scale", "show", "--quiz", "wellbeing", "--packet", "sleep", "--json"],
    );
    assert_eq!(session["origin"], "persisted");
    assert_eq!(session["scale"][0]["label"], "Restless");
}

#[test]
fn scale_save_from_file_disabled() {
    let dir = initialized();
    std::fs::write(
        dir.path().join("scale.json"),
        r#"[{"min":0,"max":4,"label":"Low"},{"min":5,"max":9,"label":"High"}]"#,
    )
    .unwrap();
    quizreport()
        .current_dir(dir.path())
        .args([
            "scale", "save", "--quiz", "wellbeing", "--packet", "focus", "--from", "scale.json",
            "--disable",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("scale disabled"));

    let session = json_stdout(
        &dir,
        &["scale", "show", "--quiz", "wellbeing", "--packet", "focus", "--json"],
    );
    assert_eq!(session["enabled"], false);
    assert_eq!(session["scale"][1]["label"], "High");
}

#[test]
fn scale_save_rejects_inverted_range() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args([
            "scale", "save", "--quiz", "wellbeing", "--packet", "sleep", "--set", "0.min=100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("was not saved"));

    let session = json_stdout(
        &dir,
        &["scale", "show", "--quiz", "wellbeing", "--packet", "sleep", "--json"],
    );
    assert_eq!(session["origin"], "generated");
}

#[test]
fn generate_all_formats() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args([
            "generate", "--quiz", "wellbeing", "--attempt", "attempt-1,attempt-2", "--format", "all",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Complete: 2/2 succeeded, 0 failed"));

    let out = dir.path().join("quizreport-output");
    let stem = "Wellbeing_Check_Ada_Lovelace_2024-03-05";
    let printable = std::fs::read_to_string(out.join(format!("{stem}.html"))).unwrap();
    assert!(printable.contains("<svg"));
    assert!(printable.contains("Assessment Summary &amp; Analytics"));

    let view = std::fs::read_to_string(out.join(format!("{stem}.view.html"))).unwrap();
    assert!(view.contains("Ada Lovelace"));
    assert!(view.contains("Quarterly Wellbeing Report"));

    let data: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(format!("{stem}.json"))).unwrap())
            .unwrap();
    assert_eq!(data["attempt"]["total_marks"], 19);

    assert!(out.join(stem).join(format!("{stem}-page-1.svg")).exists());
    assert!(out
        .join("Wellbeing_Check_Grace_Hopper_2024-03-06.html")
        .exists());
}

#[test]
fn generate_uses_default_format_from_config() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["generate", "--quiz", "wellbeing", "--attempt", "attempt-2", "--output", "out"])
        .assert()
        .success();

    let out = dir.path().join("out");
    assert!(out.join("Wellbeing_Check_Grace_Hopper_2024-03-06.html").exists());
    assert!(!out.join("Wellbeing_Check_Grace_Hopper_2024-03-06.json").exists());
}

#[test]
fn generate_reports_missing_attempt() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args([
            "generate", "--quiz", "wellbeing", "--attempt", "attempt-1,missing", "--format", "json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("report generation failed for 1 of 2 attempt(s): missing"));

    // The good attempt is still written.
    assert!(dir
        .path()
        .join("quizreport-output/Wellbeing_Check_Ada_Lovelace_2024-03-05.json")
        .exists());
}

#[test]
fn generate_rejects_unknown_format() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["generate", "--quiz", "wellbeing", "--attempt", "attempt-1", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format 'pdf'"));
}

#[test]
fn template_move_section_swaps_order() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["template", "move", "--quiz", "wellbeing", "--section", "charts", "--direction", "up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved template version 1."));

    let template = json_stdout(&dir, &["template", "show", "--quiz", "wellbeing", "--json"]);
    assert_eq!(template["charts"]["order"], 2);
    assert_eq!(template["overallScore"]["order"], 3);
    assert!(dir.path().join("quizreport-data/templates/wellbeing.json").exists());
}

#[test]
fn template_move_at_edge_changes_nothing() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["template", "move", "--quiz", "wellbeing", "--section", "header", "--direction", "up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to move."));
    assert!(!dir.path().join("quizreport-data/templates/wellbeing.json").exists());
}

#[test]
fn template_toggle_packet() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["template", "toggle", "--quiz", "wellbeing", "--packet", "focus"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Focus is now disabled."));

    let template = json_stdout(&dir, &["template", "show", "--quiz", "wellbeing", "--json"]);
    assert_eq!(template["packetConfigs"]["focus"]["enabled"], false);
    assert_eq!(template["packetConfigs"]["sleep"]["enabled"], true);
}

#[test]
fn template_requires_a_target() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["template", "toggle", "--quiz", "wellbeing"])
        .assert()
        .failure();
}

#[test]
fn template_set_and_validate() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["template", "set", "--quiz", "wellbeing", "header.title=", "charts.enabled=false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 2 edit(s)."))
        .stderr(predicate::str::contains("Warning: Header title is required"));

    quizreport()
        .current_dir(dir.path())
        .args(["template", "validate", "--quiz", "wellbeing"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Header title is required"))
        .stderr(predicate::str::contains("template has 1 issue(s)"));
}

#[test]
fn template_set_rejects_unknown_path() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["template", "set", "--quiz", "wellbeing", "header.nonsense=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid edit 'header.nonsense=1'"));
}

#[test]
fn template_preset_restyles() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["template", "preset", "--quiz", "wellbeing", "creative"])
        .assert()
        .success();

    let template = json_stdout(&dir, &["template", "show", "--quiz", "wellbeing", "--json"]);
    assert_eq!(template["colors"]["primary"], "#7c3aed");
    assert_eq!(template["typography"]["primaryFont"], "Georgia");
}

#[test]
fn default_template_is_valid() {
    let dir = initialized();
    quizreport()
        .current_dir(dir.path())
        .args(["template", "validate", "--quiz", "wellbeing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    quizreport()
        .current_dir(dir.path())
        .args(["marks", "--quiz", "wellbeing", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
