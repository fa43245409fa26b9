//! Binary-level tests for the `sounding` command

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn sounding(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sounding"))
        .args(args)
        .arg("--no-color")
        .arg("--config")
        .arg(config_dir.join("config.toml"))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sounding")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_depth_json() {
    let dir = TempDir::new().unwrap();
    let output = sounding(dir.path(), &["depth", "--format", "json"]);
    assert!(output.status.success());

    let presets: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(presets.as_array().unwrap().len(), 4);
    assert_eq!(presets[3]["level"], "exhaustive");
    assert_eq!(presets[3]["policy"]["max_probes_per_wave"], 20);
}

#[test]
fn test_unknown_depth_fails() {
    let dir = TempDir::new().unwrap();
    let output = sounding(dir.path(), &["depth", "fathomless"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown depth level"));
}

#[test]
fn test_gate_quiet() {
    let dir = TempDir::new().unwrap();
    let checklist = dir.path().join("checklist.toml");
    fs::write(
        &checklist,
        r#"
prior_art_check = "pass"
architectural_fit = "partial"
documentation_verification = "fail"
reference_implementation_verification = "fail"
root_cause_verification = "pass"

[notes]
documentation_verification = "upstream docs are stale"
"#,
    )
    .unwrap();

    let output = sounding(
        dir.path(),
        &["gate", checklist.to_str().unwrap(), "--format", "quiet"],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "stop");
}

#[test]
fn test_research_uses_config_file_format() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[settings]\nformat = \"json\"\ndepth = \"quick\"\n",
    )
    .unwrap();
    let plan = dir.path().join("plan.toml");
    fs::write(
        &plan,
        r#"
[[topics]]
key = "msrv"
query = "tokio msrv"

[[providers]]
id = "docs"
tier = "official"
fallback = { claim = "Rust 1.70", citation = "https://docs.rs/tokio" }
"#,
    )
    .unwrap();

    let output = sounding(dir.path(), &["research", plan.to_str().unwrap()]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["final_state"], "succeeded");
    assert_eq!(report["policy"]["max_waves"], 1);
    assert_eq!(report["evidence"][0]["claim"], "Rust 1.70");
}

#[test]
fn test_research_without_providers_reports_abort() {
    let dir = TempDir::new().unwrap();
    let plan = dir.path().join("plan.toml");
    fs::write(&plan, "[[topics]]\nkey = \"a\"\nquery = \"b\"\n").unwrap();

    let output = sounding(
        dir.path(),
        &["research", plan.to_str().unwrap(), "--format", "quiet", "--depth", "standard"],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "stop");
    assert!(String::from_utf8_lossy(&output.stderr).contains("no-usable-providers"));
}

#[test]
fn test_missing_plan_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = sounding(dir.path(), &["research", "/nonexistent/plan.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}
