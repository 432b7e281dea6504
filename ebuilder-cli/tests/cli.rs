use std::path::PathBuf;
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "ebuilder-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_day_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_ebuilder");
    let output_path = temp_path("day");
    let status = Command::new(exe)
        .arg("day")
        .arg("--party")
        .arg(fixture("party.json"))
        .arg("--monsters")
        .arg(fixture("monsters.json"))
        .arg("--monsters")
        .arg(fixture("dragon.json"))
        .args(["--charge", "RARE", "--consumable", "UNCOMMON"])
        .args(["--report", "json", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["method"], "cr2");
    assert_eq!(report["party"]["tier"], "tier2");
    assert_eq!(report["encounters"].as_array().map(Vec::len), Some(2));
    assert!(report["consumables"].as_f64().is_some_and(|offset| offset < 0.0));
    assert!(report["fatigue"]["cost"].as_f64().is_some_and(|cost| cost > 0.0));
}

#[test]
fn cli_day_console_lists_encounters() {
    let exe = env!("CARGO_BIN_EXE_ebuilder");
    let output = Command::new(exe)
        .arg("day")
        .arg("--party")
        .arg(fixture("party.json"))
        .args(["--crs", "2,2,2", "--floored"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Adventuring Day"));
    assert!(stdout.contains("CR 2,2,2"));
    assert!(stdout.contains("[cr2, floored cost]"));
    assert!(stdout.contains("Fatigue:"));
}

#[test]
fn cli_sorlock_prints_conversion_table() {
    let exe = env!("CARGO_BIN_EXE_ebuilder");
    let output = Command::new(exe)
        .args([
            "sorlock",
            "--level",
            "8",
            "--pact-slots",
            "2",
            "--sorcery-points",
            "3",
            "--report",
            "json",
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["columns"], serde_json::json!(["L1", "L2", "SP"]));
    assert_eq!(
        report["rows"],
        serde_json::json!([[0, 2, 3], [1, 1, 3], [2, 0, 3]])
    );
}

#[test]
fn cli_rejects_unknown_rarity() {
    let exe = env!("CARGO_BIN_EXE_ebuilder");
    let output = Command::new(exe)
        .arg("day")
        .arg("--party")
        .arg(fixture("party.json"))
        .args(["--crs", "1", "--charge", "ARTIFACT"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ARTIFACT"));
}
