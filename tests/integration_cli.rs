use std::path::PathBuf;
use std::process::Command;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_projectile-cli"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("projectile-cli-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_dataset(dir: &PathBuf) -> PathBuf {
    let path = dir.join("dataset.csv");
    let mut csv = String::from("velocity,a,b\n");
    for i in 1..=12 {
        let v = 15.0 * i as f64;
        csv.push_str(&format!("{},{},{}\n", v, 0.0004 * v + 0.03, 1.2e-6 * v * v + 0.004));
    }
    std::fs::write(&path, csv).unwrap();
    path
}

#[test]
fn test_cli_help() {
    let output = cli().arg("--help").output().expect("Failed to execute command");

    assert!(output.status.success(), "Help command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("analyze"), "Should list analyze command");
    assert!(stdout.contains("simulate"), "Should list simulate command");
    assert!(stdout.contains("analytic"), "Should list analytic command");
    assert!(stdout.contains("info"), "Should list info command");
}

#[test]
fn test_cli_info() {
    let output = cli().arg("info").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PROJECTILE DRAG"));
}

#[test]
fn test_cli_simulate_table() {
    let output = cli()
        .args(["simulate", "--velocity", "100", "--angle", "30", "-a", "0.1", "-b", "0.01"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TRAJECTORY RESULTS"));
    assert!(stdout.contains("Time to Apex"));
}

#[test]
fn test_cli_simulate_csv_has_every_sample() {
    let output = cli()
        .args(["simulate", "-v", "100", "-a", "0.1", "-b", "0.01", "--points", "50", "-o", "csv"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("t,x,y,vx,vy"));
    assert_eq!(lines.count(), 50);
}

#[test]
fn test_cli_simulate_stop_at_ground_json() {
    let output = cli()
        .args(["simulate", "-v", "50", "--angle", "45", "--t-end", "30", "--stop-at-ground", "-o", "json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let impact = parsed["impact_time"].as_f64().unwrap();
    let expected = 2.0 * 50.0 * 45f64.to_radians().sin() / 9.8;
    assert!((impact - expected).abs() < 1e-6);
}

#[test]
fn test_cli_analytic() {
    let output = cli()
        .args(["analytic", "--velocity", "50", "--angle", "45"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NO-DRAG TRAJECTORY"));
    assert!(stdout.contains("255.10"), "range of 50 m/s at 45 degrees: {}", stdout);
}

#[test]
fn test_cli_analytic_out_of_range() {
    let output = cli()
        .args(["analytic", "--velocity", "500"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_cli_analyze_exports() {
    let dir = scratch_dir("analyze");
    let dataset = write_dataset(&dir);
    let results = dir.join("results");

    let output = cli()
        .arg("analyze")
        .arg("--dataset")
        .arg(&dataset)
        .arg("--output-dir")
        .arg(&results)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SPEED QUARTILES"));
    for file in ["regression_a.csv", "regression_b.csv", "trajectory_with_resistance.csv", "report.json"] {
        assert!(results.join(file).is_file(), "{} should be written", file);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_analyze_csv_no_export() {
    let dir = scratch_dir("analyze-csv");
    let dataset = write_dataset(&dir);
    let results = dir.join("results");

    let output = cli()
        .arg("analyze")
        .arg("-d")
        .arg(&dataset)
        .arg("--output-dir")
        .arg(&results)
        .args(["--no-export", "--speed", "80", "-o", "csv"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("metric,value"));
    assert!(stdout.contains("\nspeed,80\n"));
    assert!(!results.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_analyze_missing_dataset() {
    let dir = scratch_dir("missing");
    let output = cli()
        .arg("analyze")
        .arg("--dataset")
        .arg(dir.join("nope.csv"))
        .arg("--no-export")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_invalid_command() {
    let output = cli().arg("invalid-command").output().expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid command should fail");
}
