// Result export and report rendering
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::pipeline::Report;
use crate::regression::{predict_a, predict_b, RegressionFit};
use crate::trajectory_solver::TrajectorySample;

pub const REGRESSION_A_FILE: &str = "regression_a.csv";
pub const REGRESSION_B_FILE: &str = "regression_b.csv";
pub const TRAJECTORY_FILE: &str = "trajectory_with_resistance.csv";
pub const REPORT_FILE: &str = "report.json";

#[derive(Serialize)]
struct RegressionRowA {
    v: f64,
    a: f64,
    a_fit: f64,
}

#[derive(Serialize)]
struct RegressionRowB {
    v_squared: f64,
    b: f64,
    b_fit: f64,
}

/// Create the output directory (and parents) if missing
pub fn ensure_output_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
    std::fs::create_dir_all(dir.as_ref())?;
    Ok(())
}

/// Write observed and fitted coefficients, one file per regression
pub fn export_regression(
    dir: &Path,
    dataset: &Dataset,
    fit_a: &RegressionFit,
    fit_b: &RegressionFit,
) -> Result<(PathBuf, PathBuf)> {
    let path_a = dir.join(REGRESSION_A_FILE);
    let mut writer = csv::Writer::from_path(&path_a)?;
    for r in dataset.records() {
        writer.serialize(RegressionRowA { v: r.v, a: r.a, a_fit: predict_a(r.v, fit_a) })?;
    }
    writer.flush()?;

    let path_b = dir.join(REGRESSION_B_FILE);
    let mut writer = csv::Writer::from_path(&path_b)?;
    for r in dataset.records() {
        writer.serialize(RegressionRowB { v_squared: r.v * r.v, b: r.b, b_fit: predict_b(r.v, fit_b) })?;
    }
    writer.flush()?;

    debug!(a = %path_a.display(), b = %path_b.display(), "regression series written");
    Ok((path_a, path_b))
}

/// Write the sampled trajectory as `t,x,y,vx,vy`
pub fn export_trajectory(dir: &Path, sample: &TrajectorySample) -> Result<PathBuf> {
    let path = dir.join(TRAJECTORY_FILE);
    let mut writer = csv::Writer::from_path(&path)?;
    for point in sample.iter() {
        writer.serialize(point)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = sample.len(), "trajectory written");
    Ok(path)
}

pub fn export_report(dir: &Path, report: &Report) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE);
    std::fs::write(&path, render_json(report)?)?;
    Ok(path)
}

pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// `metric,value` lines
pub fn render_csv(report: &Report) -> String {
    let mut out = String::from("metric,value\n");
    let rows = [
        ("q25", report.quartiles.q25),
        ("q50", report.quartiles.q50),
        ("q75", report.quartiles.q75),
        ("slope_a", report.fit_a.slope),
        ("intercept_a", report.fit_a.intercept),
        ("slope_b", report.fit_b.slope),
        ("intercept_b", report.fit_b.intercept),
        ("speed", report.speed),
        ("a", report.coefficients.a),
        ("b", report.coefficients.b),
    ];
    for (name, value) in rows.into_iter().chain(report.characteristics.entries()) {
        let _ = writeln!(out, "{name},{value}");
    }
    out
}

pub fn render_table(report: &Report) -> String {
    let c = &report.characteristics;
    let mut out = String::new();

    let _ = writeln!(out, "╔════════════════════════════════════════╗");
    let _ = writeln!(out, "║         SPEED QUARTILES                ║");
    let _ = writeln!(out, "╠════════════════════════════════════════╣");
    for (level, value) in report.quartiles.iter() {
        let _ = writeln!(out, "║ Q{:<4}             {:>10.3} m/s      ║", level, value);
    }
    let _ = writeln!(out, "╠════════════════════════════════════════╣");
    let _ = writeln!(out, "║         REGRESSION                     ║");
    let _ = writeln!(out, "╠════════════════════════════════════════╣");
    let _ = writeln!(out, "║ a = {:>12.6e} v + {:>12.6e}  ║", report.fit_a.slope, report.fit_a.intercept);
    let _ = writeln!(out, "║     r = {:>8.4}                       ║", report.fit_a.r_value);
    let _ = writeln!(out, "║ b = {:>12.6e} v² + {:>11.6e}  ║", report.fit_b.slope, report.fit_b.intercept);
    let _ = writeln!(out, "║     r = {:>8.4}                       ║", report.fit_b.r_value);
    let _ = writeln!(out, "╠════════════════════════════════════════╣");
    let _ = writeln!(out, "║ Predicted at v = {:>8.3} m/s          ║", report.speed);
    let _ = writeln!(out, "║ a:                 {:>12.6}        ║", report.coefficients.a);
    let _ = writeln!(out, "║ b:                 {:>12.6}        ║", report.coefficients.b);
    let _ = writeln!(out, "╠════════════════════════════════════════╣");
    let _ = writeln!(out, "║         TRAJECTORY RESULTS             ║");
    let _ = writeln!(out, "╠════════════════════════════════════════╣");
    let _ = writeln!(out, "║ Launch Angle:      {:>8.2} deg        ║", report.launch_angle_deg);
    let _ = writeln!(out, "║ Range:             {:>8.2} m          ║", c.range);
    let _ = writeln!(out, "║ Max Height:        {:>8.2} m          ║", c.max_height);
    let _ = writeln!(out, "║ Flight Time:       {:>8.3} s          ║", c.flight_time);
    let _ = writeln!(out, "║ Time to Apex:      {:>8.3} s          ║", c.time_to_apex);
    let _ = writeln!(out, "║ Impact Speed:      {:>8.2} m/s        ║", c.impact_speed);
    let _ = writeln!(out, "╚════════════════════════════════════════╝");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Observation;
    use crate::pipeline::{analyze_dataset, PipelineConfig};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("projectile-drag-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn report() -> (Dataset, Report) {
        let dataset: Dataset = (1..=8)
            .map(|i| {
                let v = 25.0 * i as f64;
                Observation { v, a: 0.001 * v, b: 2e-6 * v * v + 0.001 }
            })
            .collect();
        let config = PipelineConfig { export: false, ..Default::default() };
        let report = analyze_dataset(&dataset, &config).unwrap();
        (dataset, report)
    }

    #[test]
    fn test_exports_write_expected_files() {
        let dir = scratch_dir("exports");
        ensure_output_dir(&dir).unwrap();
        let (dataset, report) = report();

        let (path_a, path_b) = export_regression(&dir, &dataset, &report.fit_a, &report.fit_b).unwrap();
        let trajectory = export_trajectory(&dir, &report.trajectory).unwrap();
        let json = export_report(&dir, &report).unwrap();

        let a_csv = std::fs::read_to_string(path_a).unwrap();
        assert!(a_csv.starts_with("v,a,a_fit\n"));
        assert_eq!(a_csv.lines().count(), dataset.len() + 1);

        let b_csv = std::fs::read_to_string(path_b).unwrap();
        assert!(b_csv.starts_with("v_squared,b,b_fit\n"));

        let traj_csv = std::fs::read_to_string(trajectory).unwrap();
        assert!(traj_csv.starts_with("t,x,y,vx,vy\n"));
        assert_eq!(traj_csv.lines().count(), report.trajectory.len() + 1);

        let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert!(parsed["characteristics"]["range"].is_number());
        assert!(parsed.get("trajectory").is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_ensure_output_dir_nested() {
        let dir = scratch_dir("nested").join("a").join("b");
        ensure_output_dir(&dir).unwrap();
        assert!(dir.is_dir());
        // idempotent
        ensure_output_dir(&dir).unwrap();
        let _ = std::fs::remove_dir_all(dir.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_renderers() {
        let (_, report) = report();

        let table = render_table(&report);
        assert!(table.contains("TRAJECTORY RESULTS"));
        assert!(table.contains("Time to Apex"));

        let csv = render_csv(&report);
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("\nimpact_speed,"));
        assert_eq!(csv.lines().count(), 1 + 10 + 5);

        let json = render_json(&report).unwrap();
        assert!(json.contains("\"time_to_apex\""));
    }
}
