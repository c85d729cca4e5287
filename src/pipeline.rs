//! End-to-end analysis run: load, summarize, fit, predict, integrate, analyze.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{DEFAULT_LAUNCH_ANGLE_DEG, DEFAULT_SPEED_QUANTILE};
use crate::dataset::{load_dataset, Dataset};
use crate::error::{DragError, Result};
use crate::output::{ensure_output_dir, export_regression, export_report, export_trajectory};
use crate::quartiles::{calculate_quartiles, quantile, QuartileResult};
use crate::regression::{fit_coefficients, predict_coefficients, DragCoefficients, RegressionFit};
use crate::trajectory_analysis::{calculate_trajectory_characteristics, TrajectoryCharacteristics};
use crate::trajectory_solver::{integrate_trajectory, TrajectorySample, TrajectorySettings};

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub dataset_path: PathBuf,
    pub output_dir: PathBuf,
    pub launch_angle_deg: f64,
    /// Quantile of the observed speeds used as launch speed
    pub speed_quantile: f64,
    /// Explicit launch speed, overriding `speed_quantile`
    pub launch_speed: Option<f64>,
    pub trajectory: TrajectorySettings,
    /// Write regression/trajectory series and the report to `output_dir`
    pub export: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/dataset.csv"),
            output_dir: PathBuf::from("results"),
            launch_angle_deg: DEFAULT_LAUNCH_ANGLE_DEG,
            speed_quantile: DEFAULT_SPEED_QUANTILE,
            launch_speed: None,
            trajectory: TrajectorySettings::default(),
            export: true,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

/// Everything one run produces
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub quartiles: QuartileResult,
    pub fit_a: RegressionFit,
    pub fit_b: RegressionFit,
    /// Launch speed the coefficients were predicted for (m/s)
    pub speed: f64,
    pub coefficients: DragCoefficients,
    pub launch_angle_deg: f64,
    pub characteristics: TrajectoryCharacteristics,
    /// Landing time when ground-impact termination fired
    pub impact_time: Option<f64>,
    #[serde(skip)]
    pub trajectory: TrajectorySample,
}

fn select_speed(dataset: &Dataset, quartiles: &QuartileResult, config: &PipelineConfig) -> Result<f64> {
    if let Some(speed) = config.launch_speed {
        return Ok(speed);
    }
    match quartiles.get(config.speed_quantile) {
        Some(speed) => Ok(speed),
        None => quantile(&dataset.speeds(), config.speed_quantile),
    }
}

/// Run the analysis on an already loaded dataset
pub fn analyze_dataset(dataset: &Dataset, config: &PipelineConfig) -> Result<Report> {
    let quartiles = calculate_quartiles(dataset)?;
    info!(q25 = quartiles.q25, q50 = quartiles.q50, q75 = quartiles.q75, "speed quartiles");

    let (fit_a, fit_b) = fit_coefficients(dataset)?;

    let speed = select_speed(dataset, &quartiles, config)?;
    let coefficients = predict_coefficients(speed, &fit_a, &fit_b);
    info!(speed, a = coefficients.a, b = coefficients.b, "predicted drag coefficients");
    if coefficients.a < 0.0 || coefficients.b < 0.0 {
        warn!(a = coefficients.a, b = coefficients.b, "negative drag coefficient predicted");
    }

    let run = integrate_trajectory(config.launch_angle_deg, speed, coefficients, &config.trajectory)?;
    let characteristics = calculate_trajectory_characteristics(&run.sample)?;
    info!(
        range = characteristics.range,
        max_height = characteristics.max_height,
        flight_time = characteristics.flight_time,
        "trajectory analyzed"
    );

    Ok(Report {
        quartiles,
        fit_a,
        fit_b,
        speed,
        coefficients,
        launch_angle_deg: config.launch_angle_deg,
        characteristics,
        impact_time: run.impact_time,
        trajectory: run.sample,
    })
}

/// Load the dataset named in `config`, analyze it and export the results
pub fn run_pipeline(config: &PipelineConfig) -> Result<Report> {
    if !(0.0..=1.0).contains(&config.speed_quantile) {
        return Err(DragError::InvalidParameter(format!(
            "speed quantile {} outside [0, 1]",
            config.speed_quantile
        )));
    }
    if config.export {
        ensure_output_dir(&config.output_dir)?;
    }

    let dataset = load_dataset(&config.dataset_path)?;
    let report = analyze_dataset(&dataset, config)?;

    if config.export {
        export_regression(&config.output_dir, &dataset, &report.fit_a, &report.fit_b)?;
        export_trajectory(&config.output_dir, &report.trajectory)?;
        export_report(&config.output_dir, &report)?;
        info!(dir = %config.output_dir.display(), "results exported");
    }

    Ok(report)
}
