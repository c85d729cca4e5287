use serde::Serialize;

use crate::constants::QUARTILE_LEVELS;
use crate::dataset::Dataset;
use crate::error::{DragError, Result};

/// Speed quartiles of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuartileResult {
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
}

impl QuartileResult {
    /// Look up a quartile by its level (0.25, 0.5 or 0.75).
    pub fn get(&self, level: f64) -> Option<f64> {
        self.iter()
            .find(|(l, _)| (l - level).abs() < 1e-12)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> {
        QUARTILE_LEVELS.into_iter().zip([self.q25, self.q50, self.q75])
    }
}

/// Quantile of `values` at `level` using linear interpolation between order
/// statistics (position `level * (n - 1)` in the sorted data).
pub fn quantile(values: &[f64], level: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(DragError::EmptyInput("cannot take a quantile of no values".into()));
    }
    if !(0.0..=1.0).contains(&level) {
        return Err(DragError::InvalidParameter(format!(
            "quantile level {level} outside [0, 1]"
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(quantile_sorted(&sorted, level))
}

fn quantile_sorted(sorted: &[f64], level: f64) -> f64 {
    let position = level * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let frac = position - lower as f64;

    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

/// First, second and third quartile of the observed speeds
pub fn calculate_quartiles(dataset: &Dataset) -> Result<QuartileResult> {
    if dataset.is_empty() {
        return Err(DragError::EmptyInput("dataset has no records".into()));
    }

    let mut speeds = dataset.speeds();
    speeds.sort_by(f64::total_cmp);

    Ok(QuartileResult {
        q25: quantile_sorted(&speeds, 0.25),
        q50: quantile_sorted(&speeds, 0.5),
        q75: quantile_sorted(&speeds, 0.75),
    })
}
