//! Closed-form projectile motion without air resistance.
//!
//! This backs the quick parameter explorer. It never touches the fitted
//! coefficients or the numerical integrator.

use serde::Serialize;

use crate::constants::{ANALYTIC_ANGLE_MAX, ANALYTIC_ANGLE_MIN, ANALYTIC_SPEED_MAX, ANALYTIC_SPEED_MIN};
use crate::error::{DragError, Result};

/// Height and distance after `t` seconds
pub fn position_at(v0: f64, angle_deg: f64, t: f64, gravity: f64) -> (f64, f64) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let x = v0 * t * cos;
    let y = v0 * t * sin - 0.5 * gravity * t * t;
    (x, y)
}

/// Time until the projectile returns to launch height
pub fn time_of_flight(v0: f64, angle_deg: f64, gravity: f64) -> f64 {
    2.0 * v0 * angle_deg.to_radians().sin() / gravity
}

pub fn time_to_apex(v0: f64, angle_deg: f64, gravity: f64) -> f64 {
    v0 * angle_deg.to_radians().sin() / gravity
}

pub fn max_height(v0: f64, angle_deg: f64, gravity: f64) -> f64 {
    let vy = v0 * angle_deg.to_radians().sin();
    vy * vy / (2.0 * gravity)
}

pub fn range(v0: f64, angle_deg: f64, gravity: f64) -> f64 {
    v0 * v0 * (2.0 * angle_deg.to_radians()).sin() / gravity
}

/// Summary of a drag-free flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalyticSummary {
    pub v0: f64,
    pub angle_deg: f64,
    pub time_of_flight: f64,
    pub time_to_apex: f64,
    pub max_height: f64,
    pub range: f64,
}

pub fn summarize(v0: f64, angle_deg: f64, gravity: f64) -> AnalyticSummary {
    AnalyticSummary {
        v0,
        angle_deg,
        time_of_flight: time_of_flight(v0, angle_deg, gravity),
        time_to_apex: time_to_apex(v0, angle_deg, gravity),
        max_height: max_height(v0, angle_deg, gravity),
        range: range(v0, angle_deg, gravity),
    }
}

/// `(t, x, y)` at `n` even steps from launch to landing
pub fn sample_trajectory(v0: f64, angle_deg: f64, gravity: f64, n: usize) -> Vec<(f64, f64, f64)> {
    let t_max = time_of_flight(v0, angle_deg, gravity);
    crate::integrator::linspace(0.0, t_max, n)
        .into_iter()
        .map(|t| {
            let (x, y) = position_at(v0, angle_deg, t, gravity);
            (t, x, y)
        })
        .collect()
}

/// Check launch parameters against the explorer's slider limits
pub fn validate_explorer_inputs(v0: f64, angle_deg: f64) -> Result<()> {
    if !(ANALYTIC_SPEED_MIN..=ANALYTIC_SPEED_MAX).contains(&v0) {
        return Err(DragError::InvalidParameter(format!(
            "speed {v0} outside [{ANALYTIC_SPEED_MIN}, {ANALYTIC_SPEED_MAX}] m/s"
        )));
    }
    if !(ANALYTIC_ANGLE_MIN..=ANALYTIC_ANGLE_MAX).contains(&angle_deg) {
        return Err(DragError::InvalidParameter(format!(
            "angle {angle_deg} outside [{ANALYTIC_ANGLE_MIN}, {ANALYTIC_ANGLE_MAX}] degrees"
        )));
    }
    Ok(())
}
