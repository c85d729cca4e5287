use serde::Serialize;

use crate::error::{DragError, Result};
use crate::trajectory_solver::TrajectorySample;

/// Summary of a sampled trajectory
///
/// Values are read from the last sample, which is the end of the integration
/// window unless ground-impact termination was requested. With the default
/// fixed duration, `range`, `flight_time` and `impact_speed` therefore
/// describe the cutoff point rather than a landing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryCharacteristics {
    /// Horizontal distance at the last sample (m)
    pub range: f64,
    /// Highest sampled height (m)
    pub max_height: f64,
    /// Time of the last sample (s)
    pub flight_time: f64,
    /// Time of the highest sample, first occurrence (s)
    pub time_to_apex: f64,
    /// Speed at the last sample (m/s)
    pub impact_speed: f64,
}

impl TrajectoryCharacteristics {
    /// Labelled values in report order
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("range", self.range),
            ("max_height", self.max_height),
            ("flight_time", self.flight_time),
            ("time_to_apex", self.time_to_apex),
            ("impact_speed", self.impact_speed),
        ]
    }
}

/// Index of the first maximum; NaN heights never win
fn argmax_first(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] || (values[best].is_nan() && !v.is_nan()) {
            best = i;
        }
    }
    best
}

/// Reduce a sampled trajectory to its summary characteristics
pub fn calculate_trajectory_characteristics(sample: &TrajectorySample) -> Result<TrajectoryCharacteristics> {
    let last = match sample.len().checked_sub(1).and_then(|i| sample.point(i)) {
        Some(point) => point,
        None => return Err(DragError::EmptyInput("trajectory sample has no points".into())),
    };

    let apex = argmax_first(&sample.y);

    Ok(TrajectoryCharacteristics {
        range: last.x,
        max_height: sample.y[apex],
        flight_time: last.t,
        time_to_apex: sample.t[apex],
        impact_speed: last.speed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::DragCoefficients;
    use crate::trajectory_solver::{solve_ode, TrajectoryPoint, TrajectorySettings};

    fn point(t: f64, x: f64, y: f64, vx: f64, vy: f64) -> TrajectoryPoint {
        TrajectoryPoint { t, x, y, vx, vy }
    }

    #[test]
    fn test_hand_built_sample() {
        let sample: TrajectorySample = [
            point(0.0, 0.0, 0.0, 3.0, 4.0),
            point(1.0, 3.0, 2.0, 3.0, 0.0),
            point(2.0, 6.0, 2.0, 3.0, -4.0),
            point(3.0, 9.0, -1.0, 3.0, -4.0),
        ]
        .into_iter()
        .collect();

        let c = calculate_trajectory_characteristics(&sample).unwrap();
        assert_eq!(c.range, 9.0);
        assert_eq!(c.max_height, 2.0);
        assert_eq!(c.flight_time, 3.0);
        // ties resolve to the first occurrence
        assert_eq!(c.time_to_apex, 1.0);
        assert_eq!(c.impact_speed, 5.0);
    }

    #[test]
    fn test_single_point() {
        let sample: TrajectorySample = std::iter::once(point(0.0, 0.0, 0.0, 6.0, 8.0)).collect();
        let c = calculate_trajectory_characteristics(&sample).unwrap();
        assert_eq!(c.time_to_apex, 0.0);
        assert_eq!(c.impact_speed, 10.0);
    }

    #[test]
    fn test_empty_sample() {
        let result = calculate_trajectory_characteristics(&TrajectorySample::default());
        assert!(matches!(result, Err(DragError::EmptyInput(_))));
    }

    #[test]
    fn test_no_drag_apex_time() {
        let settings = TrajectorySettings::default();
        let (v0, angle) = (60.0, 40.0f64);
        let sample = solve_ode(angle, v0, DragCoefficients::none(), &settings).unwrap();
        let c = calculate_trajectory_characteristics(&sample).unwrap();

        let expected = v0 * angle.to_radians().sin() / settings.gravity;
        let dt = 10.0 / 499.0;
        assert!((c.time_to_apex - expected).abs() <= dt / 2.0 + 1e-9);

        let apex_index = sample.t.iter().position(|&t| t == c.time_to_apex).unwrap();
        assert!(sample.y.iter().all(|&y| y <= sample.y[apex_index]));
    }

    #[test]
    fn test_reference_scenario() {
        let sample = solve_ode(30.0, 100.0, DragCoefficients::new(0.1, 0.01), &TrajectorySettings::default()).unwrap();
        let c = calculate_trajectory_characteristics(&sample).unwrap();

        assert!(c.time_to_apex > 0.0 && c.time_to_apex < 10.0);
        assert_eq!(c.flight_time, 10.0);
        assert_eq!(c.range, *sample.x.last().unwrap());

        // Vy vanishes at t = ln(1 + b Vy0 / g) / b
        let apex_time = (1.0f64 + 0.01 * 50.0 / 9.8).ln() / 0.01;
        assert!((c.time_to_apex - apex_time).abs() < 10.0 / 499.0);
        let vx0 = 100.0 * 30f64.to_radians().cos();
        assert!((c.range - vx0 / 0.1 * (1.0 - (-1.0f64).exp())).abs() < 1e-2);
    }

    #[test]
    fn test_entries_order() {
        let c = TrajectoryCharacteristics {
            range: 1.0,
            max_height: 2.0,
            flight_time: 3.0,
            time_to_apex: 4.0,
            impact_speed: 5.0,
        };
        let names: Vec<&str> = c.entries().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["range", "max_height", "flight_time", "time_to_apex", "impact_speed"]);
    }
}
