//! Least-squares predictors for the resistance coefficients.
//!
//! Two independent straight-line fits are made against the observed speed:
//! `a` against `v` and `b` against `v²`. Each fit is the closed-form ordinary
//! least squares solution; the correlation and slope standard error are kept
//! as diagnostics only.

use serde::Serialize;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{DragError, Result};

/// Fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation between x and y
    pub r_value: f64,
    /// Standard error of the slope; NaN with only two points
    pub std_err: f64,
    /// Number of points used
    pub n: usize,
}

/// Drag coefficients predicted for one speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DragCoefficients {
    /// Linear resistance coefficient, applied to `Vx`
    pub a: f64,
    /// "Quadratic" resistance coefficient, applied linearly to `Vy`
    pub b: f64,
}

impl DragCoefficients {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    pub fn none() -> Self {
        Self { a: 0.0, b: 0.0 }
    }
}

/// Ordinary least squares fit of `ys` on `xs`
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Result<RegressionFit> {
    if xs.len() != ys.len() {
        return Err(DragError::InvalidParameter(format!(
            "x and y lengths differ ({} vs {})",
            xs.len(),
            ys.len()
        )));
    }
    let n = xs.len();
    if n < 2 {
        return Err(DragError::InsufficientData(format!(
            "need at least 2 points, got {n}"
        )));
    }
    if xs.iter().all(|&x| x == xs[0]) {
        return Err(DragError::InsufficientData(
            "all x values are identical (zero variance)".into(),
        ));
    }

    let nf = n as f64;
    let x_mean = xs.iter().sum::<f64>() / nf;
    let y_mean = ys.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return Err(DragError::InsufficientData(
            "x variance vanished in floating point".into(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let r_value = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };
    let std_err = if n > 2 {
        ((1.0 - r_value * r_value) * syy / sxx / (nf - 2.0)).sqrt()
    } else {
        f64::NAN
    };

    Ok(RegressionFit { slope, intercept, r_value, std_err, n })
}

/// Fit the linear coefficient `a` against speed
pub fn fit_a(dataset: &Dataset) -> Result<RegressionFit> {
    let fit = linear_regression(&dataset.speeds(), &dataset.linear_coefficients())?;
    debug!(slope = fit.slope, intercept = fit.intercept, r = fit.r_value, "fitted a ~ v");
    Ok(fit)
}

/// Fit the quadratic coefficient `b` against squared speed
pub fn fit_b(dataset: &Dataset) -> Result<RegressionFit> {
    let fit = linear_regression(&dataset.speeds_squared(), &dataset.quadratic_coefficients())?;
    debug!(slope = fit.slope, intercept = fit.intercept, r = fit.r_value, "fitted b ~ v^2");
    Ok(fit)
}

/// Run both fits on the rayon pool
pub fn fit_coefficients(dataset: &Dataset) -> Result<(RegressionFit, RegressionFit)> {
    let (fit_a, fit_b) = rayon::join(|| fit_a(dataset), || fit_b(dataset));
    Ok((fit_a?, fit_b?))
}

pub fn predict_a(v: f64, fit: &RegressionFit) -> f64 {
    fit.slope * v + fit.intercept
}

pub fn predict_b(v: f64, fit: &RegressionFit) -> f64 {
    fit.slope * v * v + fit.intercept
}

pub fn predict_coefficients(v: f64, fit_a: &RegressionFit, fit_b: &RegressionFit) -> DragCoefficients {
    DragCoefficients {
        a: predict_a(v, fit_a),
        b: predict_b(v, fit_b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Observation;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noisy_dataset(seed: u64, n: usize) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let v: f64 = rng.gen_range(20.0..300.0);
                Observation {
                    v,
                    a: 0.0004 * v + 0.01 + rng.gen_range(-0.005..0.005),
                    b: 2.0e-7 * v * v + 0.001 + rng.gen_range(-0.0005..0.0005),
                }
            })
            .collect()
    }

    #[test]
    fn test_exact_line() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [3.0, 5.0, 7.0, 9.0];
        let fit = linear_regression(&xs, &ys).unwrap();

        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_value - 1.0).abs() < 1e-12);
        assert!(fit.std_err.abs() < 1e-12);
        assert_eq!(fit.n, 4);
    }

    #[test]
    fn test_two_points_has_no_std_err() {
        let fit = linear_regression(&[0.0, 1.0], &[1.0, 0.0]).unwrap();
        assert!((fit.slope + 1.0).abs() < 1e-12);
        assert!(fit.std_err.is_nan());
    }

    #[test]
    fn test_flat_y_has_zero_correlation() {
        let fit = linear_regression(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_value, 0.0);
    }

    #[test]
    fn test_residuals_sum_to_zero_for_a() {
        for seed in 0..20 {
            let dataset = noisy_dataset(seed, 40);
            let fit = fit_a(&dataset).unwrap();
            let residual_sum: f64 = dataset
                .records()
                .iter()
                .map(|r| r.a - predict_a(r.v, &fit))
                .sum();
            assert!(residual_sum.abs() < 1e-9, "seed {seed}: {residual_sum}");
        }
    }

    #[test]
    fn test_residuals_sum_to_zero_for_b() {
        for seed in 0..20 {
            let dataset = noisy_dataset(seed, 40);
            let fit = fit_b(&dataset).unwrap();
            let residual_sum: f64 = dataset
                .records()
                .iter()
                .map(|r| r.b - predict_b(r.v, &fit))
                .sum();
            assert!(residual_sum.abs() < 1e-9, "seed {seed}: {residual_sum}");
        }
    }

    #[test]
    fn test_recovers_generating_slopes() {
        let dataset = noisy_dataset(7, 500);
        let (fa, fb) = fit_coefficients(&dataset).unwrap();

        assert!((fa.slope - 0.0004).abs() < 5e-5);
        assert!((fb.slope - 2.0e-7).abs() < 5e-8);
        assert!(fa.r_value > 0.9);
    }

    #[test]
    fn test_identical_speeds_rejected() {
        let dataset: Dataset = (0..5)
            .map(|i| Observation { v: 42.0, a: i as f64, b: i as f64 })
            .collect();

        assert!(matches!(fit_a(&dataset), Err(DragError::InsufficientData(_))));
        assert!(matches!(fit_b(&dataset), Err(DragError::InsufficientData(_))));
        assert!(fit_coefficients(&dataset).is_err());
    }

    #[test]
    fn test_too_few_records_rejected() {
        assert!(matches!(fit_a(&Dataset::default()), Err(DragError::InsufficientData(_))));

        let single: Dataset = std::iter::once(Observation { v: 1.0, a: 1.0, b: 1.0 }).collect();
        assert!(matches!(fit_b(&single), Err(DragError::InsufficientData(_))));
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(matches!(
            linear_regression(&[1.0, 2.0], &[1.0]),
            Err(DragError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_predictions() {
        let fit = RegressionFit { slope: 0.5, intercept: 1.0, r_value: 1.0, std_err: 0.0, n: 3 };
        assert_eq!(predict_a(4.0, &fit), 3.0);
        assert_eq!(predict_b(4.0, &fit), 9.0);

        let coeffs = predict_coefficients(2.0, &fit, &fit);
        assert_eq!(coeffs, DragCoefficients::new(2.0, 3.0));
        assert!(predict_a(f64::NAN, &fit).is_nan());
    }
}
