//! Adaptive Dormand–Prince 5(4) integrator with continuous output.
//!
//! Steps are advanced with the seven-stage embedded pair (first same as last)
//! and the local error is controlled with a mixed absolute/relative RMS norm.
//! Every accepted step keeps the coefficients of its fourth-order continuous
//! extension, so the solution can be evaluated anywhere in the integrated
//! interval without influencing the step sequence.

use nalgebra::SVector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    DEFAULT_ATOL, DEFAULT_MAX_STEPS, DEFAULT_RTOL, MIN_STEP_SIZE, STEP_FACTOR_MAX,
    STEP_FACTOR_MIN, STEP_SAFETY,
};
use crate::error::{DragError, Result};

/// Right-hand side of a first-order system `dy/dt = f(t, y)`
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &SVector<f64, N>) -> SVector<f64, N>;
}

/// Local error control settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
    pub min_step: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
            max_steps: DEFAULT_MAX_STEPS,
            min_step: MIN_STEP_SIZE,
        }
    }
}

impl Tolerances {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol, ..Default::default() }
    }

    fn validate(&self) -> Result<()> {
        if !(self.rtol > 0.0 && self.rtol.is_finite()) || !(self.atol > 0.0 && self.atol.is_finite()) {
            return Err(DragError::InvalidParameter(format!(
                "tolerances must be positive and finite (rtol = {}, atol = {})",
                self.rtol, self.atol
            )));
        }
        if self.max_steps == 0 {
            return Err(DragError::InvalidParameter("max_steps must be at least 1".into()));
        }
        Ok(())
    }
}

/// Step counters collected during one integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evaluations: usize,
}

// Dormand–Prince tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth-order weights (also the last stage row)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between fifth- and fourth-order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

// Continuous extension, one row per stage, columns multiply x, x², x³, x⁴
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

/// Interpolant over one accepted step `[t_old, t_old + h]`
#[derive(Debug, Clone)]
pub struct DenseStep<const N: usize> {
    pub t_old: f64,
    pub h: f64,
    y_old: SVector<f64, N>,
    q: [SVector<f64, N>; 4],
}

impl<const N: usize> DenseStep<N> {
    fn new(t_old: f64, h: f64, y_old: SVector<f64, N>, k: &[SVector<f64, N>; 7]) -> Self {
        let mut q = [SVector::<f64, N>::zeros(); 4];
        for (j, qj) in q.iter_mut().enumerate() {
            for (stage, row) in P.iter().enumerate() {
                if row[j] != 0.0 {
                    *qj += k[stage] * row[j];
                }
            }
        }
        Self { t_old, h, y_old, q }
    }

    pub fn t_new(&self) -> f64 {
        self.t_old + self.h
    }

    /// Evaluate the continuous extension at `t`
    pub fn evaluate(&self, t: f64) -> SVector<f64, N> {
        let x = (t - self.t_old) / self.h;
        // Horner form of h * (q0 x + q1 x² + q2 x³ + q3 x⁴)
        let poly = ((self.q[3] * x + self.q[2]) * x + self.q[1]) * x + self.q[0];
        self.y_old + poly * (x * self.h)
    }
}

/// Piecewise continuous solution over `[t_start, t_end]`
#[derive(Debug, Clone)]
pub struct DenseSolution<const N: usize> {
    steps: Vec<DenseStep<N>>,
    t_start: f64,
    t_end: f64,
    y_start: SVector<f64, N>,
    pub stats: IntegrationStats,
}

impl<const N: usize> DenseSolution<N> {
    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    pub fn t_end(&self) -> f64 {
        self.t_end
    }

    pub fn steps(&self) -> &[DenseStep<N>] {
        &self.steps
    }

    /// Evaluate the solution at `t`, clamped to the integrated interval
    pub fn evaluate(&self, t: f64) -> SVector<f64, N> {
        if self.steps.is_empty() || t <= self.t_start {
            return self.y_start;
        }
        let t = t.min(self.t_end);
        // Binary search for the step containing t
        let idx = self
            .steps
            .partition_point(|step| step.t_old <= t)
            .saturating_sub(1);
        self.steps[idx].evaluate(t)
    }

    /// Evaluate the solution at each requested time
    pub fn sample(&self, times: &[f64]) -> Vec<SVector<f64, N>> {
        times.iter().map(|&t| self.evaluate(t)).collect()
    }
}

fn rms_norm<const N: usize>(v: &SVector<f64, N>) -> f64 {
    (v.norm_squared() / N as f64).sqrt()
}

fn check_finite<const N: usize>(v: &SVector<f64, N>, t: f64) -> Result<()> {
    if v.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(DragError::Integration(format!("non-finite state or derivative at t = {t}")))
    }
}

/// Starting step estimate from the local behaviour of the solution
fn select_initial_step<S, const N: usize>(
    system: &S,
    t0: f64,
    y0: &SVector<f64, N>,
    f0: &SVector<f64, N>,
    span: f64,
    tol: &Tolerances,
    stats: &mut IntegrationStats,
) -> f64
where
    S: OdeSystem<N>,
{
    let scale = y0.map(|y| tol.atol + y.abs() * tol.rtol);
    let d0 = rms_norm(&y0.component_div(&scale));
    let d1 = rms_norm(&f0.component_div(&scale));

    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
    let h0 = h0.min(span);

    let y1 = y0 + f0 * h0;
    let f1 = system.rhs(t0 + h0, &y1);
    stats.rhs_evaluations += 1;
    let d2 = rms_norm(&(f1 - f0).component_div(&scale)) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / 5.0)
    };

    (100.0 * h0).min(h1).min(span)
}

/// Integrate from `t0` to `t_end`, keeping the continuous solution.
pub fn integrate<S, const N: usize>(
    system: &S,
    t0: f64,
    y0: SVector<f64, N>,
    t_end: f64,
    tol: &Tolerances,
) -> Result<DenseSolution<N>>
where
    S: OdeSystem<N>,
{
    integrate_until(system, t0, y0, t_end, tol, |_| Ok(None))
}

/// Integrate from `t0` towards `t_end`, calling `stop` after every accepted
/// step. Returning `Ok(Some(t))` with `t` inside that step ends the
/// integration at `t`.
pub fn integrate_until<S, F, const N: usize>(
    system: &S,
    t0: f64,
    y0: SVector<f64, N>,
    t_end: f64,
    tol: &Tolerances,
    mut stop: F,
) -> Result<DenseSolution<N>>
where
    S: OdeSystem<N>,
    F: FnMut(&DenseStep<N>) -> Result<Option<f64>>,
{
    tol.validate()?;
    if !t0.is_finite() || !t_end.is_finite() {
        return Err(DragError::Integration(format!(
            "non-finite time span [{t0}, {t_end}]"
        )));
    }
    if t_end <= t0 {
        return Err(DragError::InvalidParameter(format!(
            "time span must be increasing, got [{t0}, {t_end}]"
        )));
    }
    check_finite(&y0, t0)?;

    let mut stats = IntegrationStats::default();
    let mut steps = Vec::new();

    let mut t = t0;
    let mut y = y0;
    let mut f = system.rhs(t, &y);
    stats.rhs_evaluations += 1;
    check_finite(&f, t)?;

    let mut h = select_initial_step(system, t0, &y0, &f, t_end - t0, tol, &mut stats);
    let mut previous_rejected = false;
    let error_exponent = -1.0 / 5.0;

    while t < t_end {
        if stats.accepted_steps + stats.rejected_steps >= tol.max_steps {
            return Err(DragError::Integration(format!(
                "step budget of {} exhausted at t = {t}",
                tol.max_steps
            )));
        }

        let remaining = t_end - t;
        let mut h_try = h.min(remaining);
        // Finish exactly on t_end instead of leaving a sliver
        if remaining - h_try < tol.min_step {
            h_try = remaining;
        }
        if h_try < tol.min_step {
            return Err(DragError::Integration(format!(
                "step size {h_try:e} fell below minimum {:e} at t = {t}",
                tol.min_step
            )));
        }

        let k1 = f;
        let k2 = system.rhs(t + C2 * h_try, &(y + k1 * (A21 * h_try)));
        let k3 = system.rhs(t + C3 * h_try, &(y + (k1 * A31 + k2 * A32) * h_try));
        let k4 = system.rhs(t + C4 * h_try, &(y + (k1 * A41 + k2 * A42 + k3 * A43) * h_try));
        let k5 = system.rhs(
            t + C5 * h_try,
            &(y + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h_try),
        );
        let k6 = system.rhs(
            t + h_try,
            &(y + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h_try),
        );
        let y_new = y + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h_try;
        let k7 = system.rhs(t + h_try, &y_new);
        stats.rhs_evaluations += 6;

        check_finite(&y_new, t + h_try)?;
        check_finite(&k7, t + h_try)?;

        let err = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h_try;
        let scale = y.zip_map(&y_new, |a, b| tol.atol + a.abs().max(b.abs()) * tol.rtol);
        let error_norm = rms_norm(&err.component_div(&scale));

        if error_norm < 1.0 {
            let mut factor = if error_norm == 0.0 {
                STEP_FACTOR_MAX
            } else {
                (STEP_SAFETY * error_norm.powf(error_exponent)).min(STEP_FACTOR_MAX)
            };
            if previous_rejected {
                factor = factor.min(1.0);
            }

            let dense = DenseStep::new(t, h_try, y, &[k1, k2, k3, k4, k5, k6, k7]);
            let t_new = t + h_try;
            stats.accepted_steps += 1;

            if let Some(t_stop) = stop(&dense)? {
                let t_stop = t_stop.clamp(t, t_new);
                steps.push(dense);
                debug!(?stats, t_stop, "integration stopped by event");
                return Ok(DenseSolution { steps, t_start: t0, t_end: t_stop, y_start: y0, stats });
            }

            steps.push(dense);
            t = if remaining - h_try <= 0.0 { t_end } else { t_new };
            y = y_new;
            f = k7;
            h = h_try * factor;
            previous_rejected = false;
        } else {
            let factor = (STEP_SAFETY * error_norm.powf(error_exponent)).max(STEP_FACTOR_MIN);
            h = h_try * factor;
            stats.rejected_steps += 1;
            previous_rejected = true;
        }
    }

    debug!(?stats, t_end, "integration finished");
    Ok(DenseSolution { steps, t_start: t0, t_end, y_start: y0, stats })
}

/// `n` evenly spaced times covering `[t0, t1]`, both ends included exactly
pub fn linspace(t0: f64, t1: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![t0],
        _ => {
            let step = (t1 - t0) / (n - 1) as f64;
            let mut times: Vec<f64> = (0..n).map(|i| t0 + i as f64 * step).collect();
            times[n - 1] = t1;
            times
        }
    }
}
