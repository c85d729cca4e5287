use nalgebra::Vector4;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_NUM_POINTS, DEFAULT_T_END, DEFAULT_T_START, G_ACCEL_MPS2, ROOT_FINDING_MAX_ITER,
    ROOT_FINDING_TOLERANCE,
};
use crate::derivatives::{MotionModel, IDX_VX, IDX_VY, IDX_X, IDX_Y};
use crate::error::{DragError, Result};
use crate::integrator::{integrate_until, linspace, DenseStep, IntegrationStats, Tolerances};
use crate::regression::DragCoefficients;
use crate::root_finding::brent_root_find;

/// When the integration stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Run the whole nominal time span, even below ground
    #[default]
    FixedDuration,
    /// Stop where the height first returns to zero on the way down
    GroundImpact,
}

/// Trajectory integration settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectorySettings {
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Nominal integration window (s)
    pub t_span: (f64, f64),
    /// Number of evenly spaced output samples
    pub num_points: usize,
    pub tolerances: Tolerances,
    pub termination: Termination,
}

impl Default for TrajectorySettings {
    fn default() -> Self {
        Self {
            gravity: G_ACCEL_MPS2,
            t_span: (DEFAULT_T_START, DEFAULT_T_END),
            num_points: DEFAULT_NUM_POINTS,
            tolerances: Tolerances::default(),
            termination: Termination::FixedDuration,
        }
    }
}

/// Initial conditions for trajectory solving
#[derive(Debug, Clone)]
pub struct InitialConditions {
    pub launch_angle_rad: f64,
    pub launch_speed: f64,
    pub initial_state: Vector4<f64>, // [x, y, vx, vy]
    pub t_span: (f64, f64),
}

/// Prepare initial conditions for trajectory solving
pub fn prepare_initial_conditions(
    angle_deg: f64,
    launch_speed: f64,
    settings: &TrajectorySettings,
) -> InitialConditions {
    let launch_angle_rad = angle_deg.to_radians();

    InitialConditions {
        launch_angle_rad,
        launch_speed,
        initial_state: Vector4::new(
            0.0,
            0.0,
            launch_speed * launch_angle_rad.cos(),
            launch_speed * launch_angle_rad.sin(),
        ),
        t_span: settings.t_span,
    }
}

/// Single trajectory sample point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl TrajectoryPoint {
    pub fn speed(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

/// Time-indexed trajectory stored column-wise
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectorySample {
    pub t: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
}

impl TrajectorySample {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            t: Vec::with_capacity(n),
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            vx: Vec::with_capacity(n),
            vy: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, point: TrajectoryPoint) {
        self.t.push(point.t);
        self.x.push(point.x);
        self.y.push(point.y);
        self.vx.push(point.vx);
        self.vy.push(point.vy);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn point(&self, i: usize) -> Option<TrajectoryPoint> {
        if i >= self.len() {
            return None;
        }
        Some(TrajectoryPoint {
            t: self.t[i],
            x: self.x[i],
            y: self.y[i],
            vx: self.vx[i],
            vy: self.vy[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = TrajectoryPoint> + '_ {
        (0..self.len()).filter_map(move |i| self.point(i))
    }
}

impl FromIterator<TrajectoryPoint> for TrajectorySample {
    fn from_iter<I: IntoIterator<Item = TrajectoryPoint>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut sample = TrajectorySample::with_capacity(iter.size_hint().0);
        for point in iter {
            sample.push(point);
        }
        sample
    }
}

/// Sampled trajectory plus integration bookkeeping
#[derive(Debug, Clone)]
pub struct TrajectoryRun {
    pub sample: TrajectorySample,
    /// Landing time when ground-impact termination fired
    pub impact_time: Option<f64>,
    pub stats: IntegrationStats,
}

/// Time within `step` where the height crosses zero going down, if any
fn find_ground_crossing(step: &DenseStep<4>) -> Result<Option<f64>> {
    let y_start = step.evaluate(step.t_old)[IDX_Y];
    let y_end = step.evaluate(step.t_new())[IDX_Y];

    if !(y_start > 0.0 && y_end <= 0.0) {
        return Ok(None);
    }
    if y_end == 0.0 {
        return Ok(Some(step.t_new()));
    }

    let height = |t: f64| step.evaluate(t)[IDX_Y];
    let root = brent_root_find(height, step.t_old, step.t_new(), ROOT_FINDING_TOLERANCE, ROOT_FINDING_MAX_ITER)?;
    if !root.success {
        warn!(t = root.root, residual = root.final_error, "ground crossing not fully converged");
    }
    Ok(Some(root.root))
}

/// Integrate the motion equations and sample the result
pub fn integrate_trajectory(
    angle_deg: f64,
    launch_speed: f64,
    coefficients: DragCoefficients,
    settings: &TrajectorySettings,
) -> Result<TrajectoryRun> {
    if settings.num_points < 2 {
        return Err(DragError::InvalidParameter(format!(
            "need at least 2 output points, got {}",
            settings.num_points
        )));
    }
    let inputs = [angle_deg, launch_speed, coefficients.a, coefficients.b, settings.gravity];
    if inputs.iter().any(|v| !v.is_finite()) {
        return Err(DragError::Integration(format!(
            "non-finite launch parameters (angle {angle_deg}, speed {launch_speed}, a {}, b {}, g {})",
            coefficients.a, coefficients.b, settings.gravity
        )));
    }

    let initial = prepare_initial_conditions(angle_deg, launch_speed, settings);
    let model = MotionModel::new(coefficients, settings.gravity);
    let (t0, t1) = initial.t_span;

    let solution = match settings.termination {
        Termination::FixedDuration => {
            integrate_until(&model, t0, initial.initial_state, t1, &settings.tolerances, |_| Ok(None))?
        }
        Termination::GroundImpact => integrate_until(
            &model,
            t0,
            initial.initial_state,
            t1,
            &settings.tolerances,
            find_ground_crossing,
        )?,
    };

    let t_final = solution.t_end();
    let impact_time = (t_final < t1).then_some(t_final);
    if settings.termination == Termination::GroundImpact && impact_time.is_none() {
        debug!(t1, "no ground crossing before end of time span");
    }

    let times = linspace(t0, t_final, settings.num_points);
    let sample: TrajectorySample = times
        .iter()
        .zip(solution.sample(&times))
        .map(|(&t, state)| TrajectoryPoint {
            t,
            x: state[IDX_X],
            y: state[IDX_Y],
            vx: state[IDX_VX],
            vy: state[IDX_VY],
        })
        .collect();

    debug!(
        points = sample.len(),
        accepted = solution.stats.accepted_steps,
        rejected = solution.stats.rejected_steps,
        "trajectory integrated"
    );

    Ok(TrajectoryRun { sample, impact_time, stats: solution.stats })
}

/// Integrate and return only the sampled trajectory
pub fn solve_ode(
    angle_deg: f64,
    launch_speed: f64,
    coefficients: DragCoefficients,
    settings: &TrajectorySettings,
) -> Result<TrajectorySample> {
    integrate_trajectory(angle_deg, launch_speed, coefficients, settings).map(|run| run.sample)
}
