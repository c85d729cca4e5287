/// Physical and numerical constants used by the drag pipeline

/// Gravitational acceleration in m/s²
///
/// Value: 9.8 (rounded standard gravity)
/// The reference analysis used the rounded value; keep it so reports stay
/// comparable. Pass a different value through `TrajectorySettings::gravity`.
pub const G_ACCEL_MPS2: f64 = 9.8;

/// Default start of the integration window (s)
pub const DEFAULT_T_START: f64 = 0.0;

/// Default end of the integration window (s)
pub const DEFAULT_T_END: f64 = 10.0;

/// Default number of evenly spaced output samples
pub const DEFAULT_NUM_POINTS: usize = 500;

/// Default launch angle for the pipeline run (degrees)
pub const DEFAULT_LAUNCH_ANGLE_DEG: f64 = 30.0;

/// Quantile of the observed speeds used as the example launch speed
pub const DEFAULT_SPEED_QUANTILE: f64 = 0.75;

/// Quantile levels reported by the quartile summary
pub const QUARTILE_LEVELS: [f64; 3] = [0.25, 0.5, 0.75];

// Adaptive stepper defaults
//
// Relative tolerance matches the usual default of general purpose RK45
// drivers. The absolute floor is tight because positions reach hundreds of
// metres while velocities can decay towards zero.

/// Relative local error tolerance
pub const DEFAULT_RTOL: f64 = 1e-6;

/// Absolute local error tolerance
pub const DEFAULT_ATOL: f64 = 1e-9;

/// Upper bound on accepted plus rejected steps before giving up
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// Smallest step the controller may take before reporting failure (s)
pub const MIN_STEP_SIZE: f64 = 1e-12;

/// Step controller safety factor
pub const STEP_SAFETY: f64 = 0.9;

/// Step growth/shrink bounds per attempt
pub const STEP_FACTOR_MIN: f64 = 0.2;
pub const STEP_FACTOR_MAX: f64 = 10.0;

/// Tolerance for root finding algorithms
pub const ROOT_FINDING_TOLERANCE: f64 = 1e-10;

/// Iteration cap for Brent's method
pub const ROOT_FINDING_MAX_ITER: usize = 100;

// Bounds of the interactive no-drag explorer

/// Launch speed slider range (m/s) and default
pub const ANALYTIC_SPEED_MIN: f64 = 1.0;
pub const ANALYTIC_SPEED_MAX: f64 = 300.0;
pub const ANALYTIC_SPEED_DEFAULT: f64 = 50.0;

/// Launch angle slider range (degrees) and default
pub const ANALYTIC_ANGLE_MIN: f64 = 10.0;
pub const ANALYTIC_ANGLE_MAX: f64 = 80.0;
pub const ANALYTIC_ANGLE_DEFAULT: f64 = 45.0;
