//! # Projectile Drag
//!
//! Fits velocity-dependent drag coefficients from measurements and integrates
//! the resulting 2D projectile motion with an adaptive Runge-Kutta solver.

// Re-export the main types and functions
pub use dataset::{load_dataset, Dataset, Observation};
pub use error::{DragError, Result};
pub use integrator::{integrate, integrate_until, linspace, DenseSolution, DenseStep, OdeSystem, Tolerances};
pub use derivatives::{compute_derivatives, MotionModel};
pub use pipeline::{analyze_dataset, run_pipeline, PipelineConfig, Report};
pub use quartiles::{calculate_quartiles, quantile, QuartileResult};
pub use regression::{
    fit_a, fit_b, fit_coefficients, linear_regression, predict_a, predict_b, predict_coefficients,
    DragCoefficients, RegressionFit,
};
pub use root_finding::{brent_root_find, RootResult};
pub use trajectory_analysis::{calculate_trajectory_characteristics, TrajectoryCharacteristics};
pub use trajectory_solver::{
    integrate_trajectory, solve_ode, Termination, TrajectoryPoint, TrajectoryRun, TrajectorySample,
    TrajectorySettings,
};

// Module declarations
pub mod analytical;
pub mod constants;
mod dataset;
mod derivatives;
mod error;
pub mod integrator;
pub mod output;
mod pipeline;
mod quartiles;
mod regression;
mod root_finding;
mod trajectory_analysis;
mod trajectory_solver;
