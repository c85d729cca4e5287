use nalgebra::Vector4;

use crate::integrator::OdeSystem;
use crate::regression::DragCoefficients;

/// Index of each component in the motion state `[x, y, vx, vy]`
pub const IDX_X: usize = 0;
pub const IDX_Y: usize = 1;
pub const IDX_VX: usize = 2;
pub const IDX_VY: usize = 3;

/// Planar point-mass motion under gravity and velocity-proportional drag.
///
/// ```text
/// dX/dt  = Vx
/// dY/dt  = Vy
/// dVx/dt = -a * Vx
/// dVy/dt = -g - b * Vy
/// ```
///
/// `b` is fitted against squared speed and is called the quadratic
/// coefficient, yet it multiplies `Vy` linearly here. The reference results
/// were produced with this form, so it is kept as is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionModel {
    pub coefficients: DragCoefficients,
    pub gravity: f64,
}

impl MotionModel {
    pub fn new(coefficients: DragCoefficients, gravity: f64) -> Self {
        Self { coefficients, gravity }
    }
}

impl OdeSystem<4> for MotionModel {
    fn rhs(&self, _t: f64, state: &Vector4<f64>) -> Vector4<f64> {
        compute_derivatives(state, &self.coefficients, self.gravity)
    }
}

/// Compute state derivatives for trajectory integration
pub fn compute_derivatives(state: &Vector4<f64>, coefficients: &DragCoefficients, gravity: f64) -> Vector4<f64> {
    let vx = state[IDX_VX];
    let vy = state[IDX_VY];

    Vector4::new(
        vx,
        vy,
        -coefficients.a * vx,
        -gravity - coefficients.b * vy,
    )
}
