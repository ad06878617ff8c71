//! Linear-in-parameters rigid-body torque regressor
//!
//! Builds the matrix Y(Omega, alpha) such that
//!
//! ```text
//! tau_rb = J*alpha - Omega x (J*Omega) = Y(Omega, alpha) * theta
//! ```
//!
//! where theta stacks the inertia parameters: [Jxx, Jyy, Jzz] for a
//! diagonal tensor, [Jxx, Jyy, Jzz, Jxy, Jxz, Jyz] for a full symmetric
//! one. Linearity in theta is what makes gradient adaptation of the
//! inertia possible.

use nalgebra::{Matrix3, Matrix3x6, Vector3, Vector6};

use crate::math::hat;

/// Regressor matrix for a diagonal inertia tensor
///
/// For J = diag(Jxx, Jyy, Jzz), rows are body-axis torques and columns
/// the diagonal parameters:
///
/// ```text
/// Y_d = [ alpha_x   wy*wz   -wy*wz ]
///       [ -wx*wz    alpha_y  wx*wz ]
///       [ wx*wy    -wx*wy   alpha_z]
/// ```
pub fn regressor_diagonal(omega: &Vector3<f64>, alpha: &Vector3<f64>) -> Matrix3<f64> {
    let (wx, wy, wz) = (omega.x, omega.y, omega.z);
    let (ax, ay, az) = (alpha.x, alpha.y, alpha.z);

    Matrix3::new(
        ax, wy * wz, -wy * wz,
        -wx * wz, ay, wx * wz,
        wx * wy, -wx * wy, az,
    )
}

/// Regressor matrix for a full symmetric inertia tensor
///
/// Columns correspond to [Jxx, Jyy, Jzz, Jxy, Jxz, Jyz]; each entry is
/// obtained by expanding J*alpha - Omega x (J*Omega) and collecting the
/// six parameters.
pub fn regressor_full(omega: &Vector3<f64>, alpha: &Vector3<f64>) -> Matrix3x6<f64> {
    let (wx, wy, wz) = (omega.x, omega.y, omega.z);
    let (ax, ay, az) = (alpha.x, alpha.y, alpha.z);

    Matrix3x6::new(
        ax, wy * wz, -wy * wz, ay + wx * wz, az - wx * wy, -wy * wy + wz * wz,
        -wx * wz, ay, wx * wz, ax - wy * wz, wx * wx - wz * wz, az + wx * wy,
        wx * wy, -wx * wy, az, wy * wy - wx * wx, ax + wy * wz, ay - wx * wz,
    )
}

/// Diagonal parameter vector [Jxx, Jyy, Jzz] of an inertia matrix
pub fn theta_diagonal(j: &Matrix3<f64>) -> Vector3<f64> {
    Vector3::new(j[(0, 0)], j[(1, 1)], j[(2, 2)])
}

/// Full parameter vector [Jxx, Jyy, Jzz, Jxy, Jxz, Jyz] of a symmetric
/// inertia matrix
pub fn theta_full(j: &Matrix3<f64>) -> Vector6<f64> {
    Vector6::new(
        j[(0, 0)], j[(1, 1)], j[(2, 2)],
        j[(0, 1)], j[(0, 2)], j[(1, 2)],
    )
}

/// Inertia matrix reconstructed from a diagonal parameter vector
pub fn inertia_from_theta_diagonal(theta: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::from_diagonal(theta)
}

/// Inertia matrix reconstructed from a full parameter vector
pub fn inertia_from_theta_full(theta: &Vector6<f64>) -> Matrix3<f64> {
    Matrix3::new(
        theta[0], theta[3], theta[4],
        theta[3], theta[1], theta[5],
        theta[4], theta[5], theta[2],
    )
}

/// Rigid-body torque from the true inertia
///
/// tau = J*alpha - Omega x (J*Omega). Ground truth for the regressor
/// factorisation and for the simulation plant.
pub fn rigid_body_torque(
    j: &Matrix3<f64>,
    omega: &Vector3<f64>,
    alpha: &Vector3<f64>,
) -> Vector3<f64> {
    j * alpha - hat(omega) * (j * omega)
}
