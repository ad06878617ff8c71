//! SO(3) kinematics for geometric attitude control
//!
//! Implements the hat/vee maps, the geometric tracking errors, and the
//! commanded body-frame angular acceleration used by the composite
//! controller. Error conventions follow Lee et al., "Geometric Tracking
//! Control of a Quadrotor UAV on SE(3)".

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

/// Hat map: converts a vector to its skew-symmetric matrix
///
/// For v = [x, y, z]^T:
/// ```text
/// [v]x = [ 0  -z   y]
///        [ z   0  -x]
///        [-y   x   0]
/// ```
///
/// satisfies hat(v) * w = v x w for all w.
pub fn hat(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y,
        v.z, 0.0, -v.x,
        -v.y, v.x, 0.0,
    )
}

/// Vee map: extracts the vector from a skew-symmetric matrix
///
/// Inverse of [`hat`]: vee(hat(v)) = v. Only meaningful for
/// skew-symmetric input; callers holding a general matrix M pass its
/// skew part (M - M^T) / 2.
pub fn vee(m: &Matrix3<f64>) -> Vector3<f64> {
    Vector3::new(m[(2, 1)], m[(0, 2)], m[(1, 0)])
}

/// Attitude tracking error on SO(3)
///
/// e_R = 1/2 * vee(R_d^T R - R^T R_d), computed as 1/2 * vee(E - E^T)
/// with E = R_d^T R. Zero iff R = R_d; defined almost globally (the
/// singular set sits at trace error Psi = 2).
pub fn attitude_error(r: &Matrix3<f64>, r_d: &Matrix3<f64>) -> Vector3<f64> {
    let e = r_d.transpose() * r;
    0.5 * vee(&(e - e.transpose()))
}

/// Angular velocity tracking error in the body frame
///
/// e_Omega = Omega - (R^T R_d) Omega_d
pub fn angular_velocity_error(
    omega: &Vector3<f64>,
    r: &Matrix3<f64>,
    r_d: &Matrix3<f64>,
    omega_d: &Vector3<f64>,
) -> Vector3<f64> {
    omega - (r.transpose() * r_d) * omega_d
}

/// Body-frame angular acceleration commanded by the reference
///
/// alpha = E * alpha_d - hat(Omega) * E * Omega_d with E = R^T R_d.
/// This is the acceleration the body would need to be tracking the
/// reference exactly; it feeds the rigid-body regressor.
pub fn commanded_angular_accel(
    r: &Matrix3<f64>,
    r_d: &Matrix3<f64>,
    omega: &Vector3<f64>,
    omega_d: &Vector3<f64>,
    alpha_d: &Vector3<f64>,
) -> Vector3<f64> {
    let e = r.transpose() * r_d;
    e * alpha_d - hat(omega) * (e * omega_d)
}

/// Trace-based attitude error measure
///
/// Psi = (3 - tr(R^T R_d)) / 2, the configuration error of the attitude
/// Lyapunov function. Ranges over [0, 2]; Psi = 2 on the antipodal set.
pub fn trace_attitude_error(r: &Matrix3<f64>, r_d: &Matrix3<f64>) -> f64 {
    (3.0 - (r.transpose() * r_d).trace()) / 2.0
}

/// Time derivative of the trace error
///
/// dot_Psi = e_R . e_Omega
pub fn trace_attitude_error_rate(e_r: &Vector3<f64>, e_omega: &Vector3<f64>) -> f64 {
    e_r.dot(e_omega)
}

/// Rotation matrix from a (w, x, y, z) quaternion
///
/// Host-side attitude samples arrive as quaternions; the controller
/// works on rotation matrices.
pub fn rotation_from_quaternion(q: &UnitQuaternion<f64>) -> Matrix3<f64> {
    *q.to_rotation_matrix().matrix()
}

/// Rotation matrix from raw (w, x, y, z) components, renormalised
pub fn rotation_from_wxyz(w: f64, x: f64, y: f64, z: f64) -> Matrix3<f64> {
    let q = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));
    rotation_from_quaternion(&q)
}

/// Verify rotation matrix properties
///
/// Returns true iff ||R^T R - I||_F < tol and |det R - 1| < tol.
pub fn is_valid_rotation(r: &Matrix3<f64>, tol: f64) -> bool {
    let ortho_error = (r.transpose() * r - Matrix3::identity()).norm();
    ortho_error < tol && (r.determinant() - 1.0).abs() < tol
}
