//! Quaternion kinematics for attitude propagation
//!
//! The rigid-body plant integrates attitude as a unit quaternion:
//! q_dot = 1/2 * Lambda(q) [0; omega], renormalised after each step.

use nalgebra::{Matrix4, Quaternion, UnitQuaternion, Vector3, Vector4};

/// Quaternion derivative for a body-frame angular velocity
///
/// q_dot = 1/2 * Lambda(q) [0; omega] with Lambda(q) the left
/// quaternion-multiplication matrix:
///
/// ```text
/// Lambda(q) = [w  -x  -y  -z]
///             [x   w  -z   y]
///             [y   z   w  -x]
///             [z  -y   x   w]
/// ```
pub fn quaternion_derivative(q: &UnitQuaternion<f64>, omega: &Vector3<f64>) -> Vector4<f64> {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);

    let omega_quat = Vector4::new(0.0, omega.x, omega.y, omega.z);

    let lambda = Matrix4::new(
        w, -x, -y, -z,
        x, w, -z, y,
        y, z, w, -x,
        z, -y, x, w,
    );

    0.5 * lambda * omega_quat
}

/// Integrate a quaternion derivative over one step
///
/// q_new = normalize(q + q_dot * dt); normalisation keeps the attitude
/// on the unit sphere.
pub fn integrate_quaternion(
    q: &UnitQuaternion<f64>,
    q_dot: &Vector4<f64>,
    dt: f64,
) -> UnitQuaternion<f64> {
    let q_vec = Vector4::new(q.w, q.i, q.j, q.k) + q_dot * dt;
    UnitQuaternion::from_quaternion(Quaternion::new(q_vec[0], q_vec[1], q_vec[2], q_vec[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_derivative_zero_rate() {
        let q = UnitQuaternion::identity();
        let q_dot = quaternion_derivative(&q, &Vector3::zeros());
        assert_relative_eq!(q_dot.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_derivative_pure_yaw() {
        let q = UnitQuaternion::identity();
        let q_dot = quaternion_derivative(&q, &Vector3::new(0.0, 0.0, 1.0));

        // Identity attitude, z-rotation: q_dot = 0.5 * [0, 0, 0, 1].
        assert_relative_eq!(q_dot[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(q_dot[3], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_integration_stays_unit() {
        let mut q = UnitQuaternion::identity();
        let omega = Vector3::new(0.3, -0.1, PI);
        let dt = 0.001;

        for _ in 0..1000 {
            let q_dot = quaternion_derivative(&q, &omega);
            q = integrate_quaternion(&q, &q_dot, dt);
        }

        let norm = (q.w.powi(2) + q.i.powi(2) + q.j.powi(2) + q.k.powi(2)).sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_integration_matches_axis_angle() {
        // Constant z-rate for one second rotates by the same angle.
        let mut q = UnitQuaternion::identity();
        let omega = Vector3::new(0.0, 0.0, 0.5);
        let dt = 0.0005;

        for _ in 0..2000 {
            let q_dot = quaternion_derivative(&q, &omega);
            q = integrate_quaternion(&q, &q_dot, dt);
        }

        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5);
        assert_relative_eq!(q.angle_to(&expected), 0.0, epsilon = 1e-5);
    }
}
