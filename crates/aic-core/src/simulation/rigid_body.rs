//! Rotational rigid-body dynamics
//!
//! The attitude plant used for closed-loop validation:
//!
//! ```text
//! q_dot     = 1/2 Lambda(q) [0; omega]
//! J*omega_dot = tau - omega x (J*omega)
//! ```

use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::{integrate_quaternion, quaternion_derivative, rk4_vec3};

/// Attitude and body-rate state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttitudeState {
    /// Orientation (body to world)
    pub orientation: UnitQuaternion<f64>,
    /// Angular velocity [rad/s] (body frame)
    pub angular_velocity: Vector3<f64>,
}

impl Default for AttitudeState {
    fn default() -> Self {
        Self {
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

impl AttitudeState {
    /// Rotation matrix from body to world
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        *self.orientation.to_rotation_matrix().matrix()
    }
}

/// Rigid body with a fixed inertia tensor
#[derive(Debug, Clone)]
pub struct RigidBody {
    inertia: Matrix3<f64>,
    inertia_inv: Matrix3<f64>,
}

impl RigidBody {
    /// Create a rigid body from an SPD inertia tensor
    pub fn new(inertia: Matrix3<f64>) -> Self {
        let inertia_inv = inertia
            .try_inverse()
            .expect("inertia tensor must be invertible");
        Self {
            inertia,
            inertia_inv,
        }
    }

    /// Inertia tensor [kg m^2]
    pub fn inertia(&self) -> &Matrix3<f64> {
        &self.inertia
    }

    /// Angular acceleration under an applied torque
    ///
    /// omega_dot = J^{-1} (tau - omega x (J*omega))
    pub fn angular_acceleration(&self, omega: &Vector3<f64>, tau: &Vector3<f64>) -> Vector3<f64> {
        self.inertia_inv * (tau - omega.cross(&(self.inertia * omega)))
    }

    /// Propagate the state one step under a constant torque
    ///
    /// RK4 on the angular velocity, quaternion derivative at the midpoint
    /// rate for the orientation.
    pub fn step(&self, state: &AttitudeState, tau: &Vector3<f64>, dt: f64) -> AttitudeState {
        let omega_new = rk4_vec3(&state.angular_velocity, 0.0, dt, |_t, w| {
            self.angular_acceleration(w, tau)
        });

        let omega_mid = 0.5 * (state.angular_velocity + omega_new);
        let q_dot = quaternion_derivative(&state.orientation, &omega_mid);
        let orientation = integrate_quaternion(&state.orientation, &q_dot, dt);

        AttitudeState {
            orientation,
            angular_velocity: omega_new,
        }
    }
}
