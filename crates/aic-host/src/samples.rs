//! Sample and command types exchanged with the embedding host
//!
//! Attitude arrives as a (w, x, y, z) quaternion plus body rates; the
//! controller output leaves as a per-axis normalised torque command.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use aic_core::math::rotation_from_wxyz;

/// Measured vehicle attitude and body rate for one tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttitudeSample {
    /// Attitude quaternion (w, x, y, z), body to world
    pub q: [f64; 4],
    /// Body angular velocity [rad/s]
    pub angular_velocity: Vector3<f64>,
    /// Monotonic sample time [us]
    pub timestamp_us: u64,
}

impl AttitudeSample {
    /// Rotation matrix of the sampled attitude
    pub fn rotation(&self) -> Matrix3<f64> {
        rotation_from_wxyz(self.q[0], self.q[1], self.q[2], self.q[3])
    }
}

/// Attitude, rate, and acceleration setpoint for one tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttitudeSetpoint {
    /// Desired attitude quaternion (w, x, y, z)
    pub q_d: [f64; 4],
    /// Desired body angular velocity [rad/s]
    pub angular_velocity_d: Vector3<f64>,
    /// Desired body angular acceleration [rad/s^2]
    pub angular_accel_d: Vector3<f64>,
}

impl AttitudeSetpoint {
    /// Hold a fixed attitude at zero rate
    pub fn hold(q_d: [f64; 4]) -> Self {
        Self {
            q_d,
            angular_velocity_d: Vector3::zeros(),
            angular_accel_d: Vector3::zeros(),
        }
    }

    /// Rotation matrix of the desired attitude
    pub fn rotation(&self) -> Matrix3<f64> {
        rotation_from_wxyz(self.q_d[0], self.q_d[1], self.q_d[2], self.q_d[3])
    }
}

/// Normalised per-axis torque command
///
/// Each component is torque / tau_max clamped to [-1, 1]; the mixer
/// downstream maps it onto the physical rotors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    /// Monotonic emission time [us]
    pub timestamp_us: u64,
}

impl ActuatorCommand {
    /// Normalise a torque vector against the saturation limit
    pub fn from_torque(tau: &Vector3<f64>, tau_max: f64, timestamp_us: u64) -> Self {
        Self {
            roll: (tau.x / tau_max).clamp(-1.0, 1.0),
            pitch: (tau.y / tau_max).clamp(-1.0, 1.0),
            yaw: (tau.z / tau_max).clamp(-1.0, 1.0),
            timestamp_us,
        }
    }

    /// Torque vector recovered from the normalised command
    pub fn torque(&self, tau_max: f64) -> Vector3<f64> {
        Vector3::new(self.roll, self.pitch, self.yaw) * tau_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_rotation_identity() {
        let sample = AttitudeSample {
            q: [1.0, 0.0, 0.0, 0.0],
            angular_velocity: Vector3::zeros(),
            timestamp_us: 0,
        };
        assert_relative_eq!(sample.rotation(), Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_unnormalised_quaternion_is_renormalised() {
        let sample = AttitudeSample {
            q: [2.0, 0.0, 0.0, 0.0],
            angular_velocity: Vector3::zeros(),
            timestamp_us: 0,
        };
        assert!(aic_core::math::is_valid_rotation(&sample.rotation(), 1e-9));
    }

    #[test]
    fn test_command_normalisation_clamps() {
        let cmd = ActuatorCommand::from_torque(&Vector3::new(0.1, -0.025, 0.0), 0.05, 42);

        assert_relative_eq!(cmd.roll, 1.0, epsilon = 1e-12);
        assert_relative_eq!(cmd.pitch, -0.5, epsilon = 1e-12);
        assert_relative_eq!(cmd.yaw, 0.0, epsilon = 1e-12);
        assert_eq!(cmd.timestamp_us, 42);
    }

    #[test]
    fn test_command_torque_round_trip() {
        let tau = Vector3::new(0.02, -0.01, 0.005);
        let cmd = ActuatorCommand::from_torque(&tau, 0.05, 0);
        assert_relative_eq!(cmd.torque(0.05), tau, epsilon = 1e-12);
    }
}
