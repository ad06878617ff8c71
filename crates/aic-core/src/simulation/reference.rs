//! Analytic attitude references
//!
//! Reference trajectories with matching angular velocity and acceleration,
//! so the regressor sees consistent (R_d, Omega_d, alpha_d) triples.

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// One sampled reference point
#[derive(Debug, Clone)]
pub struct ReferenceSample {
    /// Desired attitude
    pub r_d: Matrix3<f64>,
    /// Desired body angular velocity [rad/s]
    pub omega_d: Vector3<f64>,
    /// Desired body angular acceleration [rad/s^2]
    pub alpha_d: Vector3<f64>,
}

impl ReferenceSample {
    /// Constant attitude hold
    pub fn hold(r_d: Matrix3<f64>) -> Self {
        Self {
            r_d,
            omega_d: Vector3::zeros(),
            alpha_d: Vector3::zeros(),
        }
    }
}

/// Sinusoidal single-axis roll reference
///
/// R_d(t) = rot_x(A sin(2 pi f t)); Omega_d and alpha_d follow
/// analytically along the body x-axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinusoidalRollReference {
    /// Roll amplitude [rad]
    pub amplitude: f64,
    /// Oscillation frequency [Hz]
    pub frequency: f64,
}

impl Default for SinusoidalRollReference {
    fn default() -> Self {
        Self {
            amplitude: 0.1,
            frequency: 1.0,
        }
    }
}

impl SinusoidalRollReference {
    pub fn sample(&self, t: f64) -> ReferenceSample {
        let w = TAU * self.frequency;
        let phase = w * t;

        let angle = self.amplitude * phase.sin();
        let rate = self.amplitude * w * phase.cos();
        let accel = -self.amplitude * w * w * phase.sin();

        ReferenceSample {
            r_d: *Rotation3::from_axis_angle(&Vector3::x_axis(), angle).matrix(),
            omega_d: Vector3::new(rate, 0.0, 0.0),
            alpha_d: Vector3::new(accel, 0.0, 0.0),
        }
    }
}
