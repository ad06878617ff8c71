//! Simulation configuration

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Closed-loop simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Simulation time step [s]
    pub dt: f64,
    /// Total simulation duration [s]
    pub duration: f64,
    /// True plant inertia diagonal [kg m^2]
    pub inertia: Vector3<f64>,
    /// Initial body rate [rad/s]
    pub initial_rate: Vector3<f64>,
    /// Gyro noise standard deviation [rad/s]; 0 disables the sensor model
    pub gyro_noise_std: f64,
    /// Noise generator seed
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.01, // 100 Hz control rate
            duration: 10.0,
            inertia: Vector3::new(0.05, 0.045, 0.03),
            initial_rate: Vector3::zeros(),
            gyro_noise_std: 0.0,
            seed: 12345,
        }
    }
}

impl SimConfig {
    /// Number of control ticks over the configured duration
    pub fn steps(&self) -> usize {
        (self.duration / self.dt).round() as usize
    }
}
