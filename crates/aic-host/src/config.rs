//! Host configuration surface
//!
//! All controller tunables in one serde structure, loadable from JSON.
//! Validation happens before a controller is built; the control path
//! never sees an inconsistent configuration.

use std::path::Path;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aic_core::control::{AdaptationParams, AicController, ControlGains};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Host-side controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// 3-parameter diagonal inertia model vs. full 6-parameter symmetric
    pub use_diagonal_inertia: bool,
    /// Initial inertia diagonal [Jxx, Jyy, Jzz] [kg m^2]
    pub j_init_diag: Vector3<f64>,
    /// Initial inertia products [Jxy, Jxz, Jyz] [kg m^2] (full model only)
    pub j_init_offdiag: Vector3<f64>,
    /// Composite controller gains
    pub gains: ControlGains,
    /// Adaptation tunables, including the IWG/plain-gradient switch
    pub adaptation: AdaptationParams,
    /// Actuator saturation limit [N m]
    pub tau_max: f64,
    /// Composite-error filter coefficient in [0, 1]
    pub filter_alpha: f64,
    /// Control loop rate [Hz]
    pub rate_hz: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            use_diagonal_inertia: true,
            j_init_diag: Vector3::new(0.040, 0.040, 0.025),
            j_init_offdiag: Vector3::zeros(),
            gains: ControlGains::default(),
            adaptation: AdaptationParams::default(),
            tau_max: 0.05,
            filter_alpha: 0.1,
            rate_hz: 100.0,
        }
    }
}

impl HostConfig {
    /// Load and validate a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Initial inertia matrix assembled from the configured parameters
    pub fn j_init(&self) -> Matrix3<f64> {
        let d = &self.j_init_diag;
        let o = &self.j_init_offdiag;
        Matrix3::new(
            d.x, o.x, o.y,
            o.x, d.y, o.z,
            o.y, o.z, d.z,
        )
    }

    /// Check every tunable against its admissible range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.adaptation;

        if !(a.j_min > 0.0 && a.j_max > a.j_min) {
            return Err(ConfigError::Invalid(format!(
                "inertia bounds must satisfy 0 < J_min < J_max, got [{}, {}]",
                a.j_min, a.j_max
            )));
        }

        let eigs = self.j_init().symmetric_eigenvalues();
        if eigs.iter().any(|&e| e < a.j_min || e > a.j_max) {
            return Err(ConfigError::Invalid(format!(
                "J_init eigenvalues {:?} outside [{}, {}]",
                eigs.as_slice(),
                a.j_min,
                a.j_max
            )));
        }

        if a.gamma <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "adaptation gain gamma must be positive, got {}",
                a.gamma
            )));
        }
        if a.sigma < 0.0 || a.beta < 0.0 || a.gamma_ee < 0.0 {
            return Err(ConfigError::Invalid(
                "sigma, beta, and gamma_ee must be non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&a.lambda) {
            return Err(ConfigError::Invalid(format!(
                "information weight lambda must lie in [0, 1], got {}",
                a.lambda
            )));
        }

        for (name, gain) in [
            ("K_R", &self.gains.k_r),
            ("K_Omega", &self.gains.k_omega),
            ("K", &self.gains.k_damping),
        ] {
            if gain.iter().any(|&g| g <= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive on every axis"
                )));
            }
        }
        if self.gains.c <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "composite weight c must be positive, got {}",
                self.gains.c
            )));
        }

        if self.tau_max < 0.01 {
            return Err(ConfigError::Invalid(format!(
                "tau_max must be at least 0.01 N m, got {}",
                self.tau_max
            )));
        }
        if !(0.0..=1.0).contains(&self.filter_alpha) {
            return Err(ConfigError::Invalid(format!(
                "filter_alpha must lie in [0, 1], got {}",
                self.filter_alpha
            )));
        }

        // The tick driver clamps dt to [0.002, 0.1] s; a rate outside
        // 10..500 Hz would fight the clamp every tick.
        if !(10.0..=500.0).contains(&self.rate_hz) {
            return Err(ConfigError::Invalid(format!(
                "rate_hz must lie in [10, 500], got {}",
                self.rate_hz
            )));
        }

        Ok(())
    }

    /// Build a controller configured from this surface
    pub fn build_controller(&self) -> Result<AicController, ConfigError> {
        self.validate()?;

        let mut controller = AicController::with_params(
            &self.j_init(),
            self.use_diagonal_inertia,
            self.adaptation,
            self.gains.clone(),
        );
        controller.set_saturation_limit(self.tau_max);
        controller.set_filter_bandwidth(self.filter_alpha);
        Ok(controller)
    }

    /// Nominal control period [s]
    pub fn period(&self) -> f64 {
        1.0 / self.rate_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HostConfig::default().validate().is_ok());
    }

    #[test]
    fn test_j_init_assembly() {
        let config = HostConfig {
            j_init_offdiag: Vector3::new(0.002, 0.0, -0.001),
            ..HostConfig::default()
        };
        let j = config.j_init();

        assert_relative_eq!(j, j.transpose(), epsilon = 1e-12);
        assert_relative_eq!(j[(0, 1)], 0.002, epsilon = 1e-12);
        assert_relative_eq!(j[(1, 2)], -0.001, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_out_of_bounds_inertia() {
        let config = HostConfig {
            j_init_diag: Vector3::new(2.0, 0.04, 0.025),
            ..HostConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_nonpositive_gains() {
        let mut config = HostConfig::default();
        config.gains.k_r.y = 0.0;
        assert!(config.validate().is_err());

        let mut config = HostConfig::default();
        config.adaptation.gamma = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_rate() {
        let config = HostConfig {
            rate_hz: 1000.0,
            ..HostConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = HostConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let parsed: HostConfig = serde_json::from_str(&text).unwrap();

        assert_relative_eq!(parsed.tau_max, config.tau_max, epsilon = 1e-12);
        assert_relative_eq!(parsed.j_init(), config.j_init(), epsilon = 1e-12);
        assert_eq!(parsed.use_diagonal_inertia, config.use_diagonal_inertia);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: HostConfig = serde_json::from_str(r#"{"tau_max": 0.08}"#).unwrap();
        assert_relative_eq!(parsed.tau_max, 0.08, epsilon = 1e-12);
        assert_relative_eq!(parsed.rate_hz, 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_build_controller_applies_limits() {
        let config = HostConfig {
            tau_max: 0.08,
            ..HostConfig::default()
        };
        let controller = config.build_controller().unwrap();
        assert_relative_eq!(controller.saturation_limit(), 0.08, epsilon = 1e-12);
    }
}
