//! Per-tick controller driver
//!
//! Bridges host samples to the core controller: derives the timestep from
//! the monotonic sample clock, clamps it to the admissible window, runs
//! the control computation, and normalises the torque for the mixer. The
//! first tick only initialises the clock and emits nothing.

use tracing::warn;

use aic_core::control::{AicController, ControllerStatus};

use crate::config::{ConfigError, HostConfig};
use crate::samples::{ActuatorCommand, AttitudeSample, AttitudeSetpoint};

/// Shortest accepted timestep [s] (500 Hz)
pub const DT_MIN: f64 = 0.002;

/// Longest accepted timestep [s] (10 Hz)
pub const DT_MAX: f64 = 0.1;

/// Drives one controller instance from a stream of samples
#[derive(Debug)]
pub struct TickDriver {
    controller: AicController,
    tau_max: f64,
    last_timestamp_us: Option<u64>,
    last_dt: f64,
    ticks: u64,
    warned_rotation: bool,
    warned_iwg: bool,
}

impl TickDriver {
    pub fn new(config: &HostConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            controller: config.build_controller()?,
            tau_max: config.tau_max,
            last_timestamp_us: None,
            last_dt: 0.0,
            ticks: 0,
            warned_rotation: false,
            warned_iwg: false,
        })
    }

    /// Process one sample/setpoint pair
    ///
    /// Returns `None` on the warm-up tick that initialises the clock;
    /// every later call returns a normalised actuator command.
    pub fn tick(
        &mut self,
        sample: &AttitudeSample,
        setpoint: &AttitudeSetpoint,
    ) -> Option<ActuatorCommand> {
        let last = match self.last_timestamp_us {
            Some(last) => last,
            None => {
                self.last_timestamp_us = Some(sample.timestamp_us);
                return None;
            }
        };

        let elapsed_us = sample.timestamp_us.saturating_sub(last);
        let dt = (elapsed_us as f64 * 1e-6).clamp(DT_MIN, DT_MAX);
        self.last_timestamp_us = Some(sample.timestamp_us);
        self.last_dt = dt;
        self.ticks += 1;

        let r = sample.rotation();
        let r_d = setpoint.rotation();

        let before = self.controller.status();
        let cmd = self.controller.compute_torque(
            &r,
            &sample.angular_velocity,
            &r_d,
            &setpoint.angular_velocity_d,
            &setpoint.angular_accel_d,
            dt,
        );
        self.report_degradations(&before);

        Some(ActuatorCommand::from_torque(
            &cmd.torque,
            self.tau_max,
            sample.timestamp_us,
        ))
    }

    /// Refresh tunables after an external parameter change
    ///
    /// Only legal between ticks on the tick thread; the adaptation state
    /// and clock survive the update.
    pub fn apply_config(&mut self, config: &HostConfig) -> Result<(), ConfigError> {
        config.validate()?;

        self.controller.set_control_gains(
            config.gains.k_r,
            config.gains.k_omega,
            config.gains.k_damping,
            config.gains.c,
        );
        self.controller.set_adaptation_params(
            config.adaptation.gamma,
            config.adaptation.sigma,
            config.adaptation.beta,
            config.adaptation.gamma_ee,
        );
        self.controller.set_saturation_limit(config.tau_max);
        self.controller.set_filter_bandwidth(config.filter_alpha);
        self.tau_max = config.tau_max;
        Ok(())
    }

    /// Controller diagnostics snapshot
    pub fn status(&self) -> ControllerStatus {
        self.controller.status()
    }

    /// Number of ticks that produced output
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Timestep used on the last tick [s]
    pub fn last_dt(&self) -> f64 {
        self.last_dt
    }

    pub fn controller(&self) -> &AicController {
        &self.controller
    }

    fn report_degradations(&mut self, before: &ControllerStatus) {
        let after = self.controller.status();

        if !self.warned_rotation && after.rotation_warn > before.rotation_warn {
            warn!(
                count = after.rotation_warn,
                "attitude sample failed the orthogonality check; continuing"
            );
            self.warned_rotation = true;
        }
        if !self.warned_iwg && after.iwg_skip > before.iwg_skip {
            warn!(
                count = after.iwg_skip,
                "IWG update skipped on numerical failure; torque still bounded"
            );
            self.warned_iwg = true;
        }
    }
}
