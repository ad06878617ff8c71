//! Composite attitude controller
//!
//! Combines geometric PD feedback, adaptive inertia feed-forward, and
//! robust damping into one torque command:
//!
//! ```text
//! tau = -K_R*e_R - K_Omega*e_Omega + Y*theta_hat - K*s_filtered
//! ```
//!
//! The composite error s = e_Omega + c*e_R is low-pass filtered before it
//! drives both the robust damping term and the parameter adaptation. The
//! feed-forward reads theta_hat after the same tick's adaptation step.
//! Output torque is saturated componentwise to +/- tau_max.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::control::adaptation::{AdaptationParams, InertiaAdapter};
use crate::control::regressor::{regressor_diagonal, regressor_full};
use crate::math::{
    angular_velocity_error, attitude_error, commanded_angular_accel, is_valid_rotation,
};

/// Orthogonality tolerance for the rotation-input warning
const ROTATION_TOL: f64 = 1e-4;

/// Lower bound enforced on the saturation limit [N m]
const TAU_MAX_FLOOR: f64 = 0.01;

/// Composite controller gains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlGains {
    /// Attitude error gain (diagonal)
    pub k_r: Vector3<f64>,
    /// Angular velocity error gain (diagonal)
    pub k_omega: Vector3<f64>,
    /// Robust damping gain (diagonal)
    pub k_damping: Vector3<f64>,
    /// Composite error weight: s = e_Omega + c * e_R
    pub c: f64,
}

impl Default for ControlGains {
    fn default() -> Self {
        Self {
            k_r: Vector3::new(5.0, 5.0, 3.0),
            k_omega: Vector3::new(0.3, 0.3, 0.2),
            k_damping: Vector3::new(0.1, 0.1, 0.1),
            c: 2.0,
        }
    }
}

/// One tick's torque output
#[derive(Debug, Clone, Copy)]
pub struct TorqueCommand {
    /// Saturated control torque [N m]
    pub torque: Vector3<f64>,
    /// Per-axis saturation flags
    pub sat_active: [bool; 3],
}

impl Default for TorqueCommand {
    fn default() -> Self {
        Self {
            torque: Vector3::zeros(),
            sat_active: [false; 3],
        }
    }
}

/// Diagnostic snapshot read by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerStatus {
    /// Ticks rejected for non-finite input or dt <= 0
    pub invalid_input: u32,
    /// Ticks where the current attitude failed the orthogonality check
    pub rotation_warn: u32,
    /// IWG Cholesky retries
    pub iwg_retry: u32,
    /// IWG ticks with the parameter integration skipped
    pub iwg_skip: u32,
    /// det P(t)
    pub information_determinant: f64,
    /// Persistent-excitation gate
    pub persistently_excited: bool,
    /// Current inertia estimate [kg m^2]
    pub inertia_estimate: Matrix3<f64>,
    /// Last emitted (saturated) torque [N m]
    pub last_torque: Vector3<f64>,
    /// Per-axis saturation flags of the last tick
    pub sat_active: [bool; 3],
}

/// Adaptive inertia-aware composite attitude controller on SO(3)
#[derive(Debug, Clone)]
pub struct AicController {
    adapter: InertiaAdapter,
    gains: ControlGains,
    tau_max: f64,
    s_filter_alpha: f64,
    s_filtered: Vector3<f64>,
    last_command: TorqueCommand,
    invalid_input: u32,
    rotation_warn: u32,
}

impl AicController {
    /// Create a controller from an initial inertia estimate
    ///
    /// `use_diagonal` selects the 3-parameter model over the full
    /// 6-parameter symmetric one; `use_iwg` selects information-weighted
    /// over plain gradient adaptation.
    pub fn new(j_init: &Matrix3<f64>, use_diagonal: bool, use_iwg: bool) -> Self {
        let params = AdaptationParams {
            use_iwg,
            ..AdaptationParams::default()
        };
        Self::with_params(j_init, use_diagonal, params, ControlGains::default())
    }

    /// Create a controller with explicit adaptation and control gains
    pub fn with_params(
        j_init: &Matrix3<f64>,
        use_diagonal: bool,
        params: AdaptationParams,
        gains: ControlGains,
    ) -> Self {
        Self {
            adapter: InertiaAdapter::new(j_init, use_diagonal, params),
            gains,
            tau_max: 0.05,
            s_filter_alpha: 0.1,
            s_filtered: Vector3::zeros(),
            last_command: TorqueCommand::default(),
            invalid_input: 0,
            rotation_warn: 0,
        }
    }

    /// Compute the attitude control torque for one tick
    ///
    /// Inputs are the current attitude R and body rate Omega, the desired
    /// attitude R_d, rate Omega_d, and angular acceleration alpha_d, and
    /// the timestep dt (already clamped by the host). Invalid input
    /// (non-finite values or dt <= 0) re-emits the previous saturated
    /// torque and skips adaptation.
    pub fn compute_torque(
        &mut self,
        r: &Matrix3<f64>,
        omega: &Vector3<f64>,
        r_d: &Matrix3<f64>,
        omega_d: &Vector3<f64>,
        alpha_d: &Vector3<f64>,
        dt: f64,
    ) -> TorqueCommand {
        if !inputs_finite(r, omega, r_d, omega_d, alpha_d, dt) {
            self.invalid_input += 1;
            return self.last_command;
        }

        // Orthogonality is the host's responsibility; record and continue.
        if !is_valid_rotation(r, ROTATION_TOL) {
            self.rotation_warn += 1;
        }

        let e_r = attitude_error(r, r_d);
        let e_omega = angular_velocity_error(omega, r, r_d, omega_d);

        let s = e_omega + self.gains.c * e_r;
        self.s_filtered = self.s_filter_alpha * s + (1.0 - self.s_filter_alpha) * self.s_filtered;

        let alpha = commanded_angular_accel(r, r_d, omega, omega_d, alpha_d);

        // Adapt on the filtered error, then feed the fresh estimate forward.
        let tau_adaptive = match &mut self.adapter {
            InertiaAdapter::Diagonal(adapter) => {
                let y = regressor_diagonal(omega, &alpha);
                adapter.update(&y, &self.s_filtered, dt);
                y * adapter.theta()
            }
            InertiaAdapter::Full(adapter) => {
                let y = regressor_full(omega, &alpha);
                adapter.update(&y, &self.s_filtered, dt);
                y * adapter.theta()
            }
        };

        let tau_pd = Vector3::new(
            -self.gains.k_r.x * e_r.x - self.gains.k_omega.x * e_omega.x,
            -self.gains.k_r.y * e_r.y - self.gains.k_omega.y * e_omega.y,
            -self.gains.k_r.z * e_r.z - self.gains.k_omega.z * e_omega.z,
        );

        let tau_robust = -self.gains.k_damping.component_mul(&self.s_filtered);

        let tau = tau_pd + tau_adaptive + tau_robust;
        self.last_command = saturate(&tau, self.tau_max);
        self.last_command
    }

    /// Current inertia matrix estimate
    pub fn inertia_estimate(&self) -> Matrix3<f64> {
        self.adapter.inertia_estimate()
    }

    /// Determinant of the information matrix
    pub fn information_determinant(&self) -> f64 {
        self.adapter.information_determinant()
    }

    /// True when the motion has excited every parameter direction
    pub fn is_persistently_excited(&self) -> bool {
        self.adapter.is_persistently_excited()
    }

    /// Diagnostic snapshot for the host status surface
    pub fn status(&self) -> ControllerStatus {
        let counters = self.adapter.counters();
        ControllerStatus {
            invalid_input: self.invalid_input,
            rotation_warn: self.rotation_warn,
            iwg_retry: counters.iwg_retry,
            iwg_skip: counters.iwg_skip,
            information_determinant: self.adapter.information_determinant(),
            persistently_excited: self.adapter.is_persistently_excited(),
            inertia_estimate: self.adapter.inertia_estimate(),
            last_torque: self.last_command.torque,
            sat_active: self.last_command.sat_active,
        }
    }

    /// Replace the control gains
    pub fn set_control_gains(
        &mut self,
        k_r: Vector3<f64>,
        k_omega: Vector3<f64>,
        k_damping: Vector3<f64>,
        c: f64,
    ) {
        self.gains = ControlGains {
            k_r,
            k_omega,
            k_damping,
            c,
        };
    }

    /// Replace the adaptation gains (forwarded to the adapter)
    pub fn set_adaptation_params(&mut self, gamma: f64, sigma: f64, beta: f64, gamma_ee: f64) {
        self.adapter.set_gains(gamma, sigma, beta, gamma_ee);
    }

    /// Set the actuator saturation limit, floored at 0.01 N m
    pub fn set_saturation_limit(&mut self, tau_max: f64) {
        self.tau_max = tau_max.max(TAU_MAX_FLOOR);
    }

    /// Set the composite-error filter coefficient, clamped to [0, 1]
    ///
    /// alpha = 1 passes the raw composite error through; smaller values
    /// smooth it more.
    pub fn set_filter_bandwidth(&mut self, alpha: f64) {
        self.s_filter_alpha = alpha.clamp(0.0, 1.0);
    }

    /// Reinitialise all mutable state from a fresh inertia estimate
    ///
    /// Afterwards the controller is indistinguishable from one freshly
    /// constructed with the same J_init.
    pub fn reset(&mut self, j_init: &Matrix3<f64>) {
        self.adapter.reset(j_init);
        self.s_filtered = Vector3::zeros();
        self.last_command = TorqueCommand::default();
        self.invalid_input = 0;
        self.rotation_warn = 0;
    }

    /// Configured saturation limit [N m]
    pub fn saturation_limit(&self) -> f64 {
        self.tau_max
    }

    /// Active control gains
    pub fn gains(&self) -> &ControlGains {
        &self.gains
    }
}

/// Componentwise saturation to +/- tau_max with per-axis flags
pub fn saturate(tau: &Vector3<f64>, tau_max: f64) -> TorqueCommand {
    let mut torque = Vector3::zeros();
    let mut sat_active = [false; 3];
    for i in 0..3 {
        let clamped = tau[i].clamp(-tau_max, tau_max);
        sat_active[i] = clamped != tau[i];
        torque[i] = clamped;
    }
    TorqueCommand { torque, sat_active }
}

fn inputs_finite(
    r: &Matrix3<f64>,
    omega: &Vector3<f64>,
    r_d: &Matrix3<f64>,
    omega_d: &Vector3<f64>,
    alpha_d: &Vector3<f64>,
    dt: f64,
) -> bool {
    dt.is_finite()
        && dt > 0.0
        && r.iter().all(|v| v.is_finite())
        && r_d.iter().all(|v| v.is_finite())
        && omega.iter().all(|v| v.is_finite())
        && omega_d.iter().all(|v| v.is_finite())
        && alpha_d.iter().all(|v| v.is_finite())
}
