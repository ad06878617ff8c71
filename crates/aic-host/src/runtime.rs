//! Thread-backed controller runtime
//!
//! Owns the tick loop on a dedicated thread and exposes the
//! start/stop/status lifecycle the operational CLI maps onto. The tick
//! thread is the only mutator of controller state; commands rendezvous
//! through the shared status snapshot and the atomic run flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use nalgebra::{Rotation3, UnitQuaternion, Vector3};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use aic_core::control::ControllerStatus;
use aic_core::simulation::{AttitudeState, RigidBody, SinusoidalRollReference};

use crate::config::{ConfigError, HostConfig};
use crate::samples::{ActuatorCommand, AttitudeSample, AttitudeSetpoint};
use crate::tick::TickDriver;

/// Runtime lifecycle errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("controller is already running")]
    AlreadyRunning,
    #[error("no running controller instance")]
    NotRunning,
}

/// Lifecycle state of the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuntimeState {
    Idle,
    Running,
    Stopped,
}

/// Snapshot of the runtime and its controller
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub state: RuntimeState,
    /// Control ticks completed
    pub ticks: u64,
    /// Timestep of the most recent tick [s]
    pub last_dt: f64,
    /// Controller diagnostics; absent before the first tick
    pub controller: Option<ControllerStatus>,
}

impl RuntimeStatus {
    fn idle() -> Self {
        Self {
            state: RuntimeState::Idle,
            ticks: 0,
            last_dt: 0.0,
            controller: None,
        }
    }
}

/// Source of pose/rate samples and setpoints for the tick loop
///
/// The previous actuator command is fed back so closed-loop sources can
/// apply it; bus-backed sources ignore it.
pub trait SampleSource: Send {
    fn next_sample(
        &mut self,
        last: Option<&ActuatorCommand>,
    ) -> Option<(AttitudeSample, AttitudeSetpoint)>;
}

/// Closed-loop simulated vehicle
///
/// A rigid body driven by the emitted actuator commands, tracking a
/// sinusoidal roll reference. Serves as the sample source for the demo
/// and shakedown modes where no flight stack is attached.
pub struct SimulatedVehicle {
    body: RigidBody,
    state: AttitudeState,
    reference: SinusoidalRollReference,
    tau_max: f64,
    dt: f64,
    remaining: u64,
    time: f64,
    started: bool,
}

impl SimulatedVehicle {
    /// Vehicle with the given true inertia diagonal, sampled at the
    /// configured host rate for `duration` seconds
    pub fn new(
        inertia: Vector3<f64>,
        reference: SinusoidalRollReference,
        config: &HostConfig,
        duration: f64,
    ) -> Self {
        let dt = config.period();
        Self {
            body: RigidBody::new(nalgebra::Matrix3::from_diagonal(&inertia)),
            state: AttitudeState::default(),
            reference,
            tau_max: config.tau_max,
            dt,
            remaining: (duration / dt).round() as u64 + 1,
            time: 0.0,
            started: false,
        }
    }
}

impl SampleSource for SimulatedVehicle {
    fn next_sample(
        &mut self,
        last: Option<&ActuatorCommand>,
    ) -> Option<(AttitudeSample, AttitudeSetpoint)> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        if self.started {
            let tau = last
                .map(|cmd| cmd.torque(self.tau_max))
                .unwrap_or_else(Vector3::zeros);
            self.state = self.body.step(&self.state, &tau, self.dt);
            self.time += self.dt;
        }
        self.started = true;

        let q = self.state.orientation;
        let sample = AttitudeSample {
            q: [q.w, q.i, q.j, q.k],
            angular_velocity: self.state.angular_velocity,
            timestamp_us: (self.time * 1e6).round() as u64,
        };

        let reference = self.reference.sample(self.time);
        let q_d = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(
            reference.r_d,
        ));
        let setpoint = AttitudeSetpoint {
            q_d: [q_d.w, q_d.i, q_d.j, q_d.k],
            angular_velocity_d: reference.omega_d,
            angular_accel_d: reference.alpha_d,
        };

        Some((sample, setpoint))
    }
}

/// Thread-backed controller runtime with a start/stop/status surface
pub struct Runtime {
    running: Arc<AtomicBool>,
    status: Arc<Mutex<RuntimeStatus>>,
    handle: Option<JoinHandle<()>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(RuntimeStatus::idle())),
            handle: None,
        }
    }

    /// Spawn the tick loop over the given sample source
    ///
    /// The configuration is validated before the thread starts; an
    /// invalid configuration never reaches the control path.
    pub fn start<S>(&mut self, config: &HostConfig, source: S) -> Result<(), RuntimeError>
    where
        S: SampleSource + 'static,
    {
        if self.handle.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let mut driver = TickDriver::new(config)?;
        let running = Arc::clone(&self.running);
        let status = Arc::clone(&self.status);

        running.store(true, Ordering::SeqCst);
        {
            let mut snapshot = status.lock().unwrap();
            *snapshot = RuntimeStatus::idle();
            snapshot.state = RuntimeState::Running;
        }

        info!(rate_hz = config.rate_hz, "controller runtime starting");

        let mut source = source;
        self.handle = Some(std::thread::spawn(move || {
            let mut last_cmd: Option<ActuatorCommand> = None;

            while running.load(Ordering::SeqCst) {
                let Some((sample, setpoint)) = source.next_sample(last_cmd.as_ref()) else {
                    break;
                };

                if let Some(cmd) = driver.tick(&sample, &setpoint) {
                    last_cmd = Some(cmd);
                }

                let mut snapshot = status.lock().unwrap();
                snapshot.ticks = driver.ticks();
                snapshot.last_dt = driver.last_dt();
                snapshot.controller = Some(driver.status());
            }

            running.store(false, Ordering::SeqCst);
            let mut snapshot = status.lock().unwrap();
            snapshot.state = RuntimeState::Stopped;
            info!(ticks = driver.ticks(), "controller runtime finished");
        }));

        Ok(())
    }

    /// Request the tick loop to stop and wait for it
    pub fn stop(&mut self) -> Result<RuntimeStatus, RuntimeError> {
        let handle = self.handle.take().ok_or(RuntimeError::NotRunning)?;
        self.running.store(false, Ordering::SeqCst);
        let _ = handle.join();
        Ok(self.status())
    }

    /// Wait for the source to exhaust itself
    pub fn wait(&mut self) -> Result<RuntimeStatus, RuntimeError> {
        let handle = self.handle.take().ok_or(RuntimeError::NotRunning)?;
        let _ = handle.join();
        Ok(self.status())
    }

    /// Current snapshot
    pub fn status(&self) -> RuntimeStatus {
        self.status.lock().unwrap().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.running.load(Ordering::SeqCst)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
