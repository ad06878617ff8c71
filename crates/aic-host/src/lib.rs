//! # AIC Host
//!
//! Host adapter for the AIC attitude controller: per-tick driving of the
//! core controller from pose/rate samples, timestep management, actuator
//! command normalisation, and an operational runtime with a
//! start/stop/status surface.
//!
//! The inter-process topic bus, mixer, and sensor drivers belong to the
//! embedding flight stack; this crate consumes pre-digested samples and
//! emits normalised three-axis torque commands.

pub mod config;
pub mod samples;
pub mod tick;
pub mod runtime;
pub mod logging;

pub use config::{ConfigError, HostConfig};
pub use samples::{ActuatorCommand, AttitudeSample, AttitudeSetpoint};
pub use tick::TickDriver;
pub use runtime::{Runtime, RuntimeError, RuntimeState, RuntimeStatus, SampleSource, SimulatedVehicle};
pub use logging::init_logging;
