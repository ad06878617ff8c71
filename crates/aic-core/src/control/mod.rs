//! Control algorithms for the AIC attitude controller
//!
//! - Rigid-body torque regressor (linear in the inertia parameters)
//! - Adaptive parameter estimation (plain and information-weighted gradient)
//! - Composite controller (geometric PD + adaptive feed-forward + robust damping)

pub mod regressor;
pub mod adaptation;
pub mod controller;

pub use regressor::*;
pub use adaptation::*;
pub use controller::*;
