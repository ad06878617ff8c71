//! Mathematical utilities for the AIC controller
//!
//! Implements SO(3) kinematics, quaternion operations, and the numerical
//! integrators used by the rigid-body validation plant.

pub mod so3;
pub mod quaternion;
pub mod integrator;

pub use so3::*;
pub use quaternion::*;
pub use integrator::*;
