//! # AIC Core
//!
//! Adaptive Inertia-aware Composite (AIC) attitude control - core library
//!
//! Implements geometric attitude tracking on SO(3) with on-line estimation
//! of the vehicle inertia tensor. The learned inertia is fed forward as
//! gyroscopic/inertial compensation, so tracking accuracy improves with
//! experience and survives payload or propeller changes.
//!
//! ## Modules
//!
//! - [`math`]: SO(3) kinematics, quaternion helpers, numerical integrators
//! - [`control`]: Rigid-body regressor, parameter adaptation, composite controller
//! - [`simulation`]: Rigid-body attitude plant and reference generators for
//!   closed-loop validation

pub mod math;
pub mod control;
pub mod simulation;

// Common type aliases
use nalgebra::{Vector3, Matrix3, UnitQuaternion};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f64>;
