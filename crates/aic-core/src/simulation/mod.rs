//! Closed-loop validation framework
//!
//! A rotational rigid-body plant, analytic attitude references, and noisy
//! rate sensors for exercising the controller end to end.

pub mod config;
pub mod rigid_body;
pub mod reference;
pub mod sensors;
pub mod simulator;

pub use config::*;
pub use rigid_body::*;
pub use reference::*;
pub use sensors::*;
pub use simulator::*;
