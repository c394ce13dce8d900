//! # Rust Value Trading
//!
//! Value-function approximation core for trading agents.
//!
//! A trading agent maps a numeric feature vector to a bounded scalar value
//! estimate that drives its buy/sell decisions. This crate provides that
//! numeric core: a small feed-forward network with piecewise-linear
//! activations, the Box–Muller normal source that initializes it, and a
//! bounded step-size calibration loop that applies one conservative
//! gradient-like update at a time without overshooting.
//!
//! ## Modules
//!
//! - `agent` - normal-variate source, value network, step calibration
//! - `error` - crate error types
//! - `utils` - configuration helpers
//!
//! Feature extraction, order execution, and weight persistence live with
//! the calling agent; the interchange contract here is purely numeric: a
//! fixed-length input vector in, a scalar estimate out, and one flat weight
//! layout shared by gradients, diffs, and snapshots.

pub mod agent;
pub mod error;
pub mod utils;

pub use agent::{
    CalibrationConfig, CalibrationReport, NetworkConfig, NormalSource, StepCalibrator,
    ValueNetwork,
};
pub use error::{Error, Result};
pub use utils::AppConfig;
