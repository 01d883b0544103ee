//! `sensorcast-simulator` — bounded random-walk signal generator.
//!
//! # Overview
//!
//! A [`DriftSimulator`] owns a scalar `value` and a signed momentum
//! `direction`. Each [`DriftSimulator::advance`] call may nudge the
//! momentum, moves the value proportionally to the elapsed time, and
//! reflects the momentum off the configured floor and ceiling.
//!
//! The simulator knows nothing about timing or transport: callers pass the
//! elapsed seconds explicitly, and randomness comes from an injected
//! [`RandomSource`].

pub mod error;
pub mod random;
pub mod simulator;

pub use error::{ConfigError, Result};
pub use random::{RandomSource, ScriptedRandom};
pub use simulator::{DriftSimulator, SimulatorConfig, DRIFT_WIDTH};
