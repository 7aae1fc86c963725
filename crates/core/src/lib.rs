//! Core traits and types for the Teeter simulator.
//!
//! This crate defines the shared abstractions that integrators and the robot
//! model build on:
//!
//! - [`Model`]: a callable that maps a typed input to a typed output
//! - [`StepIntegrable`]: a state that can be advanced by its derivative
//! - [`TimeIncrement`]: a unit-safe, strictly positive time step

mod model;
mod step;
mod time;

pub use model::Model;
pub use step::{DerivativeOf, StepIntegrable};
pub use time::{TimeIncrement, TimeIncrementError};
