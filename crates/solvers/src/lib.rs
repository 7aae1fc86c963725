//! Numerical solvers for the Teeter simulator.
//!
//! - [`transient`]: fixed-step integrators that advance a
//!   [`StepIntegrable`](teeter_core::StepIntegrable) state through time

pub mod transient;
