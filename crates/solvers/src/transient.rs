//! Fixed-step integrators for transient simulations.
//!
//! An [`Integrator`] advances a state by one step of size `dt` using a
//! [`Model`] that maps the state to its time derivative:
//!
//! ```text
//! dS/dt = f(S)
//! ```
//!
//! Any input held constant over the step (a control command, an external
//! load) belongs inside the model, which is rebuilt for each step.
//!
//! Two schemes are provided:
//!
//! - [`ForwardEuler`]: one model evaluation per step, first-order accurate
//! - [`RungeKutta4`]: four evaluations per step, fourth-order accurate

mod error;
mod euler;
mod rk4;

pub use error::Error;
pub use euler::ForwardEuler;
pub use rk4::RungeKutta4;

use teeter_core::{DerivativeOf, Model, StepIntegrable};

/// A fixed-step integration scheme.
pub trait Integrator {
    /// The global order of accuracy of the scheme.
    ///
    /// Halving `dt` over a fixed interval shrinks the error by roughly
    /// `2^ORDER`.
    const ORDER: u32;

    /// Advances `state` by one step of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestep`] if `dt` is not finite and positive,
    /// or [`Error::Model`] if any derivative evaluation fails.
    fn step<M, S>(&self, model: &M, state: &S, dt: f64) -> Result<S, Error>
    where
        M: Model<Input = S, Output = DerivativeOf<S, f64>>,
        S: StepIntegrable<f64>,
        DerivativeOf<S, f64>: Clone;
}

/// Rejects step sizes that cannot advance a simulation.
fn check_timestep(dt: f64) -> Result<(), Error> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTimestep(dt))
    }
}

#[cfg(test)]
mod test_utils;
