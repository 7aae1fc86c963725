//! Forward Euler integration.
//!
//! ```text
//! state_{n+1} = state_n + f(state_n) * dt
//! ```

use teeter_core::{DerivativeOf, Model, StepIntegrable};

use super::{Error, Integrator, check_timestep};

/// Explicit first-order Euler integration.
///
/// Cheap and simple, but its truncation error grows linearly with `dt` and it
/// can go unstable on stiff closed-loop systems when `dt` is large.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    const ORDER: u32 = 1;

    fn step<M, S>(&self, model: &M, state: &S, dt: f64) -> Result<S, Error>
    where
        M: Model<Input = S, Output = DerivativeOf<S, f64>>,
        S: StepIntegrable<f64>,
        DerivativeOf<S, f64>: Clone,
    {
        check_timestep(dt)?;

        let derivative = model.call(state).map_err(Error::model)?;
        Ok(state.step(derivative, dt))
    }
}
