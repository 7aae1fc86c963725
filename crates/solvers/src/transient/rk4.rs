//! Classic fourth-order Runge-Kutta integration.
//!
//! ```text
//! k1 = f(s)
//! k2 = f(s + k1 * dt/2)
//! k3 = f(s + k2 * dt/2)
//! k4 = f(s + k3 * dt)
//! s' = s + (k1 + 2 k2 + 2 k3 + k4) * dt/6
//! ```
//!
//! The weighted sum is formed as a chain of single steps,
//! `s.step(k1, dt/6).step(k2, dt/3).step(k3, dt/3).step(k4, dt/6)`,
//! so the scheme only needs [`StepIntegrable::step`] from the state type.

use teeter_core::{DerivativeOf, Model, StepIntegrable};

use super::{Error, Integrator, check_timestep};

/// Explicit fourth-order Runge-Kutta integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RungeKutta4;

impl Integrator for RungeKutta4 {
    const ORDER: u32 = 4;

    fn step<M, S>(&self, model: &M, state: &S, dt: f64) -> Result<S, Error>
    where
        M: Model<Input = S, Output = DerivativeOf<S, f64>>,
        S: StepIntegrable<f64>,
        DerivativeOf<S, f64>: Clone,
    {
        check_timestep(dt)?;

        let half = 0.5 * dt;

        let k1 = model.call(state).map_err(Error::model)?;
        let k2 = model
            .call(&state.step(k1.clone(), half))
            .map_err(Error::model)?;
        let k3 = model
            .call(&state.step(k2.clone(), half))
            .map_err(Error::model)?;
        let k4 = model
            .call(&state.step(k3.clone(), dt))
            .map_err(Error::model)?;

        Ok(state
            .step(k1, dt / 6.0)
            .step(k2, dt / 3.0)
            .step(k3, dt / 3.0)
            .step(k4, dt / 6.0))
    }
}
