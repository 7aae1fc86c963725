use std::fmt;

use serde::Deserialize;
use teeter_core::{DerivativeOf, Model, StepIntegrable};
use teeter_solvers::transient::{self, ForwardEuler, Integrator, RungeKutta4};

use crate::{Parameters, State, dynamics::Dynamics};

/// The integration scheme used to advance the robot between control ticks.
///
/// [`RungeKutta4`] is the default. [`ForwardEuler`] is kept for comparison
/// and for studying how integration error feeds back through the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Method {
    #[serde(rename = "euler")]
    ForwardEuler,
    #[default]
    #[serde(rename = "rk4")]
    RungeKutta4,
}

impl Method {
    /// The global order of accuracy of the scheme.
    #[must_use]
    pub fn order(self) -> u32 {
        match self {
            Self::ForwardEuler => ForwardEuler::ORDER,
            Self::RungeKutta4 => RungeKutta4::ORDER,
        }
    }

    /// Advances `state` by one step of any model with the selected scheme.
    ///
    /// # Errors
    ///
    /// Propagates the integrator's [`transient::Error`].
    pub fn step<M, S>(self, model: &M, state: &S, dt: f64) -> Result<S, transient::Error>
    where
        M: Model<Input = S, Output = DerivativeOf<S, f64>>,
        S: StepIntegrable<f64>,
        DerivativeOf<S, f64>: Clone,
    {
        match self {
            Self::ForwardEuler => ForwardEuler.step(model, state, dt),
            Self::RungeKutta4 => RungeKutta4.step(model, state, dt),
        }
    }

    /// Advances the robot by `dt` seconds with `actuation` held constant.
    ///
    /// # Errors
    ///
    /// Returns [`transient::Error::InvalidTimestep`] if `dt` is not finite
    /// and positive.
    pub fn advance(
        self,
        state: &State,
        actuation: f64,
        parameters: &Parameters,
        dt: f64,
    ) -> Result<State, transient::Error> {
        self.step(&Dynamics::new(parameters, actuation), state, dt)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForwardEuler => f.write_str("euler"),
            Self::RungeKutta4 => f.write_str("rk4"),
        }
    }
}
