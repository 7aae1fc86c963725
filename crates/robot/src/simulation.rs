//! The closed control loop, advanced lazily one tick at a time.
//!
//! A [`Simulation`] is an iterator. Each call to `next` runs one tick:
//!
//! 1. measure the tilt error `0 - tilt_angle`
//! 2. ask the controller for an actuation command
//! 3. integrate the dynamics over `dt` with that command held constant
//! 4. yield a [`SimulationTick`] for the new state
//!
//! The run ends when the robot falls past the threshold, when the horizon is
//! reached, or when a tick fails. Once ended, the iterator only returns
//! `None`; a finished simulation cannot be restarted.

use std::{fmt, iter::FusedIterator};

use teeter_core::TimeIncrement;
use teeter_solvers::transient;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::{
    Controller, ControllerError, Disturbance, Method, Parameters, Pid, State, dynamics::Dynamics,
};

/// Where a [`Simulation`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More ticks remain.
    Running,
    /// The tilt exceeded the fall threshold.
    Fallen,
    /// The horizon was reached with the robot still up.
    Completed,
    /// A tick failed and the run was cut short.
    Aborted,
}

impl Status {
    /// Whether the run has ended.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Running
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Fallen => "fallen",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How long a simulation may run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Horizon {
    /// A fixed number of control ticks.
    Ticks(usize),
    /// A span of simulated time, rounded up to whole ticks.
    Duration(TimeIncrement),
}

impl Horizon {
    /// The number of ticks this horizon allows at timestep `dt`.
    #[must_use]
    pub fn tick_count(&self, dt: TimeIncrement) -> usize {
        match self {
            Self::Ticks(count) => *count,
            Self::Duration(duration) => duration.steps_required(dt),
        }
    }
}

/// One emitted sample of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationTick {
    /// Simulated time at which `state` holds, in seconds.
    pub time: f64,
    /// The state at the end of the tick.
    pub state: State,
    /// The actuation command applied during the tick, in N·m.
    pub actuation: f64,
}

/// Errors that end a simulation early.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("controller failed: {0}")]
    Controller(#[from] ControllerError),

    #[error("integration failed: {0}")]
    Integrator(#[from] transient::Error),
}

/// A snapshot of a run's progress, usually taken once it has ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub status: Status,
    /// Ticks completed so far.
    pub ticks: usize,
    /// Simulated time elapsed, in seconds.
    pub time: f64,
    pub final_state: State,
    /// Largest tilt magnitude seen, including the initial state, in rad.
    pub peak_tilt: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Status::Fallen => write!(
                f,
                "tipped over at t = {:.2} s (tilt {:.3} rad) after {} ticks",
                self.time,
                self.final_state.wrapped_tilt(),
                self.ticks,
            ),
            status => write!(
                f,
                "{status} after {} ticks (t = {:.2} s), final tilt {:.3e} rad, peak {:.3e} rad",
                self.ticks,
                self.time,
                self.final_state.wrapped_tilt(),
                self.peak_tilt,
            ),
        }
    }
}

/// A lazily evaluated balance run.
///
/// Owns the current [`State`] and the controller. Build one with
/// [`Simulation::run`], then iterate to advance it.
///
/// # Example
///
/// ```
/// use teeter_robot::{Horizon, Parameters, Pid, Simulation, State, Status};
///
/// let params = Parameters::default();
/// let mut sim = Simulation::run(
///     State::tilted(0.05),
///     params,
///     Pid::from(&params),
///     Horizon::Ticks(500),
/// );
///
/// let ticks: Vec<_> = sim.by_ref().collect::<Result<_, _>>().unwrap();
///
/// assert_eq!(ticks.len(), 500);
/// assert_eq!(sim.status(), Status::Completed);
/// assert!(sim.current_state().tilt_angle.abs() < 1e-3);
/// ```
#[derive(Debug)]
pub struct Simulation<K: Controller = Pid> {
    parameters: Parameters,
    controller: K,
    method: Method,
    disturbance: Disturbance,
    state: State,
    ticks: usize,
    tick_limit: usize,
    status: Status,
    peak_tilt: f64,
}

impl<K: Controller> Simulation<K> {
    /// Prepares a run from `initial_state`.
    ///
    /// The controller is reset before the first tick. A run whose initial
    /// tilt is already past the fall threshold starts out [`Status::Fallen`],
    /// and a zero-tick horizon starts out [`Status::Completed`]; neither
    /// yields any ticks.
    pub fn run(
        initial_state: State,
        parameters: Parameters,
        mut controller: K,
        horizon: Horizon,
    ) -> Self {
        controller.reset();
        let tick_limit = horizon.tick_count(parameters.timestep());

        let status = if has_fallen(&initial_state, &parameters) {
            Status::Fallen
        } else if tick_limit == 0 {
            Status::Completed
        } else {
            Status::Running
        };

        debug!(
            tilt = initial_state.tilt_angle,
            dt = parameters.timestep().seconds(),
            tick_limit,
            %status,
            "simulation prepared"
        );

        Self {
            parameters,
            controller,
            method: Method::default(),
            disturbance: Disturbance::None,
            state: initial_state,
            ticks: 0,
            tick_limit,
            status,
            peak_tilt: initial_state.tilt_angle.abs(),
        }
    }

    /// Selects the integration scheme.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Applies an external torque schedule to the body.
    #[must_use]
    pub fn with_disturbance(mut self, disturbance: Disturbance) -> Self {
        self.disturbance = disturbance;
        self
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Simulated time elapsed, in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time_at(self.ticks)
    }

    #[must_use]
    pub fn current_state(&self) -> &State {
        &self.state
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn controller(&self) -> &K {
        &self.controller
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            status: self.status,
            ticks: self.ticks,
            time: self.time(),
            final_state: self.state,
            peak_tilt: self.peak_tilt,
        }
    }

    // Time is derived from the tick count so it does not drift over long runs.
    #[allow(clippy::cast_precision_loss)]
    fn time_at(&self, ticks: usize) -> f64 {
        ticks as f64 * self.parameters.timestep().seconds()
    }

    fn tick(&mut self) -> Result<SimulationTick, SimulationError> {
        let dt = self.parameters.timestep().seconds();
        let start = self.time();

        let error = 0.0 - self.state.tilt_angle;
        let actuation = self.controller.compute(error, dt)?;
        let model = Dynamics::new(&self.parameters, actuation)
            .with_external_torque(self.disturbance.torque_at(start));
        let next = self.method.step(&model, &self.state, dt)?;

        self.ticks += 1;
        self.state = next;
        self.peak_tilt = self.peak_tilt.max(next.tilt_angle.abs());
        let time = self.time();

        trace!(
            time,
            position = next.position,
            tilt = next.tilt_angle,
            actuation,
            "tick"
        );

        if has_fallen(&next, &self.parameters) {
            self.status = Status::Fallen;
            warn!(
                time,
                tilt = next.wrapped_tilt(),
                ticks = self.ticks,
                "robot tipped over"
            );
        } else if self.ticks >= self.tick_limit {
            self.status = Status::Completed;
            info!(
                time,
                tilt = next.tilt_angle,
                peak_tilt = self.peak_tilt,
                "simulation completed"
            );
        }

        Ok(SimulationTick {
            time,
            state: next,
            actuation,
        })
    }
}

/// A non-finite tilt counts as fallen.
fn has_fallen(state: &State, parameters: &Parameters) -> bool {
    let tilt = state.tilt_angle.abs();
    !tilt.is_finite() || tilt > parameters.fall_threshold()
}

impl<K: Controller> Iterator for Simulation<K> {
    type Item = Result<SimulationTick, SimulationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.status.is_terminal() {
            return None;
        }

        match self.tick() {
            Ok(tick) => Some(Ok(tick)),
            Err(err) => {
                self.status = Status::Aborted;
                error!(ticks = self.ticks, error = %err, "simulation aborted");
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.status.is_terminal() {
            (0, Some(0))
        } else {
            // Falling can end the run early.
            (0, Some(self.tick_limit - self.ticks))
        }
    }
}

impl<K: Controller> FusedIterator for Simulation<K> {}
