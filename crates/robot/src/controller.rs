//! Feedback controllers that turn tilt error into drive torque.

use teeter_core::TimeIncrement;
use thiserror::Error;
use tracing::debug;

use crate::{Gains, OutputLimits, Parameters};

/// Errors raised by a [`Controller`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ControllerError {
    #[error("controller timestep must be finite and greater than zero, got {0}")]
    InvalidTimestep(f64),
}

/// A stateful feedback law.
///
/// Implementations are called exactly once per control tick and may update
/// internal state on every call.
pub trait Controller {
    /// Computes the actuation command for the measured error.
    ///
    /// `measured_error` is `target - measurement` and `dt` is the time since
    /// the previous call, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidTimestep`] if `dt` is not finite and
    /// positive. The internal state is left untouched in that case.
    fn compute(&mut self, measured_error: f64, dt: f64) -> Result<f64, ControllerError>;

    /// Clears all accumulated state, keeping the configuration.
    fn reset(&mut self);
}

/// Memory carried by a [`Pid`] between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerState {
    integral_accumulator: f64,
    previous_error: f64,
    filtered_derivative: f64,
}

impl ControllerState {
    /// The running integral of the error, in rad·s.
    #[must_use]
    pub fn integral_accumulator(&self) -> f64 {
        self.integral_accumulator
    }

    /// The error seen on the previous tick (zero after a reset).
    #[must_use]
    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// The derivative term used on the previous tick, after filtering.
    #[must_use]
    pub fn filtered_derivative(&self) -> f64 {
        self.filtered_derivative
    }
}

/// A discrete PID controller with output saturation.
///
/// Each tick computes
///
/// ```text
/// u = Kp e + Ki ∫e dt + Kd de/dt
/// ```
///
/// with a backward-difference derivative, then clamps `u` into the output
/// limits. Integration is conditional: the error is not accumulated on ticks
/// where the unclamped output is beyond a limit and the new integral
/// contribution `Ki e dt` would push it further past that limit. An optional
/// first-order low-pass filter smooths the derivative term.
#[derive(Debug, Clone, PartialEq)]
pub struct Pid {
    gains: Gains,
    limits: OutputLimits,
    derivative_filter: Option<TimeIncrement>,
    state: ControllerState,
}

impl Pid {
    /// Creates a PID controller with a raw backward-difference derivative.
    #[must_use]
    pub fn new(gains: Gains, limits: OutputLimits) -> Self {
        Self {
            gains,
            limits,
            derivative_filter: None,
            state: ControllerState::default(),
        }
    }

    /// A proportional-only controller.
    #[must_use]
    pub fn proportional(kp: f64, limits: OutputLimits) -> Self {
        Self::new(Gains::new(kp, 0.0, 0.0), limits)
    }

    /// A proportional-integral controller.
    #[must_use]
    pub fn proportional_integral(kp: f64, ki: f64, limits: OutputLimits) -> Self {
        Self::new(Gains::new(kp, ki, 0.0), limits)
    }

    /// Low-pass filters the derivative term with the given time constant.
    #[must_use]
    pub fn with_derivative_filter(mut self, time_constant: TimeIncrement) -> Self {
        self.derivative_filter = Some(time_constant);
        self
    }

    #[must_use]
    pub fn gains(&self) -> Gains {
        self.gains
    }

    #[must_use]
    pub fn limits(&self) -> OutputLimits {
        self.limits
    }

    /// The controller's memory after the most recent tick.
    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    fn derivative(&self, error: f64, dt: f64) -> f64 {
        let raw = (error - self.state.previous_error) / dt;
        match self.derivative_filter {
            Some(tf) => {
                let alpha = dt / (tf.seconds() + dt);
                self.state.filtered_derivative + alpha * (raw - self.state.filtered_derivative)
            }
            None => raw,
        }
    }
}

impl From<&Parameters> for Pid {
    fn from(parameters: &Parameters) -> Self {
        let pid = Self::new(parameters.gains(), parameters.output_limits());
        match parameters.derivative_filter() {
            Some(tf) => pid.with_derivative_filter(tf),
            None => pid,
        }
    }
}

impl Controller for Pid {
    fn compute(&mut self, measured_error: f64, dt: f64) -> Result<f64, ControllerError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ControllerError::InvalidTimestep(dt));
        }

        let Gains {
            proportional: kp,
            integral: ki,
            derivative: kd,
        } = self.gains;
        let error = measured_error;

        let derivative = self.derivative(error, dt);
        let increment = error * dt;

        // Ki may be negative, so the direction comes from the contribution.
        let contribution = ki * increment;
        let integral = ki * self.state.integral_accumulator;
        let unclamped = kp * error + integral + contribution + kd * derivative;
        let winding_up = (unclamped > self.limits.max() && contribution > 0.0)
            || (unclamped < self.limits.min() && contribution < 0.0);
        if !winding_up {
            self.state.integral_accumulator += increment;
        }

        let output = kp * error + ki * self.state.integral_accumulator + kd * derivative;

        self.state.previous_error = error;
        self.state.filtered_derivative = derivative;

        Ok(self.limits.clamp(output))
    }

    fn reset(&mut self) {
        debug!("resetting PID controller state");
        self.state = ControllerState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{f64::Time, time::second};

    fn limits(min: f64, max: f64) -> OutputLimits {
        OutputLimits::new(min, max).unwrap()
    }

    #[test]
    fn proportional_term_scales_error() {
        let mut pid = Pid::proportional(4.0, OutputLimits::unbounded());
        assert_relative_eq!(pid.compute(0.25, 0.01).unwrap(), 1.0);
        assert_relative_eq!(pid.compute(-0.5, 0.01).unwrap(), -2.0);
    }

    #[test]
    fn integral_accumulates_error_times_dt() {
        let mut pid = Pid::proportional_integral(0.0, 2.0, OutputLimits::unbounded());

        pid.compute(1.0, 0.1).unwrap();
        pid.compute(1.0, 0.1).unwrap();
        let output = pid.compute(1.0, 0.1).unwrap();

        assert_relative_eq!(pid.state().integral_accumulator(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(output, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn derivative_uses_backward_difference() {
        let mut pid = Pid::new(Gains::new(0.0, 0.0, 1.0), OutputLimits::unbounded());

        // The first tick differences against a zero previous error.
        assert_relative_eq!(pid.compute(0.1, 0.1).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pid.compute(0.3, 0.1).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(pid.compute(0.3, 0.1).unwrap(), 0.0);
        assert_relative_eq!(pid.state().previous_error(), 0.3);
    }

    #[test]
    fn output_is_clamped() {
        let mut pid = Pid::proportional(10.0, limits(-1.0, 2.0));
        assert_relative_eq!(pid.compute(1.0, 0.01).unwrap(), 2.0);
        assert_relative_eq!(pid.compute(-1.0, 0.01).unwrap(), -1.0);
        assert_relative_eq!(pid.compute(0.05, 0.01).unwrap(), 0.5);
    }

    #[test]
    fn integral_stops_growing_at_the_limit() {
        let mut pid = Pid::proportional_integral(0.125, 1.0, limits(-1.0, 1.0));

        let integrals: Vec<f64> = (0..1_000)
            .map(|_| {
                pid.compute(2.0, 0.01).unwrap();
                pid.state().integral_accumulator()
            })
            .collect();

        // Kp e = 0.25, so once the integral reaches 0.74 the next increment
        // would push the output past 1.
        let frozen = integrals[36];
        assert!(integrals[..37].windows(2).all(|pair| pair[1] > pair[0]));
        assert_relative_eq!(frozen, 0.74, epsilon = 1e-9);
        assert!(integrals[36..].iter().all(|held| *held == frozen));
        assert!(pid.compute(2.0, 0.01).unwrap() <= 1.0);
    }

    #[test]
    fn saturated_integral_unwinds_immediately_when_error_reverses() {
        let mut pid = Pid::proportional_integral(0.125, 1.0, limits(-1.0, 1.0));
        for _ in 0..200 {
            pid.compute(2.0, 0.01).unwrap();
        }
        let wound = pid.state().integral_accumulator();

        let output = pid.compute(-0.5, 0.01).unwrap();

        let unwound = pid.state().integral_accumulator();
        assert_relative_eq!(unwound, wound - 0.005, epsilon = 1e-12);
        assert!(output < 1.0);
    }

    #[test]
    fn negative_integral_gain_does_not_latch_at_saturation() {
        let mut pid = Pid::proportional_integral(0.0, -1.0, limits(-1.0, 1.0));
        for _ in 0..10_000 {
            assert!(pid.compute(1.0, 0.01).unwrap() >= -1.0);
        }

        // A positive error drives the output down, so the integral freezes
        // once -Ki ∫e reaches the lower limit.
        let wound = pid.state().integral_accumulator();
        assert!(wound > 0.98 && wound <= 1.0 + 1e-9, "integral {wound}");

        let output = pid.compute(-1.0, 0.01).unwrap();

        assert_relative_eq!(pid.state().integral_accumulator(), wound - 0.01);
        assert!(output > -1.0, "still saturated at {output}");
        assert_relative_eq!(output, -(wound - 0.01), epsilon = 1e-12);
    }

    #[test]
    fn proportional_saturation_blocks_integration_entirely() {
        let mut pid = Pid::proportional_integral(10.0, 1.0, limits(-1.0, 1.0));
        for _ in 0..50 {
            assert_relative_eq!(pid.compute(1.0, 0.01).unwrap(), 1.0);
        }
        assert_relative_eq!(pid.state().integral_accumulator(), 0.0);
    }

    #[test]
    fn negative_saturation_also_freezes_integral() {
        let mut pid = Pid::proportional_integral(0.0, 1.0, limits(-0.5, 0.5));
        for _ in 0..500 {
            pid.compute(-1.0, 0.01).unwrap();
        }
        assert!(pid.state().integral_accumulator() >= -0.5 - 0.01);
    }

    #[test]
    fn invalid_timestep_is_rejected_without_side_effects() {
        let mut pid = Pid::new(Gains::new(1.0, 1.0, 1.0), OutputLimits::unbounded());
        pid.compute(0.5, 0.1).unwrap();
        let before = *pid.state();

        for dt in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let error = pid.compute(0.5, dt).unwrap_err();
            assert!(matches!(error, ControllerError::InvalidTimestep(_)));
        }
        assert_eq!(*pid.state(), before);
    }

    #[test]
    fn reset_clears_state_but_keeps_gains() {
        let gains = Gains::new(1.0, 2.0, 3.0);
        let mut pid = Pid::new(gains, OutputLimits::unbounded());
        let first = pid.compute(0.5, 0.1).unwrap();
        pid.compute(0.7, 0.1).unwrap();

        pid.reset();

        assert_eq!(*pid.state(), ControllerState::default());
        assert_eq!(pid.gains(), gains);
        assert_relative_eq!(pid.compute(0.5, 0.1).unwrap(), first);
    }

    #[test]
    fn derivative_filter_smooths_a_step_in_error() {
        let tf = TimeIncrement::new::<second>(0.09).unwrap();
        let mut raw = Pid::new(Gains::new(0.0, 0.0, 1.0), OutputLimits::unbounded());
        let mut filtered = raw.clone().with_derivative_filter(tf);

        let raw_kick = raw.compute(1.0, 0.01).unwrap();
        let filtered_kick = filtered.compute(1.0, 0.01).unwrap();

        // alpha = 0.01 / (0.09 + 0.01) = 0.1
        assert_relative_eq!(raw_kick, 100.0, epsilon = 1e-9);
        assert_relative_eq!(filtered_kick, 10.0, epsilon = 1e-9);

        // The filtered derivative decays instead of dropping to zero.
        let next = filtered.compute(1.0, 0.01).unwrap();
        assert_relative_eq!(next, 9.0, epsilon = 1e-9);
        assert_relative_eq!(raw.compute(1.0, 0.01).unwrap(), 0.0);
    }

    #[test]
    fn built_from_parameters() {
        let params = Parameters::builder()
            .gains(Gains::new(3.0, 0.5, 0.25))
            .output_limits(-2.0, 2.0)
            .derivative_filter(Time::new::<second>(0.05))
            .build()
            .unwrap();

        let pid = Pid::from(&params);

        assert_eq!(pid.gains(), Gains::new(3.0, 0.5, 0.25));
        assert_relative_eq!(pid.limits().max(), 2.0);
        assert!(pid.derivative_filter.is_some());
    }
}
