//! Physical and control constants for a simulation run.
//!
//! [`Parameters`] are built once through a [`ParametersBuilder`], validated,
//! and never change afterwards. The builder speaks in [`uom`] quantities so
//! units are checked at the call site; the validated values are stored in SI
//! base units for the numeric core.

use std::f64::consts::{FRAC_PI_2, PI};

use teeter_core::{TimeIncrement, TimeIncrementError};
use thiserror::Error;
use uom::si::{
    acceleration::meter_per_second_squared,
    angle::radian,
    f64::{Acceleration, Angle, Length, Mass, Time},
    length::meter,
    mass::kilogram,
    time::second,
};

/// Proportional, integral, and derivative gains of the balance controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

impl Gains {
    /// Creates a gain set from `Kp`, `Ki`, and `Kd`.
    #[must_use]
    pub fn new(proportional: f64, integral: f64, derivative: f64) -> Self {
        Self {
            proportional,
            integral,
            derivative,
        }
    }

    fn validate(&self) -> Result<(), ParametersError> {
        finite("gain_p", self.proportional)?;
        finite("gain_i", self.integral)?;
        finite("gain_d", self.derivative)?;
        Ok(())
    }
}

/// Saturation bounds on the actuation command, in N·m.
///
/// Either bound may be infinite to leave that side unsaturated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputLimits {
    min: f64,
    max: f64,
}

impl OutputLimits {
    /// Creates limits spanning `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is NaN or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, ParametersError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ParametersError::InvertedLimits { min, max });
        }
        Ok(Self { min, max })
    }

    /// Limits that never saturate.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamps `value` into the limits.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Errors raised when parameters fail validation.
///
/// Any of these is fatal: a simulation never starts from invalid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ParametersError {
    #[error("{name} must be finite and greater than zero, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("output_min ({min}) must not exceed output_max ({max})")]
    InvertedLimits { min: f64, max: f64 },

    #[error("fall threshold must lie in (0, pi], got {0} rad")]
    FallThreshold(f64),

    #[error("invalid timestep: {0}")]
    Timestep(#[from] TimeIncrementError),
}

/// Validated, immutable constants for one simulation run.
///
/// The robot is a uniform rod (the body) pivoting on the axle of a solid
/// disk wheel that rolls without slipping. Masses are in kg, lengths in m,
/// torques in N·m, and angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    body_mass: f64,
    wheel_mass: f64,
    wheel_radius: f64,
    pendulum_length: f64,
    gravity: f64,
    friction_coefficient: f64,
    gains: Gains,
    limits: OutputLimits,
    derivative_filter: Option<TimeIncrement>,
    timestep: TimeIncrement,
    fall_threshold: f64,
}

impl Parameters {
    /// Starts a builder populated with the default robot.
    #[must_use]
    pub fn builder() -> ParametersBuilder {
        ParametersBuilder::default()
    }

    /// Mass of the body, in kg.
    #[must_use]
    pub fn body_mass(&self) -> f64 {
        self.body_mass
    }

    /// Mass of the wheel assembly, in kg.
    #[must_use]
    pub fn wheel_mass(&self) -> f64 {
        self.wheel_mass
    }

    /// Wheel radius, in m.
    #[must_use]
    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    /// Distance from the axle to the body's centre of mass, in m.
    #[must_use]
    pub fn pendulum_length(&self) -> f64 {
        self.pendulum_length
    }

    /// Gravitational acceleration, in m/s².
    #[must_use]
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    /// Viscous rolling friction, in N per m/s of base velocity.
    #[must_use]
    pub fn friction_coefficient(&self) -> f64 {
        self.friction_coefficient
    }

    #[must_use]
    pub fn gains(&self) -> Gains {
        self.gains
    }

    #[must_use]
    pub fn output_limits(&self) -> OutputLimits {
        self.limits
    }

    /// Time constant of the derivative low-pass filter, if one is enabled.
    #[must_use]
    pub fn derivative_filter(&self) -> Option<TimeIncrement> {
        self.derivative_filter
    }

    /// The fixed integration and control step.
    #[must_use]
    pub fn timestep(&self) -> TimeIncrement {
        self.timestep
    }

    /// Tilt magnitude beyond which the robot counts as fallen, in radians.
    #[must_use]
    pub fn fall_threshold(&self) -> f64 {
        self.fall_threshold
    }
}

impl Default for Parameters {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        ParametersBuilder::default().build().unwrap()
    }
}

/// Collects and validates [`Parameters`].
///
/// Every field starts at a value describing a small desktop robot that the
/// default gains keep upright:
///
/// | field | default |
/// |---|---|
/// | body mass | 1 kg |
/// | wheel mass | 0.5 kg |
/// | wheel radius | 0.2 m |
/// | pendulum length | 0.5 m |
/// | gravity | 9.81 m/s² |
/// | friction | 0 |
/// | gains | Kp = 50, Ki = 0, Kd = 5 |
/// | output limits | ±100 N·m |
/// | derivative filter | off |
/// | timestep | 0.01 s |
/// | fall threshold | π/2 rad |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametersBuilder {
    body_mass: Mass,
    wheel_mass: Mass,
    wheel_radius: Length,
    pendulum_length: Length,
    gravity: Acceleration,
    friction_coefficient: f64,
    gains: Gains,
    output_min: f64,
    output_max: f64,
    derivative_filter: Time,
    timestep: Time,
    fall_threshold: Angle,
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self {
            body_mass: Mass::new::<kilogram>(1.0),
            wheel_mass: Mass::new::<kilogram>(0.5),
            wheel_radius: Length::new::<meter>(0.2),
            pendulum_length: Length::new::<meter>(0.5),
            gravity: Acceleration::new::<meter_per_second_squared>(9.81),
            friction_coefficient: 0.0,
            gains: Gains::new(50.0, 0.0, 5.0),
            output_min: -100.0,
            output_max: 100.0,
            derivative_filter: Time::new::<second>(0.0),
            timestep: Time::new::<second>(0.01),
            fall_threshold: Angle::new::<radian>(FRAC_PI_2),
        }
    }
}

impl ParametersBuilder {
    #[must_use]
    pub fn body_mass(mut self, mass: Mass) -> Self {
        self.body_mass = mass;
        self
    }

    #[must_use]
    pub fn wheel_mass(mut self, mass: Mass) -> Self {
        self.wheel_mass = mass;
        self
    }

    #[must_use]
    pub fn wheel_radius(mut self, radius: Length) -> Self {
        self.wheel_radius = radius;
        self
    }

    #[must_use]
    pub fn pendulum_length(mut self, length: Length) -> Self {
        self.pendulum_length = length;
        self
    }

    #[must_use]
    pub fn gravity(mut self, gravity: Acceleration) -> Self {
        self.gravity = gravity;
        self
    }

    /// Sets the viscous friction opposing base motion, in N·s/m.
    #[must_use]
    pub fn friction_coefficient(mut self, coefficient: f64) -> Self {
        self.friction_coefficient = coefficient;
        self
    }

    #[must_use]
    pub fn gains(mut self, gains: Gains) -> Self {
        self.gains = gains;
        self
    }

    /// Sets `Kp`, keeping the other gains.
    #[must_use]
    pub fn proportional_gain(mut self, kp: f64) -> Self {
        self.gains.proportional = kp;
        self
    }

    /// Sets `Ki`, keeping the other gains.
    #[must_use]
    pub fn integral_gain(mut self, ki: f64) -> Self {
        self.gains.integral = ki;
        self
    }

    /// Sets `Kd`, keeping the other gains.
    #[must_use]
    pub fn derivative_gain(mut self, kd: f64) -> Self {
        self.gains.derivative = kd;
        self
    }

    /// Sets the actuation saturation bounds, in N·m.
    #[must_use]
    pub fn output_limits(mut self, min: f64, max: f64) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }

    #[must_use]
    pub fn output_min(mut self, min: f64) -> Self {
        self.output_min = min;
        self
    }

    #[must_use]
    pub fn output_max(mut self, max: f64) -> Self {
        self.output_max = max;
        self
    }

    /// Sets the derivative filter time constant; zero disables the filter.
    #[must_use]
    pub fn derivative_filter(mut self, time_constant: Time) -> Self {
        self.derivative_filter = time_constant;
        self
    }

    #[must_use]
    pub fn timestep(mut self, dt: Time) -> Self {
        self.timestep = dt;
        self
    }

    #[must_use]
    pub fn fall_threshold(mut self, threshold: Angle) -> Self {
        self.fall_threshold = threshold;
        self
    }

    /// Validates the collected values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParametersError`] found:
    ///
    /// - masses: body strictly positive, wheel non-negative
    /// - lengths and gravity: strictly positive
    /// - friction and filter time constant: non-negative
    /// - gains: finite
    /// - output limits: `min <= max`
    /// - timestep: strictly positive
    /// - fall threshold: in `(0, pi]`
    pub fn build(self) -> Result<Parameters, ParametersError> {
        let body_mass = positive("body_mass", self.body_mass.get::<kilogram>())?;
        let wheel_mass = non_negative("wheel_mass", self.wheel_mass.get::<kilogram>())?;
        let wheel_radius = positive("wheel_radius", self.wheel_radius.get::<meter>())?;
        let pendulum_length = positive("pendulum_length", self.pendulum_length.get::<meter>())?;
        let gravity = positive("gravity", self.gravity.get::<meter_per_second_squared>())?;
        let friction = non_negative("friction_coefficient", self.friction_coefficient)?;

        self.gains.validate()?;
        let limits = OutputLimits::new(self.output_min, self.output_max)?;

        let filter_seconds = non_negative(
            "derivative_filter_time",
            self.derivative_filter.get::<second>(),
        )?;
        let derivative_filter = if filter_seconds > 0.0 {
            Some(TimeIncrement::from_time(self.derivative_filter)?)
        } else {
            None
        };

        let timestep = TimeIncrement::from_time(self.timestep)?;

        let fall_threshold = self.fall_threshold.get::<radian>();
        if !(fall_threshold > 0.0 && fall_threshold <= PI) {
            return Err(ParametersError::FallThreshold(fall_threshold));
        }

        Ok(Parameters {
            body_mass,
            wheel_mass,
            wheel_radius,
            pendulum_length,
            gravity,
            friction_coefficient: friction,
            gains: self.gains,
            limits,
            derivative_filter,
            timestep,
            fall_threshold,
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ParametersError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParametersError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64, ParametersError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ParametersError::Negative { name, value })
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, ParametersError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParametersError::NotFinite { name, value })
    }
}
