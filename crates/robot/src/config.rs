//! TOML run configuration.
//!
//! Every table and key is optional; anything left out keeps the default
//! robot from [`ParametersBuilder`]. Values are plain SI numbers and are
//! validated when converted into [`Parameters`].
//!
//! ```toml
//! [robot]
//! body_mass = 1.0             # kg
//! wheel_mass = 0.5            # kg
//! wheel_radius = 0.2          # m
//! pendulum_length = 0.5       # m
//! gravity = 9.81              # m/s²
//! friction_coefficient = 0.0  # N·s/m
//!
//! [controller]
//! gain_p = 50.0
//! gain_i = 0.0
//! gain_d = 5.0
//! output_min = -100.0           # N·m
//! output_max = 100.0            # N·m
//! derivative_filter_time = 0.0  # s, 0 disables the filter
//!
//! [simulation]
//! timestep_dt = 0.01
//! fall_threshold_rad = 1.5707963267948966
//! initial_tilt = 0.05
//! initial_tilt_rate = 0.0
//! duration_s = 5.0            # or tick_count, not both
//! method = "rk4"              # or "euler"
//!
//! [[disturbance.pulses]]
//! start = 1.0                 # s
//! duration = 0.1              # s
//! peak_torque = 5.0           # N·m
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use teeter_core::{TimeIncrement, TimeIncrementError};
use thiserror::Error;
use tracing::debug;
use uom::si::{
    acceleration::meter_per_second_squared,
    angle::radian,
    f64::{Acceleration, Angle, Length, Mass, Time},
    length::meter,
    mass::kilogram,
    time::second,
};

use crate::{
    Disturbance, Horizon, Method, Parameters, ParametersBuilder, ParametersError, Pid, Pulse,
    PulseError, Simulation, State,
};

/// Simulated time used when neither `tick_count` nor `duration_s` is given.
const DEFAULT_DURATION_S: f64 = 5.0;

/// Errors raised while loading or applying a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Parameters(#[from] ParametersError),

    #[error("set either simulation.tick_count or simulation.duration_s, not both")]
    Horizon,

    #[error("invalid simulation duration: {0}")]
    Duration(#[source] TimeIncrementError),

    #[error("invalid disturbance pulse {index}: {source}")]
    Disturbance {
        index: usize,
        #[source]
        source: DisturbanceError,
    },
}

/// Why a configured pulse was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DisturbanceError {
    #[error(transparent)]
    Pulse(#[from] PulseError),

    #[error("duration: {0}")]
    Duration(#[from] TimeIncrementError),
}

/// A complete run description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub robot: RobotConfig,
    pub controller: ControllerConfig,
    pub simulation: SimulationConfig,
    pub disturbance: DisturbanceConfig,
}

/// The `[robot]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RobotConfig {
    pub body_mass: Option<f64>,
    pub wheel_mass: Option<f64>,
    pub wheel_radius: Option<f64>,
    pub pendulum_length: Option<f64>,
    pub gravity: Option<f64>,
    pub friction_coefficient: Option<f64>,
}

/// The `[controller]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub gain_p: Option<f64>,
    pub gain_i: Option<f64>,
    pub gain_d: Option<f64>,
    pub output_min: Option<f64>,
    pub output_max: Option<f64>,
    pub derivative_filter_time: Option<f64>,
}

/// The `[simulation]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub timestep_dt: Option<f64>,
    pub fall_threshold_rad: Option<f64>,
    pub initial_tilt: f64,
    pub initial_tilt_rate: f64,
    pub tick_count: Option<usize>,
    pub duration_s: Option<f64>,
    pub method: Method,
}

/// The `[disturbance]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisturbanceConfig {
    pub pulses: Vec<PulseConfig>,
}

/// One `[[disturbance.pulses]]` entry, in seconds and N·m.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PulseConfig {
    pub start: f64,
    pub duration: f64,
    pub peak_torque: f64,
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML, unknown keys, or
    /// values of the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Config::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Self::from_toml_str(&text)
    }

    /// Builds validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parameters`] if any value fails validation.
    pub fn parameters(&self) -> Result<Parameters, ConfigError> {
        let robot = &self.robot;
        let controller = &self.controller;
        let sim = &self.simulation;

        let mut builder = ParametersBuilder::default();
        if let Some(mass) = robot.body_mass {
            builder = builder.body_mass(Mass::new::<kilogram>(mass));
        }
        if let Some(mass) = robot.wheel_mass {
            builder = builder.wheel_mass(Mass::new::<kilogram>(mass));
        }
        if let Some(radius) = robot.wheel_radius {
            builder = builder.wheel_radius(Length::new::<meter>(radius));
        }
        if let Some(length) = robot.pendulum_length {
            builder = builder.pendulum_length(Length::new::<meter>(length));
        }
        if let Some(gravity) = robot.gravity {
            builder = builder.gravity(Acceleration::new::<meter_per_second_squared>(gravity));
        }
        if let Some(coefficient) = robot.friction_coefficient {
            builder = builder.friction_coefficient(coefficient);
        }

        if let Some(kp) = controller.gain_p {
            builder = builder.proportional_gain(kp);
        }
        if let Some(ki) = controller.gain_i {
            builder = builder.integral_gain(ki);
        }
        if let Some(kd) = controller.gain_d {
            builder = builder.derivative_gain(kd);
        }
        if let Some(min) = controller.output_min {
            builder = builder.output_min(min);
        }
        if let Some(max) = controller.output_max {
            builder = builder.output_max(max);
        }
        if let Some(time_constant) = controller.derivative_filter_time {
            builder = builder.derivative_filter(Time::new::<second>(time_constant));
        }

        if let Some(dt) = sim.timestep_dt {
            builder = builder.timestep(Time::new::<second>(dt));
        }
        if let Some(threshold) = sim.fall_threshold_rad {
            builder = builder.fall_threshold(Angle::new::<radian>(threshold));
        }

        Ok(builder.build()?)
    }

    /// The robot's state at the start of the run.
    #[must_use]
    pub fn initial_state(&self) -> State {
        State {
            tilt_rate: self.simulation.initial_tilt_rate,
            ..State::tilted(self.simulation.initial_tilt)
        }
    }

    /// How long to run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Horizon`] if both `tick_count` and
    /// `duration_s` are set, or [`ConfigError::Duration`] if the duration is
    /// not positive.
    pub fn horizon(&self) -> Result<Horizon, ConfigError> {
        match (self.simulation.tick_count, self.simulation.duration_s) {
            (Some(_), Some(_)) => Err(ConfigError::Horizon),
            (Some(count), None) => Ok(Horizon::Ticks(count)),
            (None, duration) => {
                let seconds = duration.unwrap_or(DEFAULT_DURATION_S);
                TimeIncrement::new::<second>(seconds)
                    .map(Horizon::Duration)
                    .map_err(ConfigError::Duration)
            }
        }
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.simulation.method
    }

    /// The configured external torque schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Disturbance`] naming the first bad pulse.
    pub fn disturbance(&self) -> Result<Disturbance, ConfigError> {
        self.disturbance
            .pulses
            .iter()
            .enumerate()
            .map(|(index, pulse)| {
                pulse
                    .to_pulse()
                    .map_err(|source| ConfigError::Disturbance { index, source })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Disturbance::from)
    }

    /// Assembles a ready-to-run simulation driven by a PID controller.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in any section.
    pub fn simulation(&self) -> Result<Simulation, ConfigError> {
        let parameters = self.parameters()?;
        let horizon = self.horizon()?;
        let disturbance = self.disturbance()?;

        Ok(Simulation::run(
            self.initial_state(),
            parameters,
            Pid::from(&parameters),
            horizon,
        )
        .with_method(self.method())
        .with_disturbance(disturbance))
    }
}

impl PulseConfig {
    fn to_pulse(self) -> Result<Pulse, DisturbanceError> {
        let duration = TimeIncrement::new::<second>(self.duration)?;
        Ok(Pulse::new(
            Time::new::<second>(self.start),
            duration,
            self.peak_torque,
        )?)
    }
}
