//! Simulation of a two-wheeled self-balancing robot.
//!
//! The robot is an inverted pendulum riding on a driven wheel. A feedback
//! [`Controller`] reads the tilt error each tick and commands a drive torque;
//! the nonlinear [`dynamics`] are then integrated over one fixed timestep
//! with the command held constant. A [`Simulation`] runs this loop lazily,
//! yielding one [`SimulationTick`] per step until the robot falls or the
//! [`Horizon`] is reached.
//!
//! ```
//! use teeter_robot::{Config, Status};
//!
//! let config = Config::from_toml_str(
//!     r#"
//!     [simulation]
//!     initial_tilt = 0.05
//!     duration_s = 2.0
//!     "#,
//! )
//! .unwrap();
//!
//! let mut sim = config.simulation().unwrap();
//! for tick in sim.by_ref() {
//!     let tick = tick.unwrap();
//!     assert!(tick.state.tilt_angle.abs() < 0.1);
//! }
//! assert_eq!(sim.status(), Status::Completed);
//! ```

mod config;
mod controller;
mod disturbance;
mod method;
mod parameters;
mod simulation;
mod state;

pub mod dynamics;

pub use config::{
    Config, ConfigError, ControllerConfig, DisturbanceConfig, DisturbanceError, PulseConfig,
    RobotConfig, SimulationConfig,
};
pub use controller::{Controller, ControllerError, ControllerState, Pid};
pub use disturbance::{Disturbance, Pulse, PulseError};
pub use method::Method;
pub use parameters::{Gains, OutputLimits, Parameters, ParametersBuilder, ParametersError};
pub use simulation::{Horizon, Simulation, SimulationError, SimulationTick, Status, Summary};
pub use state::{State, StateDerivative};
