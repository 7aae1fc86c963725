use std::f64::consts::{PI, TAU};

use teeter_core::StepIntegrable;

/// Kinematic state of the robot.
///
/// `tilt_angle` is measured from vertical and is positive when the body
/// leans toward positive `position`. It is never wrapped during integration,
/// so an angle past ±π/2 means the body is lying on the ground; use
/// [`State::wrapped_tilt`] when reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct State {
    /// Horizontal displacement of the axle, in m.
    pub position: f64,
    /// Velocity of the axle, in m/s.
    pub velocity: f64,
    /// Tilt of the body from vertical, in rad.
    pub tilt_angle: f64,
    /// Angular velocity of the body, in rad/s.
    pub tilt_rate: f64,
}

impl State {
    /// A robot at rest at the origin, tilted by `tilt_angle` radians.
    #[must_use]
    pub fn tilted(tilt_angle: f64) -> Self {
        Self {
            tilt_angle,
            ..Self::default()
        }
    }

    /// The tilt angle wrapped into `(-π, π]`.
    #[must_use]
    pub fn wrapped_tilt(&self) -> f64 {
        let wrapped = (self.tilt_angle + PI).rem_euclid(TAU) - PI;
        if wrapped <= -PI {
            wrapped + TAU
        } else {
            wrapped
        }
    }
}

/// Time derivative of a [`State`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateDerivative {
    /// Rate of change of position, in m/s.
    pub velocity: f64,
    /// Base acceleration, in m/s².
    pub acceleration: f64,
    /// Rate of change of tilt, in rad/s.
    pub tilt_rate: f64,
    /// Angular acceleration of the body, in rad/s².
    pub tilt_acceleration: f64,
}

impl StepIntegrable<f64> for State {
    type Derivative = StateDerivative;

    fn step(&self, derivative: StateDerivative, dt: f64) -> Self {
        Self {
            position: self.position + derivative.velocity * dt,
            velocity: self.velocity + derivative.acceleration * dt,
            tilt_angle: self.tilt_angle + derivative.tilt_rate * dt,
            tilt_rate: self.tilt_rate + derivative.tilt_acceleration * dt,
        }
    }
}
