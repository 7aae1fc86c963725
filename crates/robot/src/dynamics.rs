//! Nonlinear equations of motion for the wheeled inverted pendulum.
//!
//! With `x` the axle position and `θ` the body tilt, Lagrange's equations for
//! a rod of mass `m_b` (centre of mass at `l`, inertia `m_b l²/3` about it) on
//! a solid disk wheel of mass `m_w` and radius `r` give
//!
//! ```text
//! A ẍ + B cosθ θ̈ = -u/r + B θ̇² sinθ - b ẋ
//! B cosθ ẍ + C θ̈ = B g sinθ + u + τ
//!
//! A = m_b + 1.5 m_w      B = m_b l      C = 4/3 m_b l²
//! ```
//!
//! where `u` is the drive torque on the body (the wheel feels `-u`), `b` is
//! viscous rolling friction, and `τ` is any external torque on the body. The
//! determinant `A C - B² cos²θ >= m_b l² (2 m_w + m_b/3)` never vanishes, so
//! the system is solved directly by Cramer's rule at every angle.

use std::convert::Infallible;

use teeter_core::Model;

use crate::{Parameters, State, StateDerivative};

/// Computes the state derivative under a constant drive torque.
///
/// `actuation` is the torque the drive applies to the body, in N·m. A
/// negative torque pitches the body back toward negative tilt while the
/// reaction on the wheel pushes the base toward positive position.
#[must_use]
pub fn derivative(state: &State, actuation: f64, parameters: &Parameters) -> StateDerivative {
    derivative_with_load(state, actuation, 0.0, parameters)
}

/// Computes the state derivative with an additional external torque on the body.
#[must_use]
pub fn derivative_with_load(
    state: &State,
    actuation: f64,
    external_torque: f64,
    parameters: &Parameters,
) -> StateDerivative {
    let body_mass = parameters.body_mass();
    let length = parameters.pendulum_length();

    let a = body_mass + 1.5 * parameters.wheel_mass();
    let b = body_mass * length;
    let c = 4.0 / 3.0 * body_mass * length * length;

    let (sin, cos) = state.tilt_angle.sin_cos();

    let base_force = -actuation / parameters.wheel_radius()
        + b * state.tilt_rate.powi(2) * sin
        - parameters.friction_coefficient() * state.velocity;
    let body_torque = b * parameters.gravity() * sin + actuation + external_torque;

    let determinant = a * c - (b * cos).powi(2);

    StateDerivative {
        velocity: state.velocity,
        acceleration: (c * base_force - b * cos * body_torque) / determinant,
        tilt_rate: state.tilt_rate,
        tilt_acceleration: (a * body_torque - b * cos * base_force) / determinant,
    }
}

/// The robot's dynamics over one control step, as a [`Model`].
///
/// The controller's command and any disturbance are held constant for the
/// step, so an integrator can evaluate the model as often as it needs.
#[derive(Debug, Clone, Copy)]
pub struct Dynamics<'a> {
    parameters: &'a Parameters,
    actuation: f64,
    external_torque: f64,
}

impl<'a> Dynamics<'a> {
    /// Dynamics driven by `actuation` with no external load.
    #[must_use]
    pub fn new(parameters: &'a Parameters, actuation: f64) -> Self {
        Self {
            parameters,
            actuation,
            external_torque: 0.0,
        }
    }

    /// Adds an external torque on the body, in N·m.
    #[must_use]
    pub fn with_external_torque(mut self, torque: f64) -> Self {
        self.external_torque = torque;
        self
    }
}

impl Model for Dynamics<'_> {
    type Input = State;
    type Output = StateDerivative;
    type Error = Infallible;

    fn call(&self, input: &State) -> Result<StateDerivative, Infallible> {
        Ok(derivative_with_load(
            input,
            self.actuation,
            self.external_torque,
            self.parameters,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::f64::consts::FRAC_PI_2;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use uom::si::{f64::Mass, mass::kilogram};

    #[test]
    fn upright_robot_at_rest_is_in_equilibrium() {
        let d = derivative(&State::default(), 0.0, &Parameters::default());

        assert_abs_diff_eq!(d.velocity, 0.0);
        assert_abs_diff_eq!(d.acceleration, 0.0);
        assert_abs_diff_eq!(d.tilt_rate, 0.0);
        assert_abs_diff_eq!(d.tilt_acceleration, 0.0);
    }

    #[test]
    fn gravity_tips_a_leaning_body_further() {
        let params = Parameters::default();

        let forward = derivative(&State::tilted(0.1), 0.0, &params);
        let backward = derivative(&State::tilted(-0.1), 0.0, &params);

        assert!(forward.tilt_acceleration > 0.0);
        assert_relative_eq!(forward.tilt_acceleration, -backward.tilt_acceleration);
        // The base slides back under a falling body.
        assert!(forward.acceleration < 0.0);
    }

    #[test]
    fn matches_linearized_model_for_small_tilts() {
        let params = Parameters::default();
        let tilt = 1e-6;

        // Near upright, θ̈ = (A B g θ + (A + B/r) u) / (A C - B²).
        let (a, b, c, r, g) = (1.75, 0.5, 1.0 / 3.0, 0.2, 9.81);
        let det = a * c - b * b;

        let d = derivative(&State::tilted(tilt), 0.0, &params);
        let expected = a * b * g * tilt / det;
        assert_relative_eq!(d.tilt_acceleration, expected, max_relative = 1e-6);

        let d = derivative(&State::default(), 1.0, &params);
        assert_relative_eq!(d.tilt_acceleration, (a + b / r) / det, max_relative = 1e-12);
    }

    #[test]
    fn negative_torque_rights_the_body_and_drives_the_base_forward() {
        let d = derivative(&State::default(), -1.0, &Parameters::default());

        assert!(d.tilt_acceleration < 0.0);
        assert!(d.acceleration > 0.0);
    }

    #[test]
    fn friction_opposes_base_motion() {
        let params = Parameters::builder()
            .friction_coefficient(2.0)
            .build()
            .unwrap();
        let moving = State {
            velocity: 1.0,
            ..State::default()
        };

        let d = derivative(&moving, 0.0, &params);

        assert!(d.acceleration < 0.0);
        assert_relative_eq!(d.velocity, 1.0);
    }

    #[test]
    fn stays_finite_past_horizontal() {
        let params = Parameters::builder()
            .wheel_mass(Mass::new::<kilogram>(0.0))
            .build()
            .unwrap();

        for tilt in [FRAC_PI_2, 2.0, -3.0, 10.0] {
            let state = State {
                tilt_rate: 3.0,
                ..State::tilted(tilt)
            };
            let d = derivative(&state, 5.0, &params);
            assert!(d.acceleration.is_finite(), "tilt {tilt}");
            assert!(d.tilt_acceleration.is_finite(), "tilt {tilt}");
        }
    }

    #[test]
    fn hanging_body_is_pulled_back_down() {
        // Beyond horizontal the gravity torque shrinks again toward θ = π.
        let params = Parameters::default();
        let near_bottom = derivative(&State::tilted(3.0), 0.0, &params);
        let near_horizontal = derivative(&State::tilted(1.6), 0.0, &params);

        assert!(
            near_bottom.tilt_acceleration.abs() < near_horizontal.tilt_acceleration.abs()
        );
    }

    #[test]
    fn external_torque_acts_like_a_push_on_the_body() {
        let params = Parameters::default();
        let model = Dynamics::new(&params, 0.0).with_external_torque(0.5);

        let d = model.call(&State::default()).unwrap();

        assert!(d.tilt_acceleration > 0.0);
        assert_relative_eq!(
            d.tilt_acceleration,
            derivative_with_load(&State::default(), 0.0, 0.5, &params).tilt_acceleration
        );
    }
}
