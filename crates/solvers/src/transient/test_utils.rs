//! Small models with known solutions for exercising the integrators.

use std::convert::Infallible;

use teeter_core::{Model, StepIntegrable};
use thiserror::Error;

/// A scalar quantity decaying as `y' = -rate * y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level(pub f64);

#[derive(Debug, Clone, Copy)]
pub struct LevelRate(pub f64);

impl StepIntegrable<f64> for Level {
    type Derivative = LevelRate;

    fn step(&self, derivative: LevelRate, dt: f64) -> Self {
        Level(self.0 + derivative.0 * dt)
    }
}

pub struct Decay {
    pub rate: f64,
}

impl Model for Decay {
    type Input = Level;
    type Output = LevelRate;
    type Error = Infallible;

    fn call(&self, input: &Level) -> Result<LevelRate, Infallible> {
        Ok(LevelRate(-self.rate * input.0))
    }
}

/// Undamped oscillator state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swing {
    pub position: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SwingRates {
    pub position: f64,
    pub velocity: f64,
}

impl StepIntegrable<f64> for Swing {
    type Derivative = SwingRates;

    fn step(&self, derivative: SwingRates, dt: f64) -> Self {
        Swing {
            position: self.position + derivative.position * dt,
            velocity: self.velocity + derivative.velocity * dt,
        }
    }
}

/// `x'' = -omega² x`, with `x(t) = cos(omega t)` for `x(0) = 1, v(0) = 0`.
pub struct Oscillator {
    pub omega: f64,
}

impl Model for Oscillator {
    type Input = Swing;
    type Output = SwingRates;
    type Error = Infallible;

    fn call(&self, input: &Swing) -> Result<SwingRates, Infallible> {
        Ok(SwingRates {
            position: input.velocity,
            velocity: -self.omega.powi(2) * input.position,
        })
    }
}

#[derive(Debug, Error)]
#[error("level {0} is out of range")]
pub struct OutOfRange(pub f64);

/// A model that refuses negative levels.
pub struct NonNegative;

impl Model for NonNegative {
    type Input = Level;
    type Output = LevelRate;
    type Error = OutOfRange;

    fn call(&self, input: &Level) -> Result<LevelRate, OutOfRange> {
        if input.0 < 0.0 {
            Err(OutOfRange(input.0))
        } else {
            Ok(LevelRate(-1.0))
        }
    }
}
