//! Deterministic external torques applied to the robot body.

use std::f64::consts::PI;

use teeter_core::TimeIncrement;
use thiserror::Error;
use uom::si::{f64::Time, time::second};

/// Errors raised when a [`Pulse`] is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PulseError {
    #[error("pulse start must be finite and non-negative, got {0} s")]
    Start(f64),

    #[error("pulse peak torque must be finite, got {0} N·m")]
    PeakTorque(f64),
}

/// A half-sine torque pulse on the body.
///
/// The torque rises from zero at `start`, peaks at `peak_torque` halfway
/// through, and returns to zero after `duration`. A positive torque pushes
/// the body toward positive tilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    start: f64,
    duration: f64,
    peak_torque: f64,
}

impl Pulse {
    /// Creates a pulse.
    ///
    /// # Errors
    ///
    /// Returns a [`PulseError`] if `start` is negative or not finite, or if
    /// `peak_torque` is not finite.
    pub fn new(start: Time, duration: TimeIncrement, peak_torque: f64) -> Result<Self, PulseError> {
        let start = start.get::<second>();
        if !(start.is_finite() && start >= 0.0) {
            return Err(PulseError::Start(start));
        }
        if !peak_torque.is_finite() {
            return Err(PulseError::PeakTorque(peak_torque));
        }
        Ok(Self {
            start,
            duration: duration.seconds(),
            peak_torque,
        })
    }

    /// When the pulse begins, in seconds.
    #[must_use]
    pub fn start(&self) -> f64 {
        self.start
    }

    /// When the pulse has fully decayed, in seconds.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    #[must_use]
    pub fn peak_torque(&self) -> f64 {
        self.peak_torque
    }

    /// The torque delivered at `time` seconds.
    #[must_use]
    pub fn torque_at(&self, time: f64) -> f64 {
        if time < self.start || time > self.end() {
            return 0.0;
        }
        let phase = (time - self.start) / self.duration;
        self.peak_torque * (PI * phase).sin()
    }
}

/// An external torque schedule.
///
/// Overlapping pulses add.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Disturbance {
    /// The robot is left alone.
    #[default]
    None,
    Pulses(Vec<Pulse>),
}

impl Disturbance {
    /// The total external torque at `time` seconds, in N·m.
    #[must_use]
    pub fn torque_at(&self, time: f64) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Pulses(pulses) => pulses.iter().map(|pulse| pulse.torque_at(time)).sum(),
        }
    }
}

impl From<Vec<Pulse>> for Disturbance {
    fn from(pulses: Vec<Pulse>) -> Self {
        if pulses.is_empty() {
            Self::None
        } else {
            Self::Pulses(pulses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use uom::si::time::millisecond;

    fn pulse(start: f64, duration: f64, peak: f64) -> Pulse {
        Pulse::new(
            Time::new::<second>(start),
            TimeIncrement::new::<second>(duration).unwrap(),
            peak,
        )
        .unwrap()
    }

    #[test]
    fn half_sine_shape() {
        let p = pulse(1.0, 0.2, 3.0);

        assert_abs_diff_eq!(p.torque_at(0.99), 0.0);
        assert_abs_diff_eq!(p.torque_at(1.0), 0.0);
        assert_relative_eq!(p.torque_at(1.1), 3.0, epsilon = 1e-12);
        assert_relative_eq!(p.torque_at(1.05), 3.0 * (PI / 4.0).sin(), epsilon = 1e-12);
        assert_abs_diff_eq!(p.torque_at(1.2), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.torque_at(1.3), 0.0);
    }

    #[test]
    fn no_disturbance_means_no_torque() {
        assert_abs_diff_eq!(Disturbance::None.torque_at(0.0), 0.0);
        assert_abs_diff_eq!(Disturbance::default().torque_at(12.5), 0.0);
        assert_eq!(Disturbance::from(Vec::new()), Disturbance::None);
    }

    #[test]
    fn overlapping_pulses_add() {
        let disturbance = Disturbance::from(vec![pulse(0.0, 1.0, 2.0), pulse(0.0, 1.0, -0.5)]);
        assert_relative_eq!(disturbance.torque_at(0.5), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_pulses() {
        let duration = TimeIncrement::new::<millisecond>(100.0).unwrap();

        assert_eq!(
            Pulse::new(Time::new::<second>(-1.0), duration, 1.0),
            Err(PulseError::Start(-1.0))
        );
        assert!(matches!(
            Pulse::new(Time::new::<second>(0.0), duration, f64::NAN),
            Err(PulseError::PeakTorque(_))
        ));
    }
}
