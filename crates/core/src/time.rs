use std::fmt;

use thiserror::Error;
use uom::{
    Conversion,
    si::{f64::Time, time},
};

/// A unit-safe, strictly positive duration used to advance simulation time.
///
/// `TimeIncrement` wraps a [`Time`] value while enforcing that the duration is
/// finite and strictly greater than zero.
///
/// # Construction
///
/// ```
/// use teeter_core::TimeIncrement;
/// use uom::si::time::millisecond;
///
/// let dt = TimeIncrement::new::<millisecond>(10.0).unwrap();
/// assert!((dt.seconds() - 0.01).abs() < 1e-12);
/// ```
///
/// Zero, negative, or non-finite values result in
/// [`TimeIncrementError::NotPositive`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeIncrement(Time);

/// Error type returned when constructing an invalid [`TimeIncrement`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimeIncrementError {
    #[error("time increment must be finite and greater than zero, got {0} s")]
    NotPositive(f64),
}

impl TimeIncrement {
    /// Constructs a `TimeIncrement` from a numeric value and unit.
    ///
    /// # Errors
    ///
    /// Returns [`TimeIncrementError::NotPositive`] if `value` is zero, negative,
    /// or not finite.
    pub fn new<U>(value: f64) -> Result<Self, TimeIncrementError>
    where
        U: time::Unit + Conversion<f64, T = f64>,
    {
        Self::from_time(Time::new::<U>(value))
    }

    /// Constructs a `TimeIncrement` from an existing [`Time`] value.
    ///
    /// # Errors
    ///
    /// Returns [`TimeIncrementError::NotPositive`] if the time is zero,
    /// negative, or not finite.
    pub fn from_time(time: Time) -> Result<Self, TimeIncrementError> {
        let seconds = time.get::<time::second>();
        if seconds.is_finite() && seconds > 0.0 {
            Ok(Self(time))
        } else {
            Err(TimeIncrementError::NotPositive(seconds))
        }
    }

    /// Returns the increment in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.0.get::<time::second>()
    }

    /// Returns how many steps of `dt` are needed to cover this interval.
    ///
    /// Intervals that are an exact multiple of `dt` (within floating point
    /// noise) take exactly that many steps; otherwise the count rounds up so
    /// the steps never fall short.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn steps_required(&self, dt: TimeIncrement) -> usize {
        let ratio = self.seconds() / dt.seconds();
        let nearest = ratio.round();
        if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
            nearest as usize
        } else {
            ratio.ceil() as usize
        }
    }
}

impl TryFrom<Time> for TimeIncrement {
    type Error = TimeIncrementError;

    fn try_from(t: Time) -> Result<Self, Self::Error> {
        Self::from_time(t)
    }
}

impl fmt::Display for TimeIncrement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.seconds())
    }
}
