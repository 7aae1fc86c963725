/// A state that can be advanced by its derivative over a step `Delta`.
///
/// Implementing this trait lets the integrators in `teeter-solvers` work with
/// any state type: they only ever form `state + derivative * delta`, and
/// higher-order schemes chain several such steps together.
///
/// `Delta` is usually `f64` seconds, but nothing stops a state from stepping
/// over a dimensioned quantity such as `uom::si::f64::Time`.
pub trait StepIntegrable<Delta> {
    /// The derivative of the state with respect to `Delta`.
    type Derivative;

    /// Returns the state advanced by `derivative * delta`.
    #[must_use]
    fn step(&self, derivative: Self::Derivative, delta: Delta) -> Self;
}

/// Shorthand for the [`StepIntegrable::Derivative`] of `T`.
pub type DerivativeOf<T, Delta> = <T as StepIntegrable<Delta>>::Derivative;
