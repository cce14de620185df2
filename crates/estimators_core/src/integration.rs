//! Fixed-step integration of scalar initial-value problems into caller-owned buffers.
//!
//! The number of samples for `[lo, hi]` with step `h` is
//! `floor((hi - lo) / h) + 1`, where a quotient within a few ulps
//! (`4 * epsilon * max(|q|, 1)`) of an integer counts as that integer.
//! Sample `i` holds the solution at `lo + i * h` as accumulated by repeated
//! addition; the last sample is not moved onto `hi`.

use crate::error::{EstimatorError, Result};
use crate::solvers::Euler;
use crate::traits::{Scalar, ScalarOde, Steppable};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Interval, initial condition and step size for one Euler run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerSettings<T> {
    pub lo: T,
    pub hi: T,
    pub initial_value: T,
    pub step_size: T,
}

impl Default for EulerSettings<f64> {
    fn default() -> Self {
        Self {
            lo: 0.0,
            hi: 1.0,
            initial_value: 1.0,
            step_size: 1e-2,
        }
    }
}

impl<T: Scalar> EulerSettings<T> {
    pub fn new(lo: T, hi: T, initial_value: T, step_size: T) -> Self {
        Self {
            lo,
            hi,
            initial_value,
            step_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_grid(self.lo, self.hi, self.step_size)?;
        if !self.initial_value.is_finite() {
            return Err(EstimatorError::invalid("y0", "must be finite"));
        }
        Ok(())
    }

    /// Number of samples an output buffer must hold for these settings.
    pub fn sample_count(&self) -> Result<usize> {
        euler_sample_count(self.lo, self.hi, self.step_size)
    }
}

fn validate_grid<T: Scalar>(lo: T, hi: T, step_size: T) -> Result<()> {
    if !lo.is_finite() {
        return Err(EstimatorError::invalid("lo", "must be finite"));
    }
    if !hi.is_finite() {
        return Err(EstimatorError::invalid("hi", "must be finite"));
    }
    if !(lo < hi) {
        return Err(EstimatorError::invalid("hi", "must be greater than lo"));
    }
    if !(step_size > T::zero()) || !step_size.is_finite() {
        return Err(EstimatorError::invalid(
            "step_size",
            "must be positive and finite",
        ));
    }
    Ok(())
}

/// Returns `floor((hi - lo) / step_size) + 1` after validating the grid.
pub fn euler_sample_count<T: Scalar>(lo: T, hi: T, step_size: T) -> Result<usize> {
    validate_grid(lo, hi, step_size)?;

    let quotient = (hi - lo) / step_size;
    if !quotient.is_finite() {
        return Err(EstimatorError::SampleCountOverflow);
    }
    let nearest = quotient.round();
    let four = T::one() + T::one() + T::one() + T::one();
    // Rounding drift only; a genuine fractional step is floored.
    let tolerance = four * T::epsilon() * quotient.abs().max(T::one());
    let steps = if (quotient - nearest).abs() <= tolerance {
        nearest
    } else {
        quotient.floor()
    };

    steps
        .to_usize()
        .and_then(|steps| steps.checked_add(1))
        .ok_or(EstimatorError::SampleCountOverflow)
}

/// Integrates `dy/dx = ode(x, y)` with forward Euler, writing every sample into `buffer`.
///
/// `buffer[0]` receives the initial value and `buffer[i + 1]` the value after
/// `i + 1` steps. All preconditions, the buffer length included, are checked
/// before the first write, so a failed call leaves `buffer` untouched.
/// Returns the number of samples written.
pub fn integrate_with<T, O>(
    ode: &O,
    buffer: &mut [T],
    settings: &EulerSettings<T>,
) -> Result<usize>
where
    T: Scalar,
    O: ScalarOde<T>,
{
    settings.validate()?;
    let expected = settings.sample_count()?;
    if buffer.len() != expected {
        return Err(EstimatorError::BufferSizeMismatch {
            expected,
            actual: buffer.len(),
        });
    }

    let mut stepper = Euler::new();
    let mut x = settings.lo;
    let mut y = settings.initial_value;
    // expected >= 1, so the buffer always holds at least the initial value.
    if let Some((first, rest)) = buffer.split_first_mut() {
        *first = y;
        for slot in rest {
            stepper.step(ode, &mut x, &mut y, settings.step_size);
            *slot = y;
        }
    }

    debug!(
        samples = expected,
        final_x = ?x,
        final_y = ?y,
        "euler integration finished"
    );
    Ok(expected)
}

/// Positional form of [`integrate_with`].
pub fn integrate_euler<T, O>(
    ode: &O,
    buffer: &mut [T],
    lo: T,
    hi: T,
    y0: T,
    step_size: T,
) -> Result<usize>
where
    T: Scalar,
    O: ScalarOde<T>,
{
    integrate_with(ode, buffer, &EulerSettings::new(lo, hi, y0, step_size))
}

/// Allocates a correctly sized buffer and fills it with [`integrate_with`].
pub fn euler_trajectory<T, O>(ode: &O, settings: &EulerSettings<T>) -> Result<Vec<T>>
where
    T: Scalar,
    O: ScalarOde<T>,
{
    settings.validate()?;
    let mut samples = vec![T::zero(); settings.sample_count()?];
    integrate_with(ode, &mut samples, settings)?;
    Ok(samples)
}
