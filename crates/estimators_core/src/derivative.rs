//! Finite-difference derivative estimation with Richardson extrapolation.
//!
//! A difference quotient is evaluated on the geometric step schedule
//! `h_i = h0 * factor^i` and the resulting sequence is fed through a
//! Richardson tableau:
//!
//! ```text
//! R[i][0] = D_i
//! R[i][j] = R[i][j-1] + (R[i][j-1] - R[i-1][j-1]) / (t^(p_j) - 1),   t = 1 / factor
//! ```
//!
//! Central differences only carry even powers of `h` in their error
//! expansion (`p_j = 2j`); forward differences carry all of them (`p_j = j`).
//! The returned estimate is the last diagonal entry `R[n-1][n-1]`.
//!
//! Steps are never clamped. Choosing `h0`, `factor` and `n` so that the
//! smallest step is not dominated by cancellation is up to the caller.

use crate::error::{EstimatorError, Result};
use crate::traits::{Scalar, UnivariateFunction};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Difference quotient evaluated at each step of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifferenceScheme {
    /// `(f(x + h) - f(x - h)) / 2h`, error `O(h^2)`.
    Central,
    /// `(f(x + h) - f(x)) / h`, error `O(h)`.
    Forward,
}

impl DifferenceScheme {
    /// Factor by which each tableau column raises the eliminated order.
    fn column_base<T: Scalar>(self, inverse_factor: T) -> T {
        match self {
            DifferenceScheme::Central => inverse_factor * inverse_factor,
            DifferenceScheme::Forward => inverse_factor,
        }
    }
}

/// Step schedule and scheme for one derivative estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivativeSettings<T> {
    pub initial_step: T,
    pub step_factor: T,
    pub iterations: usize,
    pub scheme: DifferenceScheme,
}

impl Default for DerivativeSettings<f64> {
    fn default() -> Self {
        Self {
            initial_step: 1e-2,
            step_factor: 0.5,
            iterations: 6,
            scheme: DifferenceScheme::Central,
        }
    }
}

impl<T: Scalar> DerivativeSettings<T> {
    pub fn central(initial_step: T, step_factor: T, iterations: usize) -> Self {
        Self {
            initial_step,
            step_factor,
            iterations,
            scheme: DifferenceScheme::Central,
        }
    }

    pub fn forward(initial_step: T, step_factor: T, iterations: usize) -> Self {
        Self {
            scheme: DifferenceScheme::Forward,
            ..Self::central(initial_step, step_factor, iterations)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.initial_step > T::zero()) || !self.initial_step.is_finite() {
            return Err(EstimatorError::invalid(
                "initial_step",
                "must be positive and finite",
            ));
        }
        if !(self.step_factor > T::zero() && self.step_factor < T::one()) {
            return Err(EstimatorError::invalid(
                "step_factor",
                "must lie strictly between 0 and 1",
            ));
        }
        if self.iterations == 0 {
            return Err(EstimatorError::invalid("iterations", "must be at least 1"));
        }
        Ok(())
    }

    pub fn schedule(&self) -> StepSchedule<T> {
        StepSchedule::new(self.initial_step, self.step_factor, self.iterations)
    }
}

/// The geometric step sequence `h0, h0 * factor, h0 * factor^2, ...`.
#[derive(Debug, Clone)]
pub struct StepSchedule<T> {
    next: T,
    factor: T,
    remaining: usize,
}

impl<T: Scalar> StepSchedule<T> {
    pub fn new(initial_step: T, factor: T, count: usize) -> Self {
        Self {
            next: initial_step,
            factor,
            remaining: count,
        }
    }
}

impl<T: Scalar> Iterator for StepSchedule<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let h = self.next;
        self.next = h * self.factor;
        Some(h)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Scalar> ExactSizeIterator for StepSchedule<T> {}

#[derive(Debug, Clone, Serialize)]
pub struct DerivativeEstimate<T> {
    /// Extrapolated derivative, the last diagonal entry of the tableau.
    pub value: T,
    /// Plain difference quotients `D_i`, one per step.
    pub raw: Vec<T>,
    /// Change of the diagonal between consecutive iterations.
    pub corrections: Vec<T>,
    /// Number of times the function was evaluated.
    pub evaluations: usize,
}

/// Runs the refinement described by `settings` at the point `x`.
pub fn estimate_with<T, F>(
    f: &F,
    x: T,
    settings: &DerivativeSettings<T>,
) -> Result<DerivativeEstimate<T>>
where
    T: Scalar,
    F: UnivariateFunction<T> + ?Sized,
{
    settings.validate()?;
    if !x.is_finite() {
        return Err(EstimatorError::invalid("x", "must be finite"));
    }

    let scheme = settings.scheme;
    let base = scheme.column_base(settings.step_factor.recip());
    let mut evaluations = 0usize;
    let fx = match scheme {
        DifferenceScheme::Forward => {
            evaluations += 1;
            Some(f.eval(x))
        }
        DifferenceScheme::Central => None,
    };

    let mut raw = Vec::new();
    let mut corrections = Vec::new();
    let mut previous_row: Vec<T> = Vec::new();

    for (i, h) in settings.schedule().enumerate() {
        let d = match fx {
            Some(fx) => (f.eval(x + h) - fx) / h,
            None => {
                let two = T::one() + T::one();
                (f.eval(x + h) - f.eval(x - h)) / (two * h)
            }
        };
        evaluations += match scheme {
            DifferenceScheme::Central => 2,
            DifferenceScheme::Forward => 1,
        };
        raw.push(d);

        let mut row = Vec::with_capacity(i + 1);
        row.push(d);
        let mut ratio = T::one();
        for j in 1..=i {
            ratio = ratio * base;
            let current = row[j - 1];
            row.push(current + (current - previous_row[j - 1]) / (ratio - T::one()));
        }

        let estimate = row[i];
        let correction = previous_row.last().map(|&last| estimate - last);
        if let Some(correction) = correction {
            corrections.push(correction);
        }
        debug!(
            iteration = i,
            step = ?h,
            raw = ?d,
            estimate = ?estimate,
            correction = ?correction,
            "refined derivative estimate"
        );
        previous_row = row;
    }

    let value = previous_row
        .last()
        .copied()
        .ok_or_else(|| EstimatorError::invalid("iterations", "must be at least 1"))?;

    Ok(DerivativeEstimate {
        value,
        raw,
        corrections,
        evaluations,
    })
}

/// Central-difference estimate of `f'(x)` refined over `iterations` steps.
///
/// `f` is evaluated exactly `2 * iterations` times, in pairs at `x + h_i`
/// and `x - h_i`.
pub fn estimate_derivative<T, F>(
    f: &F,
    x: T,
    initial_step: T,
    step_factor: T,
    iterations: usize,
) -> Result<T>
where
    T: Scalar,
    F: UnivariateFunction<T> + ?Sized,
{
    let settings = DerivativeSettings::central(initial_step, step_factor, iterations);
    estimate_with(f, x, &settings).map(|estimate| estimate.value)
}

/// Forward-difference estimate of `f'(x)`; evaluates `f` `iterations + 1` times.
pub fn estimate_forward_derivative<T, F>(
    f: &F,
    x: T,
    initial_step: T,
    step_factor: T,
    iterations: usize,
) -> Result<T>
where
    T: Scalar,
    F: UnivariateFunction<T> + ?Sized,
{
    let settings = DerivativeSettings::forward(initial_step, step_factor, iterations);
    estimate_with(f, x, &settings).map(|estimate| estimate.value)
}
