use crate::traits::{Scalar, ScalarOde, Steppable};

/// Explicit (forward) Euler stepper.
/// Evaluates y_{n+1} = y_n + h * f(x_n, y_n); first order, one evaluation per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl Euler {
    pub fn new() -> Self {
        Self
    }
}

impl<T: Scalar> Steppable<T> for Euler {
    fn step(&mut self, ode: &impl ScalarOde<T>, x: &mut T, y: &mut T, h: T) {
        let x0 = *x;

        // slope at the left end of the step
        let k = ode.rhs(x0, *y);
        *y = *y + h * k;

        // No snapping to the interval end; drift in x is accepted.
        *x = x0 + h;
    }
}
