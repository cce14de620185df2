use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the estimators.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A real function of one real variable, `y = f(x)`.
///
/// Implementations are borrowed for the duration of a single estimator call
/// and never stored. Calling back into the estimators from `eval` is not
/// supported.
pub trait UnivariateFunction<T: Scalar> {
    fn eval(&self, x: T) -> T;
}

impl<T: Scalar, F: Fn(T) -> T + ?Sized> UnivariateFunction<T> for F {
    fn eval(&self, x: T) -> T {
        self(x)
    }
}

/// Right-hand side of a scalar initial-value problem, `dy/dx = f(x, y)`.
pub trait ScalarOde<T: Scalar> {
    /// x: independent variable
    /// y: current solution value
    fn rhs(&self, x: T, y: T) -> T;
}

impl<T: Scalar, F: Fn(T, T) -> T + ?Sized> ScalarOde<T> for F {
    fn rhs(&self, x: T, y: T) -> T {
        self(x, y)
    }
}

/// A trait for solvers that can step a scalar ODE forward.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size h.
    /// x: independent variable (updated after step)
    /// y: current solution (updated after step)
    fn step(&mut self, ode: &impl ScalarOde<T>, x: &mut T, y: &mut T, h: T);
}
