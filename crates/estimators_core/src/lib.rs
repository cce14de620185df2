//! The `estimators_core` crate provides the numerical engine behind the estimators C library.
//! It is generic over the floating-point type (`f32`, `f64`) and has no `unsafe` code;
//! the `estimators_ffi` crate wraps it in a flat C ABI.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `UnivariateFunction` and `ScalarOde`
//!   (caller-supplied callbacks), `Steppable` (single-step solvers).
//! - **Derivative**: central and forward differences on a geometric step schedule,
//!   combined by Richardson extrapolation.
//! - **Solvers**: the explicit Euler stepper.
//! - **Integration**: fixed-step Euler runs that fill caller-owned buffers.
//!
//! Callbacks run on the calling thread and are never retained past the call.
//! Calling back into the library from inside a callback is not supported.

pub mod derivative;
pub mod error;
pub mod integration;
pub mod solvers;
pub mod traits;

pub use derivative::{
    estimate_derivative, estimate_forward_derivative, estimate_with, DerivativeEstimate,
    DerivativeSettings, DifferenceScheme, StepSchedule,
};
pub use error::{EstimatorError, Result};
pub use integration::{
    euler_sample_count, euler_trajectory, integrate_euler, integrate_with, EulerSettings,
};
