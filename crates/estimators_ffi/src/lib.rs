//! C ABI bridge for the estimators core (`libestimators`).
//!
//! Every entry point is synchronous and runs its callback on the calling thread.
//! Callbacks are plain C function pointers, used only for the duration of the
//! call; calling back into the library from inside a callback is unsupported.
//! Panics never unwind into the host: they are caught and reported as
//! [`EstimatorStatus::Panicked`] or NaN.

pub mod logging;
pub mod status;

pub use status::EstimatorStatus;

use estimators_core::{DerivativeSettings, EstimatorError};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::slice;
use tracing::{error, info, warn};

/// `double (*)(double)`; null maps to `None`.
pub type UnaryCallback = extern "C" fn(f64) -> f64;
/// `double (*)(double x, double y)`; null maps to `None`.
pub type BinaryCallback = extern "C" fn(f64, f64) -> f64;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

fn guard<R>(entry: &'static str, fallback: R, body: impl FnOnce() -> R) -> R {
    logging::init();
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(_) => {
            error!(entry, "panic caught at the C boundary");
            fallback
        }
    }
}

fn report(entry: &'static str, err: &EstimatorError) -> EstimatorStatus {
    warn!(entry, error = %err, "call rejected");
    EstimatorStatus::from(err)
}

fn null_argument(entry: &'static str, argument: &'static str) -> EstimatorStatus {
    warn!(entry, argument, "null pointer argument");
    EstimatorStatus::NullPointer
}

fn run_derivative(
    entry: &'static str,
    callback: Option<UnaryCallback>,
    x: f64,
    settings: DerivativeSettings<f64>,
) -> Result<f64, EstimatorStatus> {
    let callback = callback.ok_or_else(|| null_argument(entry, "callback"))?;
    let f = move |x: f64| callback(x);
    estimators_core::estimate_with(&f, x, &settings)
        .map(|estimate| estimate.value)
        .map_err(|err| report(entry, &err))
}

/// Central-difference derivative of `callback` at `x`, refined over `n` iterations with
/// steps `h0 * factor^i` and combined by Richardson extrapolation.
///
/// Returns NaN when `callback` is null, `factor` is not strictly inside `(0, 1)`,
/// `n == 0`, `h0` is not positive, or any input is non-finite.
#[no_mangle]
pub extern "C" fn estimate_derivative(
    callback: Option<UnaryCallback>,
    x: f64,
    h0: f64,
    factor: f64,
    n: usize,
) -> f64 {
    guard("estimate_derivative", f64::NAN, || {
        let settings = DerivativeSettings::central(h0, factor, n);
        run_derivative("estimate_derivative", callback, x, settings).unwrap_or(f64::NAN)
    })
}

/// Same as [`estimate_derivative`] with a forward difference, `(f(x + h) - f(x)) / h`.
#[no_mangle]
pub extern "C" fn estimate_forward_derivative(
    callback: Option<UnaryCallback>,
    x: f64,
    h0: f64,
    factor: f64,
    n: usize,
) -> f64 {
    guard("estimate_forward_derivative", f64::NAN, || {
        let settings = DerivativeSettings::forward(h0, factor, n);
        run_derivative("estimate_forward_derivative", callback, x, settings).unwrap_or(f64::NAN)
    })
}

/// Status-returning form of [`estimate_derivative`]. On success the estimate is
/// stored in `*out`; on failure `*out` is not written.
///
/// `out` must be null or valid for a single `double` write.
#[no_mangle]
pub extern "C" fn estimate_derivative_checked(
    callback: Option<UnaryCallback>,
    x: f64,
    h0: f64,
    factor: f64,
    n: usize,
    out: *mut f64,
) -> i32 {
    const ENTRY: &str = "estimate_derivative_checked";
    guard(ENTRY, EstimatorStatus::Panicked.code(), || {
        if out.is_null() {
            return null_argument(ENTRY, "out").code();
        }
        let settings = DerivativeSettings::central(h0, factor, n);
        match run_derivative(ENTRY, callback, x, settings) {
            Ok(value) => {
                unsafe {
                    *out = value;
                }
                EstimatorStatus::Ok.code()
            }
            Err(status) => status.code(),
        }
    })
}

/// Integrates `dy/dx = callback(x, y)` from `lo` to `hi` with explicit Euler steps of
/// `step_size`, starting from `y0`, into `buffer[0..buffer_len]`.
///
/// `buffer_len` must equal `euler_sample_count(lo, hi, step_size)`. On any
/// non-zero status the buffer is left untouched.
///
/// `buffer` must point to `buffer_len` writable, properly aligned doubles that no
/// other thread accesses during the call.
#[no_mangle]
pub extern "C" fn integrate_euler(
    callback: Option<BinaryCallback>,
    buffer: *mut f64,
    buffer_len: usize,
    lo: f64,
    hi: f64,
    y0: f64,
    step_size: f64,
) -> i32 {
    const ENTRY: &str = "integrate_euler";
    guard(ENTRY, EstimatorStatus::Panicked.code(), || {
        let Some(callback) = callback else {
            return null_argument(ENTRY, "callback").code();
        };
        if buffer.is_null() {
            return null_argument(ENTRY, "buffer").code();
        }
        // The slice may only be formed once `buffer_len` is known to match the grid.
        let expected = match estimators_core::euler_sample_count(lo, hi, step_size) {
            Ok(expected) => expected,
            Err(err) => return report(ENTRY, &err).code(),
        };
        if buffer_len != expected {
            let err = EstimatorError::BufferSizeMismatch {
                expected,
                actual: buffer_len,
            };
            return report(ENTRY, &err).code();
        }
        let samples = unsafe { slice::from_raw_parts_mut(buffer, buffer_len) };
        let ode = move |x: f64, y: f64| callback(x, y);
        match estimators_core::integrate_euler(&ode, samples, lo, hi, y0, step_size) {
            Ok(_) => EstimatorStatus::Ok.code(),
            Err(err) => report(ENTRY, &err).code(),
        }
    })
}

/// Number of samples `integrate_euler` writes for the grid, `floor((hi - lo) / step_size) + 1`.
/// Returns 0 for an invalid grid.
#[no_mangle]
pub extern "C" fn euler_sample_count(lo: f64, hi: f64, step_size: f64) -> usize {
    const ENTRY: &str = "euler_sample_count";
    guard(ENTRY, 0, || {
        estimators_core::euler_sample_count(lo, hi, step_size).unwrap_or_else(|err| {
            report(ENTRY, &err);
            0
        })
    })
}

/// Confirms the library is loaded and callable. Emits one `info` event on the
/// `estimators::probe` target and returns.
#[no_mangle]
pub extern "C" fn link_probe() {
    guard("link_probe", (), || {
        info!(
            target: "estimators::probe",
            library = env!("CARGO_PKG_NAME"),
            version = env!("CARGO_PKG_VERSION"),
            "link probe"
        );
    })
}

/// Static, NUL-terminated description of a status code. Never null; the host must not free it.
#[no_mangle]
pub extern "C" fn estimators_status_message(code: i32) -> *const c_char {
    EstimatorStatus::from_code(code)
        .map(EstimatorStatus::message)
        .unwrap_or(status::UNKNOWN_STATUS)
        .as_ptr()
}

/// Static, NUL-terminated library version. The host must not free it.
#[no_mangle]
pub extern "C" fn estimators_version() -> *const c_char {
    VERSION.as_ptr().cast()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::f64::consts::E;
    use std::ffi::CStr;

    thread_local! {
        static CALLS: Cell<usize> = const { Cell::new(0) };
    }

    fn reset_calls() {
        CALLS.with(|calls| calls.set(0));
    }

    fn calls() -> usize {
        CALLS.with(Cell::get)
    }

    extern "C" fn exp_cb(x: f64) -> f64 {
        CALLS.with(|calls| calls.set(calls.get() + 1));
        x.exp()
    }

    extern "C" fn growth_cb(_x: f64, y: f64) -> f64 {
        CALLS.with(|calls| calls.set(calls.get() + 1));
        y
    }

    #[test]
    fn derivative_of_exp_approaches_e() {
        let value = estimate_derivative(Some(exp_cb), 1.0, 0.5, 0.5, 4);
        assert_relative_eq!(value, E, epsilon = 1e-8);
    }

    #[test]
    fn derivative_calls_back_twice_per_iteration() {
        reset_calls();
        estimate_derivative(Some(exp_cb), 1.0, 0.1, 0.5, 7);
        assert_eq!(calls(), 14);
    }

    #[test]
    fn single_iteration_matches_central_difference() {
        let value = estimate_derivative(Some(exp_cb), 1.0, 0.2, 0.5, 1);
        let expected = (1.2f64.exp() - 0.8f64.exp()) / 0.4;
        assert_eq!(value, expected);
    }

    #[test]
    fn invalid_derivative_arguments_return_nan() {
        for factor in [0.0, 1.0, 1.5] {
            assert!(estimate_derivative(Some(exp_cb), 1.0, 0.1, factor, 4).is_nan());
        }
        assert!(estimate_derivative(Some(exp_cb), 1.0, 0.1, 0.5, 0).is_nan());
        assert!(estimate_derivative(Some(exp_cb), 1.0, -0.1, 0.5, 4).is_nan());
        assert!(estimate_derivative(None, 1.0, 0.1, 0.5, 4).is_nan());
    }

    #[test]
    fn factor_just_inside_unit_interval_is_finite() {
        let value = estimate_derivative(Some(exp_cb), 1.0, 0.1, 0.999, 3);
        assert!(value.is_finite());
    }

    #[test]
    fn forward_derivative_is_exported() {
        reset_calls();
        let value = estimate_forward_derivative(Some(exp_cb), 1.0, 0.5, 0.5, 6);
        assert_eq!(calls(), 7);
        assert_relative_eq!(value, E, epsilon = 1e-6);
        assert!(estimate_forward_derivative(None, 1.0, 0.5, 0.5, 6).is_nan());
    }

    #[test]
    fn checked_derivative_reports_status() {
        let mut out = -1.0;
        let status = estimate_derivative_checked(Some(exp_cb), 1.0, 0.5, 0.5, 4, &mut out);
        assert_eq!(status, EstimatorStatus::Ok.code());
        assert_relative_eq!(out, E, epsilon = 1e-8);

        let mut out = -1.0;
        let status = estimate_derivative_checked(Some(exp_cb), 1.0, 0.5, 1.0, 4, &mut out);
        assert_eq!(status, EstimatorStatus::InvalidParameter.code());
        assert_eq!(out, -1.0);

        let status = estimate_derivative_checked(None, 1.0, 0.5, 0.5, 4, &mut out);
        assert_eq!(status, EstimatorStatus::NullPointer.code());
        assert_eq!(out, -1.0);

        let status =
            estimate_derivative_checked(Some(exp_cb), 1.0, 0.5, 0.5, 4, std::ptr::null_mut());
        assert_eq!(status, EstimatorStatus::NullPointer.code());
    }

    #[test]
    fn euler_fills_buffer_and_reaches_e() {
        let len = euler_sample_count(0.0, 1.0, 1e-3);
        assert_eq!(len, 1001);
        let mut buffer = vec![0.0; len];
        reset_calls();
        let status = integrate_euler(
            Some(growth_cb),
            buffer.as_mut_ptr(),
            buffer.len(),
            0.0,
            1.0,
            1.0,
            1e-3,
        );
        assert_eq!(status, EstimatorStatus::Ok.code());
        assert_eq!(calls(), 1000);
        assert_eq!(buffer[0], 1.0);
        assert_relative_eq!(buffer[1000], E, epsilon = 2e-3);
    }

    #[test]
    fn euler_rejects_mismatched_buffer_without_writing() {
        for len in [10usize, 12] {
            let mut buffer = vec![-3.0; len];
            let status = integrate_euler(
                Some(growth_cb),
                buffer.as_mut_ptr(),
                buffer.len(),
                0.0,
                1.0,
                1.0,
                0.1,
            );
            assert_eq!(status, EstimatorStatus::BufferSizeMismatch.code());
            assert!(buffer.iter().all(|&v| v == -3.0));
        }
    }

    #[test]
    fn euler_rejects_oversized_length_before_touching_memory() {
        let mut buffer = vec![-3.0; 3];
        for claimed in [1000usize, usize::MAX / 4] {
            reset_calls();
            let status = integrate_euler(
                Some(growth_cb),
                buffer.as_mut_ptr(),
                claimed,
                0.0,
                1.0,
                1.0,
                0.1,
            );
            assert_eq!(status, EstimatorStatus::BufferSizeMismatch.code());
            assert_eq!(calls(), 0);
        }
        assert!(buffer.iter().all(|&v| v == -3.0));
    }

    #[test]
    fn euler_rejects_invalid_parameters() {
        let mut buffer = vec![-3.0; 11];
        let cases = [(1.0, 0.0, 0.1), (0.0, 0.0, 0.1), (0.0, 1.0, 0.0), (0.0, 1.0, -0.1)];
        for (lo, hi, step) in cases {
            let status = integrate_euler(
                Some(growth_cb),
                buffer.as_mut_ptr(),
                buffer.len(),
                lo,
                hi,
                1.0,
                step,
            );
            assert_eq!(status, EstimatorStatus::InvalidParameter.code());
        }
        assert!(buffer.iter().all(|&v| v == -3.0));
    }

    #[test]
    fn euler_rejects_null_arguments() {
        let mut buffer = vec![-3.0; 11];
        let status = integrate_euler(None, buffer.as_mut_ptr(), buffer.len(), 0.0, 1.0, 1.0, 0.1);
        assert_eq!(status, EstimatorStatus::NullPointer.code());
        assert!(buffer.iter().all(|&v| v == -3.0));

        let status = integrate_euler(Some(growth_cb), std::ptr::null_mut(), 11, 0.0, 1.0, 1.0, 0.1);
        assert_eq!(status, EstimatorStatus::NullPointer.code());
    }

    #[test]
    fn sample_count_is_zero_for_invalid_grid() {
        assert_eq!(euler_sample_count(0.0, 1.0, 0.1), 11);
        assert_eq!(euler_sample_count(1.0, 0.0, 0.1), 0);
        assert_eq!(euler_sample_count(0.0, 1.0, 0.0), 0);
    }

    #[test]
    fn link_probe_survives_repeated_calls() {
        for _ in 0..100 {
            link_probe();
        }
    }

    #[test]
    fn status_messages_are_never_null() {
        for code in -1..=6 {
            let ptr = estimators_status_message(code);
            assert!(!ptr.is_null());
            let text = unsafe { CStr::from_ptr(ptr) }.to_str().expect("utf-8");
            assert!(!text.is_empty());
        }
        let text = unsafe { CStr::from_ptr(estimators_status_message(2)) };
        assert_eq!(text.to_str(), Ok("output buffer size mismatch"));
        let text = unsafe { CStr::from_ptr(estimators_status_message(42)) };
        assert_eq!(text.to_str(), Ok("unknown status"));
    }

    #[test]
    fn version_matches_package() {
        let text = unsafe { CStr::from_ptr(estimators_version()) };
        assert_eq!(text.to_str(), Ok(env!("CARGO_PKG_VERSION")));
    }
}
