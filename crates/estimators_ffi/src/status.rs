//! Status codes returned across the C boundary.

use estimators_core::EstimatorError;
use std::ffi::CStr;

/// Result of a fallible C entry point. `0` is success; every other value is a failure
/// with no partial output.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorStatus {
    Ok = 0,
    InvalidParameter = 1,
    BufferSizeMismatch = 2,
    NullPointer = 3,
    Panicked = 4,
}

impl EstimatorStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::InvalidParameter),
            2 => Some(Self::BufferSizeMismatch),
            3 => Some(Self::NullPointer),
            4 => Some(Self::Panicked),
            _ => None,
        }
    }

    pub fn message(self) -> &'static CStr {
        match self {
            Self::Ok => c"ok",
            Self::InvalidParameter => c"invalid parameter",
            Self::BufferSizeMismatch => c"output buffer size mismatch",
            Self::NullPointer => c"null callback or pointer argument",
            Self::Panicked => c"internal panic caught at the library boundary",
        }
    }
}

impl From<&EstimatorError> for EstimatorStatus {
    fn from(err: &EstimatorError) -> Self {
        match err {
            EstimatorError::InvalidParameter { .. } => Self::InvalidParameter,
            EstimatorError::SampleCountOverflow => Self::InvalidParameter,
            EstimatorError::BufferSizeMismatch { .. } => Self::BufferSizeMismatch,
        }
    }
}

pub(crate) const UNKNOWN_STATUS: &CStr = c"unknown status";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=4 {
            let status = EstimatorStatus::from_code(code).expect("known code");
            assert_eq!(status.code(), code);
        }
        assert_eq!(EstimatorStatus::from_code(5), None);
        assert_eq!(EstimatorStatus::from_code(-1), None);
    }

    #[test]
    fn core_errors_map_to_status() {
        let invalid = EstimatorError::InvalidParameter {
            name: "step_factor",
            reason: "must lie strictly between 0 and 1",
        };
        let mismatch = EstimatorError::BufferSizeMismatch {
            expected: 11,
            actual: 10,
        };
        assert_eq!(
            EstimatorStatus::from(&invalid),
            EstimatorStatus::InvalidParameter
        );
        assert_eq!(
            EstimatorStatus::from(&mismatch),
            EstimatorStatus::BufferSizeMismatch
        );
        assert_eq!(
            EstimatorStatus::from(&EstimatorError::SampleCountOverflow),
            EstimatorStatus::InvalidParameter
        );
    }
}
