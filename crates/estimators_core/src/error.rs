/// Precondition failures reported by the estimators.
///
/// Loss of precision at small step sizes is not an error; only contract
/// violations end up here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimatorError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    #[error("output buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("sample count for the requested interval overflows usize")]
    SampleCountOverflow,
}

impl EstimatorError {
    pub(crate) fn invalid(name: &'static str, reason: &'static str) -> Self {
        Self::InvalidParameter { name, reason }
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
