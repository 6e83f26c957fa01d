use crate::{field::DensityFieldError, Scalar};
use thiserror::Error;

/// Rejected engine configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Point count must be at least 1.
    #[error("point count must be at least 1")]
    ZeroPointCount,
    /// Area per stipple must be a positive finite number.
    /// (provided)
    #[error("target area per stipple must be positive and finite, got {0}")]
    InvalidTargetArea(Scalar),
    /// Relaxation step scale must lie in `(0, 2)`.
    /// (provided)
    #[error("step scale must lie in (0, 2), got {0}")]
    InvalidStepScale(Scalar),
    /// Jitter amplitude must be non-negative and finite.
    /// (provided)
    #[error("jitter must be non-negative and finite, got {0}")]
    InvalidJitter(Scalar),
    /// Density field could not be built.
    #[error(transparent)]
    DensityField(#[from] DensityFieldError),
}

/// Error thrown by the stippling engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StippleError {
    /// Raised by `initialize` only.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
    /// Engine operation called before `initialize`.
    #[error("invalid state: `{operation}` called before `initialize`")]
    InvalidState {
        /// Name of the rejected operation.
        operation: &'static str,
    },
}

impl From<DensityFieldError> for StippleError {
    fn from(error: DensityFieldError) -> Self {
        Self::InvalidConfiguration(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_names_operation() {
        let message = StippleError::InvalidState {
            operation: "advance",
        }
        .to_string();
        assert!(message.contains("advance"), "got: {message}");
        assert!(message.contains("initialize"), "got: {message}");
    }

    #[test]
    fn density_field_error_is_a_configuration_error() {
        let error: StippleError = DensityFieldError::ZeroDimensions(0, 4).into();
        assert!(matches!(
            error,
            StippleError::InvalidConfiguration(ConfigurationError::DensityField(_))
        ));
    }
}
