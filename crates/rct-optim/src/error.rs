//! Error type returned by the calibration entry points.

use thiserror::Error;

/// Failure of a calibration problem.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The problem description is inconsistent or degenerate; nothing was solved.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// IR construction, compilation or result extraction failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Return `CalibrationError::InvalidInput` with a formatted message unless `cond` holds.
macro_rules! ensure_input {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::CalibrationError::InvalidInput(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure_input;

#[cfg(test)]
mod tests {
    use super::*;

    fn check(len: usize) -> Result<(), CalibrationError> {
        ensure_input!(len > 0, "need at least one image, got {}", len);
        Ok(())
    }

    #[test]
    fn ensure_input_formats_message() {
        assert!(check(1).is_ok());
        let err = check(0).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidInput(_)));
        assert_eq!(err.to_string(), "invalid input: need at least one image, got 0");
    }

    #[test]
    fn anyhow_errors_convert_to_backend() {
        let err: CalibrationError = anyhow::anyhow!("solver exploded").into();
        assert!(matches!(err, CalibrationError::Backend(_)));
        assert_eq!(err.to_string(), "solver exploded");
    }
}
