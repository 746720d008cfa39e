//! Error types for storage models and their configuration.

use pt_core::PtError;
use thiserror::Error;

/// Errors raised while building storage configs or models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error(transparent)]
    Config(#[from] PtError),

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("No state of charge reproduces V_OC = {v_oc} V")]
    SocNotFound { v_oc: f64 },
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_pass_through() {
        let err: StorageError = PtError::OutOfRange {
            field: "q_as",
            value: -1.0,
            expected: "> 0",
        }
        .into();
        assert!(err.to_string().contains("q_as"));
    }
}
