//! Error types for simulation drivers.

use pt_convert::ConvertError;
use pt_core::PtError;
use pt_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] PtError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Model {index} steps {found} s, the simulator {expected} s")]
    TimestepMismatch {
        index: usize,
        expected: f64,
        found: f64,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type SimResult<T> = Result<T, SimError>;
