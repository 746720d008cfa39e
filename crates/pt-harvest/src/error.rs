//! Error types for harvester configs and source curves.

use pt_core::PtError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarvestError {
    #[error(transparent)]
    Config(#[from] PtError),

    #[error("Invalid IV curve: {what}")]
    InvalidCurve { what: &'static str },
}

pub type HarvestResult<T> = Result<T, HarvestError>;
