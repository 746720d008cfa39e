//! Error types for converter configs and the composed virtual source.

use pt_core::PtError;
use pt_harvest::HarvestError;
use pt_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error(transparent)]
    Config(#[from] PtError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Harvest(#[from] HarvestError),

    #[error("Harvester samples every {harvester_s} s but the storage steps {storage_s} s")]
    TimestepMismatch { harvester_s: f64, storage_s: f64 },
}

pub type ConvertResult<T> = Result<T, ConvertError>;
