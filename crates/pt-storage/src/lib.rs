//! pt-storage: energy storage models for the power-path twin.
//!
//! Contains:
//! - params (physical storage parameters, curve fits, presets by capacity)
//! - presets (named parameter sets)
//! - lut (128-entry SoC lookup tables)
//! - quantized (config deriver producing the firmware's fixed-point record)
//! - model (the `StorageModel` contract and the `Storage` variant enum)
//! - kibam, kibam_plus, kibam_simple, fixed_point, shp_cap (the variants)
//!
//! All models share one contract: `step(i_charge_a) -> StorageState`, with
//! positive current charging the storage. SoC is always clamped to `[0, 1]`
//! and the cell voltage never goes negative.

pub mod error;
pub mod fixed_point;
pub mod kibam;
pub mod kibam_plus;
pub mod kibam_simple;
pub mod lut;
pub mod model;
pub mod params;
pub mod presets;
pub mod quantized;
pub mod shp_cap;

pub use error::{StorageError, StorageResult};
pub use fixed_point::{FixedPointModel, PruStorage};
pub use kibam::KiBaM;
pub use kibam_plus::KiBaMPlus;
pub use kibam_simple::{KiBaMSimple, LutMode};
pub use lut::{LUT_SIZE, LUT_SIZE_LOG, Lut};
pub use model::{Storage, StorageKind, StorageModel, StorageState};
pub use params::StorageParameters;
pub use presets::{storage_preset, storage_preset_names};
pub use quantized::{QuantizedStorageConfig, TIMESTEP_S, derive};
pub use shp_cap::ShpCap;
