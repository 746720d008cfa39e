//! pt-harvest: harvester model for the power-path twin.
//!
//! Contains:
//! - curve (prototype IV characteristics of a source)
//! - config (algorithm selection, voltage bounds, timing)
//! - presets (named harvester configurations)
//! - harvester (per-sample operating point selection)
//!
//! The harvester is deterministic: identical inputs and prior state give
//! identical operating points.

pub mod config;
pub mod curve;
pub mod error;
pub mod harvester;
pub mod presets;

pub use config::{HarvesterAlgorithm, HarvesterConfig, SAMPLE_INTERVAL_S};
pub use curve::IvCurve;
pub use error::{HarvestError, HarvestResult};
pub use harvester::{HarvestSample, Harvester, OcvPhase};
pub use presets::{harvester_preset, harvester_preset_names};
