//! pt-convert: converter model and virtual source for the power-path twin.
//!
//! Contains:
//! - efficiency (voltage/current bucketing of the efficiency tables)
//! - config (efficiency tables, input limits, power-good hysteresis, regulation)
//! - presets (named converter configurations)
//! - converter (couples harvested power, storage and load)
//! - target (virtual loads)
//! - source (harvester + converter with energy accounting)

pub mod config;
pub mod converter;
pub mod efficiency;
pub mod error;
pub mod presets;
pub mod source;
pub mod target;

pub use config::{ConverterConfig, InputEfficiency, OutputEfficiency};
pub use converter::{Converter, ConverterState};
pub use efficiency::{EFFICIENCY_BUCKETS, current_bucket, voltage_bucket};
pub use error::{ConvertError, ConvertResult};
pub use presets::{converter_preset, converter_preset_names};
pub use source::VirtualSource;
pub use target::{ConstantCurrentTarget, ResistiveTarget, Target};
