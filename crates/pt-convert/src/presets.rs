//! Named converter configurations.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use pt_core::PtError;

use crate::config::{ConverterConfig, InputEfficiency, OutputEfficiency};
use crate::error::ConvertResult;

/// Boost input stage of the TI BQ255xx family.
///
/// Rows are 128 mV steps of input voltage, columns the log2 current buckets
/// from below 8 uA up to above 8 mA.
const BQ255XX_INPUT: InputEfficiency = [
    [0.01, 0.01, 0.02, 0.05, 0.10, 0.15, 0.15, 0.20, 0.25, 0.30, 0.30, 0.35],
    [0.10, 0.20, 0.30, 0.40, 0.50, 0.55, 0.56, 0.57, 0.58, 0.59, 0.60, 0.61],
    [0.20, 0.40, 0.50, 0.60, 0.65, 0.66, 0.67, 0.68, 0.69, 0.70, 0.71, 0.72],
    [0.35, 0.55, 0.65, 0.71, 0.73, 0.74, 0.75, 0.75, 0.76, 0.77, 0.77, 0.78],
    [0.45, 0.65, 0.70, 0.73, 0.75, 0.77, 0.78, 0.79, 0.80, 0.81, 0.81, 0.82],
    [0.50, 0.70, 0.74, 0.76, 0.78, 0.79, 0.80, 0.81, 0.82, 0.83, 0.83, 0.84],
    [0.52, 0.73, 0.76, 0.78, 0.80, 0.81, 0.82, 0.83, 0.84, 0.85, 0.85, 0.86],
    [0.53, 0.75, 0.77, 0.79, 0.81, 0.82, 0.83, 0.84, 0.85, 0.86, 0.86, 0.87],
    [0.55, 0.77, 0.78, 0.80, 0.82, 0.83, 0.85, 0.86, 0.87, 0.87, 0.87, 0.88],
    [0.56, 0.78, 0.79, 0.81, 0.83, 0.85, 0.87, 0.88, 0.88, 0.88, 0.88, 0.89],
    [0.58, 0.79, 0.80, 0.82, 0.84, 0.86, 0.88, 0.89, 0.89, 0.89, 0.89, 0.90],
    [0.60, 0.80, 0.81, 0.83, 0.85, 0.87, 0.89, 0.90, 0.90, 0.90, 0.90, 0.90],
];

/// Buck output stage of the BQ25570.
const BQ25570_OUTPUT: OutputEfficiency = [
    0.50, 0.70, 0.78, 0.83, 0.86, 0.88, 0.90, 0.91, 0.92, 0.92, 0.91, 0.90,
];

static CONVERTER_PRESETS: LazyLock<BTreeMap<&'static str, ConverterConfig>> =
    LazyLock::new(|| {
        BTreeMap::from([
            ("ideal", ConverterConfig::default()),
            (
                "bq25504",
                // boost only: storage voltage reaches the target directly
                ConverterConfig {
                    name: "bq25504".to_owned(),
                    input_efficiency: BQ255XX_INPUT,
                    v_enable_threshold: 2.4,
                    v_disable_threshold: 2.3,
                    ..ConverterConfig::default()
                },
            ),
            (
                "bq25570",
                ConverterConfig {
                    name: "bq25570".to_owned(),
                    input_efficiency: BQ255XX_INPUT,
                    output_efficiency: BQ25570_OUTPUT,
                    v_enable_threshold: 2.6,
                    v_disable_threshold: 2.4,
                    v_output: 2.0,
                    v_buck_drop: 0.1,
                    ..ConverterConfig::default()
                },
            ),
        ])
    });

pub fn converter_preset(name: &str) -> ConvertResult<ConverterConfig> {
    CONVERTER_PRESETS
        .get(name)
        .cloned()
        .ok_or_else(|| PtError::UnknownPreset { name: name.to_owned() }.into())
}

pub fn converter_preset_names() -> impl Iterator<Item = &'static str> {
    CONVERTER_PRESETS.keys().copied()
}
