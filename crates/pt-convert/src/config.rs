//! Converter configuration.
//!
//! SI units throughout. The input efficiency table is indexed
//! `[voltage bucket][current bucket]`, the output table by the log2 bucket
//! of the load current.

use pt_core::{PtError, ensure_non_negative, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

use crate::efficiency::{EFFICIENCY_BUCKETS, current_bucket, voltage_bucket};
use crate::error::ConvertResult;

pub type InputEfficiency = [[f64; EFFICIENCY_BUCKETS]; EFFICIENCY_BUCKETS];
pub type OutputEfficiency = [f64; EFFICIENCY_BUCKETS];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub name: String,
    pub input_efficiency: InputEfficiency,
    /// Width of one input voltage bucket.
    pub voltage_bucket_v: f64,
    /// Lower edge of the first log2 current bucket.
    pub current_bucket_a: f64,
    pub output_efficiency: OutputEfficiency,
    pub v_input_max: f64,
    pub i_input_max: f64,
    /// Power-good rises when the storage voltage reaches this.
    pub v_enable_threshold: f64,
    /// Power-good falls when the storage voltage drops below this.
    pub v_disable_threshold: f64,
    /// Regulated output voltage.
    pub v_output: f64,
    /// Minimum headroom of the regulation stage.
    pub v_buck_drop: f64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            name: "ideal".to_owned(),
            input_efficiency: [[1.0; EFFICIENCY_BUCKETS]; EFFICIENCY_BUCKETS],
            voltage_bucket_v: 0.128,
            current_bucket_a: 8e-6,
            output_efficiency: [1.0; EFFICIENCY_BUCKETS],
            v_input_max: 5.0,
            i_input_max: 50e-3,
            v_enable_threshold: 1e-3,
            v_disable_threshold: 0.0,
            v_output: 5.0,
            v_buck_drop: 0.0,
        }
    }
}

impl ConverterConfig {
    pub fn validate(&self) -> ConvertResult<()> {
        for row in &self.input_efficiency {
            for &eta in row {
                ensure_range(eta, "input_efficiency", 0.0, 1.0, "[0, 1]")?;
            }
        }
        for &eta in &self.output_efficiency {
            ensure_range(eta, "output_efficiency", f64::MIN_POSITIVE, 1.0, "(0, 1]")?;
        }
        ensure_positive(self.voltage_bucket_v, "voltage_bucket_v")?;
        ensure_positive(self.current_bucket_a, "current_bucket_a")?;
        ensure_positive(self.v_input_max, "v_input_max")?;
        ensure_positive(self.i_input_max, "i_input_max")?;
        ensure_non_negative(self.v_disable_threshold, "v_disable_threshold")?;
        ensure_non_negative(self.v_enable_threshold, "v_enable_threshold")?;
        if self.v_disable_threshold >= self.v_enable_threshold {
            return Err(PtError::OutOfRange {
                field: "v_disable_threshold",
                value: self.v_disable_threshold,
                expected: "< v_enable_threshold",
            }
            .into());
        }
        ensure_non_negative(self.v_output, "v_output")?;
        ensure_non_negative(self.v_buck_drop, "v_buck_drop")?;
        Ok(())
    }

    /// Input efficiency at an operating point, clamped to the edge buckets.
    pub fn input_efficiency_at(&self, voltage: f64, current: f64) -> f64 {
        let row = voltage_bucket(voltage, self.voltage_bucket_v);
        let col = current_bucket(current, self.current_bucket_a);
        self.input_efficiency[row][col]
    }

    pub fn output_efficiency_at(&self, current: f64) -> f64 {
        self.output_efficiency[current_bucket(current, self.current_bucket_a)]
    }
}
