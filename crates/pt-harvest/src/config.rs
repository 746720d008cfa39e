//! Harvester configuration.
//!
//! All quantities in SI units. Timing is converted into sample counts with
//! `sample_interval_s` when a harvester is built.

use pt_core::units::{Time, Voltage};
use pt_core::{PtError, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

use crate::error::HarvestResult;

/// Default recording rate of the hardware: 100 kSps.
pub const SAMPLE_INTERVAL_S: f64 = 10e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvesterAlgorithm {
    /// Input samples already are the operating point.
    Neutral,
    /// Alternate between open-circuit voltage and short-circuit current.
    IscVoc,
    ConstantVoltage,
    /// Fractional open-circuit voltage tracking.
    MpptVoc,
    MpptPerturbObserve,
    /// Offline optimum of the source curve; an upper bound, not realizable.
    MpptOptimal,
}

impl HarvesterAlgorithm {
    /// Whether the algorithm needs a source characteristic.
    pub fn uses_curve(self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvesterConfig {
    pub name: String,
    pub algorithm: HarvesterAlgorithm,
    /// Fixed voltage for CV, start voltage for perturb & observe.
    pub voltage: f64,
    pub voltage_min: f64,
    pub voltage_max: f64,
    /// Ceiling for the harvested current.
    pub current_limit: f64,
    pub voltage_step: f64,
    /// Ratio of V_oc to regulate at (open-circuit tracking).
    pub setpoint: f64,
    /// Period between the starts of two measurements.
    pub interval_s: f64,
    /// Length of one measurement.
    pub duration_s: f64,
    pub sample_interval_s: f64,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            name: "neutral".to_owned(),
            algorithm: HarvesterAlgorithm::Neutral,
            voltage: 2.5,
            voltage_min: 0.0,
            voltage_max: 5.0,
            current_limit: 50e-3,
            voltage_step: 1e-3,
            setpoint: 0.7,
            interval_s: 100e-3,
            duration_s: 0.1e-3,
            sample_interval_s: SAMPLE_INTERVAL_S,
        }
    }
}

impl HarvesterConfig {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn constant_voltage(name: &str, voltage: Voltage) -> Self {
        Self {
            name: name.to_owned(),
            algorithm: HarvesterAlgorithm::ConstantVoltage,
            voltage: voltage.value,
            ..Self::default()
        }
    }

    pub fn mppt_voc(name: &str, setpoint: f64, interval: Time, duration: Time) -> Self {
        Self {
            name: name.to_owned(),
            algorithm: HarvesterAlgorithm::MpptVoc,
            setpoint,
            interval_s: interval.value,
            duration_s: duration.value,
            ..Self::default()
        }
    }

    pub fn mppt_po(name: &str, start: Voltage, step: Voltage, interval: Time) -> Self {
        Self {
            name: name.to_owned(),
            algorithm: HarvesterAlgorithm::MpptPerturbObserve,
            voltage: start.value,
            voltage_step: step.value,
            interval_s: interval.value,
            ..Self::default()
        }
    }

    pub fn with_sample_interval(mut self, sample_interval: Time) -> Self {
        self.sample_interval_s = sample_interval.value;
        self
    }

    pub fn validate(&self) -> HarvestResult<()> {
        ensure_range(self.voltage, "voltage", 0.0, 5.0, "[0, 5] V")?;
        ensure_range(self.voltage_min, "voltage_min", 0.0, 5.0, "[0, 5] V")?;
        ensure_range(self.voltage_max, "voltage_max", 0.0, 5.0, "[0, 5] V")?;
        if self.voltage_min > self.voltage_max {
            return Err(PtError::OutOfRange {
                field: "voltage_min",
                value: self.voltage_min,
                expected: "<= voltage_max",
            }
            .into());
        }
        ensure_range(
            self.voltage,
            "voltage",
            self.voltage_min,
            self.voltage_max,
            "[voltage_min, voltage_max]",
        )?;
        ensure_range(self.current_limit, "current_limit", 1e-6, 50e-3, "[1 uA, 50 mA]")?;
        ensure_range(self.voltage_step, "voltage_step", 1e-3, 1000.0, "[1 mV, 1000 V]")?;
        ensure_range(self.setpoint, "setpoint", 0.0, 1.0, "[0, 1]")?;
        ensure_range(self.interval_s, "interval_s", 10e-6, 1000.0, "[10 us, 1000 s]")?;
        ensure_range(
            self.duration_s,
            "duration_s",
            10e-6,
            self.interval_s,
            "[10 us, interval_s]",
        )?;
        ensure_positive(self.sample_interval_s, "sample_interval_s")?;
        Ok(())
    }

    /// Samples between measurement starts, at least one.
    pub fn interval_n(&self) -> u64 {
        samples(self.interval_s, self.sample_interval_s)
    }

    /// Samples per measurement, at least one.
    pub fn duration_n(&self) -> u64 {
        samples(self.duration_s, self.sample_interval_s)
    }
}

fn samples(duration_s: f64, sample_interval_s: f64) -> u64 {
    (duration_s / sample_interval_s).round().max(1.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_core::units::{seconds, volts};

    #[test]
    fn defaults_are_valid() {
        HarvesterConfig::default().validate().unwrap();
    }

    #[test]
    fn voltage_window_is_checked() {
        let mut cfg = HarvesterConfig::default();
        cfg.voltage_min = 3.0;
        cfg.voltage_max = 2.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("voltage_min"));

        let mut cfg = HarvesterConfig::constant_voltage("cv", volts(4.0));
        cfg.voltage_max = 3.0;
        assert!(cfg.validate().unwrap_err().to_string().contains("voltage"));
    }

    #[test]
    fn duration_must_fit_interval() {
        let cfg = HarvesterConfig::mppt_voc("x", 0.8, seconds(0.1), seconds(0.2));
        assert!(cfg.validate().unwrap_err().to_string().contains("duration_s"));
    }

    #[test]
    fn sample_counts() {
        let cfg = HarvesterConfig::mppt_voc("bq", 0.8, seconds(16.0), seconds(0.256))
            .with_sample_interval(seconds(1e-3));
        assert_eq!(cfg.interval_n(), 16_000);
        assert_eq!(cfg.duration_n(), 256);
    }

    #[test]
    fn yaml_with_partial_fields() {
        let cfg: HarvesterConfig = serde_yaml::from_str(
            "name: cv33\nalgorithm: constant_voltage\nvoltage: 3.3\n",
        )
        .unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.algorithm, HarvesterAlgorithm::ConstantVoltage);
        assert_eq!(cfg.current_limit, 50e-3);
    }
}
