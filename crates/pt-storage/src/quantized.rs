//! Config deriver: physical storage parameters to firmware constants.
//!
//! The record mirrors the storage config struct of the PRU firmware, field
//! for field and in the same order:
//! - `soc_init_1_n30`: initial SoC, `SoC · 2^30`
//! - `constant_1_per_na_n60`: SoC delta per nA and tick, `2^60 / 1e9 · dt / q`
//! - `constant_1_per_uv_n60`: SoC delta per µV of leakage, `2^60 / 1e6 · dt / (q · R_leak)`
//! - `lut_voc_uv_n8`: 128 × V_OC in µV with 8 fractional bits
//! - `lut_rseries_kohm_n32`: 128 × R_series in kΩ with 32 fractional bits
//!
//! Every word is a `u32`. Values that do not fit are clamped with a warning.

use pt_core::{KiloOhmQ32, MicroVoltQ8, PtResult, UFixed, ensure_positive};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lut::{LUT_SIZE, SOC_BUCKET};
use crate::params::StorageParameters;

/// Tick of the firmware storage model.
pub const TIMESTEP_S: f64 = 10e-6;

/// Number of `u32` words in the serialized record.
pub const WORD_COUNT: usize = 3 + 2 * LUT_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantizedStorageConfig {
    pub soc_init_1_n30: u32,
    pub constant_1_per_na_n60: u32,
    pub constant_1_per_uv_n60: u32,
    pub lut_voc_uv_n8: Vec<u32>,
    pub lut_rseries_kohm_n32: Vec<u32>,
}

/// Round half to even and narrow to a config word.
fn word(scaled: f64, what: &'static str) -> u32 {
    UFixed::<0>::quantize(scaled, what).to_u32(what)
}

/// Quantize `params` for a model ticking every `dt_s` seconds.
///
/// `optimize_clamp` samples each SoC bucket at its center instead of its
/// lower edge.
pub fn derive(
    params: &StorageParameters,
    dt_s: f64,
    optimize_clamp: bool,
) -> PtResult<QuantizedStorageConfig> {
    params.validate()?;
    ensure_positive(dt_s, "dt_s")?;

    let x_off = if optimize_clamp { 0.5 } else { 0.0 };
    let sample = |i: usize| SOC_BUCKET * (i as f64 + x_off);

    let constant_1_per_a = dt_s / params.q_as;
    let constant_1_per_v = constant_1_per_a / params.r_leak_ohm;

    // scale factors first, then the physical value: keeps rounding identical
    // to the tooling that generates firmware configs
    let volt_scale = MicroVoltQ8::scale() * 1e6;
    let ohm_scale = KiloOhmQ32::scale() * 1e-3;
    let lut_voc_uv_n8 = (0..LUT_SIZE)
        .map(|i| word(volt_scale * params.calc_v_oc(sample(i)), "lut_voc_uv_n8"))
        .collect();
    let lut_rseries_kohm_n32 = (0..LUT_SIZE)
        .map(|i| word(ohm_scale * params.calc_r_series(sample(i)), "lut_rseries_kohm_n32"))
        .collect();

    let cfg = QuantizedStorageConfig {
        soc_init_1_n30: word(2.0_f64.powi(30) * params.soc_init, "soc_init_1_n30"),
        constant_1_per_na_n60: word(
            (2.0_f64.powi(60) / 1e9) * constant_1_per_a,
            "constant_1_per_na_n60",
        ),
        constant_1_per_uv_n60: word(
            (2.0_f64.powi(60) / 1e6) * constant_1_per_v,
            "constant_1_per_uv_n60",
        ),
        lut_voc_uv_n8,
        lut_rseries_kohm_n32,
    };
    debug!(
        storage = %params.name,
        dt_s,
        optimize_clamp,
        soc_init_1_n30 = cfg.soc_init_1_n30,
        constant_1_per_na_n60 = cfg.constant_1_per_na_n60,
        constant_1_per_uv_n60 = cfg.constant_1_per_uv_n60,
        "derived quantized storage config"
    );
    Ok(cfg)
}

impl QuantizedStorageConfig {
    /// Words in firmware order.
    pub fn to_words(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(WORD_COUNT);
        words.push(self.soc_init_1_n30);
        words.push(self.constant_1_per_na_n60);
        words.push(self.constant_1_per_uv_n60);
        words.extend_from_slice(&self.lut_voc_uv_n8);
        words.extend_from_slice(&self.lut_rseries_kohm_n32);
        words
    }

    /// Little-endian image as shared with the firmware.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.to_words()
            .into_iter()
            .flat_map(u32::to_le_bytes)
            .collect()
    }

    /// Table index for a SoC with 62 fractional bits.
    pub fn lut_position(soc_1_n62: u64) -> usize {
        let shift = 62 - crate::lut::LUT_SIZE_LOG;
        ((soc_1_n62 >> shift) as usize).min(LUT_SIZE - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_core::units::{microfarads, milliamp_hours, ohms, volts};

    fn cap() -> StorageParameters {
        StorageParameters::capacitor(microfarads(100.0), volts(6.3), Some(ohms(2.0)), None)
    }

    #[test]
    fn lut_lengths_are_fixed() {
        let cfg = derive(&cap(), TIMESTEP_S, true).unwrap();
        assert_eq!(cfg.lut_voc_uv_n8.len(), LUT_SIZE);
        assert_eq!(cfg.lut_rseries_kohm_n32.len(), LUT_SIZE);
        assert_eq!(cfg.to_words().len(), WORD_COUNT);
        assert_eq!(cfg.to_le_bytes().len(), 4 * WORD_COUNT);
    }

    #[test]
    fn lut_is_monotonic_for_rising_voltage() {
        let lipo = StorageParameters::lipo(milliamp_hours(860.0), None);
        for clamp in [false, true] {
            let cfg = derive(&lipo, TIMESTEP_S, clamp).unwrap();
            assert!(cfg.lut_voc_uv_n8.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn offsets_follow_optimize_clamp() {
        let lower = derive(&cap(), TIMESTEP_S, false).unwrap();
        let center = derive(&cap(), TIMESTEP_S, true).unwrap();
        assert_eq!(lower.lut_voc_uv_n8[0], 0);
        // 6.3 V / 256 buckets-halves in µV·2^8
        let expected = (256.0_f64 * 1e6 * 6.3 * (0.5 / 128.0)).round_ties_even() as u32;
        assert_eq!(center.lut_voc_uv_n8[0], expected);
    }

    #[test]
    fn series_resistance_in_kohm_q32() {
        let cfg = derive(&cap(), TIMESTEP_S, true).unwrap();
        // 2 Ω = 0.002 kΩ
        let expected = (2.0_f64.powi(32) * 1e-3 * 2.0).round_ties_even() as u32;
        assert!(cfg.lut_rseries_kohm_n32.iter().all(|&r| r == expected));
    }

    #[test]
    fn scalar_constants() {
        let params = cap().with_soc_init(0.5);
        let cfg = derive(&params, TIMESTEP_S, true).unwrap();
        assert_eq!(cfg.soc_init_1_n30, 1 << 29);
        let expected = ((2.0_f64.powi(60) / 1e9) * (TIMESTEP_S / params.q_as)).round_ties_even();
        assert_eq!(cfg.constant_1_per_na_n60 as f64, expected);
        // no leakage
        assert_eq!(cfg.constant_1_per_uv_n60, 0);
    }

    #[test]
    fn oversized_values_clamp_instead_of_failing() {
        // 20 V does not fit µV·2^8 in 32 bit
        let big = StorageParameters::capacitor(microfarads(100.0), volts(20.0), None, None);
        let cfg = derive(&big, TIMESTEP_S, true).unwrap();
        assert_eq!(*cfg.lut_voc_uv_n8.last().unwrap(), u32::MAX);
    }

    #[test]
    fn invalid_inputs_fail_before_derivation() {
        assert!(derive(&cap(), 0.0, true).is_err());
        let mut bad = cap();
        bad.soc_init = -0.1;
        assert!(derive(&bad, TIMESTEP_S, true).is_err());
    }

    #[test]
    fn words_are_in_firmware_order() {
        let cfg = derive(&cap(), TIMESTEP_S, false).unwrap();
        let words = cfg.to_words();
        assert_eq!(words[0], cfg.soc_init_1_n30);
        assert_eq!(words[1], cfg.constant_1_per_na_n60);
        assert_eq!(words[2], cfg.constant_1_per_uv_n60);
        assert_eq!(words[3], cfg.lut_voc_uv_n8[0]);
        assert_eq!(words[3 + LUT_SIZE], cfg.lut_rseries_kohm_n32[0]);
        let bytes = cfg.to_le_bytes();
        assert_eq!(&bytes[0..4], &cfg.soc_init_1_n30.to_le_bytes());
    }

    #[test]
    fn lut_position_saturates() {
        assert_eq!(QuantizedStorageConfig::lut_position(0), 0);
        assert_eq!(QuantizedStorageConfig::lut_position(1 << 62), LUT_SIZE - 1);
        assert_eq!(QuantizedStorageConfig::lut_position(u64::MAX), LUT_SIZE - 1);
        assert_eq!(QuantizedStorageConfig::lut_position(1 << 61), 64);
    }
}
