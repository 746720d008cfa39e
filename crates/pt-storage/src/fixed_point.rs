//! Integer storage model, bit-exact with the PRU firmware.
//!
//! [`PruStorage`] is the firmware tick (10 µs): all state lives in Q-format
//! integers and every intermediate result passes a saturating guard.
//! [`FixedPointModel`] wraps it for simulations on a coarser timestep by
//! running several identical firmware ticks per call.
//!
//! Behaves like [`crate::kibam_simple::KiBaMSimple`] with discrete tables.
//! The cell voltage tops out at 16.78 V (`u32` µV·2^8).

use pt_core::{MicroVoltQ8, SocQ62, sat_u32, sat_u64, sat_u64_f64};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::lut::LUT_SIZE;
use crate::model::{StorageModel, StorageState, initial_soc};
use crate::params::StorageParameters;
use crate::quantized::{QuantizedStorageConfig, TIMESTEP_S, derive};

/// SoC of a full storage, `1.0` in Q62.
const SOC_MAX_1_N62: u64 = 1 << 62;

/// Firmware tick: integer state, power in, cell voltage out.
#[derive(Debug, Clone)]
pub struct PruStorage {
    cfg: QuantizedStorageConfig,
    soc: SocQ62,
    v_oc: MicroVoltQ8,
}

impl PruStorage {
    /// Start at `soc_init`, or at the config word when `None`.
    pub fn new(cfg: QuantizedStorageConfig, soc_init: Option<f64>) -> StorageResult<Self> {
        if cfg.lut_voc_uv_n8.len() != LUT_SIZE || cfg.lut_rseries_kohm_n32.len() != LUT_SIZE {
            return Err(StorageError::InvalidArg {
                what: "quantized lookup tables must have 128 entries",
            });
        }
        let soc_1_n30 = match soc_init {
            Some(soc) => 2.0_f64.powi(30) * soc,
            None => f64::from(cfg.soc_init_1_n30),
        };
        let soc = SocQ62::quantize(2.0_f64.powi(32) * soc_1_n30, "soc_1_n62");
        let v_oc = MicroVoltQ8::from_raw(u64::from(
            cfg.lut_voc_uv_n8[QuantizedStorageConfig::lut_position(soc.raw())],
        ));
        Ok(Self { cfg, soc, v_oc })
    }

    pub fn config(&self) -> &QuantizedStorageConfig {
        &self.cfg
    }

    pub fn soc(&self) -> SocQ62 {
        self.soc
    }

    pub fn v_oc(&self) -> MicroVoltQ8 {
        self.v_oc
    }

    /// Open-circuit voltage in whole µV.
    pub fn v_oc_uv(&self) -> u64 {
        let pos = QuantizedStorageConfig::lut_position(self.soc.raw());
        u64::from(self.cfg.lut_voc_uv_n8[pos]) >> 8
    }

    /// One firmware tick with `p_charge_fw` femtowatts into the storage.
    ///
    /// Returns the cell voltage in µV.
    pub fn step(&mut self, p_charge_fw: f64) -> u32 {
        let mut soc = self.soc.raw();

        let d_soc_leak = sat_u64(
            i128::from(self.v_oc.raw() >> 6) * i128::from(self.cfg.constant_1_per_uv_n60),
            "d_soc_leak_1_n62",
        );
        soc = soc.saturating_sub(d_soc_leak);

        let v_oc_prot_uv = (self.v_oc.raw() >> 8).max(1) as f64;
        let charging = p_charge_fw >= 0.0;
        let i_delta_na_n4 = sat_u64_f64(16.0 * p_charge_fw.abs() / v_oc_prot_uv, "i_delta_na_n4");
        let d_soc = sat_u64(
            (i128::from(i_delta_na_n4) * i128::from(self.cfg.constant_1_per_na_n60)) >> 2,
            "d_soc_1_n62",
        );
        if charging {
            soc = sat_u64(i128::from(soc) + i128::from(d_soc), "soc_1_n62").min(SOC_MAX_1_N62);
        } else if soc > d_soc {
            soc -= d_soc;
        } else {
            soc = 0;
        }
        self.soc = SocQ62::from_raw(soc);

        let pos = QuantizedStorageConfig::lut_position(soc);
        let v_oc_n8 = self.cfg.lut_voc_uv_n8[pos];
        self.v_oc = MicroVoltQ8::from_raw(u64::from(v_oc_n8));
        let r_series_n32 = self.cfg.lut_rseries_kohm_n32[pos];
        let v_delta_n8 = sat_u32(
            i128::from(
                sat_u64(
                    i128::from(i_delta_na_n4) * i128::from(r_series_n32),
                    "v_delta_uv_n36",
                ) >> 28,
            ),
            "v_delta_uv_n8",
        );

        let v_cell_n8 = if charging {
            sat_u32(i128::from(v_oc_n8) + i128::from(v_delta_n8), "v_cell_uv_n8")
        } else {
            v_oc_n8.saturating_sub(v_delta_n8)
        };
        v_cell_n8 >> 8
    }
}

/// Firmware model on a caller-chosen timestep.
#[derive(Debug, Clone)]
pub struct FixedPointModel {
    pru: PruStorage,
    dt_s: f64,
    steps_per_frame: u64,
}

impl FixedPointModel {
    pub fn new(
        params: &StorageParameters,
        soc_init: Option<f64>,
        dt_s: f64,
        optimize_clamp: bool,
    ) -> StorageResult<Self> {
        initial_soc(params, soc_init, dt_s)?;
        let cfg = derive(params, TIMESTEP_S, optimize_clamp)?;
        let steps_per_frame = (dt_s / TIMESTEP_S).round_ties_even().max(1.0) as u64;
        debug!(
            storage = %params.name,
            dt_s,
            steps_per_frame,
            "fixed-point storage ready"
        );
        Ok(Self {
            pru: PruStorage::new(cfg, soc_init)?,
            dt_s,
            steps_per_frame,
        })
    }

    pub fn steps_per_frame(&self) -> u64 {
        self.steps_per_frame
    }

    pub fn pru(&self) -> &PruStorage {
        &self.pru
    }
}

impl StorageModel for FixedPointModel {
    fn label(&self) -> &str {
        "FixedPoint"
    }

    fn dt_s(&self) -> f64 {
        self.dt_s
    }

    fn v_oc(&self) -> f64 {
        (1e-6 / MicroVoltQ8::scale()) * self.pru.v_oc.raw() as f64
    }

    fn step(&mut self, i_charge_a: f64) -> StorageState {
        // power stays constant over the frame, like a PRU fed at the outer rate
        let p_charge_fw = (1e9 * i_charge_a) * (self.pru.v_oc.raw() as f64 / MicroVoltQ8::scale());
        let mut v_cell_uv = 0;
        for _ in 0..self.steps_per_frame {
            v_cell_uv = self.pru.step(p_charge_fw);
        }
        let soc = self.pru.soc.to_real();
        StorageState {
            v_oc: self.v_oc(),
            v_cell: 1e-6 * f64::from(v_cell_uv),
            soc,
            soc_eff: soc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_core::units::{microfarads, ohms, volts};

    fn cap(r_series: f64) -> StorageParameters {
        StorageParameters::capacitor(microfarads(100.0), volts(6.3), Some(ohms(r_series)), None)
    }

    #[test]
    fn initial_soc_from_config_word() {
        let params = cap(0.0).with_soc_init(0.25);
        let cfg = derive(&params, TIMESTEP_S, true).unwrap();
        let pru = PruStorage::new(cfg, None).unwrap();
        assert_eq!(pru.soc().raw(), 1 << 60);
        assert_eq!(pru.v_oc_uv(), pru.v_oc().raw() >> 8);
    }

    #[test]
    fn idle_tick_drains_leakage_exactly() {
        let params =
            StorageParameters::capacitor(microfarads(100.0), volts(6.3), None, Some(ohms(1e5)));
        let cfg = derive(&params, TIMESTEP_S, true).unwrap();
        let mut pru = PruStorage::new(cfg, Some(0.5)).unwrap();
        let soc = pru.soc().raw();
        let leak = (pru.v_oc().raw() >> 6) * u64::from(pru.config().constant_1_per_uv_n60);
        assert!(leak > 0);
        pru.step(0.0);
        assert_eq!(pru.soc().raw(), soc - leak);
    }

    #[test]
    fn short_tables_are_rejected() {
        let mut cfg = derive(&cap(0.0), TIMESTEP_S, true).unwrap();
        cfg.lut_voc_uv_n8.pop();
        assert!(PruStorage::new(cfg, Some(0.5)).is_err());
    }

    #[test]
    fn full_storage_stays_at_one() {
        let cfg = derive(&cap(0.0), TIMESTEP_S, true).unwrap();
        let mut pru = PruStorage::new(cfg, Some(1.0)).unwrap();
        pru.step(1e12);
        assert_eq!(pru.soc().raw(), SOC_MAX_1_N62);
    }

    #[test]
    fn empty_storage_stays_at_zero() {
        let cfg = derive(&cap(0.0), TIMESTEP_S, true).unwrap();
        let mut pru = PruStorage::new(cfg, Some(0.0)).unwrap();
        let v = pru.step(-1e12);
        assert_eq!(pru.soc().raw(), 0);
        assert!(v <= (pru.v_oc().raw() >> 8) as u32);
    }

    #[test]
    fn series_resistance_shifts_cell_voltage() {
        let cfg = derive(&cap(100.0), TIMESTEP_S, true).unwrap();
        let mut pru = PruStorage::new(cfg, Some(0.5)).unwrap();
        let v_oc_uv = pru.v_oc().raw() as f64 / 256.0;
        // 1 mA at V_OC
        let v_cell = pru.step(1e6 * v_oc_uv);
        let expected = pru.v_oc().raw() as f64 / 256.0 + 0.1e6;
        assert!((f64::from(v_cell) - expected).abs() < 2.0, "{v_cell} vs {expected}");
    }

    #[test]
    fn frame_runs_rounded_number_of_ticks() {
        let m = FixedPointModel::new(&cap(0.0), None, 1e-3, true).unwrap();
        assert_eq!(m.steps_per_frame(), 100);
        let m = FixedPointModel::new(&cap(0.0), None, 1e-6, true).unwrap();
        assert_eq!(m.steps_per_frame(), 1);
    }
}
