//! Charge-based capacitor model that predates the KiBaM family.
//!
//! Kept for regression comparisons. Input current (minus leakage) integrates
//! onto a capacitor sized so that V_OC(1) holds the full capacity.
//!
//! Only meaningful with capacitor parameters (V_OC linear in SoC). The start
//! voltage comes from `calc_v_oc(soc_init)` while the reported SoC is
//! `V / V_OC(1)`, so a battery curve shifts the SoC on the first tick: lipo
//! started at 0.3 reports about 0.90.

use crate::error::{StorageError, StorageResult};
use crate::model::{StorageModel, StorageState, initial_soc};
use crate::params::StorageParameters;

#[derive(Debug, Clone)]
pub struct ShpCap {
    dt_s: f64,
    v_mid_max_v: f64,
    constant_s_per_f: f64,
    constant_1_per_ohm: f64,
    v_mid_v: f64,
}

impl ShpCap {
    pub fn new(params: &StorageParameters, soc_init: Option<f64>, dt_s: f64) -> StorageResult<Self> {
        let soc = initial_soc(params, soc_init, dt_s)?;
        let v_mid_max_v = params.calc_v_oc(1.0);
        if !(v_mid_max_v.is_finite() && v_mid_max_v > 0.0) {
            return Err(StorageError::InvalidArg {
                what: "capacitor model needs V_OC(1) > 0",
            });
        }
        let c_mid_uf = (1e6 * params.q_as / v_mid_max_v).max(0.001);
        let samplerate_sps = 1.0 / dt_s;
        Ok(Self {
            dt_s,
            v_mid_max_v,
            constant_s_per_f: 1e6 / (c_mid_uf * samplerate_sps),
            constant_1_per_ohm: 1.0 / params.r_leak_ohm,
            v_mid_v: params.calc_v_oc(soc).clamp(0.0, v_mid_max_v),
        })
    }
}

impl StorageModel for ShpCap {
    fn label(&self) -> &str {
        "ShpCap"
    }

    fn dt_s(&self) -> f64 {
        self.dt_s
    }

    fn v_oc(&self) -> f64 {
        self.v_mid_v
    }

    fn step(&mut self, i_charge_a: f64) -> StorageState {
        let i_mid_a = i_charge_a - self.v_mid_v * self.constant_1_per_ohm;
        self.v_mid_v = (self.v_mid_v + i_mid_a * self.constant_s_per_f).clamp(0.0, self.v_mid_max_v);
        let soc = self.v_mid_v / self.v_mid_max_v;
        StorageState {
            v_oc: self.v_mid_v,
            v_cell: self.v_mid_v,
            soc,
            soc_eff: soc,
        }
    }
}
