//! Reduced KiBaM for the PRU: no rate capacity, no transients.
//!
//! V_OC and R_series come from 128-entry tables; self-discharge is kept.
//! The open-circuit voltage therefore shows 128 steps over the SoC range
//! unless the tables interpolate.

use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::lut::Lut;
use crate::model::{StorageModel, StorageState, initial_soc};
use crate::params::StorageParameters;

/// How the SoC tables are sampled and read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LutMode {
    /// Stair lookup; `optimize_clamp` samples bucket centers instead of lower edges.
    Discrete { optimize_clamp: bool },
    /// Linear interpolation between lower-edge samples.
    Interpolated,
}

#[derive(Debug, Clone)]
pub struct KiBaMSimple {
    dt_s: f64,
    lut_voc: Lut,
    lut_rseries: Lut,
    constant_s_per_as: f64,
    constant_1_per_ohm: f64,
    soc: f64,
    label: &'static str,
}

impl KiBaMSimple {
    pub fn new(
        params: &StorageParameters,
        soc_init: Option<f64>,
        dt_s: f64,
        mode: LutMode,
    ) -> StorageResult<Self> {
        let soc = initial_soc(params, soc_init, dt_s)?;
        let (optimize_clamp, interpolate, label) = match mode {
            LutMode::Discrete { optimize_clamp } => (optimize_clamp, false, "KiBaMSimple"),
            LutMode::Interpolated => (false, true, "KiBaMSimple(interp)"),
        };
        Ok(Self {
            dt_s,
            lut_voc: Lut::soc(|s| params.calc_v_oc(s), optimize_clamp, interpolate),
            lut_rseries: Lut::soc(|s| params.calc_r_series(s), optimize_clamp, interpolate),
            constant_s_per_as: dt_s / params.q_as,
            constant_1_per_ohm: 1.0 / params.r_leak_ohm,
            soc,
            label,
        })
    }

    pub fn lut_voc(&self) -> &Lut {
        &self.lut_voc
    }
}

impl StorageModel for KiBaMSimple {
    fn label(&self) -> &str {
        self.label
    }

    fn dt_s(&self) -> f64 {
        self.dt_s
    }

    fn v_oc(&self) -> f64 {
        self.lut_voc.get(self.soc)
    }

    fn step(&mut self, i_charge_a: f64) -> StorageState {
        let i_cell = -i_charge_a;
        let i_leak = self.lut_voc.get(self.soc) * self.constant_1_per_ohm;

        self.soc = (self.soc - (i_cell + i_leak) * self.constant_s_per_as).clamp(0.0, 1.0);

        let v_oc = self.lut_voc.get(self.soc);
        let r_series = self.lut_rseries.get(self.soc);
        let v_cell = (v_oc - i_cell * r_series).max(0.0);
        StorageState {
            v_oc,
            v_cell,
            soc: self.soc,
            soc_eff: self.soc,
        }
    }
}
