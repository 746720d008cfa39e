//! Hybrid KiBaM as published, focused on discharge.
//!
//! Follows "A Hybrid Battery Model Capable of Capturing Dynamic Circuit
//! Characteristics and Nonlinear Capacity Effects":
//! - rate capacity effect only builds up while discharging
//! - transient voltages ramp toward `R·I` while discharging and decay from the
//!   last reached value otherwise (peaks freeze only at direction switches)
//! - no self-discharge
//!
//! SoC and SoC_eff are clamped, V_cell is floored at zero.

use crate::error::StorageResult;
use crate::model::{StorageModel, StorageState, initial_soc};
use crate::params::StorageParameters;

#[derive(Debug, Clone)]
pub struct KiBaM {
    params: StorageParameters,
    dt_s: f64,
    soc: f64,
    /// Time since the last change of current direction.
    time_s: f64,
    c_unavailable: f64,
    c_unavailable_last: f64,
    v_transient_s_max: f64,
    v_transient_l_max: f64,
    discharge_last: bool,
}

impl KiBaM {
    pub fn new(params: &StorageParameters, soc_init: Option<f64>, dt_s: f64) -> StorageResult<Self> {
        let soc = initial_soc(params, soc_init, dt_s)?;
        Ok(Self {
            params: params.clone(),
            dt_s,
            soc,
            time_s: 0.0,
            c_unavailable: 0.0,
            c_unavailable_last: 0.0,
            v_transient_s_max: 0.0,
            v_transient_l_max: 0.0,
            discharge_last: false,
        })
    }
}

impl StorageModel for KiBaM {
    fn label(&self) -> &str {
        "KiBaM"
    }

    fn dt_s(&self) -> f64 {
        self.dt_s
    }

    fn v_oc(&self) -> f64 {
        let soc_eff = (self.soc - self.c_unavailable / self.params.q_as).max(0.0);
        self.params.calc_v_oc(soc_eff)
    }

    fn step(&mut self, i_charge_a: f64) -> StorageState {
        let p = &self.params;
        let i_cell = -i_charge_a;
        let discharging = i_cell > 0.0;

        if self.discharge_last != discharging {
            self.discharge_last = discharging;
            self.time_s = 0.0;
            self.c_unavailable_last = self.c_unavailable;
        }
        // transients are evaluated at the end of this tick
        self.time_s += self.dt_s;

        // rate capacity and recovery (eq. 17)
        let decay = (-p.kdash * self.time_s).exp();
        self.c_unavailable = if discharging {
            self.c_unavailable_last * decay
                + (1.0 - p.p_rce) * i_cell / p.p_rce * (1.0 - decay) / p.kdash
        } else {
            self.c_unavailable_last * decay
        };

        // eq. 6, discretized
        self.soc = (self.soc - i_cell * self.dt_s / p.q_as).clamp(0.0, 1.0);
        let soc_eff = (self.soc - self.c_unavailable / p.q_as).max(0.0);

        let v_oc = p.calc_v_oc(soc_eff);
        let r_series = p.calc_r_series(soc_eff);
        let r_ts = p.calc_r_transient_s(soc_eff);
        let r_tl = p.calc_r_transient_l(soc_eff);
        let tau_s = (r_ts * p.calc_c_transient_s(soc_eff)).max(f64::MIN_POSITIVE);
        let tau_l = (r_tl * p.calc_c_transient_l(soc_eff)).max(f64::MIN_POSITIVE);

        // eq. 10 and 11
        let v_transient_s = if discharging {
            self.v_transient_s_max = r_ts * i_cell * (1.0 - (-self.time_s / tau_s).exp());
            self.v_transient_s_max
        } else {
            self.v_transient_s_max * (-self.time_s / tau_s).exp()
        };
        let v_transient_l = if discharging {
            self.v_transient_l_max = r_tl * i_cell * (1.0 - (-self.time_s / tau_l).exp());
            self.v_transient_l_max
        } else {
            self.v_transient_l_max * (-self.time_s / tau_l).exp()
        };

        let v_cell = (v_oc - i_cell * r_series - v_transient_s - v_transient_l).max(0.0);
        StorageState {
            v_oc,
            v_cell,
            soc: self.soc,
            soc_eff,
        }
    }
}
