//! Physical parameters of an energy storage element.
//!
//! The curve-fit follows the hybrid KiBaM paper ("A Hybrid Battery Model
//! Capable of Capturing Dynamic Circuit Characteristics and Nonlinear Capacity
//! Effects") with the coefficient names a..f mapped onto `p_voc`, `p_rs`,
//! `p_rts`, `p_cts`, `p_rtl` and `p_ctl`. Self-discharge through `r_leak_ohm`
//! is an extension on top of the paper.

use std::time::Duration;

use pt_core::units::{Capacitance, Charge, Resistance, Voltage};
use pt_core::{PtError, PtResult, ensure_finite, ensure_fraction, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Grid used to check that fitted resistances stay non-negative.
const VALIDATION_POINTS: usize = 129;

/// Immutable description of a battery or capacitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageParameters {
    pub name: String,
    /// State of charge when the simulation starts.
    #[serde(default = "default_soc_init")]
    pub soc_init: f64,
    /// Capacity (electrical charge) in ampere-seconds.
    pub q_as: f64,
    /// Open-circuit voltage fit, a0..a5.
    #[serde(default = "default_p_voc")]
    pub p_voc: [f64; 6],
    /// Series resistance fit, b0..b5.
    #[serde(default)]
    pub p_rs: [f64; 6],
    /// Short-term transient resistance, c0..c2.
    #[serde(default)]
    pub p_rts: [f64; 3],
    /// Short-term transient capacitance, d0..d2.
    #[serde(default)]
    pub p_cts: [f64; 3],
    /// Long-term transient resistance, e0..e2.
    #[serde(default)]
    pub p_rtl: [f64; 3],
    /// Long-term transient capacitance, f0..f2.
    #[serde(default)]
    pub p_ctl: [f64; 3],
    /// Rate capacity effect ratio `c` in (0, 1]; 1 disables the effect.
    #[serde(default = "default_p_rce")]
    pub p_rce: f64,
    /// Valve constant `k' = k / (c (1 - c))` of the kinetic model.
    #[serde(default = "default_kdash")]
    pub kdash: f64,
    /// Parallel leakage resistance modelling self-discharge.
    #[serde(default = "default_r_leak")]
    pub r_leak_ohm: f64,
}

fn default_soc_init() -> f64 {
    1.0
}

fn default_p_voc() -> [f64; 6] {
    [0.0, 0.0, 0.0, 1.0, 0.0, 0.0]
}

fn default_p_rce() -> f64 {
    1.0
}

fn default_kdash() -> f64 {
    f64::MIN_POSITIVE
}

fn default_r_leak() -> f64 {
    f64::MAX
}

fn poly_exp6(p: &[f64; 6], soc: f64) -> f64 {
    p[0] * (-p[1] * soc).exp() + p[2] + p[3] * soc - p[4] * soc.powi(2) + p[5] * soc.powi(3)
}

fn exp3(p: &[f64; 3], soc: f64) -> f64 {
    p[0] * (-p[1] * soc).exp() + p[2]
}

impl StorageParameters {
    /// Direct SoC-to-voltage mapping, no resistances, no leakage.
    pub fn new(name: impl Into<String>, q_as: f64) -> Self {
        Self {
            name: name.into(),
            soc_init: default_soc_init(),
            q_as,
            p_voc: default_p_voc(),
            p_rs: [0.0; 6],
            p_rts: [0.0; 3],
            p_cts: [0.0; 3],
            p_rtl: [0.0; 3],
            p_ctl: [0.0; 3],
            p_rce: default_p_rce(),
            kdash: default_kdash(),
            r_leak_ohm: default_r_leak(),
        }
    }

    /// Modeled after the PL-383562 2C Polymer Lithium-ion Battery.
    ///
    /// Nominal 3.7 V / 860 mAh, cutoff 3.0 V .. 4.2 V, max discharge 2 C.
    /// The capacity is adjustable, all other coefficients are per cell.
    pub fn lipo(capacity: Charge, soc_init: Option<f64>) -> Self {
        let q_as = capacity.value;
        let capacity_mah = q_as * 1000.0 / 3600.0;
        Self {
            name: format!("LiPo_{capacity_mah:.0}mAh_3.7V"),
            soc_init: soc_init.unwrap_or_else(default_soc_init),
            q_as,
            p_voc: [-0.852, 63.867, 3.6297, 0.559, 0.51, 0.508],
            p_rs: [0.1463, 30.27, 0.1037, 0.0584, 0.1747, 0.1288],
            p_rts: [0.1063, 62.49, 0.0437],
            // d1 is most likely misprinted in the paper (-138)
            p_cts: [-200.0, 138.0, 300.0],
            p_rtl: [0.0712, 61.4, 0.0288],
            p_ctl: [-3083.0, 180.0, 5088.0],
            p_rce: 0.9248,
            kdash: 0.0008,
            // ~5 % self-discharge per month
            r_leak_ohm: 55.9e6 / capacity_mah,
        }
    }

    /// Modeled after the LEOCH LP12-1.2AH lead acid battery (6 cells, 12 V).
    ///
    /// Cutoff 10.8 V .. 13.5 V, max discharge 15 C.
    pub fn lead_acid(capacity: Charge, soc_init: Option<f64>) -> Self {
        let q_as = capacity.value;
        let capacity_mah = q_as * 1000.0 / 3600.0;
        Self {
            name: format!("Lead-Acid_{capacity_mah:.0}mAh_12V"),
            soc_init: soc_init.unwrap_or_else(default_soc_init),
            q_as,
            p_voc: [5.429, 117.5, 11.32, 2.706, 2.04, 1.026],
            p_rs: [1.578, 8.527, 0.7808, -1.887, -2.404, -0.649],
            p_rts: [2.771, 9.079, 0.22],
            p_cts: [-2423.0, 75.14, 55.0],
            // first two values equal p_rts in the published table
            p_rtl: [2.771, 9.079, 0.218],
            p_ctl: [-1240.0, 9.571, 3100.0],
            p_rce: 0.6,
            kdash: 0.0034,
            // datasheet: 3-20 % discharge per month, 5 % chosen
            r_leak_ohm: 174e6 / capacity_mah,
        }
    }

    /// Ideal capacitor: V_OC rises linearly to `v_rated` at SoC = 1.
    pub fn capacitor(
        capacitance: Capacitance,
        v_rated: Voltage,
        r_series: Option<Resistance>,
        r_leak: Option<Resistance>,
    ) -> Self {
        let c_uf = capacitance.value * 1e6;
        let v = v_rated.value;
        let mut params = Self::new(format!("Capacitor_{c_uf:.0}uF_{v:.1}V"), capacitance.value * v);
        params.p_voc = [0.0, 0.0, 0.0, v, 0.0, 0.0];
        if let Some(r) = r_series {
            params.p_rs = [0.0, 0.0, r.value, 0.0, 0.0, 0.0];
        }
        if let Some(r) = r_leak {
            params.r_leak_ohm = r.value;
        }
        params
    }

    pub fn with_soc_init(mut self, soc_init: f64) -> Self {
        self.soc_init = soc_init;
        self
    }

    pub fn with_r_leak(mut self, r_leak_ohm: f64) -> Self {
        self.r_leak_ohm = r_leak_ohm;
        self
    }

    pub fn without_rate_capacity(&self) -> Self {
        let mut out = self.clone();
        out.p_rce = 1.0;
        out.name.push_str(" no_rate_cap");
        out
    }

    pub fn without_transient_voltages(&self) -> Self {
        let mut out = self.clone();
        out.p_rts = [0.0; 3];
        out.p_cts = [0.0; 3];
        out.p_rtl = [0.0; 3];
        out.p_ctl = [0.0; 3];
        out.name.push_str(" no_transient_vs");
        out
    }

    /// Check every field; the first violation is reported by name.
    pub fn validate(&self) -> PtResult<()> {
        ensure_fraction(self.soc_init, "soc_init")?;
        ensure_positive(self.q_as, "q_as")?;
        ensure_range(self.p_rce, "p_rce", f64::MIN_POSITIVE, 1.0, "(0, 1]")?;
        ensure_positive(self.kdash, "kdash")?;
        ensure_positive(self.r_leak_ohm, "r_leak_ohm")?;

        let coefficients: [(&'static str, &[f64]); 6] = [
            ("p_voc", &self.p_voc),
            ("p_rs", &self.p_rs),
            ("p_rts", &self.p_rts),
            ("p_cts", &self.p_cts),
            ("p_rtl", &self.p_rtl),
            ("p_ctl", &self.p_ctl),
        ];
        for (field, values) in coefficients {
            for v in values {
                ensure_finite(*v, field)?;
            }
        }

        let resistances: [(&'static str, fn(&Self, f64) -> f64); 3] = [
            ("p_rs", Self::calc_r_series),
            ("p_rts", Self::calc_r_transient_s),
            ("p_rtl", Self::calc_r_transient_l),
        ];
        for (field, calc) in resistances {
            for i in 0..VALIDATION_POINTS {
                let soc = i as f64 / (VALIDATION_POINTS - 1) as f64;
                let r = calc(self, soc);
                if !(r >= 0.0) {
                    return Err(PtError::OutOfRange {
                        field,
                        value: r,
                        expected: "resistance >= 0 for SoC in [0, 1]",
                    });
                }
            }
        }
        Ok(())
    }

    pub fn calc_v_oc(&self, soc: f64) -> f64 {
        poly_exp6(&self.p_voc, soc)
    }

    pub fn calc_r_series(&self, soc: f64) -> f64 {
        poly_exp6(&self.p_rs, soc)
    }

    pub fn calc_r_transient_s(&self, soc: f64) -> f64 {
        exp3(&self.p_rts, soc)
    }

    pub fn calc_c_transient_s(&self, soc: f64) -> f64 {
        exp3(&self.p_cts, soc)
    }

    pub fn calc_r_transient_l(&self, soc: f64) -> f64 {
        exp3(&self.p_rtl, soc)
    }

    pub fn calc_c_transient_l(&self, soc: f64) -> f64 {
        exp3(&self.p_ctl, soc)
    }

    /// Translate `k'` into the valve constant `k = k' c (1 - c)`.
    pub fn calc_k(kdash: f64, c: f64) -> PtResult<f64> {
        ensure_positive(kdash, "kdash")?;
        ensure_range(c, "p_rce", f64::MIN_POSITIVE, 1.0, "(0, 1]")?;
        Ok(kdash * c * (1.0 - c))
    }

    /// Leakage resistance of a capacitor that decays from `soc_0` to
    /// `soc_final` within `duration` (from `U(t) = U0 e^(-t/RC)`).
    ///
    /// Example: 50 mAh from 100 % to 85 % over 30 days gives ~1.8 MΩ.
    pub fn calc_r_leak_capacitor(
        &self,
        duration: Duration,
        soc_final: f64,
        soc_0: f64,
    ) -> StorageResult<f64> {
        ensure_fraction(soc_final, "soc_final")?;
        ensure_fraction(soc_0, "soc_0")?;
        let u0 = self.calc_v_oc(soc_0);
        let ut = self.calc_v_oc(soc_final);
        if !(u0 > ut && ut > 0.0) {
            return Err(StorageError::InvalidArg {
                what: "capacitor leakage needs V_OC(soc_0) > V_OC(soc_final) > 0",
            });
        }
        Ok(duration.as_secs_f64() * u0 / (self.q_as * (u0 / ut).ln()))
    }

    /// Leakage resistance of a battery, assuming a linear SoC decay at the
    /// mean open-circuit voltage.
    pub fn calc_r_leak_battery(
        &self,
        duration: Duration,
        soc_final: f64,
        soc_0: f64,
    ) -> StorageResult<f64> {
        ensure_fraction(soc_final, "soc_final")?;
        ensure_fraction(soc_0, "soc_0")?;
        let secs = duration.as_secs_f64();
        if !(soc_0 > soc_final && secs > 0.0) {
            return Err(StorageError::InvalidArg {
                what: "battery leakage needs soc_0 > soc_final and a non-zero duration",
            });
        }
        let u0 = self.calc_v_oc(soc_0);
        let u1 = self.calc_v_oc(soc_final);
        let current_a = (soc_0 - soc_final) * self.q_as / secs;
        Ok((u0 + u1) / 2.0 / current_a)
    }

    /// Invert `calc_v_oc` with a step-halving search starting at SoC = 0.5.
    pub fn approximate_soc(&self, v_oc: f64) -> StorageResult<f64> {
        const MAX_ITER: usize = 100;
        if !(v_oc.is_finite() && v_oc != 0.0) {
            return Err(StorageError::SocNotFound { v_oc });
        }
        let mut soc_next = 0.5;
        let mut soc_now = soc_next;
        let mut step_size = 0.05;
        let mut go_up = true;
        let mut mismatch = 5.0;

        for _ in 0..=MAX_ITER {
            if mismatch <= 0.001 {
                return Ok(soc_now);
            }
            soc_now = soc_next;
            let mismatch_new = (self.calc_v_oc(soc_now) / v_oc - 1.0).abs();
            if mismatch_new > mismatch {
                go_up = !go_up;
                if go_up {
                    step_size /= 2.0;
                }
            }
            soc_next += if go_up { step_size } else { -step_size };
            mismatch = mismatch_new;
        }
        Err(StorageError::SocNotFound { v_oc })
    }
}
