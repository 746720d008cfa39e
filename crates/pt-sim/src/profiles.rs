//! Synthetic charge profiles for storage experiments.
//!
//! A profile maps `(t_s, soc, v_cell)` to the charge current of the next
//! tick, matching the charge function of [`crate::StorageSimulator`].

use pt_core::units::{Current, Resistance, Time, Voltage};
use pt_core::{ensure_finite, ensure_fraction, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

use crate::error::SimResult;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChargeProfile {
    ConstantCurrent {
        current: f64,
    },
    /// Pulses `current` for `duration_s` of every `period_s` until the SoC
    /// reaches `soc_target` (from below when charging, above when discharging).
    CurrentPulsed {
        current: f64,
        period_s: f64,
        duration_s: f64,
        soc_target: f64,
    },
    /// Charger at `v_target` behind `r_ohm`, pulsed like `CurrentPulsed`.
    ResistiveChargePulsed {
        v_target: f64,
        r_ohm: f64,
        period_s: f64,
        duration_s: f64,
    },
    /// Load resistor across the cell.
    ResistiveLoad {
        r_ohm: f64,
    },
}

impl ChargeProfile {
    pub fn constant_current(current: Current) -> Self {
        Self::ConstantCurrent {
            current: current.value,
        }
    }

    pub fn current_pulsed(current: Current, period: Time, duration: Time, soc_target: f64) -> Self {
        Self::CurrentPulsed {
            current: current.value,
            period_s: period.value,
            duration_s: duration.value,
            soc_target,
        }
    }

    pub fn resistive_charge_pulsed(
        v_target: Voltage,
        r: Resistance,
        period: Time,
        duration: Time,
    ) -> Self {
        Self::ResistiveChargePulsed {
            v_target: v_target.value,
            r_ohm: r.value,
            period_s: period.value,
            duration_s: duration.value,
        }
    }

    pub fn resistive_load(r: Resistance) -> Self {
        Self::ResistiveLoad { r_ohm: r.value }
    }

    pub fn validate(&self) -> SimResult<()> {
        match *self {
            Self::ConstantCurrent { current } => {
                ensure_finite(current, "current")?;
            }
            Self::CurrentPulsed {
                current,
                period_s,
                duration_s,
                soc_target,
            } => {
                ensure_finite(current, "current")?;
                ensure_positive(period_s, "period_s")?;
                ensure_range(duration_s, "duration_s", 0.0, period_s, "[0, period_s]")?;
                ensure_fraction(soc_target, "soc_target")?;
            }
            Self::ResistiveChargePulsed {
                v_target,
                r_ohm,
                period_s,
                duration_s,
            } => {
                ensure_positive(v_target, "v_target")?;
                ensure_positive(r_ohm, "r_ohm")?;
                ensure_positive(period_s, "period_s")?;
                ensure_range(duration_s, "duration_s", 0.0, period_s, "[0, period_s]")?;
            }
            Self::ResistiveLoad { r_ohm } => {
                ensure_positive(r_ohm, "r_ohm")?;
            }
        }
        Ok(())
    }

    /// Charge current for the next tick; negative discharges.
    pub fn current(&self, t_s: f64, soc: f64, v_cell: f64) -> f64 {
        match *self {
            Self::ConstantCurrent { current } => current,
            Self::CurrentPulsed {
                current,
                period_s,
                duration_s,
                soc_target,
            } => {
                let reached = (current < 0.0 && soc <= soc_target)
                    || (current > 0.0 && soc >= soc_target);
                if reached || !pulse_on(t_s, period_s, duration_s) {
                    0.0
                } else {
                    current
                }
            }
            Self::ResistiveChargePulsed {
                v_target,
                r_ohm,
                period_s,
                duration_s,
            } => {
                if pulse_on(t_s, period_s, duration_s) {
                    (v_target - v_cell) / r_ohm
                } else {
                    0.0
                }
            }
            Self::ResistiveLoad { r_ohm } => -v_cell / r_ohm,
        }
    }
}

fn pulse_on(t_s: f64, period_s: f64, duration_s: f64) -> bool {
    t_s.rem_euclid(period_s) < duration_s
}
