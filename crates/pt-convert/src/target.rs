//! Virtual targets drawing current from the converter output.

use pt_core::{ensure_non_negative, ensure_positive};
use pt_core::units::{Current, Resistance};
use serde::{Deserialize, Serialize};

use crate::error::ConvertResult;

/// Trait for loads attached to the regulated output.
pub trait Target: Send + Sync {
    /// Current drawn at `voltage`, given the converter's power-good signal.
    fn step(&mut self, voltage: f64, power_good: bool) -> f64;
}

/// Ohmic load. A controlled target disconnects while power-good is low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistiveTarget {
    pub r_ohm: f64,
    pub controlled: bool,
}

impl ResistiveTarget {
    pub fn new(r: Resistance, controlled: bool) -> ConvertResult<Self> {
        ensure_positive(r.value, "r_ohm")?;
        Ok(Self {
            r_ohm: r.value,
            controlled,
        })
    }
}

impl Target for ResistiveTarget {
    fn step(&mut self, voltage: f64, power_good: bool) -> f64 {
        if self.controlled && !power_good {
            return 0.0;
        }
        voltage.max(0.0) / self.r_ohm
    }
}

/// Fixed current sink, e.g. an MCU in one power mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantCurrentTarget {
    pub i_a: f64,
    pub controlled: bool,
}

impl ConstantCurrentTarget {
    pub fn new(i: Current, controlled: bool) -> ConvertResult<Self> {
        ensure_non_negative(i.value, "i_a")?;
        Ok(Self {
            i_a: i.value,
            controlled,
        })
    }
}

impl Target for ConstantCurrentTarget {
    fn step(&mut self, voltage: f64, power_good: bool) -> f64 {
        // nothing flows without a supply
        if (self.controlled && !power_good) || !(voltage > 0.0) {
            return 0.0;
        }
        self.i_a
    }
}
