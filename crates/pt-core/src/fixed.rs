//! Unsigned fixed-point values and the saturating guards of the PRU firmware.
//!
//! A `UFixed<FRAC>` stores `raw = value · 2^FRAC`, where `value` is expressed in
//! the unit the alias names (µV, nA, kΩ, 1/nA, ...). Aliases spell out both
//! parts, e.g. `MicroVoltQ8` is "microvolts, 8 fractional bits".
//!
//! The firmware has no exception mechanism: every addition, subtraction and
//! multiplication that could leave the `u32`/`u64` range is clamped. The
//! `sat_*` guards reproduce that and report each clamp via `tracing::warn!`.

use std::fmt;

/// Unsigned Q-format value with `FRAC` fractional bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UFixed<const FRAC: u32>(u64);

impl<const FRAC: u32> UFixed<FRAC> {
    pub const FRAC_BITS: u32 = FRAC;
    pub const ZERO: Self = Self(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// `2^FRAC` as float.
    #[inline]
    pub fn scale() -> f64 {
        2.0_f64.powi(FRAC as i32)
    }

    /// Quantize an already scaled value (`value · 2^FRAC · unit`).
    ///
    /// Rounds half to even, the rounding mode of the host-side tooling that
    /// generates firmware constants.
    pub fn quantize(scaled: f64, what: &'static str) -> Self {
        Self(sat_u64_f64(scaled.round_ties_even(), what))
    }

    /// Quantize a value given in the alias unit.
    pub fn from_real(value: f64, what: &'static str) -> Self {
        Self::quantize(Self::scale() * value, what)
    }

    pub fn to_real(self) -> f64 {
        self.0 as f64 / Self::scale()
    }

    /// Integer part (`raw >> FRAC`).
    pub const fn trunc(self) -> u64 {
        self.0 >> FRAC
    }

    /// Reinterpret into another Q-format, shifting the raw value.
    pub fn rescale<const TO: u32>(self, what: &'static str) -> UFixed<TO> {
        let raw = self.0 as i128;
        let shifted = if TO >= FRAC {
            raw << (TO - FRAC)
        } else {
            raw >> (FRAC - TO)
        };
        UFixed::<TO>(sat_u64(shifted, what))
    }

    /// Narrow to the 32 bit field width used in firmware structs.
    pub fn to_u32(self, what: &'static str) -> u32 {
        sat_u32(self.0 as i128, what)
    }
}

impl<const FRAC: u32> fmt::Debug for UFixed<FRAC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UFixed<{}>({} ≈ {})", FRAC, self.0, self.to_real())
    }
}

/// SoC with 62 fractional bits: `1.0 == 2^62`, two spare bits detect overshoot.
pub type SocQ62 = UFixed<62>;
/// SoC with 30 fractional bits, the width of the initial-SoC config word.
pub type SocQ30 = UFixed<30>;
/// Microvolts with 8 fractional bits; `u32` range covers 3.9 nV .. 16.7 V.
pub type MicroVoltQ8 = UFixed<8>;
/// Kiloohms with 32 fractional bits; `u32` range covers 233 nΩ .. 1 kΩ.
pub type KiloOhmQ32 = UFixed<32>;
/// Nanoamperes with 4 fractional bits.
pub type NanoAmpQ4 = UFixed<4>;
/// SoC change per nanoampere and tick, 60 fractional bits.
pub type PerNanoAmpQ60 = UFixed<60>;
/// SoC change per microvolt of leakage and tick, 60 fractional bits.
pub type PerMicroVoltQ60 = UFixed<60>;

/// Direction in which a value left its integer range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Saturation {
    Overflow,
    Underflow,
}

pub const U32_LIMIT: i128 = 1 << 32;
pub const U64_LIMIT: i128 = 1 << 64;

/// Clamp into `[0, 2^32 - 1]`.
pub fn clamp_u32(v: i128) -> (u32, Option<Saturation>) {
    if v >= U32_LIMIT {
        (u32::MAX, Some(Saturation::Overflow))
    } else if v < 0 {
        (0, Some(Saturation::Underflow))
    } else {
        (v as u32, None)
    }
}

/// Clamp into `[0, 2^64 - 1]`.
pub fn clamp_u64(v: i128) -> (u64, Option<Saturation>) {
    if v >= U64_LIMIT {
        (u64::MAX, Some(Saturation::Overflow))
    } else if v < 0 {
        (0, Some(Saturation::Underflow))
    } else {
        (v as u64, None)
    }
}

/// Clamp a float into `[0, 2^32 - 1]`, truncating toward zero. NaN maps to 0.
pub fn clamp_u32_f64(v: f64) -> (u32, Option<Saturation>) {
    if v >= U32_LIMIT as f64 {
        (u32::MAX, Some(Saturation::Overflow))
    } else if v < 0.0 || v.is_nan() {
        (0, Some(Saturation::Underflow))
    } else {
        (v as u32, None)
    }
}

/// Clamp a float into `[0, 2^64 - 1]`, truncating toward zero. NaN maps to 0.
pub fn clamp_u64_f64(v: f64) -> (u64, Option<Saturation>) {
    if v >= U64_LIMIT as f64 {
        (u64::MAX, Some(Saturation::Overflow))
    } else if v < 0.0 || v.is_nan() {
        (0, Some(Saturation::Underflow))
    } else {
        (v as u64, None)
    }
}

fn report(sat: Option<Saturation>, width: &'static str, what: &'static str) {
    match sat {
        Some(Saturation::Overflow) => tracing::warn!(quantity = what, "{width}-overflow"),
        Some(Saturation::Underflow) => tracing::warn!(quantity = what, "{width}-underflow"),
        None => {}
    }
}

pub fn sat_u32(v: i128, what: &'static str) -> u32 {
    let (out, sat) = clamp_u32(v);
    report(sat, "u32", what);
    out
}

pub fn sat_u64(v: i128, what: &'static str) -> u64 {
    let (out, sat) = clamp_u64(v);
    report(sat, "u64", what);
    out
}

pub fn sat_u32_f64(v: f64, what: &'static str) -> u32 {
    let (out, sat) = clamp_u32_f64(v);
    report(sat, "u32", what);
    out
}

pub fn sat_u64_f64(v: f64, what: &'static str) -> u64 {
    let (out, sat) = clamp_u64_f64(v);
    report(sat, "u64", what);
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sat_u32_never_exceeds_range(v in any::<i64>()) {
            let out = sat_u32(v as i128, "prop");
            if v < 0 {
                prop_assert_eq!(out, 0);
            } else if (v as i128) < U32_LIMIT {
                prop_assert_eq!(out as i64, v);
            } else {
                prop_assert_eq!(out, u32::MAX);
            }
        }

        #[test]
        fn from_real_error_below_one_lsb(v in 0.0_f64..16.0e6) {
            let q = MicroVoltQ8::from_real(v, "prop");
            prop_assert!((q.to_real() - v).abs() <= 0.5 / 256.0 + 1e-9);
        }
    }
}
