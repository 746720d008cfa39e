//! Fixed-size lookup tables sampled from a storage curve.

use pt_core::{PtResult, ensure_positive};

pub const LUT_SIZE_LOG: u32 = 7;
pub const LUT_SIZE: usize = 1 << LUT_SIZE_LOG;

/// Sampling grid for SoC lookups: `1 / LUT_SIZE` per bucket.
pub const SOC_BUCKET: f64 = 1.0 / LUT_SIZE as f64;

/// Lookup table over `[0, x_min · len)`.
///
/// Entry `i` holds `f((i + offset) · x_min)`, with `offset = 0.5` when
/// generated with `optimize_clamp` (bucket centers) and `0` otherwise
/// (lower bucket edges). Interpolating tables always use lower edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut {
    x_min: f64,
    y_values: Vec<f64>,
    interpolate: bool,
}

impl Lut {
    pub fn generate(
        x_min: f64,
        y_fn: impl Fn(f64) -> f64,
        size: usize,
        optimize_clamp: bool,
        interpolate: bool,
    ) -> PtResult<Self> {
        ensure_positive(x_min, "x_min")?;
        if size == 0 {
            return Err(pt_core::PtError::InvalidArg {
                what: "lookup table needs at least one entry",
            });
        }
        let offset = if optimize_clamp && !interpolate { 0.5 } else { 0.0 };
        let y_values = (0..size)
            .map(|i| y_fn((i as f64 + offset) * x_min))
            .collect();
        Ok(Self {
            x_min,
            y_values,
            interpolate,
        })
    }

    /// Table with `LUT_SIZE` entries over SoC in `[0, 1]`.
    pub fn soc(y_fn: impl Fn(f64) -> f64, optimize_clamp: bool, interpolate: bool) -> Self {
        let offset = if optimize_clamp && !interpolate { 0.5 } else { 0.0 };
        let y_values = (0..LUT_SIZE)
            .map(|i| y_fn((i as f64 + offset) * SOC_BUCKET))
            .collect();
        Self {
            x_min: SOC_BUCKET,
            y_values,
            interpolate,
        }
    }

    pub fn len(&self) -> usize {
        self.y_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y_values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.y_values
    }

    pub fn get(&self, x: f64) -> f64 {
        if self.interpolate {
            self.get_interpol(x)
        } else {
            self.get_discrete(x)
        }
    }

    /// Stair lookup: `trunc(x / x_min)` clamped to the table.
    pub fn get_discrete(&self, x: f64) -> f64 {
        let last = self.y_values.len() - 1;
        let num = (x / self.x_min).trunc();
        // NaN and negative inputs land in bucket 0
        let idx = if num >= 0.0 { (num as usize).min(last) } else { 0 };
        self.y_values[idx]
    }

    pub fn get_interpol(&self, x: f64) -> f64 {
        let last = self.y_values.len() - 1;
        let num = x / self.x_min;
        if !(num > 0.0) {
            return self.y_values[0];
        }
        if num >= last as f64 {
            return self.y_values[last];
        }
        let idx = num.floor() as usize;
        let frac = num - idx as f64;
        let y_base = self.y_values[idx];
        y_base + (self.y_values[idx + 1] - y_base) * frac
    }
}
