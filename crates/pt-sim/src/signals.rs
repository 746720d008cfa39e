//! Synthetic IV input traces.

use pt_core::units::{Current, Time, Voltage};
use pt_core::{ensure_finite, ensure_positive};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// One input sample: timestamp, voltage, current (SI).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IvSample {
    pub t_s: f64,
    pub voltage: f64,
    pub current: f64,
}

/// `count` samples of a static source.
pub fn constant_iv(
    voltage: Voltage,
    current: Current,
    dt: Time,
    count: usize,
) -> SimResult<impl Iterator<Item = IvSample>> {
    let (voltage, current) = (voltage.value, current.value);
    ensure_finite(voltage, "voltage")?;
    ensure_finite(current, "current")?;
    let dt_s = ensure_positive(dt.value, "dt_s")?;
    Ok((0..count).map(move |n| IvSample {
        t_s: n as f64 * dt_s,
        voltage,
        current,
    }))
}

/// Repetitive linear ramps from `start` to `end` over `period_n` samples.
///
/// Each period hits both end points exactly.
pub fn sawtooth_iv(
    voltage: (Voltage, Voltage),
    current: (Current, Current),
    period_n: usize,
    dt: Time,
    count: usize,
) -> SimResult<impl Iterator<Item = IvSample>> {
    if period_n < 2 {
        return Err(SimError::InvalidArg {
            what: "sawtooth period needs at least two samples",
        });
    }
    let (v0, v1) = (voltage.0.value, voltage.1.value);
    let (i0, i1) = (current.0.value, current.1.value);
    for (v, what) in [(v0, "voltage"), (v1, "voltage"), (i0, "current"), (i1, "current")] {
        ensure_finite(v, what)?;
    }
    let dt_s = ensure_positive(dt.value, "dt_s")?;
    let last = (period_n - 1) as f64;
    Ok((0..count).map(move |n| {
        let frac = (n % period_n) as f64 / last;
        IvSample {
            t_s: n as f64 * dt_s,
            voltage: lerp(v0, v1, frac),
            current: lerp(i0, i1, frac),
        }
    }))
}

fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a * (1.0 - frac) + b * frac
}
