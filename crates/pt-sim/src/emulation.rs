//! End-to-end emulation: input trace -> virtual source -> target.

use pt_convert::{Target, VirtualSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signals::IvSample;

/// Per-sample record of an emulation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmulationRecord {
    pub t_s: Vec<f64>,
    /// Operating point the converter harvested from.
    pub v_in: Vec<f64>,
    pub i_in: Vec<f64>,
    /// Regulated output and the target's draw.
    pub v_out: Vec<f64>,
    pub i_out: Vec<f64>,
    pub soc: Vec<f64>,
    pub power_good: Vec<bool>,
}

impl EmulationRecord {
    fn with_capacity(n: usize) -> Self {
        Self {
            t_s: Vec::with_capacity(n),
            v_in: Vec::with_capacity(n),
            i_in: Vec::with_capacity(n),
            v_out: Vec::with_capacity(n),
            i_out: Vec::with_capacity(n),
            soc: Vec::with_capacity(n),
            power_good: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.t_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t_s.is_empty()
    }
}

/// Drive the full stack with `samples`.
///
/// The target sees the output voltage and power-good of the previous sample.
pub fn run_emulation<T, I>(
    source: &mut VirtualSource,
    target: &mut T,
    samples: I,
) -> EmulationRecord
where
    T: Target + ?Sized,
    I: IntoIterator<Item = IvSample>,
{
    let samples = samples.into_iter();
    let mut rec = EmulationRecord::with_capacity(samples.size_hint().0);
    debug!(start_sample = source.samples(), "emulation start");
    for sample in samples {
        let prev = source.state();
        let i_out = target.step(prev.v_out, prev.power_good);
        let v_out = source.step(sample.voltage, sample.current, i_out);
        let state = source.state();
        rec.t_s.push(sample.t_s);
        rec.v_in.push(state.v_input);
        rec.i_in.push(state.i_input);
        rec.v_out.push(v_out);
        rec.i_out.push(i_out);
        rec.soc.push(state.storage.soc);
        rec.power_good.push(state.power_good);
    }
    debug!(
        samples = rec.len(),
        energy_in_ws = source.energy_in_ws(),
        energy_out_ws = source.energy_out_ws(),
        "emulation finished"
    );
    rec
}
