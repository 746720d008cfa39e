//! Synchronous driver for comparing storage models.

use pt_core::ensure_positive;
use pt_storage::{Storage, StorageModel, StorageState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimError, SimResult};

/// One recorded tick of one model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    pub t_s: f64,
    pub v_oc: f64,
    pub v_cell: f64,
    pub soc: f64,
    pub soc_eff: f64,
    /// Charge current fed into the model.
    pub current: f64,
}

/// Column-wise trace of one model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageTrace {
    pub label: String,
    pub t_s: Vec<f64>,
    pub current: Vec<f64>,
    pub v_oc: Vec<f64>,
    pub v_cell: Vec<f64>,
    pub soc: Vec<f64>,
    pub soc_eff: Vec<f64>,
}

impl StorageTrace {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            ..Self::default()
        }
    }

    fn push(&mut self, t_s: f64, current: f64, s: &StorageState) {
        self.t_s.push(t_s);
        self.current.push(current);
        self.v_oc.push(s.v_oc);
        self.v_cell.push(s.v_cell);
        self.soc.push(s.soc);
        self.soc_eff.push(s.soc_eff);
    }

    pub fn len(&self) -> usize {
        self.t_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t_s.is_empty()
    }

    pub fn last(&self) -> Option<TraceSample> {
        self.len().checked_sub(1).map(|i| self.sample(i))
    }

    /// Row view over the columns.
    pub fn samples(&self) -> impl Iterator<Item = TraceSample> + '_ {
        (0..self.len()).map(|i| self.sample(i))
    }

    fn sample(&self, i: usize) -> TraceSample {
        TraceSample {
            t_s: self.t_s[i],
            v_oc: self.v_oc[i],
            v_cell: self.v_cell[i],
            soc: self.soc[i],
            soc_eff: self.soc_eff[i],
            current: self.current[i],
        }
    }
}

/// Steps a set of storage models with a shared timestep.
///
/// Every model gets its own feedback: the charge function sees the SoC and
/// cell voltage that model produced on the previous tick.
#[derive(Debug, Clone)]
pub struct StorageSimulator {
    models: Vec<Storage>,
    dt_s: f64,
    ticks: u64,
    last: Vec<Option<StorageState>>,
    traces: Vec<StorageTrace>,
}

impl StorageSimulator {
    /// Fails if any model steps with a different timestep.
    pub fn new(models: Vec<Storage>, dt_s: f64) -> SimResult<Self> {
        ensure_positive(dt_s, "dt_s")?;
        if let Some((index, m)) = models.iter().enumerate().find(|(_, m)| m.dt_s() != dt_s) {
            return Err(SimError::TimestepMismatch {
                index,
                expected: dt_s,
                found: m.dt_s(),
            });
        }
        let traces = models.iter().map(|m| StorageTrace::new(m.label())).collect();
        Ok(Self {
            last: vec![None; models.len()],
            models,
            dt_s,
            ticks: 0,
            traces,
        })
    }

    pub fn dt_s(&self) -> f64 {
        self.dt_s
    }

    /// Ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn models(&self) -> &[Storage] {
        &self.models
    }

    pub fn traces(&self) -> &[StorageTrace] {
        &self.traces
    }

    pub fn into_traces(self) -> Vec<StorageTrace> {
        self.traces
    }

    /// Run `round(duration_s / dt_s)` ticks of `f(t_s, soc, v_cell) -> i_charge`.
    pub fn run<F>(&mut self, f: F, duration_s: f64) -> SimResult<u64>
    where
        F: FnMut(f64, f64, f64) -> f64,
    {
        ensure_positive(duration_s, "duration_s")?;
        let n = (duration_s / self.dt_s).round() as u64;
        self.run_steps(f, n);
        Ok(n)
    }

    pub fn run_steps<F>(&mut self, mut f: F, n: u64)
    where
        F: FnMut(f64, f64, f64) -> f64,
    {
        debug!(models = self.models.len(), ticks = n, dt_s = self.dt_s, "storage run start");
        for _ in 0..n {
            let t_s = self.ticks as f64 * self.dt_s;
            for ((model, last), trace) in self
                .models
                .iter_mut()
                .zip(self.last.iter_mut())
                .zip(self.traces.iter_mut())
            {
                let (soc, v_cell) = last.map_or((1.0, 0.0), |s| (s.soc, s.v_cell));
                let current = f(t_s, soc, v_cell);
                let state = model.step(current);
                trace.push(t_s, current, &state);
                *last = Some(state);
            }
            self.ticks += 1;
        }
        debug!(ticks = self.ticks, "storage run finished");
    }
}
