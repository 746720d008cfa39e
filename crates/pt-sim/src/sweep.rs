//! Parallel execution of independent simulations.
//!
//! Each job owns its models; nothing is shared between threads except the
//! read-only charge function.

use pt_convert::{Target, VirtualSource};
use rayon::prelude::*;

use crate::emulation::{EmulationRecord, run_emulation};
use crate::error::SimResult;
use crate::signals::IvSample;
use crate::storage_sim::StorageSimulator;

/// Run every simulator for `duration_s` on the rayon pool.
///
/// Results are in input order; one failing job does not stop the others.
pub fn run_parallel<F>(
    sims: &mut [StorageSimulator],
    f: F,
    duration_s: f64,
) -> Vec<SimResult<u64>>
where
    F: Fn(f64, f64, f64) -> f64 + Sync,
{
    sims.par_iter_mut()
        .map(|sim| sim.run(&f, duration_s))
        .collect()
}

/// Emulate each `(source, target)` pair against the same input trace.
pub fn emulate_parallel<T>(
    jobs: &mut [(VirtualSource, T)],
    samples: &[IvSample],
) -> Vec<EmulationRecord>
where
    T: Target,
{
    jobs.par_iter_mut()
        .map(|(source, target)| run_emulation(source, target, samples.iter().copied()))
        .collect()
}
