//! Virtual source: harvester and converter stepped together.

use pt_harvest::Harvester;
use tracing::debug;

use crate::converter::{Converter, ConverterState};
use crate::error::{ConvertError, ConvertResult};

#[derive(Debug, Clone)]
pub struct VirtualSource {
    harvester: Harvester,
    converter: Converter,
    samples: u64,
    energy_in_ws: f64,
    energy_out_ws: f64,
}

impl VirtualSource {
    /// Curve-based harvesters must sample at the storage timestep.
    pub fn new(harvester: Harvester, converter: Converter) -> ConvertResult<Self> {
        let hrv = harvester.config();
        let storage_s = converter.dt_s();
        if hrv.algorithm.uses_curve() {
            let harvester_s = hrv.sample_interval_s;
            if (harvester_s - storage_s).abs() > 1e-9 * storage_s {
                return Err(ConvertError::TimestepMismatch {
                    harvester_s,
                    storage_s,
                });
            }
        }
        debug!(
            harvester = %hrv.name,
            converter = %converter.config().name,
            dt_s = storage_s,
            "virtual source ready"
        );
        Ok(Self {
            harvester,
            converter,
            samples: 0,
            energy_in_ws: 0.0,
            energy_out_ws: 0.0,
        })
    }

    /// Process one input sample with the target drawing `i_load`.
    ///
    /// Returns the regulated output voltage after the tick.
    pub fn step(&mut self, v_input: f64, i_input: f64, i_load: f64) -> f64 {
        let sample = self.harvester.step(v_input, i_input, self.samples);
        self.samples += 1;
        let dt = self.converter.dt_s();
        let state = self.converter.step(sample, i_load);
        self.energy_in_ws += state.p_in * dt;
        self.energy_out_ws += state.p_out * dt;
        state.v_out
    }

    pub fn state(&self) -> &ConverterState {
        self.converter.state()
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn harvester(&self) -> &Harvester {
        &self.harvester
    }

    /// Samples processed so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn dt_s(&self) -> f64 {
        self.converter.dt_s()
    }

    /// Energy delivered into the storage after input losses (Ws).
    pub fn energy_in_ws(&self) -> f64 {
        self.energy_in_ws
    }

    /// Energy taken from the storage by the output stage (Ws).
    pub fn energy_out_ws(&self) -> f64 {
        self.energy_out_ws
    }

    pub fn reset_energy(&mut self) {
        self.energy_in_ws = 0.0;
        self.energy_out_ws = 0.0;
    }
}
