//! Converter model: couples harvested power, the storage and the load.

use pt_harvest::HarvestSample;
use pt_storage::{Storage, StorageKind, StorageModel, StorageParameters, StorageState};
use tracing::{debug, trace};

use crate::config::ConverterConfig;
use crate::error::ConvertResult;

/// Floor for the storage voltage when converting power into current.
const V_STORAGE_MIN: f64 = 1e-6;

/// Everything the converter computed during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConverterState {
    /// Input operating point after clamping.
    pub v_input: f64,
    pub i_input: f64,
    /// Power entering the storage after conversion losses (W).
    pub p_in: f64,
    /// Power drawn from the storage by the output stage (W).
    pub p_out: f64,
    pub storage: StorageState,
    pub power_good: bool,
    /// Regulated voltage seen by the target.
    pub v_out: f64,
}

#[derive(Debug, Clone)]
pub struct Converter {
    cfg: ConverterConfig,
    storage: Storage,
    state: ConverterState,
}

impl Converter {
    /// Build the converter with its own storage instance.
    pub fn new(
        cfg: &ConverterConfig,
        kind: StorageKind,
        params: &StorageParameters,
        soc_init: Option<f64>,
        dt_s: f64,
    ) -> ConvertResult<Self> {
        cfg.validate()?;
        let storage = Storage::new(kind, params, soc_init, dt_s)?;
        let soc = soc_init.unwrap_or(params.soc_init);
        // discrete tables start on their bucket value, not the curve
        let v_oc = storage.v_oc();
        let power_good = v_oc >= cfg.v_enable_threshold;
        let state = ConverterState {
            storage: StorageState {
                v_oc,
                v_cell: v_oc,
                soc,
                soc_eff: soc,
            },
            power_good,
            v_out: regulated(cfg, v_oc, power_good),
            ..ConverterState::default()
        };
        debug!(
            converter = %cfg.name,
            storage = storage.label(),
            soc,
            power_good,
            "converter ready"
        );
        Ok(Self {
            cfg: cfg.clone(),
            storage,
            state,
        })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.cfg
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn dt_s(&self) -> f64 {
        self.storage.dt_s()
    }

    /// State after the last tick, or the initial state before the first.
    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    pub fn power_good(&self) -> bool {
        self.state.power_good
    }

    pub fn v_out(&self) -> f64 {
        self.state.v_out
    }

    /// Advance one tick with the harvested operating point and the load current.
    pub fn step(&mut self, input: HarvestSample, i_load: f64) -> &ConverterState {
        let cfg = &self.cfg;
        let v_input = clamp_input(input.voltage, cfg.v_input_max);
        let i_input = clamp_input(input.current, cfg.i_input_max);
        let p_in = v_input * i_input * cfg.input_efficiency_at(v_input, i_input);

        let i_load = clamp_input(i_load, f64::INFINITY);
        let p_out = if self.state.power_good {
            self.state.v_out * i_load / cfg.output_efficiency_at(i_load)
        } else {
            0.0
        };

        let i_charge = (p_in - p_out) / self.state.storage.v_oc.max(V_STORAGE_MIN);
        let storage = self.storage.step(i_charge);

        let was_good = self.state.power_good;
        let power_good = if was_good {
            storage.v_cell >= cfg.v_disable_threshold
        } else {
            storage.v_cell >= cfg.v_enable_threshold
        };
        if power_good != was_good {
            trace!(power_good, v_cell = storage.v_cell, "power-good toggled");
        }

        self.state = ConverterState {
            v_input,
            i_input,
            p_in,
            p_out,
            storage,
            power_good,
            v_out: regulated(cfg, storage.v_cell, power_good),
        };
        &self.state
    }
}

/// Non-finite and negative inputs count as zero; the rest saturates at `max`.
fn clamp_input(v: f64, max: f64) -> f64 {
    if v > 0.0 { v.min(max) } else { 0.0 }
}

fn regulated(cfg: &ConverterConfig, v_storage: f64, power_good: bool) -> f64 {
    if power_good {
        cfg.v_output.min(v_storage - cfg.v_buck_drop).max(0.0)
    } else {
        0.0
    }
}
