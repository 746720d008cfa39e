//! Harvester model: picks the operating point on the source characteristic.

use tracing::debug;

use crate::config::{HarvesterAlgorithm, HarvesterConfig};
use crate::curve::IvCurve;
use crate::error::{HarvestError, HarvestResult};

/// Operating point handed to the converter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HarvestSample {
    pub voltage: f64,
    pub current: f64,
}

/// Phase of the open-circuit voltage tracker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OcvPhase {
    /// Load disconnected, `remaining` probe samples left.
    Measuring { remaining: u64 },
    Regulating,
}

#[derive(Debug, Clone)]
enum Tracker {
    Neutral,
    IscVoc,
    ConstantVoltage,
    OpenCircuit {
        phase: OcvPhase,
        v_hrvst: f64,
    },
    PerturbObserve {
        v_hrvst: f64,
        rising: bool,
        p_prev: f64,
    },
    Optimal {
        v_opt_proto: f64,
    },
}

#[derive(Debug, Clone)]
pub struct Harvester {
    cfg: HarvesterConfig,
    curve: IvCurve,
    interval_n: u64,
    duration_n: u64,
    tracker: Tracker,
}

impl Harvester {
    pub fn new(cfg: &HarvesterConfig, curve: IvCurve) -> HarvestResult<Self> {
        cfg.validate()?;
        curve.validate()?;
        if !(curve.open_circuit_voltage() > 0.0) {
            return Err(HarvestError::InvalidCurve {
                what: "open-circuit voltage must be positive",
            });
        }
        let tracker = match cfg.algorithm {
            HarvesterAlgorithm::Neutral => Tracker::Neutral,
            HarvesterAlgorithm::IscVoc => Tracker::IscVoc,
            HarvesterAlgorithm::ConstantVoltage => Tracker::ConstantVoltage,
            HarvesterAlgorithm::MpptVoc => Tracker::OpenCircuit {
                phase: OcvPhase::Regulating,
                v_hrvst: 0.0,
            },
            HarvesterAlgorithm::MpptPerturbObserve => Tracker::PerturbObserve {
                v_hrvst: cfg.voltage,
                rising: true,
                p_prev: 0.0,
            },
            HarvesterAlgorithm::MpptOptimal => Tracker::Optimal {
                v_opt_proto: curve.maximum_power_point(),
            },
        };
        debug!(
            harvester = %cfg.name,
            algorithm = ?cfg.algorithm,
            interval_n = cfg.interval_n(),
            duration_n = cfg.duration_n(),
            "harvester ready"
        );
        Ok(Self {
            interval_n: cfg.interval_n(),
            duration_n: cfg.duration_n(),
            cfg: cfg.clone(),
            curve,
            tracker,
        })
    }

    /// Pass-through harvester for recordings that already hold operating points.
    pub fn neutral() -> Self {
        Self {
            cfg: HarvesterConfig::neutral(),
            curve: IvCurve::Linear {
                v_oc: 1.0,
                i_sc: 1.0,
            },
            interval_n: 1,
            duration_n: 1,
            tracker: Tracker::Neutral,
        }
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.cfg
    }

    pub fn curve(&self) -> &IvCurve {
        &self.curve
    }

    /// Current phase when tracking the open-circuit voltage.
    pub fn ocv_phase(&self) -> Option<OcvPhase> {
        match self.tracker {
            Tracker::OpenCircuit { phase, .. } => Some(phase),
            _ => None,
        }
    }

    /// Process one input sample.
    ///
    /// For `Neutral`, `(voltage, current)` is the operating point. Otherwise it
    /// is the source's open-circuit voltage and short-circuit current at this
    /// instant, which scale the configured curve.
    pub fn step(&mut self, voltage: f64, current: f64, elapsed_samples: u64) -> HarvestSample {
        let scale_v = finite_or_zero(voltage) / self.curve.open_circuit_voltage();
        let scale_i = finite_or_zero(current) / self.curve.short_circuit_current();
        let period_start = elapsed_samples % self.interval_n == 0;

        let sample = match &mut self.tracker {
            // the recording already holds the operating point
            Tracker::Neutral => return HarvestSample { voltage, current },
            Tracker::IscVoc => {
                if elapsed_samples % 2 == 0 {
                    HarvestSample {
                        voltage: self.curve.open_circuit_voltage() * scale_v,
                        current: 0.0,
                    }
                } else {
                    HarvestSample {
                        voltage: 0.0,
                        current: self.curve.short_circuit_current() * scale_i,
                    }
                }
            }
            Tracker::ConstantVoltage => {
                let v = self.cfg.voltage;
                HarvestSample {
                    voltage: v,
                    current: scaled_current(&self.curve, v, scale_v, scale_i),
                }
            }
            Tracker::OpenCircuit { phase, v_hrvst } => {
                if period_start {
                    *phase = OcvPhase::Measuring {
                        remaining: self.duration_n,
                    };
                }
                match *phase {
                    OcvPhase::Measuring { remaining } => {
                        let remaining = remaining.saturating_sub(1);
                        let v_oc = self.curve.open_circuit_voltage();
                        *v_hrvst = if remaining == 0 {
                            *phase = OcvPhase::Regulating;
                            (self.cfg.setpoint * v_oc) * scale_v
                        } else {
                            *phase = OcvPhase::Measuring { remaining };
                            v_oc * scale_v
                        };
                        HarvestSample {
                            voltage: *v_hrvst,
                            current: 0.0,
                        }
                    }
                    OcvPhase::Regulating => HarvestSample {
                        voltage: *v_hrvst,
                        current: scaled_current(&self.curve, *v_hrvst, scale_v, scale_i),
                    },
                }
            }
            Tracker::PerturbObserve {
                v_hrvst,
                rising,
                p_prev,
            } => {
                if period_start {
                    let power = *v_hrvst * scaled_current(&self.curve, *v_hrvst, scale_v, scale_i);
                    // equal power keeps the direction
                    if power < *p_prev {
                        *rising = !*rising;
                    }
                    *p_prev = power;
                    let step = if *rising {
                        self.cfg.voltage_step
                    } else {
                        -self.cfg.voltage_step
                    };
                    *v_hrvst = (*v_hrvst + step).clamp(self.cfg.voltage_min, self.cfg.voltage_max);
                }
                HarvestSample {
                    voltage: *v_hrvst,
                    current: scaled_current(&self.curve, *v_hrvst, scale_v, scale_i),
                }
            }
            Tracker::Optimal { v_opt_proto } => HarvestSample {
                voltage: *v_opt_proto * scale_v,
                current: self.curve.current_at(*v_opt_proto) * scale_i,
            },
        };

        HarvestSample {
            voltage: sample.voltage,
            current: sample.current.min(self.cfg.current_limit),
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Current of the scaled curve `I(v) = scale_i · I_proto(v / scale_v)`.
fn scaled_current(curve: &IvCurve, v: f64, scale_v: f64, scale_i: f64) -> f64 {
    if !(scale_v > 0.0 && scale_i > 0.0) {
        return 0.0;
    }
    curve.current_at(v / scale_v) * scale_i
}
