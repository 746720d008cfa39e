//! Common contract of the storage model family.

use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::fixed_point::FixedPointModel;
use crate::kibam::KiBaM;
use crate::kibam_plus::KiBaMPlus;
use crate::kibam_simple::{KiBaMSimple, LutMode};
use crate::params::StorageParameters;
use crate::shp_cap::ShpCap;

/// Observable state after one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    /// Open-circuit voltage (V).
    pub v_oc: f64,
    /// Terminal voltage under load (V), never negative.
    pub v_cell: f64,
    /// State of charge in `[0, 1]`.
    pub soc: f64,
    /// SoC reduced by temporarily unavailable capacity.
    pub soc_eff: f64,
}

/// Trait for storage elements stepped at a fixed timestep.
///
/// Implementations own their state exclusively and mutate it once per
/// `step`.
pub trait StorageModel: Send + Sync {
    /// Short identifier for traces.
    fn label(&self) -> &str;

    /// Timestep per call to `step` (s).
    fn dt_s(&self) -> f64;

    /// Open-circuit voltage the next `step` starts from (V).
    fn v_oc(&self) -> f64;

    /// Advance one tick with `i_charge_a` flowing into the storage.
    ///
    /// Positive current charges, negative current discharges.
    fn step(&mut self, i_charge_a: f64) -> StorageState;
}

/// Selects a model variant for [`Storage::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    KiBaM,
    #[default]
    KiBaMPlus,
    KiBaMSimple(LutMode),
    FixedPoint { optimize_clamp: bool },
    ShpCap,
}

/// Any member of the storage model family.
#[derive(Debug, Clone)]
pub enum Storage {
    KiBaM(KiBaM),
    KiBaMPlus(KiBaMPlus),
    KiBaMSimple(KiBaMSimple),
    FixedPoint(FixedPointModel),
    ShpCap(ShpCap),
}

impl Storage {
    /// Build the selected variant, starting at `soc_init` or the configured SoC.
    pub fn new(
        kind: StorageKind,
        params: &StorageParameters,
        soc_init: Option<f64>,
        dt_s: f64,
    ) -> StorageResult<Self> {
        Ok(match kind {
            StorageKind::KiBaM => Self::KiBaM(KiBaM::new(params, soc_init, dt_s)?),
            StorageKind::KiBaMPlus => Self::KiBaMPlus(KiBaMPlus::new(params, soc_init, dt_s)?),
            StorageKind::KiBaMSimple(mode) => {
                Self::KiBaMSimple(KiBaMSimple::new(params, soc_init, dt_s, mode)?)
            }
            StorageKind::FixedPoint { optimize_clamp } => Self::FixedPoint(
                FixedPointModel::new(params, soc_init, dt_s, optimize_clamp)?,
            ),
            StorageKind::ShpCap => Self::ShpCap(ShpCap::new(params, soc_init, dt_s)?),
        })
    }

    fn inner(&self) -> &dyn StorageModel {
        match self {
            Self::KiBaM(m) => m,
            Self::KiBaMPlus(m) => m,
            Self::KiBaMSimple(m) => m,
            Self::FixedPoint(m) => m,
            Self::ShpCap(m) => m,
        }
    }
}

impl StorageModel for Storage {
    fn label(&self) -> &str {
        self.inner().label()
    }

    fn dt_s(&self) -> f64 {
        self.inner().dt_s()
    }

    fn v_oc(&self) -> f64 {
        self.inner().v_oc()
    }

    fn step(&mut self, i_charge_a: f64) -> StorageState {
        match self {
            Self::KiBaM(m) => m.step(i_charge_a),
            Self::KiBaMPlus(m) => m.step(i_charge_a),
            Self::KiBaMSimple(m) => m.step(i_charge_a),
            Self::FixedPoint(m) => m.step(i_charge_a),
            Self::ShpCap(m) => m.step(i_charge_a),
        }
    }
}

/// Shared constructor checks: valid parameters, valid timestep and initial SoC.
pub(crate) fn initial_soc(
    params: &StorageParameters,
    soc_init: Option<f64>,
    dt_s: f64,
) -> StorageResult<f64> {
    params.validate()?;
    pt_core::ensure_positive(dt_s, "dt_s")?;
    let soc = soc_init.unwrap_or(params.soc_init);
    pt_core::ensure_fraction(soc, "soc_init")?;
    Ok(soc)
}
