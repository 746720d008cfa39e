//! Named harvester configurations.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use pt_core::PtError;
use pt_core::units::{seconds, volts};

use crate::config::{HarvesterAlgorithm, HarvesterConfig};
use crate::error::HarvestResult;

static HARVESTER_PRESETS: LazyLock<BTreeMap<&'static str, HarvesterConfig>> =
    LazyLock::new(|| {
        let with_algorithm = |name: &str, algorithm| HarvesterConfig {
            name: name.to_owned(),
            algorithm,
            ..HarvesterConfig::default()
        };
        BTreeMap::from([
            ("neutral", HarvesterConfig::neutral()),
            ("isc_voc", with_algorithm("isc_voc", HarvesterAlgorithm::IscVoc)),
            ("cv10", HarvesterConfig::constant_voltage("cv10", volts(1.0))),
            ("cv20", HarvesterConfig::constant_voltage("cv20", volts(2.0))),
            (
                "mppt_voc",
                HarvesterConfig::mppt_voc("mppt_voc", 0.76, seconds(100e-3), seconds(1.2e-3)),
            ),
            // TI BQ255xx sample V_oc every 16 s for 256 ms
            (
                "mppt_bq_solar",
                HarvesterConfig::mppt_voc("mppt_bq_solar", 0.8, seconds(16.0), seconds(0.256)),
            ),
            (
                "mppt_bq_thermoelectric",
                HarvesterConfig::mppt_voc(
                    "mppt_bq_thermoelectric",
                    0.5,
                    seconds(16.0),
                    seconds(0.256),
                ),
            ),
            (
                "mppt_po",
                HarvesterConfig::mppt_po("mppt_po", volts(0.0), volts(10e-3), seconds(18e-3)),
            ),
            ("mppt_opt", with_algorithm("mppt_opt", HarvesterAlgorithm::MpptOptimal)),
        ])
    });

pub fn harvester_preset(name: &str) -> HarvestResult<HarvesterConfig> {
    HARVESTER_PRESETS
        .get(name)
        .cloned()
        .ok_or_else(|| PtError::UnknownPreset { name: name.to_owned() }.into())
}

pub fn harvester_preset_names() -> impl Iterator<Item = &'static str> {
    HARVESTER_PRESETS.keys().copied()
}
