//! Named storage configurations.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use pt_core::PtError;
use pt_core::units::{microfarads, milliamp_hours, volts};

use crate::error::StorageResult;
use crate::params::StorageParameters;

static STORAGE_PRESETS: LazyLock<BTreeMap<&'static str, StorageParameters>> = LazyLock::new(|| {
    BTreeMap::from([
        (
            "lipo",
            StorageParameters::lipo(milliamp_hours(860.0), None),
        ),
        (
            "lead_acid",
            StorageParameters::lead_acid(milliamp_hours(1200.0), None),
        ),
        (
            "capacitor",
            StorageParameters::capacitor(microfarads(100.0), volts(6.3), None, None),
        ),
    ])
});

/// Look up a preset by name; unknown names are an error, never a default.
pub fn storage_preset(name: &str) -> StorageResult<StorageParameters> {
    STORAGE_PRESETS
        .get(name)
        .cloned()
        .ok_or_else(|| PtError::UnknownPreset { name: name.to_owned() }.into())
}

pub fn storage_preset_names() -> impl Iterator<Item = &'static str> {
    STORAGE_PRESETS.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_validate() {
        for name in storage_preset_names() {
            storage_preset(name).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = storage_preset("supercap9000").unwrap_err();
        assert!(err.to_string().contains("supercap9000"));
    }
}
