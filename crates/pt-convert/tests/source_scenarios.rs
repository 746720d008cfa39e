//! Charge, drain and limit scenarios of the full harvester + converter stack.

use pt_convert::{Converter, VirtualSource, converter_preset};
use pt_core::units::{microfarads, volts};
use pt_core::{Tolerances, nearly_equal};
use pt_harvest::{Harvester, IvCurve, harvester_preset};
use pt_storage::{StorageKind, StorageParameters};

const DT_S: f64 = 10e-6;

fn converter(name: &str, soc: f64) -> Converter {
    let cap = StorageParameters::capacitor(microfarads(100.0), volts(6.3), None, None);
    let cfg = converter_preset(name).unwrap();
    Converter::new(&cfg, StorageKind::KiBaMPlus, &cap, Some(soc), DT_S).unwrap()
}

fn neutral_source(name: &str, soc: f64) -> VirtualSource {
    VirtualSource::new(Harvester::neutral(), converter(name, soc)).unwrap()
}

#[test]
fn static_input_moves_no_energy() {
    let curve = IvCurve::Linear {
        v_oc: 3.0,
        i_sc: 10e-3,
    };
    let hrv = Harvester::new(&harvester_preset("cv20").unwrap(), curve).unwrap();
    let mut src = VirtualSource::new(hrv, converter("bq25504", 0.5)).unwrap();
    // open circuit, then short circuit
    for _ in 0..2_000 {
        src.step(3.0, 0.0, 0.0);
    }
    for _ in 0..2_000 {
        src.step(0.0, 3e-3, 0.0);
    }
    assert_eq!(src.energy_in_ws(), 0.0);
    assert_eq!(src.energy_out_ws(), 0.0);
    assert_eq!(src.samples(), 4_000);
}

#[test]
fn charging_enables_output() {
    let mut src = neutral_source("bq25504", 0.2);
    assert!(!src.state().power_good);
    for n in 0..8_000 {
        let v_out = src.step(1.0 + n as f64 * 1e-3, 1.5e-3, 0.0);
        if !src.state().power_good {
            assert_eq!(v_out, 0.0);
        }
    }
    let v_out = src.step(1.0, 1e-3, 0.0);
    assert!(src.energy_in_ws() > 0.0);
    assert_eq!(src.energy_out_ws(), 0.0);
    assert!(v_out > 0.0);
    assert!(src.state().storage.soc > 0.2);
}

#[test]
fn draining_delivers_energy() {
    let mut src = neutral_source("bq25504", 0.5);
    for c_ua in 0..4_000 {
        src.step(0.0, 0.0, c_ua as f64 * 1e-6);
    }
    let v_out = src.step(0.0, 0.0, 0.0);
    assert_eq!(src.energy_in_ws(), 0.0);
    assert!(src.energy_out_ws() > 0.0);
    assert!(v_out >= 0.0);
    assert!(src.state().storage.soc < 0.5);
}

#[test]
fn over_voltage_is_clamped() {
    let mut src = neutral_source("bq25504", 0.5);
    for _ in 0..100 {
        src.step(10.0, 3e-3, 0.0);
    }
    assert!(src.state().v_input <= 5.0);
    assert!(src.energy_in_ws() > 0.0);
}

#[test]
fn over_current_is_clamped() {
    let mut src = neutral_source("bq25504", 0.5);
    for _ in 0..100 {
        src.step(5.0, 100e-3, 0.0);
    }
    assert_eq!(src.state().i_input, 50e-3);
    assert!(src.energy_in_ws() > 0.0);
}

#[test]
fn charge_drain_recharge_cycle() {
    let mut src = neutral_source("bq25504", 0.5);

    for _ in 0..2_000 {
        src.step(5.0, 4e-3, 0.0);
    }
    assert!(src.step(0.0, 0.0, 0.0) > 0.0);

    for _ in 0..2_000 {
        src.step(0.0, 0.0, 40e-3);
    }
    assert_eq!(src.step(0.0, 0.0, 0.0), 0.0);
    assert!(!src.state().power_good);

    for _ in 0..2_000 {
        src.step(5.0, 20e-3, 0.0);
    }
    assert!(src.step(0.0, 0.0, 0.0) > 0.0);

    assert!(src.energy_out_ws() > 0.0);
    assert!(src.energy_in_ws() > src.energy_out_ws());
}

#[test]
fn buck_stage_draws_through_its_efficiency() {
    let mut src = neutral_source("bq25570", 0.6);
    for _ in 0..500 {
        assert_eq!(src.step(0.0, 0.0, 1e-3), 2.0);
    }
    // 1 mA falls into the 0.91 bucket of the output stage
    let expected = 2.0 * 1e-3 / 0.91 * 500.0 * DT_S;
    let tol = Tolerances {
        abs: 0.0,
        rel: 1e-12,
    };
    assert!(nearly_equal(src.energy_out_ws(), expected, tol));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn one_tick_stays_physical(
            soc in 0.0_f64..=1.0,
            v in -1.0_f64..10.0,
            i in -1e-3_f64..0.1,
            load in 0.0_f64..0.1,
        ) {
            for name in ["ideal", "bq25504", "bq25570"] {
                let cfg = converter_preset(name).unwrap();
                let mut src = neutral_source(name, soc);
                let v_out = src.step(v, i, load);
                let s = src.state();
                prop_assert!((0.0..=1.0).contains(&s.storage.soc));
                prop_assert!(s.storage.v_cell >= 0.0);
                prop_assert!(s.v_input <= cfg.v_input_max);
                prop_assert!(s.i_input <= cfg.i_input_max);
                prop_assert!(s.p_in >= 0.0);
                prop_assert!(v_out >= 0.0 && v_out <= cfg.v_output);
            }
        }
    }
}
