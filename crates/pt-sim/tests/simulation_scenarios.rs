//! Model comparison and end-to-end emulation runs.

use pt_convert::{Converter, ResistiveTarget, VirtualSource, converter_preset};
use pt_core::units::{amps, coulombs, microfarads, ohms, seconds, volts};
use pt_core::{Tolerances, nearly_equal};
use pt_harvest::Harvester;
use pt_sim::{
    ChargeProfile, StorageSimulator, constant_iv, emulate_parallel, run_emulation, sawtooth_iv,
};
use pt_storage::{LutMode, Storage, StorageKind, StorageParameters};
use tracing_subscriber::filter::LevelFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(LevelFilter::DEBUG)
        .try_init();
}

fn ideal_cap() -> StorageParameters {
    StorageParameters::capacitor(microfarads(100.0), volts(6.3), None, None)
}

fn simulator(
    params: &StorageParameters,
    kinds: &[StorageKind],
    soc: f64,
    dt_s: f64,
) -> StorageSimulator {
    let models = kinds
        .iter()
        .map(|&kind| Storage::new(kind, params, Some(soc), dt_s).unwrap())
        .collect();
    StorageSimulator::new(models, dt_s).unwrap()
}

#[test]
fn models_agree_on_linear_capacitor_charge() {
    init_tracing();
    let kinds = [
        StorageKind::KiBaM,
        StorageKind::KiBaMPlus,
        StorageKind::KiBaMSimple(LutMode::Interpolated),
        StorageKind::ShpCap,
    ];
    let mut sim = simulator(&ideal_cap(), &kinds, 0.0, 1e-3);
    let profile = ChargeProfile::constant_current(amps(1e-3));
    assert_eq!(sim.run(|t, s, v| profile.current(t, s, v), 0.1).unwrap(), 100);

    let expected = 1e-3 * 0.1 / ideal_cap().q_as;
    let tol = Tolerances {
        abs: 1e-9,
        rel: 0.0,
    };
    for trace in sim.traces() {
        let last = trace.last().unwrap();
        assert!(
            nearly_equal(last.soc, expected, tol),
            "{}: {} vs {expected}",
            trace.label,
            last.soc
        );
    }
}

#[test]
fn pulsed_discharge_stops_at_target() {
    let lipo = StorageParameters::lipo(coulombs(1.0), None);
    let mut sim = simulator(&lipo, &[StorageKind::KiBaMSimple(LutMode::Interpolated)], 1.0, 1e-2);
    let profile = ChargeProfile::current_pulsed(amps(-0.05), seconds(2.0), seconds(1.0), 0.5);
    profile.validate().unwrap();
    sim.run(|t, s, v| profile.current(t, s, v), 100.0).unwrap();

    let trace = &sim.traces()[0];
    // second half of the first period is off
    assert_eq!(trace.current[50], -0.05);
    assert_eq!(trace.current[150], 0.0);
    let last = trace.last().unwrap();
    assert!(last.soc <= 0.5 && last.soc > 0.499, "soc {}", last.soc);
    assert_eq!(last.current, 0.0);
}

#[test]
fn resistive_load_decays_with_rc() {
    let mut sim = simulator(&ideal_cap(), &[StorageKind::KiBaMPlus], 1.0, 1e-3);
    let profile = ChargeProfile::resistive_load(ohms(1000.0));
    // RC = 100 ms
    sim.run(|t, s, v| profile.current(t, s, v), 0.1).unwrap();
    let trace = &sim.traces()[0];
    // the first tick sees 0 V and draws nothing
    assert_eq!(trace.current[0], 0.0);
    let ratio = trace.last().unwrap().v_cell / 6.3;
    assert!((ratio - (-1.0_f64).exp()).abs() < 0.01, "ratio {ratio}");
}

fn bq_source(soc: f64) -> VirtualSource {
    let cfg = converter_preset("bq25504").unwrap();
    let cnv = Converter::new(&cfg, StorageKind::KiBaMPlus, &ideal_cap(), Some(soc), 10e-6).unwrap();
    VirtualSource::new(Harvester::neutral(), cnv).unwrap()
}

#[test]
fn emulation_powers_controlled_target() {
    init_tracing();
    let mut src = bq_source(0.3);
    let mut target = ResistiveTarget::new(ohms(1000.0), true).unwrap();
    let input = constant_iv(volts(3.0), amps(10e-3), seconds(10e-6), 2_000).unwrap();
    let rec = run_emulation(&mut src, &mut target, input);

    assert_eq!(rec.len(), 2_000);
    assert!(!rec.power_good[0]);
    assert_eq!(rec.i_out[0], 0.0);
    let on = rec.power_good.iter().position(|&pg| pg).unwrap();
    assert!(on > 100 && on < 1_000, "enabled at {on}");
    for k in 1..rec.len() {
        if rec.power_good[k - 1] {
            assert_eq!(rec.i_out[k], rec.v_out[k - 1] / 1000.0);
        } else {
            assert_eq!(rec.i_out[k], 0.0);
        }
    }
    assert!(*rec.soc.last().unwrap() > 0.3);
    assert!(src.energy_out_ws() > 0.0);
    assert!(src.energy_in_ws() > src.energy_out_ws());
}

#[test]
fn sawtooth_input_is_harvested() {
    let mut src = bq_source(0.5);
    let mut target = ResistiveTarget::new(ohms(10_000.0), false).unwrap();
    let input = sawtooth_iv(
        (volts(3.6), volts(1.9)),
        (amps(100e-6), amps(2000e-6)),
        500,
        seconds(10e-6),
        2_000,
    )
    .unwrap();
    let rec = run_emulation(&mut src, &mut target, input);
    assert_eq!(rec.v_in[0], 3.6);
    assert_eq!(rec.v_in[499], 1.9);
    assert!(rec.power_good.iter().all(|&pg| pg));
    assert!(src.energy_in_ws() > 0.0);
}

#[test]
fn parallel_emulation_matches_sequential() {
    let input: Vec<_> = constant_iv(volts(2.0), amps(5e-3), seconds(10e-6), 500)
        .unwrap()
        .collect();
    let target = ResistiveTarget::new(ohms(2000.0), true).unwrap();
    let mut jobs: Vec<_> = [0.3, 0.5, 0.7].map(|soc| (bq_source(soc), target)).into();
    let records = emulate_parallel(&mut jobs, &input);

    for (soc, rec) in [0.3, 0.5, 0.7].into_iter().zip(&records) {
        let mut src = bq_source(soc);
        let mut t = target;
        let seq = run_emulation(&mut src, &mut t, input.iter().copied());
        assert_eq!(&seq, rec);
    }
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn traces_stay_physical(current in -0.02_f64..0.02, soc in 0.0_f64..=1.0) {
            let lipo = StorageParameters::lipo(coulombs(0.5), None);
            let kinds = [
                StorageKind::KiBaM,
                StorageKind::KiBaMPlus,
                StorageKind::KiBaMSimple(LutMode::Interpolated),
            ];
            let mut sim = simulator(&lipo, &kinds, soc, 0.1);
            sim.run_steps(|_, _, _| current, 200);
            for trace in sim.traces() {
                for row in trace.samples() {
                    prop_assert!((0.0..=1.0).contains(&row.soc));
                    prop_assert!((0.0..=1.0).contains(&row.soc_eff));
                    prop_assert!(row.v_cell >= 0.0);
                }
            }
        }
    }
}
