// pt-core/src/units.rs

use uom::si::f64::{
    Capacitance as UomCapacitance, ElectricCharge as UomElectricCharge,
    ElectricCurrent as UomElectricCurrent, ElectricPotential as UomElectricPotential,
    ElectricalResistance as UomElectricalResistance, Power as UomPower, Ratio as UomRatio,
    Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Capacitance = UomCapacitance;
pub type Charge = UomElectricCharge;
pub type Current = UomElectricCurrent;
pub type Power = UomPower;
pub type Ratio = UomRatio;
pub type Resistance = UomElectricalResistance;
pub type Time = UomTime;
pub type Voltage = UomElectricPotential;

#[inline]
pub fn volts(v: f64) -> Voltage {
    use uom::si::electric_potential::volt;
    Voltage::new::<volt>(v)
}

#[inline]
pub fn amps(v: f64) -> Current {
    use uom::si::electric_current::ampere;
    Current::new::<ampere>(v)
}

#[inline]
pub fn coulombs(v: f64) -> Charge {
    use uom::si::electric_charge::coulomb;
    Charge::new::<coulomb>(v)
}

/// Battery capacity as printed on datasheets (1 mAh = 3.6 As).
#[inline]
pub fn milliamp_hours(v: f64) -> Charge {
    coulombs(v * 3600.0 / 1000.0)
}

#[inline]
pub fn farads(v: f64) -> Capacitance {
    use uom::si::capacitance::farad;
    Capacitance::new::<farad>(v)
}

#[inline]
pub fn microfarads(v: f64) -> Capacitance {
    use uom::si::capacitance::microfarad;
    Capacitance::new::<microfarad>(v)
}

#[inline]
pub fn ohms(v: f64) -> Resistance {
    use uom::si::electrical_resistance::ohm;
    Resistance::new::<ohm>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn seconds(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _v = volts(3.7);
        let _i = amps(1e-3);
        let _r = ohms(20.0);
        let _p = watts(0.5);
        let _t = seconds(0.1);
        let _n = unitless(0.8);
    }

    #[test]
    fn constructors_store_si_base_values() {
        assert!((microfarads(100.0).value - 100e-6).abs() < 1e-18);
        assert!((milliamp_hours(860.0).value - 3096.0).abs() < 1e-9);
        assert!((farads(2.0).value - 2.0).abs() < 1e-15);
        assert!((coulombs(6.3e-4).value - 6.3e-4).abs() < 1e-18);
    }
}
