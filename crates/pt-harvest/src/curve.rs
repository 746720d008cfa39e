//! Source characteristics (IV curves) for curve-based tracking.
//!
//! A curve is a prototype: the recorded input supplies the instantaneous
//! open-circuit voltage and short-circuit current, which scale the prototype
//! multiplicatively.

use pt_core::{ensure_finite, ensure_positive};
use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, HarvestResult};

/// Fraction of the first table current below which a point counts as open circuit.
const OPEN_CIRCUIT_RATIO: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IvCurve {
    /// Straight line from `(0, i_sc)` to `(v_oc, 0)`.
    Linear { v_oc: f64, i_sc: f64 },
    /// Single-diode shape, normalized so `I(0) = i_sc` and `I(v_oc) = 0`.
    Diode { v_oc: f64, i_sc: f64, v_thermal: f64 },
    /// Piecewise-linear `(voltage, current)` points, ascending in voltage.
    Table { points: Vec<(f64, f64)> },
}

impl IvCurve {
    pub fn validate(&self) -> HarvestResult<()> {
        match self {
            Self::Linear { v_oc, i_sc } => {
                ensure_positive(*v_oc, "v_oc")?;
                ensure_positive(*i_sc, "i_sc")?;
            }
            Self::Diode {
                v_oc,
                i_sc,
                v_thermal,
            } => {
                ensure_positive(*v_oc, "v_oc")?;
                ensure_positive(*i_sc, "i_sc")?;
                ensure_positive(*v_thermal, "v_thermal")?;
            }
            Self::Table { points } => {
                if points.len() < 2 {
                    return Err(HarvestError::InvalidCurve {
                        what: "table needs at least two points",
                    });
                }
                for &(v, i) in points {
                    ensure_finite(v, "table voltage")?;
                    ensure_finite(i, "table current")?;
                    if i < 0.0 {
                        return Err(HarvestError::InvalidCurve {
                            what: "table currents must be >= 0",
                        });
                    }
                }
                if !points.windows(2).all(|w| w[0].0 < w[1].0) {
                    return Err(HarvestError::InvalidCurve {
                        what: "table voltages must be strictly ascending",
                    });
                }
                if !(points[0].1 > 0.0) {
                    return Err(HarvestError::InvalidCurve {
                        what: "table must start with a positive current",
                    });
                }
            }
        }
        Ok(())
    }

    /// Current delivered at `voltage`; never negative.
    pub fn current_at(&self, voltage: f64) -> f64 {
        let i = match self {
            Self::Linear { v_oc, i_sc } => i_sc * (1.0 - voltage.clamp(0.0, *v_oc) / v_oc),
            Self::Diode {
                v_oc,
                i_sc,
                v_thermal,
            } => {
                let v = voltage.clamp(0.0, *v_oc);
                i_sc * (1.0 - (v / v_thermal).exp_m1() / (v_oc / v_thermal).exp_m1())
            }
            Self::Table { points } => interpolate(points, voltage),
        };
        if i.is_nan() { 0.0 } else { i.max(0.0) }
    }

    pub fn open_circuit_voltage(&self) -> f64 {
        match self {
            Self::Linear { v_oc, .. } | Self::Diode { v_oc, .. } => *v_oc,
            Self::Table { points } => {
                let threshold = points[0].1 * OPEN_CIRCUIT_RATIO;
                points
                    .iter()
                    .find(|(_, i)| *i < threshold)
                    .or(points.last())
                    .map_or(0.0, |(v, _)| *v)
            }
        }
    }

    pub fn short_circuit_current(&self) -> f64 {
        match self {
            Self::Linear { i_sc, .. } | Self::Diode { i_sc, .. } => *i_sc,
            Self::Table { points } => points.first().map_or(0.0, |(_, i)| *i),
        }
    }

    /// Power-maximizing voltage on `[0, V_oc]` by golden-section search.
    pub fn maximum_power_point(&self) -> f64 {
        const ITERATIONS: usize = 100;
        let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
        let power = |v: f64| v * self.current_at(v);

        let (mut a, mut b) = (0.0, self.open_circuit_voltage());
        let mut c = b - inv_phi * (b - a);
        let mut d = a + inv_phi * (b - a);
        let (mut pc, mut pd) = (power(c), power(d));
        for _ in 0..ITERATIONS {
            if pc > pd {
                b = d;
                d = c;
                pd = pc;
                c = b - inv_phi * (b - a);
                pc = power(c);
            } else {
                a = c;
                c = d;
                pc = pd;
                d = a + inv_phi * (b - a);
                pd = power(d);
            }
            if (b - a).abs() < 1e-12 {
                break;
            }
        }
        (a + b) / 2.0
    }
}

/// Linear interpolation, clamped to the first and last point.
fn interpolate(points: &[(f64, f64)], v: f64) -> f64 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return 0.0;
    };
    if v <= first.0 {
        return first.1;
    }
    if v >= last.0 {
        return last.1;
    }
    let idx = points.partition_point(|(pv, _)| *pv <= v);
    let (v0, i0) = points[idx - 1];
    let (v1, i1) = points[idx];
    i0 + (i1 - i0) * (v - v0) / (v1 - v0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_endpoints() {
        let c = IvCurve::Linear {
            v_oc: 2.0,
            i_sc: 10e-3,
        };
        c.validate().unwrap();
        assert_eq!(c.current_at(0.0), 10e-3);
        assert_eq!(c.current_at(2.0), 0.0);
        assert_eq!(c.current_at(3.0), 0.0);
        assert_eq!(c.current_at(-1.0), 10e-3);
        assert!((c.current_at(1.0) - 5e-3).abs() < 1e-15);
    }

    #[test]
    fn diode_endpoints() {
        let c = IvCurve::Diode {
            v_oc: 0.6,
            i_sc: 1e-3,
            v_thermal: 0.05,
        };
        c.validate().unwrap();
        assert!((c.current_at(0.0) - 1e-3).abs() < 1e-15);
        assert_eq!(c.current_at(0.6), 0.0);
        // knee: most current survives up to half of V_oc
        assert!(c.current_at(0.3) > 0.99e-3);
    }

    #[test]
    fn table_interpolates_and_finds_open_circuit() {
        let c = IvCurve::Table {
            points: vec![(0.0, 4e-3), (1.0, 3e-3), (2.0, 1e-3), (2.5, 0.1e-3), (3.0, 0.0)],
        };
        c.validate().unwrap();
        assert!((c.current_at(0.5) - 3.5e-3).abs() < 1e-15);
        assert_eq!(c.current_at(10.0), 0.0);
        assert_eq!(c.open_circuit_voltage(), 2.5);
        assert_eq!(c.short_circuit_current(), 4e-3);
    }

    #[test]
    fn bad_tables_are_rejected() {
        let unsorted = IvCurve::Table {
            points: vec![(1.0, 1.0), (0.5, 0.0)],
        };
        assert!(unsorted.validate().is_err());
        let short = IvCurve::Table {
            points: vec![(0.0, 1.0)],
        };
        assert!(short.validate().is_err());
        let neg = IvCurve::Linear {
            v_oc: -1.0,
            i_sc: 1.0,
        };
        assert!(neg.validate().unwrap_err().to_string().contains("v_oc"));
    }

    #[test]
    fn mpp_of_linear_curve_is_half_voc() {
        let c = IvCurve::Linear {
            v_oc: 3.0,
            i_sc: 1e-3,
        };
        assert!((c.maximum_power_point() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn yaml_tagged_curve() {
        let c: IvCurve = serde_yaml::from_str("kind: linear\nv_oc: 2.0\ni_sc: 0.01\n").unwrap();
        assert_eq!(
            c,
            IvCurve::Linear {
                v_oc: 2.0,
                i_sc: 0.01
            }
        );
    }
}
