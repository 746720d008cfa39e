use crate::PtError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PtError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PtError::NonFinite { what, value: v })
    }
}

/// Closed interval check: `min <= v <= max`.
pub fn ensure_range(
    v: Real,
    field: &'static str,
    min: Real,
    max: Real,
    expected: &'static str,
) -> Result<Real, PtError> {
    if v.is_nan() || v < min || v > max {
        return Err(PtError::OutOfRange {
            field,
            value: v,
            expected,
        });
    }
    Ok(v)
}

/// Strictly positive, infinity excluded.
pub fn ensure_positive(v: Real, field: &'static str) -> Result<Real, PtError> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(PtError::OutOfRange {
            field,
            value: v,
            expected: "> 0",
        })
    }
}

pub fn ensure_non_negative(v: Real, field: &'static str) -> Result<Real, PtError> {
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(PtError::OutOfRange {
            field,
            value: v,
            expected: ">= 0",
        })
    }
}

/// State-of-charge style fraction in `[0, 1]`.
pub fn ensure_fraction(v: Real, field: &'static str) -> Result<Real, PtError> {
    ensure_range(v, field, 0.0, 1.0, "[0, 1]")
}
