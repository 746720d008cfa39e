//! Bucketing of operating points into the efficiency tables.
//!
//! Voltages fall into linear buckets, currents into log2 buckets above a
//! lowest edge. Anything outside the tabulated range lands in the nearest
//! edge bucket; lookups never fail.

/// Rows and columns of the efficiency tables.
pub const EFFICIENCY_BUCKETS: usize = 12;

const LAST: f64 = (EFFICIENCY_BUCKETS - 1) as f64;

/// `min(11, floor(v / width))`; NaN and negative voltages map to 0.
pub fn voltage_bucket(voltage: f64, width: f64) -> usize {
    if !(voltage > 0.0) {
        return 0;
    }
    (voltage / width).floor().min(LAST) as usize
}

/// 0 below `edge`, else `min(11, floor(log2(i / edge)) + 1)`.
pub fn current_bucket(current: f64, edge: f64) -> usize {
    if !(current >= edge) {
        return 0;
    }
    ((current / edge).log2().floor() + 1.0).min(LAST) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_buckets_are_linear() {
        assert_eq!(voltage_bucket(0.0, 0.128), 0);
        assert_eq!(voltage_bucket(0.127, 0.128), 0);
        assert_eq!(voltage_bucket(0.129, 0.128), 1);
        assert_eq!(voltage_bucket(1.0, 0.128), 7);
        assert_eq!(voltage_bucket(5.0, 0.128), 11);
        assert_eq!(voltage_bucket(f64::INFINITY, 0.128), 11);
    }

    #[test]
    fn current_buckets_are_log2() {
        let edge = 8e-6;
        assert_eq!(current_bucket(1e-6, edge), 0);
        assert_eq!(current_bucket(8e-6, edge), 1);
        assert_eq!(current_bucket(16e-6, edge), 2);
        assert_eq!(current_bucket(1e-3, edge), 7);
        assert_eq!(current_bucket(4e-3, edge), 9);
        assert_eq!(current_bucket(1.0, edge), 11);
        assert_eq!(current_bucket(f64::INFINITY, edge), 11);
    }

    #[test]
    fn garbage_lands_in_first_bucket() {
        assert_eq!(voltage_bucket(f64::NAN, 0.128), 0);
        assert_eq!(voltage_bucket(-3.0, 0.128), 0);
        assert_eq!(current_bucket(f64::NAN, 8e-6), 0);
        assert_eq!(current_bucket(-1e-3, 8e-6), 0);
    }
}
