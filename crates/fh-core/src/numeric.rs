//! Range checks for validated setters and configuration.

/// Inclusive range check that also rejects NaN and infinities.
pub fn within(v: f64, min: f64, max: f64) -> bool {
    v.is_finite() && v >= min && v <= max
}

/// Exclusive range check that also rejects NaN and infinities.
pub fn strictly_within(v: f64, min: f64, max: f64) -> bool {
    v.is_finite() && v > min && v < max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(within(0.0, 0.0, 1.0));
        assert!(within(1.0, 0.0, 1.0));
        assert!(!within(1.0 + 1e-12, 0.0, 1.0));
    }

    #[test]
    fn strict_bounds_exclude_endpoints() {
        assert!(!strictly_within(1.0, -1.0, 1.0));
        assert!(!strictly_within(-1.0, -1.0, 1.0));
        assert!(strictly_within(-0.3, -1.0, 1.0));
    }

    #[test]
    fn non_finite_is_never_in_range() {
        assert!(!within(f64::NAN, 0.0, 1.0));
        assert!(!within(f64::INFINITY, 0.0, f64::MAX));
        assert!(!strictly_within(f64::NAN, -1.0, 1.0));
    }
}
