//! Exponential low-pass filter for ADC samples.

use fh_core::within;

/// First-order exponential smoothing: `y' = k2·x + (1 − k2)·y`.
///
/// The first sample seeds the state so a cold start does not ramp up from 0.
#[derive(Debug, Clone, PartialEq)]
pub struct LowpassFilter {
    k2: f64,
    state: Option<f64>,
}

impl LowpassFilter {
    /// Create a filter with coefficient `k2`, or `None` if `k2` is outside [0, 1].
    pub fn new(k2: f64) -> Option<Self> {
        within(k2, 0.0, 1.0).then_some(Self { k2, state: None })
    }

    pub fn k2(&self) -> f64 {
        self.k2
    }

    /// Change the coefficient. Out-of-range values are ignored; returns
    /// whether the new value was applied.
    pub fn set_k2(&mut self, k2: f64) -> bool {
        if within(k2, 0.0, 1.0) {
            self.k2 = k2;
            true
        } else {
            false
        }
    }

    /// Feed one sample and return the filtered value.
    pub fn update(&mut self, input: f64) -> f64 {
        let delay = self.state.unwrap_or(input);
        let out = input * self.k2 + delay * (1.0 - self.k2);
        self.state = Some(out);
        out
    }

    /// Last filtered value, `None` before the first sample.
    pub fn value(&self) -> Option<f64> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coefficient() {
        assert!(LowpassFilter::new(-0.1).is_none());
        assert!(LowpassFilter::new(1.1).is_none());
        assert!(LowpassFilter::new(f64::NAN).is_none());

        let mut f = LowpassFilter::new(0.5).unwrap();
        assert!(!f.set_k2(2.0));
        assert_eq!(f.k2(), 0.5);
        assert!(f.set_k2(0.25));
        assert_eq!(f.k2(), 0.25);
    }

    #[test]
    fn converges_towards_step() {
        let mut f = LowpassFilter::new(0.1).unwrap();
        f.update(0.0);
        let mut y = 0.0;
        for _ in 0..200 {
            y = f.update(1000.0);
        }
        assert!((y - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn single_step_matches_formula() {
        let mut f = LowpassFilter::new(0.0005).unwrap();
        f.update(2000.0);
        let y = f.update(2100.0);
        assert!((y - (2100.0 * 0.0005 + 2000.0 * 0.9995)).abs() < 1e-9);
    }

    #[test]
    fn zero_coefficient_freezes_after_seed() {
        let mut f = LowpassFilter::new(0.0).unwrap();
        f.update(123.0);
        assert_eq!(f.update(4000.0), 123.0);
        f.reset();
        assert_eq!(f.value(), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn first_sample_seeds_exactly(k2 in 0.0_f64..=1.0_f64, raw in 0_u16..4096) {
            let mut f = LowpassFilter::new(k2).unwrap();
            let out = f.update(raw as f64);
            prop_assert_eq!(out, raw as f64);
        }

        #[test]
        fn output_stays_between_inputs(
            k2 in 0.0_f64..=1.0_f64,
            samples in prop::collection::vec(0_u16..4096, 1..64),
        ) {
            let mut f = LowpassFilter::new(k2).unwrap();
            let lo = *samples.iter().min().unwrap() as f64;
            let hi = *samples.iter().max().unwrap() as f64;
            for s in samples {
                let y = f.update(s as f64);
                prop_assert!(y >= lo - 1e-9 && y <= hi + 1e-9);
            }
        }
    }
}
