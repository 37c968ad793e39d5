//! PID controller block.
//!
//! Gains follow the process-engineering form: proportional gain `kp`, reset
//! time `tn` (seconds) and derivative gain `kd`. The integral gain is derived,
//! `ki = kp / tn`, and is 0 when `tn <= 0`.
//!
//! The controller includes:
//! - Output clamping
//! - Anti-windup (integration stops at the clamp, resumes when the error
//!   sign pulls the output back)
//! - Integral stored in output units, so retuning never steps the output
//! - Derivative on measurement, so setpoint changes do not kick

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Upper bound (exclusive) accepted for `kp`.
pub const KP_LIMIT: f64 = 100.0;

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidController {
    /// Proportional gain.
    pub kp: f64,
    /// Reset time in seconds. `<= 0` disables integral action.
    pub tn: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
}

impl PidController {
    /// Create a new controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain, within `[0, 100)`
    /// * `tn` - Reset time (seconds)
    /// * `kd` - Derivative gain
    /// * `out_min` - Minimum output
    /// * `out_max` - Maximum output
    pub fn new(kp: f64, tn: f64, kd: f64, out_min: f64, out_max: f64) -> ControlResult<Self> {
        if !valid_kp(kp) {
            return Err(ControlError::InvalidArg {
                what: "kp must be within [0, 100)",
            });
        }
        if !tn.is_finite() || !kd.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "tn and kd must be finite",
            });
        }
        if out_min.is_nan() || out_max.is_nan() || out_min >= out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            tn,
            kd,
            out_min,
            out_max,
        })
    }

    /// Integral gain derived from `kp` and `tn`.
    pub fn ki(&self) -> f64 {
        if self.tn > 0.0 { self.kp / self.tn } else { 0.0 }
    }

    /// Replace `kp` and `tn`. Returns `false` and leaves the gains untouched
    /// if either is outside its domain.
    pub fn set_tunings(&mut self, kp: f64, tn: f64) -> bool {
        if !valid_kp(kp) || !tn.is_finite() {
            return false;
        }
        self.kp = kp;
        self.tn = tn;
        true
    }

    /// Compute controller output given process variable and setpoint.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (integral, last measurement)
    /// * `pv` - Process variable (measured value)
    /// * `sp` - Setpoint (desired value)
    /// * `dt` - Time since last update (seconds), 0 on the first update
    ///
    /// # Returns
    ///
    /// Updated state and output value.
    pub fn update(&self, state: &PidState, pv: f64, sp: f64, dt: f64) -> (PidState, f64) {
        // Error: e = sp - pv (positive error means PV is below setpoint)
        let error = sp - pv;

        let p_term = self.kp * error;

        let d_term = match state.last_input {
            Some(prev) if dt > 0.0 => -self.kd * (pv - prev) / dt,
            _ => 0.0,
        };

        let candidate =
            (state.integral + self.ki() * error * dt).clamp(self.out_min, self.out_max);
        let output_raw = p_term + candidate + d_term;

        // Anti-windup: fill the integral only up to the clamp while the error
        // keeps pushing outwards
        let integral = if output_raw > self.out_max && error > 0.0 {
            state.integral.max(self.out_max - p_term - d_term)
        } else if output_raw < self.out_min && error < 0.0 {
            state.integral.min(self.out_min - p_term - d_term)
        } else {
            candidate
        };

        let output = (p_term + integral + d_term).clamp(self.out_min, self.out_max);

        let new_state = PidState {
            integral,
            last_input: Some(pv),
            last_output: output,
        };

        (new_state, output)
    }
}

fn valid_kp(kp: f64) -> bool {
    kp.is_finite() && (0.0..KP_LIMIT).contains(&kp)
}

/// PID controller state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PidState {
    /// Integral contribution, in output units.
    pub integral: f64,
    /// Measurement at the previous update.
    pub last_input: Option<f64>,
    /// Output of the previous update.
    pub last_output: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(kp: f64, tn: f64) -> PidController {
        PidController::new(kp, tn, 0.0, 0.0, 100.0).unwrap()
    }

    #[test]
    fn ki_derived_from_reset_time() {
        assert!((pid(2.6, 1000.0).ki() - 0.0026).abs() < 1e-12);
        assert!((pid(2.0, 120.0).ki() - 2.0 / 120.0).abs() < 1e-12);
        assert_eq!(pid(2.0, 0.0).ki(), 0.0);
        assert_eq!(pid(2.0, -5.0).ki(), 0.0);
    }

    #[test]
    fn set_tunings_validates_kp() {
        let mut c = pid(2.6, 1000.0);
        assert!(!c.set_tunings(100.0, 10.0));
        assert!(!c.set_tunings(-1.0, 10.0));
        assert!(!c.set_tunings(1.0, f64::NAN));
        assert_eq!((c.kp, c.tn), (2.6, 1000.0));

        assert!(c.set_tunings(0.0, 5.0));
        assert_eq!(c.ki(), 0.0);
    }

    #[test]
    fn proportional_only_on_first_update() {
        let c = pid(2.0, 120.0);
        let (state, out) = c.update(&PidState::default(), 35.0, 40.0, 0.0);
        assert!((out - 10.0).abs() < 1e-12);
        assert_eq!(state.integral, 0.0);
        assert_eq!(state.last_input, Some(35.0));
    }

    #[test]
    fn integral_uses_elapsed_time() {
        let c = pid(1.0, 10.0);
        let (s1, _) = c.update(&PidState::default(), 0.0, 1.0, 0.0);
        let (short, _) = c.update(&s1, 0.0, 1.0, 1.0);
        let (long, _) = c.update(&s1, 0.0, 1.0, 5.0);
        assert!((short.integral - 0.1).abs() < 1e-12);
        assert!((long.integral - 0.5).abs() < 1e-12);
    }

    #[test]
    fn output_clamping() {
        let c = pid(10.0, 1.0);
        let (_, high) = c.update(&PidState::default(), 0.0, 50.0, 0.0);
        let (_, low) = c.update(&PidState::default(), 50.0, 0.0, 0.0);
        assert_eq!(high, 100.0);
        assert_eq!(low, 0.0);
    }

    #[test]
    fn no_windup_while_saturated() {
        let c = pid(2.0, 1.0);
        let mut state = PidState::default();
        for _ in 0..100 {
            let (next, out) = c.update(&state, 0.0, 100.0, 10.0);
            assert_eq!(out, 100.0);
            state = next;
        }
        assert_eq!(state.integral, 0.0);

        // as soon as the error flips the output leaves the clamp
        let (_, out) = c.update(&state, 100.5, 100.0, 10.0);
        assert_eq!(out, 0.0);
    }

    #[test]
    fn integral_fills_exactly_to_the_clamp() {
        let c = pid(0.1, 10.0);
        let mut state = PidState::default();
        let mut out = 0.0;
        for _ in 0..20 {
            let (next, o) = c.update(&state, 30.0, 40.0, 100.0);
            state = next;
            out = o;
        }
        assert_eq!(out, 100.0);
        assert!((state.integral - 99.0).abs() < 1e-9);

        // slight overshoot: output comes off the clamp right away
        let (_, out) = c.update(&state, 41.0, 40.0, 10.0);
        assert!(out < 100.0);
        assert!(out > 90.0);
    }

    #[test]
    fn retuning_does_not_step_output() {
        let mut c = pid(1.0, 10.0);
        let mut state = PidState::default();
        for _ in 0..5 {
            state = c.update(&state, 35.0, 40.0, 10.0).0;
        }
        let integral = state.integral;
        assert!(c.set_tunings(1.0, 1000.0));
        let (next, _) = c.update(&state, 40.0, 40.0, 0.0);
        assert_eq!(next.integral, integral);
    }

    #[test]
    fn derivative_acts_on_measurement() {
        let c = PidController::new(0.0, 0.0, 10.0, -100.0, 100.0).unwrap();
        let (s1, _) = c.update(&PidState::default(), 20.0, 40.0, 1.0);
        // setpoint jump alone produces no derivative action
        let (_, out) = c.update(&s1, 20.0, 60.0, 1.0);
        assert_eq!(out, 0.0);
        // rising measurement pushes the output down
        let (_, out) = c.update(&s1, 21.0, 40.0, 1.0);
        assert!((out + 10.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_controller_params() {
        assert!(PidController::new(100.0, 1.0, 0.0, 0.0, 100.0).is_err());
        assert!(PidController::new(1.0, f64::INFINITY, 0.0, 0.0, 100.0).is_err());
        assert!(PidController::new(1.0, 1.0, 0.0, 100.0, 0.0).is_err());
        assert!(PidController::new(1.0, 1.0, 0.0, f64::NAN, 0.0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ki_is_kp_over_tn(kp in 0.0_f64..100.0, tn in -1000.0_f64..10_000.0) {
            let c = PidController::new(kp, tn, 0.0, 0.0, 100.0).unwrap();
            if tn > 0.0 {
                prop_assert!((c.ki() - kp / tn).abs() <= 1e-12 * (1.0 + kp / tn));
            } else {
                prop_assert_eq!(c.ki(), 0.0);
            }
        }

        #[test]
        fn output_always_within_bounds(
            kp in 0.0_f64..100.0,
            tn in 0.0_f64..2000.0,
            steps in prop::collection::vec((-40.0_f64..90.0, -40.0_f64..90.0, 0.0_f64..600.0), 1..50),
        ) {
            let c = PidController::new(kp, tn, 0.0, 0.0, 100.0).unwrap();
            let mut state = PidState::default();
            for (pv, sp, dt) in steps {
                let (next, out) = c.update(&state, pv, sp, dt);
                prop_assert!((0.0..=100.0).contains(&out));
                prop_assert!((0.0..=100.0).contains(&next.integral));
                state = next;
            }
        }
    }
}
