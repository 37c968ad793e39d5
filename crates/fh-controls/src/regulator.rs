//! Flow regulator: supply temperature error to valve position command.

use std::sync::Arc;
use std::time::Duration;

use fh_core::{Clock, PropertyId, PropertySink, PropertyValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::controller::{PidController, PidState};
use crate::error::{ControlError, ControlResult};
use crate::sampled::SampleGate;

const OUTPUT_MIN: f64 = 0.0;
const OUTPUT_MAX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatorConfig {
    pub kp: f64,
    /// Integral time constant in seconds. Zero or negative disables the
    /// integral term.
    pub tn_s: f64,
    /// Minimum time between two regulation steps.
    pub sample_interval_s: f64,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            kp: 2.0,
            tn_s: 120.0,
            sample_interval_s: 10.0,
        }
    }
}

impl RegulatorConfig {
    pub fn sample_interval(&self) -> ControlResult<Duration> {
        Duration::try_from_secs_f64(self.sample_interval_s).map_err(|_| {
            ControlError::InvalidArg {
                what: "sample_interval_s must be finite and non-negative",
            }
        })
    }
}

/// Sampled PI loop producing a valve command in `0..=100`.
pub struct FlowRegulator {
    pid: PidController,
    state: PidState,
    gate: SampleGate,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn PropertySink>,
}

impl FlowRegulator {
    pub fn new(
        config: &RegulatorConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn PropertySink>,
    ) -> ControlResult<Self> {
        let pid = PidController::new(config.kp, config.tn_s, 0.0, OUTPUT_MIN, OUTPUT_MAX)?;
        let gate = SampleGate::new(config.sample_interval()?);
        Ok(Self {
            pid,
            state: PidState::default(),
            gate,
            clock,
            sink,
        })
    }

    /// One regulation step at the injected clock's current time.
    pub fn regulate(&mut self, current: f64, target: f64) -> u8 {
        let now = self.clock.now();
        self.regulate_at(now, current, target)
    }

    /// One regulation step at `now`. Inside the sample interval the previous
    /// command is repeated.
    pub fn regulate_at(&mut self, now: Duration, current: f64, target: f64) -> u8 {
        if !self.gate.is_due(now) {
            return to_command(self.state.last_output);
        }
        let dt = self
            .gate
            .elapsed(now)
            .map_or(0.0, |elapsed| elapsed.as_secs_f64());
        let (state, output) = self.pid.update(&self.state, current, target, dt);
        self.state = state;
        self.gate.mark(now);
        debug!(
            current,
            setpoint = target,
            dt,
            integral = self.state.integral,
            output,
            "regulation step"
        );
        to_command(output)
    }

    pub fn kp(&self) -> f64 {
        self.pid.kp
    }

    pub fn tn(&self) -> f64 {
        self.pid.tn
    }

    pub fn ki(&self) -> f64 {
        self.pid.ki()
    }

    /// Last computed command.
    pub fn output(&self) -> u8 {
        to_command(self.state.last_output)
    }

    pub fn set_tunings(&mut self, kp: f64, tn: f64) -> bool {
        if !self.pid.set_tunings(kp, tn) {
            warn!(kp, tn, "rejected regulator tunings");
            return false;
        }
        self.sink.publish(PropertyId::Kp, PropertyValue::Float(kp));
        self.sink.publish(PropertyId::Tn, PropertyValue::Float(tn));
        self.sink
            .publish(PropertyId::Ki, PropertyValue::Float(self.pid.ki()));
        true
    }

    pub fn set_kp(&mut self, kp: f64) -> bool {
        self.set_tunings(kp, self.pid.tn)
    }

    pub fn set_tn(&mut self, tn: f64) -> bool {
        self.set_tunings(self.pid.kp, tn)
    }

    /// Clear the integrator and the sample history.
    pub fn reset(&mut self) {
        self.state = PidState::default();
        self.gate.reset();
    }
}

fn to_command(output: f64) -> u8 {
    output.round().clamp(OUTPUT_MIN, OUTPUT_MAX) as u8
}


#[cfg(test)]
mod proptests {
    use super::*;
    use fh_core::{ManualClock, NullSink};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn command_within_bounds_for_any_sequence(
            steps in prop::collection::vec(
                (-50.0_f64..150.0, -50.0_f64..150.0, 0_u64..120),
                1..60,
            ),
        ) {
            let clock = ManualClock::new();
            let mut r = FlowRegulator::new(
                &RegulatorConfig::default(),
                Arc::new(clock.clone()),
                Arc::new(NullSink),
            )
            .unwrap();
            for (current, target, advance) in steps {
                clock.advance(Duration::from_secs(advance));
                let command = r.regulate(current, target);
                prop_assert!(command <= 100);
                prop_assert!((0.0..=100.0).contains(&r.state.integral));
            }
        }
    }
}
