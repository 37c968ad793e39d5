//! Valve position state machine.
//!
//! Position is tracked as whole percent. The motor needs
//! `ticks_per_percent` fast ticks to travel one percent, so a move of `n`
//! percent loads a counter with `n * ticks_per_percent` that is counted down
//! one per tick. Requests for fully open or fully closed are extended by the
//! overshoot margin so the valve really reaches its end stop.

use std::sync::Arc;
use std::time::Duration;

use fh_core::{DigitalOutput, PinId, PropertyId, PropertySink, PropertyValue, Tickable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::drive::{Drive, ValvePins};
use crate::error::{ValveError, ValveResult};
use crate::handle::ValveHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValveConfig {
    pub open_pin: u8,
    pub close_pin: u8,
    /// Fast ticks the motor needs for one percent of travel.
    pub ticks_per_percent: u32,
    /// Fast tick period in milliseconds.
    pub tick_ms: u64,
    /// Extra percent driven past the end stops.
    pub overshoot: u8,
    /// Time between full-close calibrations, after the one at startup.
    pub recalibration_interval_s: u64,
}

impl Default for ValveConfig {
    fn default() -> Self {
        Self {
            open_pin: 20,
            close_pin: 21,
            ticks_per_percent: 55,
            tick_ms: 10,
            overshoot: 3,
            recalibration_interval_s: 24 * 60 * 60,
        }
    }
}

impl ValveConfig {
    pub fn validate(&self) -> ValveResult<()> {
        if self.open_pin == self.close_pin {
            return Err(ValveError::InvalidArg {
                what: "open_pin and close_pin must differ",
            });
        }
        if self.ticks_per_percent == 0 || self.ticks_per_percent > 10_000 {
            return Err(ValveError::InvalidArg {
                what: "ticks_per_percent must be within [1, 10000]",
            });
        }
        if self.tick_ms == 0 {
            return Err(ValveError::InvalidArg {
                what: "tick_ms must be positive",
            });
        }
        if self.overshoot > 50 {
            return Err(ValveError::InvalidArg {
                what: "overshoot must be at most 50",
            });
        }
        if self.recalibration_interval_s == 0 {
            return Err(ValveError::InvalidArg {
                what: "recalibration_interval_s must be positive",
            });
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Time for a full 0 to 100 traversal.
    pub fn full_travel(&self) -> Duration {
        self.tick_period() * self.ticks_per_percent * 100
    }

    pub fn recalibration_interval(&self) -> Duration {
        Duration::from_secs(self.recalibration_interval_s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionState {
    Opening,
    Closing,
    Holding,
}

/// Observable actuator state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValveSnapshot {
    pub target: Option<u8>,
    pub previous_target: Option<u8>,
    pub internal_target: i16,
    pub current: u8,
    pub counter: i32,
    pub motion: MotionState,
    pub calibrating: bool,
}

pub struct ValveActuator {
    ticks_per_percent: i32,
    overshoot: i16,
    full_travel: Duration,
    pins: ValvePins,
    handle: ValveHandle,
    sink: Arc<dyn PropertySink>,
    previous_target: Option<u8>,
    internal_target: i16,
    current: u8,
    counter: i32,
    motion: MotionState,
}

impl ValveActuator {
    pub fn new(
        config: &ValveConfig,
        output: Box<dyn DigitalOutput>,
        sink: Arc<dyn PropertySink>,
    ) -> ValveResult<Self> {
        config.validate()?;
        let pins = ValvePins::new(output, PinId(config.open_pin), PinId(config.close_pin));
        let ticks_per_percent =
            i32::try_from(config.ticks_per_percent).map_err(|_| ValveError::InvalidArg {
                what: "ticks_per_percent out of range",
            })?;
        Ok(Self {
            ticks_per_percent,
            overshoot: i16::from(config.overshoot),
            full_travel: config.full_travel(),
            pins,
            handle: ValveHandle::new(sink.clone()),
            sink,
            previous_target: None,
            internal_target: 0,
            current: 0,
            counter: 0,
            motion: MotionState::Holding,
        })
    }

    /// Handle for setting targets from other cadences.
    pub fn handle(&self) -> ValveHandle {
        self.handle.clone()
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn motion(&self) -> MotionState {
        self.motion
    }

    pub fn drive(&self) -> Drive {
        self.pins.drive()
    }

    pub fn is_calibrating(&self) -> bool {
        self.handle.is_calibrating()
    }

    pub fn snapshot(&self) -> ValveSnapshot {
        ValveSnapshot {
            target: self.handle.target(),
            previous_target: self.previous_target,
            internal_target: self.internal_target,
            current: self.current,
            counter: self.counter,
            motion: self.motion,
            calibrating: self.is_calibrating(),
        }
    }

    /// Advance the motor by one fast tick.
    pub fn step(&mut self) {
        if self.handle.is_calibrating() {
            return;
        }
        if self.counter == 0 {
            self.adjust_target_valve_position();
        }
        if self.counter > 0 {
            self.enter(MotionState::Opening);
            self.counter -= 1;
            if self.counter % self.ticks_per_percent == 0 {
                if self.current < 100 {
                    self.move_current(1);
                }
                self.adjust_target_valve_position();
            }
        } else if self.counter < 0 {
            self.enter(MotionState::Closing);
            self.counter += 1;
            if self.counter % self.ticks_per_percent == 0 {
                if self.current > 0 {
                    self.move_current(-1);
                }
                self.adjust_target_valve_position();
            }
        }
        if self.counter == 0 {
            self.enter(MotionState::Holding);
        }
    }

    /// Begin a full-close calibration and return how long the motor has to
    /// run before [`finish_calibration`](Self::finish_calibration) is called.
    /// Returns `None` if a calibration is already running.
    pub fn start_calibration(&mut self) -> Option<Duration> {
        if self.handle.is_calibrating() {
            return None;
        }
        info!(duration = ?self.full_travel, "valve calibration started");
        self.handle.set_calibrating(true);
        self.motion = MotionState::Closing;
        self.pins.set(Drive::Close);
        Some(self.full_travel)
    }

    /// End a calibration: the valve is now fully closed.
    pub fn finish_calibration(&mut self) {
        if !self.handle.is_calibrating() {
            return;
        }
        self.pins.set(Drive::Off);
        self.motion = MotionState::Holding;
        self.current = 0;
        self.counter = 0;
        self.internal_target = 0;
        self.previous_target = None;
        self.publish_current();
        self.handle.set_calibrating(false);
        info!("valve calibration finished");
    }

    /// Latch a changed target and load the motor counter.
    fn adjust_target_valve_position(&mut self) {
        let Some(target) = self.handle.target() else {
            return;
        };
        if self.previous_target == Some(target) {
            return;
        }
        self.previous_target = Some(target);

        let target = i16::from(target);
        let current = i16::from(self.current);
        self.internal_target = if target == 100 && current < 100 {
            100 + self.overshoot
        } else if target == 0 && current > 0 {
            -self.overshoot
        } else {
            target
        };
        let limit = 100 + self.overshoot;
        let percent = (self.internal_target - current).clamp(-limit, limit);
        self.counter = i32::from(percent) * self.ticks_per_percent;
        debug!(
            requested = target,
            internal_target = self.internal_target,
            current,
            counter = self.counter,
            "valve retarget"
        );
    }

    fn enter(&mut self, motion: MotionState) {
        if self.motion == motion {
            return;
        }
        debug!(?motion, current = self.current, "valve motion");
        self.motion = motion;
        self.pins.set(match motion {
            MotionState::Opening => Drive::Open,
            MotionState::Closing => Drive::Close,
            MotionState::Holding => Drive::Off,
        });
    }

    fn move_current(&mut self, delta: i8) {
        self.current = self.current.saturating_add_signed(delta).min(100);
        self.publish_current();
    }

    fn publish_current(&self) {
        self.sink.publish(
            PropertyId::ValveCurrent,
            PropertyValue::Integer(i64::from(self.current)),
        );
    }
}

impl Tickable for ValveActuator {
    fn tick(&mut self, _now: Duration) {
        self.step();
    }
}
