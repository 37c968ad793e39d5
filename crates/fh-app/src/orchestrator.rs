//! Regulation cadence: sensors to setpoint to regulator to valve.

use std::sync::Arc;
use std::time::Duration;

use fh_controls::{FlowRegulator, SetpointCalculator};
use fh_core::{Clock, PropertyId, PropertySink, PropertyValue};
use fh_sensors::SensorConditioner;
use fh_valve::ValveHandle;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::AppResult;

/// What a regulation tick did with the valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Forwarding {
    /// Startup grace period, nothing forwarded.
    Grace,
    /// No zone calls for heat, the valve was told to close.
    Idle,
    /// Regulator output forwarded to the valve.
    Command { valve_target: u8 },
}

/// Values captured during one regulation tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegulationReport {
    pub at_s: f64,
    pub flow: f64,
    pub outside: f64,
    #[serde(rename = "return")]
    pub return_temp: f64,
    pub target_flow: f64,
    pub open_valves: u32,
    pub forwarding: Forwarding,
}

pub struct HeatingOrchestrator {
    setpoint: SetpointCalculator,
    regulator: FlowRegulator,
    valve: ValveHandle,
    open_valves: u32,
    grace_until: Duration,
    idle: bool,
    sink: Arc<dyn PropertySink>,
}

impl HeatingOrchestrator {
    pub fn new(
        config: &ControllerConfig,
        clock: Arc<dyn Clock>,
        valve: ValveHandle,
        sink: Arc<dyn PropertySink>,
    ) -> AppResult<Self> {
        let setpoint = SetpointCalculator::new(config.curve.clone(), sink.clone())?;
        let grace_until = clock.now() + config.orchestrator.grace_period();
        let regulator = FlowRegulator::new(&config.regulator, clock, sink.clone())?;
        Ok(Self {
            setpoint,
            regulator,
            valve,
            open_valves: config.orchestrator.initial_open_valves,
            grace_until,
            idle: false,
            sink,
        })
    }

    /// One regulation tick at `now`.
    pub fn run(&mut self, now: Duration, sensors: &SensorConditioner) -> RegulationReport {
        let flow = sensors.flow_temperature();
        let outside = sensors.outside_temperature();
        let return_temp = sensors.return_temperature();
        let target_flow = self.setpoint.calculate_target_temperature(outside);

        let forwarding = if now < self.grace_until {
            debug!(remaining = ?(self.grace_until - now), "grace period, valve untouched");
            Forwarding::Grace
        } else if self.open_valves == 0 {
            if !self.idle {
                info!("no zone calls for heat, closing valve");
                self.regulator.reset();
                self.idle = true;
            }
            self.valve.set_target(0);
            Forwarding::Idle
        } else {
            if self.idle {
                info!(open_valves = self.open_valves, "zones call for heat");
                self.idle = false;
            }
            let valve_target = self.regulator.regulate_at(now, flow, target_flow);
            self.valve.set_target(valve_target);
            Forwarding::Command { valve_target }
        };

        debug!(
            flow,
            outside,
            return_temp,
            target_flow,
            ?forwarding,
            "regulation tick"
        );
        RegulationReport {
            at_s: now.as_secs_f64(),
            flow,
            outside,
            return_temp,
            target_flow,
            open_valves: self.open_valves,
            forwarding,
        }
    }

    pub fn open_valves(&self) -> u32 {
        self.open_valves
    }

    /// Number of zones calling for heat. Negative or oversized counts are
    /// ignored.
    pub fn set_number_of_open_valves(&mut self, count: i64) -> bool {
        let Ok(count) = u32::try_from(count) else {
            warn!(count, "rejected open valve count");
            return false;
        };
        self.open_valves = count;
        self.sink.publish(
            PropertyId::NumberOfOpenValves,
            PropertyValue::Integer(i64::from(count)),
        );
        true
    }

    pub fn in_grace(&self, now: Duration) -> bool {
        now < self.grace_until
    }

    pub fn setpoint(&self) -> &SetpointCalculator {
        &self.setpoint
    }

    pub fn setpoint_mut(&mut self) -> &mut SetpointCalculator {
        &mut self.setpoint
    }

    pub fn regulator(&self) -> &FlowRegulator {
        &self.regulator
    }

    pub fn regulator_mut(&mut self) -> &mut FlowRegulator {
        &mut self.regulator
    }
}
