//! Closed-loop simulation: controller against the plant on a manual clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fh_app::{ControllerConfig, Forwarding, Hardware, HeatingController};
use fh_core::{Clock, ManualClock};
use serde::Serialize;
use tracing::info;

use crate::error::{SimError, SimResult};
use crate::hardware::{PinBank, PlantAdc, lock};
use crate::plant::{Actuation, Plant, PlantConfig, PlantState};
use crate::sink::RecordingSink;

/// Options for simulation runs.
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Simulated time to run for (seconds)
    pub t_end_s: u64,
    /// Record a sample every this many seconds
    pub record_every_s: u64,
    /// Actual valve position at boot, unknown to the controller
    pub initial_valve_position: f64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            t_end_s: 3600,
            record_every_s: 60,
            initial_valve_position: 0.0,
        }
    }
}

/// One recorded point of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSample {
    pub t_s: f64,
    pub outside_c: f64,
    pub flow_c: f64,
    pub return_c: f64,
    pub measured_flow_c: f64,
    pub target_flow_c: Option<f64>,
    pub valve_target: Option<u8>,
    pub valve_estimate: u8,
    pub valve_actual: f64,
    pub calibrating: bool,
    pub forwarding: Option<Forwarding>,
}

pub struct Simulation {
    controller: HeatingController,
    clock: ManualClock,
    plant: Plant,
    state: Arc<Mutex<PlantState>>,
    pins: PinBank,
    open_pin: u8,
    close_pin: u8,
    heat_pump_pin: u8,
    sink: Arc<RecordingSink>,
}

impl Simulation {
    pub fn new(
        config: &ControllerConfig,
        plant: PlantConfig,
        initial_valve_position: f64,
    ) -> SimResult<Self> {
        let plant = Plant::new(plant, config.valve.full_travel().as_secs_f64())?;
        let state = Arc::new(Mutex::new(plant.initial_state(initial_valve_position)));
        let pins = PinBank::new();
        let clock = ManualClock::new();
        let sink = Arc::new(RecordingSink::new());

        let hardware = Hardware {
            adc: Box::new(PlantAdc::new(state.clone(), config.sensors.clone())),
            valve_lines: Box::new(pins.clone()),
            heat_pump_line: Box::new(pins.clone()),
        };
        let controller =
            HeatingController::new(config, hardware, Arc::new(clock.clone()), sink.clone())?;

        Ok(Self {
            controller,
            clock,
            plant,
            state,
            pins,
            open_pin: config.valve.open_pin,
            close_pin: config.valve.close_pin,
            heat_pump_pin: config.orchestrator.heat_pump_pin,
            sink,
        })
    }

    pub fn controller(&self) -> &HeatingController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut HeatingController {
        &mut self.controller
    }

    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    pub fn plant_state(&self) -> PlantState {
        lock(&self.state).clone()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Advance plant and controller to `until`, dispatching every task on
    /// its due time.
    pub fn advance_to(&mut self, until: Duration) -> SimResult<()> {
        while let Some(due) = self.controller.next_due() {
            if due > until {
                break;
            }
            self.step_plant_to(due);
            self.controller.run_pending()?;
        }
        self.step_plant_to(until);
        Ok(())
    }

    fn step_plant_to(&mut self, t: Duration) {
        let now = self.clock.now();
        if t > now {
            let act = Actuation {
                open: self.pins.level(self.open_pin),
                close: self.pins.level(self.close_pin),
                heat_pump: self.pins.level(self.heat_pump_pin),
            };
            let mut state = lock(&self.state);
            let next = self.plant.step(&state, (t - now).as_secs_f64(), act);
            *state = next;
        }
        self.clock.set(t);
    }

    pub fn sample(&self) -> SimSample {
        let plant = self.plant_state();
        let report = self.controller.last_report();
        let valve = self.controller.valve();
        SimSample {
            t_s: self.now().as_secs_f64(),
            outside_c: plant.outside_c,
            flow_c: plant.flow_c,
            return_c: plant.return_c,
            measured_flow_c: self
                .controller
                .sensors()
                .peek(fh_sensors::ChannelKind::Flow),
            target_flow_c: report.map(|r| r.target_flow),
            valve_target: self.controller.valve_handle().target(),
            valve_estimate: valve.current(),
            valve_actual: plant.valve_position,
            calibrating: valve.is_calibrating(),
            forwarding: report.map(|r| r.forwarding),
        }
    }

    /// Run for `opts.t_end_s` more seconds, recording a sample every
    /// `opts.record_every_s`.
    pub fn run(&mut self, opts: &SimOptions) -> SimResult<Vec<SimSample>> {
        if opts.record_every_s == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every_s must be positive",
            });
        }
        let start = self.now();
        let end = start + Duration::from_secs(opts.t_end_s);
        let every = Duration::from_secs(opts.record_every_s);

        let mut samples = vec![self.sample()];
        let mut next = start + every;
        while next <= end {
            self.advance_to(next)?;
            samples.push(self.sample());
            next += every;
        }
        if self.now() < end {
            self.advance_to(end)?;
            samples.push(self.sample());
        }
        info!(
            samples = samples.len(),
            t_end_s = end.as_secs_f64(),
            "simulation finished"
        );
        Ok(samples)
    }
}

/// Build a simulation and run it once.
pub fn run_sim(
    config: &ControllerConfig,
    plant: PlantConfig,
    opts: &SimOptions,
) -> SimResult<Vec<SimSample>> {
    let mut sim = Simulation::new(config, plant, opts.initial_valve_position)?;
    sim.run(opts)
}
