//! Controller wiring and the cooperative run loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fh_core::{
    AnalogInput, Clock, DigitalOutput, PinId, PropertyId, PropertySink, PropertyValue, Tickable,
};
use fh_sensors::SensorConditioner;
use fh_valve::{ValveActuator, ValveHandle};
use tracing::{debug, info};

use crate::config::ControllerConfig;
use crate::error::AppResult;
use crate::heat_pump::HeatPump;
use crate::orchestrator::{HeatingOrchestrator, RegulationReport};
use crate::scheduler::Scheduler;

/// Longest sleep of [`HeatingController::run`] between two stop checks.
const MAX_IDLE: Duration = Duration::from_millis(100);

/// Scheduled work, in the order the cadences are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    ValveTick,
    Sample,
    Regulate,
    Recalibrate,
    CalibrationDone,
}

/// Hardware the controller drives.
pub struct Hardware {
    pub adc: Box<dyn AnalogInput>,
    pub valve_lines: Box<dyn DigitalOutput>,
    pub heat_pump_line: Box<dyn DigitalOutput>,
}

pub struct HeatingController {
    scheduler: Scheduler<Task>,
    pub(crate) sensors: SensorConditioner,
    valve: ValveActuator,
    pub(crate) valve_handle: ValveHandle,
    pub(crate) orchestrator: HeatingOrchestrator,
    heat_pump: HeatPump,
    last_report: Option<RegulationReport>,
    sink: Arc<dyn PropertySink>,
}

impl HeatingController {
    /// Build every component, switch the heat pump on, start the cadences and
    /// the startup calibration.
    pub fn new(
        config: &ControllerConfig,
        hardware: Hardware,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn PropertySink>,
    ) -> AppResult<Self> {
        config.validate()?;

        let sensors = SensorConditioner::new(config.sensors.clone(), hardware.adc, sink.clone())?;
        let valve = ValveActuator::new(&config.valve, hardware.valve_lines, sink.clone())?;
        let valve_handle = valve.handle();
        let orchestrator =
            HeatingOrchestrator::new(config, clock.clone(), valve_handle.clone(), sink.clone())?;
        let heat_pump = HeatPump::new(
            hardware.heat_pump_line,
            PinId(config.orchestrator.heat_pump_pin),
            sink.clone(),
        );

        let mut scheduler = Scheduler::new(clock);
        scheduler.schedule(config.valve.tick_period(), true, Task::ValveTick)?;
        scheduler.schedule(config.schedule.sampling_period(), true, Task::Sample)?;
        scheduler.schedule(config.schedule.regulation_period(), true, Task::Regulate)?;
        scheduler.schedule(config.valve.recalibration_interval(), true, Task::Recalibrate)?;

        let mut controller = Self {
            scheduler,
            sensors,
            valve,
            valve_handle,
            orchestrator,
            heat_pump,
            last_report: None,
            sink,
        };
        controller.heat_pump.on();
        controller.publish_parameters();
        controller.calibrate()?;
        info!("heating controller started");
        Ok(controller)
    }

    /// Start a full-close calibration unless one is running.
    pub fn calibrate(&mut self) -> AppResult<bool> {
        match self.valve.start_calibration() {
            Some(duration) => {
                self.scheduler
                    .schedule(duration, false, Task::CalibrationDone)?;
                Ok(true)
            }
            None => {
                debug!("calibration already running");
                Ok(false)
            }
        }
    }

    /// Dispatch every task due at the clock's current time.
    pub fn run_pending(&mut self) -> AppResult<usize> {
        let now = self.scheduler.now();
        let due = self.scheduler.drain_due();
        let count = due.len();
        for task in due {
            self.dispatch(task, now)?;
        }
        Ok(count)
    }

    fn dispatch(&mut self, task: Task, now: Duration) -> AppResult<()> {
        match task {
            Task::ValveTick => self.valve.tick(now),
            Task::Sample => self.sensors.tick(now),
            Task::Regulate => {
                let report = self.orchestrator.run(now, &self.sensors);
                self.last_report = Some(report);
            }
            Task::Recalibrate => {
                self.calibrate()?;
            }
            Task::CalibrationDone => self.valve.finish_calibration(),
        }
        Ok(())
    }

    /// Run until `stop` is set, sleeping between due tasks.
    pub fn run(&mut self, stop: &AtomicBool) -> AppResult<()> {
        while !stop.load(Ordering::Relaxed) {
            self.run_pending()?;
            let now = self.scheduler.now();
            let wait = self
                .scheduler
                .next_due()
                .map_or(MAX_IDLE, |due| due.saturating_sub(now))
                .min(MAX_IDLE);
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }
        info!("heating controller stopped");
        Ok(())
    }

    /// Publish the current value of every settable parameter.
    pub fn publish_parameters(&self) {
        let regulator = self.orchestrator.regulator();
        let curve = self.orchestrator.setpoint().curve();
        let floats = [
            (PropertyId::Kp, regulator.kp()),
            (PropertyId::Tn, regulator.tn()),
            (PropertyId::Ki, regulator.ki()),
            (PropertyId::Slope, curve.slope),
            (PropertyId::Origin, curve.origin),
            (PropertyId::MaxFlowTemp, curve.ceiling),
            (PropertyId::LowpassFilterK2, self.sensors.lowpass_k2()),
        ];
        for (id, value) in floats {
            self.sink.publish(id, PropertyValue::Float(value));
        }
        self.sink.publish(
            PropertyId::NumberOfOpenValves,
            PropertyValue::Integer(i64::from(self.orchestrator.open_valves())),
        );
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    pub fn sensors(&self) -> &SensorConditioner {
        &self.sensors
    }

    pub fn valve(&self) -> &ValveActuator {
        &self.valve
    }

    pub fn valve_handle(&self) -> ValveHandle {
        self.valve_handle.clone()
    }

    pub fn orchestrator(&self) -> &HeatingOrchestrator {
        &self.orchestrator
    }

    pub fn heat_pump(&self) -> &HeatPump {
        &self.heat_pump
    }

    pub fn last_report(&self) -> Option<&RegulationReport> {
        self.last_report.as_ref()
    }
}
