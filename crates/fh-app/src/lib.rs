//! fh-app: the floor-heating controller assembled from its components.
//!
//! [`HeatingController`] owns the sensor front end, the valve actuator, the
//! regulation orchestrator and the heat pump output, and drives them from a
//! single cooperative [`Scheduler`]. Configuration is one YAML document, see
//! [`ControllerConfig`].

pub mod config;
pub mod controller;
pub mod error;
pub mod heat_pump;
pub mod orchestrator;
pub mod params;
pub mod scheduler;

pub use config::{
    ControllerConfig, OrchestratorConfig, ScheduleConfig, from_yaml_str, load_json, load_yaml,
    save_yaml, to_yaml_string,
};
pub use controller::{Hardware, HeatingController, Task};
pub use error::{AppError, AppResult, ConfigError, ConfigResult};
pub use heat_pump::HeatPump;
pub use orchestrator::{Forwarding, HeatingOrchestrator, RegulationReport};
pub use scheduler::Scheduler;
