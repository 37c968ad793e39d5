//! Controller configuration document.
//!
//! One YAML (or JSON) document with a section per component. Every field has
//! a default, so an empty document is a valid configuration.

use std::path::Path;
use std::time::Duration;

use fh_controls::{HeatingCurve, RegulatorConfig};
use fh_sensors::SensorConfig;
use fh_valve::ValveConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub sensors: SensorConfig,
    pub curve: HeatingCurve,
    pub regulator: RegulatorConfig,
    pub valve: ValveConfig,
    pub orchestrator: OrchestratorConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// No valve commands are forwarded during this time after boot.
    pub grace_period_s: u64,
    /// Zones calling for heat at startup.
    pub initial_open_valves: u32,
    pub heat_pump_pin: u8,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            grace_period_s: 5 * 60,
            initial_open_valves: 0,
            heat_pump_pin: 2,
        }
    }
}

impl OrchestratorConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_s)
    }
}

/// Cadences of the sensor and regulation tasks. The valve motor cadence is
/// `valve.tick_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub sampling_ms: u64,
    pub regulation_s: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sampling_ms: 100,
            regulation_s: 10,
        }
    }
}

impl ScheduleConfig {
    pub fn sampling_period(&self) -> Duration {
        Duration::from_millis(self.sampling_ms)
    }

    pub fn regulation_period(&self) -> Duration {
        Duration::from_secs(self.regulation_s)
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.sensors
            .validate()
            .map_err(|e| invalid("sensors", e))?;
        self.curve.validate().map_err(|e| invalid("curve", e))?;
        self.regulator
            .sample_interval()
            .map_err(|e| invalid("regulator", e))?;
        fh_controls::PidController::new(self.regulator.kp, self.regulator.tn_s, 0.0, 0.0, 100.0)
            .map_err(|e| invalid("regulator", e))?;
        self.valve.validate().map_err(|e| invalid("valve", e))?;

        if self.schedule.sampling_ms == 0 {
            return Err(invalid("schedule", "sampling_ms must be positive"));
        }
        if self.schedule.regulation_s == 0 {
            return Err(invalid("schedule", "regulation_s must be positive"));
        }

        let pin = self.orchestrator.heat_pump_pin;
        if pin == self.valve.open_pin || pin == self.valve.close_pin {
            return Err(invalid(
                "orchestrator",
                "heat_pump_pin must not be a valve pin",
            ));
        }
        Ok(())
    }
}

fn invalid(section: &'static str, what: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        section,
        what: what.to_string(),
    }
}

pub fn from_yaml_str(content: &str) -> ConfigResult<ControllerConfig> {
    let config: ControllerConfig = serde_yaml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn to_yaml_string(config: &ControllerConfig) -> ConfigResult<String> {
    Ok(serde_yaml::to_string(config)?)
}

pub fn load_yaml(path: &Path) -> ConfigResult<ControllerConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, config: &ControllerConfig) -> ConfigResult<()> {
    config.validate()?;
    let content = to_yaml_string(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_json(path: &Path) -> ConfigResult<ControllerConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ControllerConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_default() {
        let config = from_yaml_str("{}").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.valve.ticks_per_percent, 55);
        assert_eq!(config.regulator.kp, 2.0);
        assert_eq!(config.curve.origin, 35.0);
        assert_eq!(config.orchestrator.grace_period(), Duration::from_secs(300));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "curve:\n  slope: -0.5\nvalve:\n  ticks_per_percent: 40\n";
        let config = from_yaml_str(yaml).unwrap();
        assert_eq!(config.curve.slope, -0.5);
        assert_eq!(config.curve.ceiling, 40.0);
        assert_eq!(config.valve.ticks_per_percent, 40);
        assert_eq!(config.valve.overshoot, 3);
    }

    #[test]
    fn out_of_range_value_names_the_section() {
        let err = from_yaml_str("curve:\n  slope: 1.5\n").unwrap_err();
        match err {
            ConfigError::Invalid { section, .. } => assert_eq!(section, "curve"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_kp_at_limit() {
        let err = from_yaml_str("regulator:\n  kp: 100.0\n").unwrap_err();
        assert!(err.to_string().contains("regulator"));
    }

    #[test]
    fn rejects_pin_clash() {
        let yaml = "orchestrator:\n  heat_pump_pin: 20\n";
        assert!(from_yaml_str(yaml).is_err());
    }

    #[test]
    fn rejects_zero_cadence() {
        assert!(from_yaml_str("schedule:\n  sampling_ms: 0\n").is_err());
        assert!(from_yaml_str("valve:\n  tick_ms: 0\n").is_err());
    }

    #[test]
    fn yaml_string_roundtrip() {
        let mut config = ControllerConfig::default();
        config.orchestrator.initial_open_valves = 2;
        config.sensors.lowpass_k2 = 0.01;
        let text = to_yaml_string(&config).unwrap();
        assert_eq!(from_yaml_str(&text).unwrap(), config);
    }
}
