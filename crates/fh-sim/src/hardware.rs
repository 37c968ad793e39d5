//! Simulated pins and ADC wired to the plant state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use fh_core::{AnalogChannel, AnalogInput, DigitalOutput, PinId};
use fh_sensors::SensorConfig;

use crate::plant::PlantState;

/// Shared digital output levels. Clones see the same pins.
#[derive(Debug, Clone, Default)]
pub struct PinBank {
    levels: Arc<Mutex<HashMap<u8, bool>>>,
}

impl PinBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, pin: u8) -> bool {
        lock(&self.levels).get(&pin).copied().unwrap_or(false)
    }
}

impl DigitalOutput for PinBank {
    fn set(&mut self, pin: PinId, high: bool) {
        lock(&self.levels).insert(pin.0, high);
    }
}

/// ADC that samples the plant's temperatures through the thermistor model.
pub struct PlantAdc {
    state: Arc<Mutex<PlantState>>,
    sensors: SensorConfig,
}

impl PlantAdc {
    pub fn new(state: Arc<Mutex<PlantState>>, sensors: SensorConfig) -> Self {
        Self { state, sensors }
    }
}

impl AnalogInput for PlantAdc {
    fn read(&mut self, channel: AnalogChannel) -> u16 {
        let state = lock(&self.state);
        let celsius = match channel.0 {
            c if c == self.sensors.outside_channel => state.outside_c,
            c if c == self.sensors.flow_channel => state.flow_c,
            c if c == self.sensors.return_channel => state.return_c,
            _ => return 0,
        };
        self.sensors.sample_for(celsius)
    }
}

/// The simulation never panics while holding a lock, so a poisoned mutex
/// still holds consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_bank_clones_share_levels() {
        let bank = PinBank::new();
        let mut writer = bank.clone();
        writer.set(PinId(20), true);
        assert!(bank.level(20));
        assert!(!bank.level(21));
    }

    #[test]
    fn adc_reads_plant_temperatures() {
        let state = Arc::new(Mutex::new(PlantState {
            t_s: 0.0,
            valve_position: 0.0,
            flow_c: 35.0,
            return_c: 28.0,
            outside_c: -3.0,
        }));
        let sensors = SensorConfig::default();
        let mut adc = PlantAdc::new(state, sensors.clone());
        assert_eq!(
            adc.read(AnalogChannel(sensors.flow_channel)),
            sensors.sample_for(35.0)
        );
        assert_eq!(
            adc.read(AnalogChannel(sensors.outside_channel)),
            sensors.sample_for(-3.0)
        );
        assert_eq!(adc.read(AnalogChannel(1)), 0);
    }
}
