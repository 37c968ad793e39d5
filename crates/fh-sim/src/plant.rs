//! Hydronic plant: mixing valve, supply line and floor loop.
//!
//! Lumped first-order model integrated with forward Euler:
//! - valve: motor runs at constant speed while a line is energised, stops at
//!   the end stops
//! - supply: `d(flow)/dt = (mix - flow) / mix_tau`, where `mix` blends the
//!   heat pump supply and the return by valve position
//! - floor loop: `d(ret)/dt = (room + f·(flow - room) - ret) / return_tau`

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Heat pump supply temperature while running.
    pub heat_source_c: f64,
    pub room_c: f64,
    pub outside_mean_c: f64,
    pub outside_amplitude_c: f64,
    pub outside_period_s: f64,
    pub mix_tau_s: f64,
    pub return_tau_s: f64,
    /// Share of the supply temperature rise over room left in the return.
    pub return_fraction: f64,
    /// Real motor speed relative to the nominal one the controller assumes.
    pub valve_speed_factor: f64,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            heat_source_c: 45.0,
            room_c: 21.0,
            outside_mean_c: -5.0,
            outside_amplitude_c: 0.0,
            outside_period_s: 86_400.0,
            mix_tau_s: 60.0,
            return_tau_s: 300.0,
            return_fraction: 0.75,
            valve_speed_factor: 1.0,
        }
    }
}

impl PlantConfig {
    pub fn validate(&self) -> SimResult<()> {
        let finite = [
            self.heat_source_c,
            self.room_c,
            self.outside_mean_c,
            self.outside_amplitude_c,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "plant temperatures must be finite",
            });
        }
        if !(self.mix_tau_s > 0.0 && self.return_tau_s > 0.0 && self.outside_period_s > 0.0) {
            return Err(SimError::InvalidArg {
                what: "time constants must be positive",
            });
        }
        if !(0.0..1.0).contains(&self.return_fraction) {
            return Err(SimError::InvalidArg {
                what: "return_fraction must be within [0, 1)",
            });
        }
        if !(self.valve_speed_factor > 0.0 && self.valve_speed_factor.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "valve_speed_factor must be positive",
            });
        }
        Ok(())
    }

    pub fn outside_at(&self, t_s: f64) -> f64 {
        self.outside_mean_c + self.outside_amplitude_c * (TAU * t_s / self.outside_period_s).sin()
    }
}

/// Physical state of the plant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantState {
    pub t_s: f64,
    /// Actual valve opening in percent.
    pub valve_position: f64,
    pub flow_c: f64,
    pub return_c: f64,
    pub outside_c: f64,
}

/// Motor line levels and heat pump enable seen by the plant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actuation {
    pub open: bool,
    pub close: bool,
    pub heat_pump: bool,
}

pub struct Plant {
    config: PlantConfig,
    /// Percent per second at nominal speed.
    valve_rate: f64,
}

impl Plant {
    /// `full_travel_s` is the nominal 0 to 100 travel time of the valve.
    pub fn new(config: PlantConfig, full_travel_s: f64) -> SimResult<Self> {
        config.validate()?;
        if full_travel_s.is_nan() || full_travel_s <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "full_travel_s must be positive",
            });
        }
        let valve_rate = 100.0 / full_travel_s * config.valve_speed_factor;
        Ok(Self { config, valve_rate })
    }

    pub fn config(&self) -> &PlantConfig {
        &self.config
    }

    /// Cold plant, valve position unknown to the controller.
    pub fn initial_state(&self, valve_position: f64) -> PlantState {
        PlantState {
            t_s: 0.0,
            valve_position: valve_position.clamp(0.0, 100.0),
            flow_c: self.config.room_c,
            return_c: self.config.room_c,
            outside_c: self.config.outside_at(0.0),
        }
    }

    /// Advance `state` by `dt` seconds under `act`.
    pub fn step(&self, state: &PlantState, dt: f64, act: Actuation) -> PlantState {
        let c = &self.config;
        let direction = match (act.open, act.close) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        let valve_position =
            (state.valve_position + direction * self.valve_rate * dt).clamp(0.0, 100.0);

        let source = if act.heat_pump {
            c.heat_source_c
        } else {
            state.return_c
        };
        let mix = state.return_c + (source - state.return_c) * state.valve_position / 100.0;
        let flow_c = state.flow_c + (mix - state.flow_c) / c.mix_tau_s * dt;

        let return_target = c.room_c + c.return_fraction * (state.flow_c - c.room_c);
        let return_c = state.return_c + (return_target - state.return_c) / c.return_tau_s * dt;

        let t_s = state.t_s + dt;
        PlantState {
            t_s,
            valve_position,
            flow_c,
            return_c,
            outside_c: c.outside_at(t_s),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn actuation() -> impl Strategy<Value = Actuation> {
        (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(open, close, heat_pump)| {
            Actuation {
                open,
                close,
                heat_pump,
            }
        })
    }

    proptest! {
        #[test]
        fn temperatures_stay_between_room_and_source(
            start in 0.0_f64..=100.0,
            acts in prop::collection::vec(actuation(), 1..400),
        ) {
            let p = Plant::new(PlantConfig::default(), 55.0).unwrap();
            let mut s = p.initial_state(start);
            for act in acts {
                s = p.step(&s, 1.0, act);
                prop_assert!((0.0..=100.0).contains(&s.valve_position));
                prop_assert!(s.flow_c >= 21.0 - 1e-9 && s.flow_c <= 45.0 + 1e-9);
                prop_assert!(s.return_c >= 21.0 - 1e-9 && s.return_c <= 45.0 + 1e-9);
            }
        }
    }
}
