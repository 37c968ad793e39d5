//! Thermistor front end: voltage divider inversion and linear temperature fit.
//!
//! The sensor sits on the low side of a divider fed from the ADC reference:
//! `V = Vref · R / (Rref + R)`, hence `R = V · Rref / (Vref − V)`.
//! A fixed `factor`/`offset` correction compensates wiring resistance, then a
//! precomputed linear fit `T = offset + factor · R` gives the temperature.

use fh_core::units::{Resistance, Temperature, Voltage, as_mv, as_ohm, degc, mv, ohm};
use serde::{Deserialize, Serialize};

use crate::error::{SensorError, SensorResult};

/// Calibration constants for one thermistor/divider combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermistorModel {
    /// ADC reference voltage (mV).
    pub ref_voltage_mv: f64,
    /// Fixed divider resistor (Ω).
    pub ref_resistor_ohm: f64,
    /// Additive wiring correction (Ω).
    pub correction_offset_ohm: f64,
    /// Multiplicative wiring correction.
    pub correction_factor: f64,
    /// Linear fit intercept (°C).
    pub temp_offset_c: f64,
    /// Linear fit slope (°C per Ω).
    pub temp_factor_c_per_ohm: f64,
}

impl Default for ThermistorModel {
    fn default() -> Self {
        Self {
            ref_voltage_mv: 3300.0,
            ref_resistor_ohm: 3875.0,
            correction_offset_ohm: -20.0,
            correction_factor: 1.0,
            temp_offset_c: -257.003341043434,
            temp_factor_c_per_ohm: 0.257003341043434,
        }
    }
}

impl ThermistorModel {
    pub fn validate(&self) -> SensorResult<()> {
        let all_finite = [
            self.ref_voltage_mv,
            self.ref_resistor_ohm,
            self.correction_offset_ohm,
            self.correction_factor,
            self.temp_offset_c,
            self.temp_factor_c_per_ohm,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(SensorError::InvalidArg {
                what: "thermistor constants must be finite",
            });
        }
        if self.ref_voltage_mv <= 0.0 {
            return Err(SensorError::InvalidArg {
                what: "ref_voltage_mv must be positive",
            });
        }
        if self.ref_resistor_ohm <= 0.0 {
            return Err(SensorError::InvalidArg {
                what: "ref_resistor_ohm must be positive",
            });
        }
        if self.temp_factor_c_per_ohm == 0.0 || self.correction_factor == 0.0 {
            return Err(SensorError::InvalidArg {
                what: "temperature fit and correction factors must be non-zero",
            });
        }
        Ok(())
    }

    /// Scale a filtered ADC value against the working full scale.
    pub fn voltage(&self, filtered: f64, full_scale: f64) -> Voltage {
        mv(filtered / full_scale * self.ref_voltage_mv)
    }

    /// Divider inversion plus wiring correction.
    ///
    /// No plausibility check: a reading at the reference voltage yields an
    /// infinite resistance.
    pub fn resistance(&self, voltage: Voltage) -> Resistance {
        let v = as_mv(voltage);
        let raw = v * self.ref_resistor_ohm / (self.ref_voltage_mv - v);
        ohm(raw * self.correction_factor + self.correction_offset_ohm)
    }

    pub fn temperature(&self, resistance: Resistance) -> Temperature {
        degc(self.temp_offset_c + self.temp_factor_c_per_ohm * as_ohm(resistance))
    }

    /// Voltage the divider would show at temperature `t`.
    ///
    /// Inverse of [`Self::resistance`] followed by [`Self::temperature`];
    /// used to synthesise ADC readings for a simulated plant.
    pub fn voltage_for(&self, t: Temperature) -> Voltage {
        use fh_core::units::as_degc;
        let corrected = (as_degc(t) - self.temp_offset_c) / self.temp_factor_c_per_ohm;
        let raw = (corrected - self.correction_offset_ohm) / self.correction_factor;
        mv(self.ref_voltage_mv * raw / (self.ref_resistor_ohm + raw))
    }
}
