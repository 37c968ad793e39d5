//! Temperature sensor conditioning for the floor-heating controller.
//!
//! Raw ADC counts pass through three stages per channel:
//! - an exponential low-pass filter ([`LowpassFilter`])
//! - a voltage-divider inversion to thermistor resistance ([`ThermistorModel`])
//! - a linear resistance-to-temperature fit
//!
//! [`SensorConditioner`] owns the outside, flow and return channels and
//! publishes every reading it hands out.

pub mod conditioner;
pub mod error;
pub mod filter;
pub mod thermistor;

pub use conditioner::{ChannelKind, SensorConditioner, SensorConfig, TemperatureChannel};
pub use error::{SensorError, SensorResult};
pub use filter::LowpassFilter;
pub use thermistor::ThermistorModel;
