//! Capabilities the control core consumes from its surroundings.
//!
//! Hardware drivers and the device framework live outside this workspace;
//! they plug in by implementing these traits. Implementations must not block.

use core::fmt;
use std::time::Duration;

use crate::properties::{PropertyId, PropertyValue};

/// ADC input selector (board pin or mux channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnalogChannel(pub u8);

impl fmt::Display for AnalogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "adc{}", self.0)
    }
}

/// Digital output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub u8);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

/// Raw analog sampling, full scale 0..=65535.
pub trait AnalogInput: Send {
    fn read(&mut self, channel: AnalogChannel) -> u16;
}

/// Digital output lines.
pub trait DigitalOutput: Send {
    fn set(&mut self, pin: PinId, high: bool);
}

/// Sink for derived values (the device framework's property publisher).
pub trait PropertySink: Send + Sync {
    fn publish(&self, id: PropertyId, value: PropertyValue);
}

/// A component driven at a fixed cadence by the scheduler.
///
/// `now` is the scheduler's monotonic time at the moment the tick fires.
pub trait Tickable {
    fn tick(&mut self, now: Duration);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PropertySink for NullSink {
    fn publish(&self, _id: PropertyId, _value: PropertyValue) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display() {
        assert_eq!(AnalogChannel(26).to_string(), "adc26");
        assert_eq!(PinId(15).to_string(), "gpio15");
    }
}
