//! Heat pump enable output.

use std::sync::Arc;

use fh_core::{DigitalOutput, PinId, PropertyId, PropertySink, PropertyValue};
use tracing::info;

pub struct HeatPump {
    output: Box<dyn DigitalOutput>,
    pin: PinId,
    on: bool,
    sink: Arc<dyn PropertySink>,
}

impl HeatPump {
    /// Starts switched off. Nothing is written until [`on`](Self::on) or
    /// [`off`](Self::off) is called.
    pub fn new(output: Box<dyn DigitalOutput>, pin: PinId, sink: Arc<dyn PropertySink>) -> Self {
        Self {
            output,
            pin,
            on: false,
            sink,
        }
    }

    pub fn on(&mut self) {
        self.switch(true);
    }

    pub fn off(&mut self) {
        self.switch(false);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    fn switch(&mut self, on: bool) {
        self.output.set(self.pin, on);
        self.on = on;
        let state = if on { "on" } else { "off" };
        info!(pin = %self.pin, state, "heat pump");
        self.sink
            .publish(PropertyId::HeatPump, PropertyValue::Enum(state));
    }
}
