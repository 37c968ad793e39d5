//! Heating curve: target supply temperature from outside temperature.
//!
//! `target = min(origin + outside · slope, ceiling)`. The slope is normally
//! negative, so colder weather asks for hotter supply water.

use std::sync::Arc;

use fh_core::{PropertyId, PropertySink, PropertyValue, strictly_within, within};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ControlError, ControlResult};

/// Heating curve parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatingCurve {
    /// Supply temperature change per degree outside, within (-1, 1).
    pub slope: f64,
    /// Supply temperature at 0 °C outside, within [0, 50] °C.
    pub origin: f64,
    /// Upper bound for the supply temperature, within [20, 50] °C.
    pub ceiling: f64,
}

impl Default for HeatingCurve {
    fn default() -> Self {
        Self {
            slope: -0.3,
            origin: 35.0,
            ceiling: 40.0,
        }
    }
}

impl HeatingCurve {
    pub fn valid_slope(slope: f64) -> bool {
        strictly_within(slope, -1.0, 1.0)
    }

    pub fn valid_origin(origin: f64) -> bool {
        within(origin, 0.0, 50.0)
    }

    pub fn valid_ceiling(ceiling: f64) -> bool {
        within(ceiling, 20.0, 50.0)
    }

    pub fn validate(&self) -> ControlResult<()> {
        if !Self::valid_slope(self.slope) {
            return Err(ControlError::InvalidArg {
                what: "slope must be within (-1, 1)",
            });
        }
        if !Self::valid_origin(self.origin) {
            return Err(ControlError::InvalidArg {
                what: "origin must be within [0, 50]",
            });
        }
        if !Self::valid_ceiling(self.ceiling) {
            return Err(ControlError::InvalidArg {
                what: "ceiling must be within [20, 50]",
            });
        }
        Ok(())
    }

    pub fn target(&self, outside: f64) -> f64 {
        (self.origin + outside * self.slope).min(self.ceiling)
    }
}

/// Owns the heating curve and publishes its parameters and results.
pub struct SetpointCalculator {
    curve: HeatingCurve,
    sink: Arc<dyn PropertySink>,
}

impl SetpointCalculator {
    pub fn new(curve: HeatingCurve, sink: Arc<dyn PropertySink>) -> ControlResult<Self> {
        curve.validate()?;
        Ok(Self { curve, sink })
    }

    pub fn curve(&self) -> &HeatingCurve {
        &self.curve
    }

    /// Target supply temperature for `outside`, published as
    /// `targetFlowTemperature`.
    pub fn calculate_target_temperature(&self, outside: f64) -> f64 {
        let target = self.curve.target(outside);
        self.sink
            .publish(PropertyId::TargetFlowTemperature, PropertyValue::Float(target));
        target
    }

    pub fn set_slope(&mut self, slope: f64) -> bool {
        self.apply(PropertyId::Slope, slope, HeatingCurve::valid_slope, |c| {
            &mut c.slope
        })
    }

    pub fn set_origin(&mut self, origin: f64) -> bool {
        self.apply(PropertyId::Origin, origin, HeatingCurve::valid_origin, |c| {
            &mut c.origin
        })
    }

    pub fn set_ceiling(&mut self, ceiling: f64) -> bool {
        self.apply(
            PropertyId::MaxFlowTemp,
            ceiling,
            HeatingCurve::valid_ceiling,
            |c| &mut c.ceiling,
        )
    }

    fn apply(
        &mut self,
        id: PropertyId,
        value: f64,
        valid: fn(f64) -> bool,
        field: fn(&mut HeatingCurve) -> &mut f64,
    ) -> bool {
        if !valid(value) {
            warn!(param = %id, value, "rejected heating curve parameter");
            return false;
        }
        *field(&mut self.curve) = value;
        self.sink.publish(id, PropertyValue::Float(value));
        true
    }
}
