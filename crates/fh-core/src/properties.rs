//! Identifiers for published properties and settable parameters.
//!
//! Names follow the property ids the device framework exposes, so a
//! transport adapter can map topics straight onto these enums.

use core::fmt;
use core::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Every value the control core pushes to the property sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyId {
    OutsideTemperature,
    FlowTemperature,
    RawFlowTemperature,
    ReturnTemperature,
    TargetFlowTemperature,
    ValveTarget,
    ValveCurrent,
    Kp,
    Tn,
    Ki,
    Slope,
    Origin,
    MaxFlowTemp,
    LowpassFilterK2,
    NumberOfOpenValves,
    HeatPump,
}

impl PropertyId {
    pub const ALL: [PropertyId; 16] = [
        PropertyId::OutsideTemperature,
        PropertyId::FlowTemperature,
        PropertyId::RawFlowTemperature,
        PropertyId::ReturnTemperature,
        PropertyId::TargetFlowTemperature,
        PropertyId::ValveTarget,
        PropertyId::ValveCurrent,
        PropertyId::Kp,
        PropertyId::Tn,
        PropertyId::Ki,
        PropertyId::Slope,
        PropertyId::Origin,
        PropertyId::MaxFlowTemp,
        PropertyId::LowpassFilterK2,
        PropertyId::NumberOfOpenValves,
        PropertyId::HeatPump,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyId::OutsideTemperature => "outsideTemperature",
            PropertyId::FlowTemperature => "flowTemperature",
            PropertyId::RawFlowTemperature => "rawFlowTemperature",
            PropertyId::ReturnTemperature => "returnTemperature",
            PropertyId::TargetFlowTemperature => "targetFlowTemperature",
            PropertyId::ValveTarget => "valveTarget",
            PropertyId::ValveCurrent => "valveCurrent",
            PropertyId::Kp => "kP",
            PropertyId::Tn => "tN",
            PropertyId::Ki => "kI",
            PropertyId::Slope => "slope",
            PropertyId::Origin => "origin",
            PropertyId::MaxFlowTemp => "maxFlowTemp",
            PropertyId::LowpassFilterK2 => "lowpassFilterK2",
            PropertyId::NumberOfOpenValves => "numberOfOpenValves",
            PropertyId::HeatPump => "heatPump",
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PropertyValue {
    Float(f64),
    Integer(i64),
    Enum(&'static str),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Integer(v) => Some(*v as f64),
            PropertyValue::Enum(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Float(v) => write!(f, "{v:.2}"),
            PropertyValue::Integer(v) => write!(f, "{v}"),
            PropertyValue::Enum(v) => f.write_str(v),
        }
    }
}

/// Parameters that can be written from outside the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamId {
    Kp,
    Tn,
    Slope,
    Origin,
    MaxFlowTemp,
    LowpassFilterK2,
    NumberOfOpenValves,
    ValveTarget,
}

impl ParamId {
    pub const ALL: [ParamId; 8] = [
        ParamId::Kp,
        ParamId::Tn,
        ParamId::Slope,
        ParamId::Origin,
        ParamId::MaxFlowTemp,
        ParamId::LowpassFilterK2,
        ParamId::NumberOfOpenValves,
        ParamId::ValveTarget,
    ];

    /// The property that mirrors this parameter once accepted.
    pub fn property(self) -> PropertyId {
        match self {
            ParamId::Kp => PropertyId::Kp,
            ParamId::Tn => PropertyId::Tn,
            ParamId::Slope => PropertyId::Slope,
            ParamId::Origin => PropertyId::Origin,
            ParamId::MaxFlowTemp => PropertyId::MaxFlowTemp,
            ParamId::LowpassFilterK2 => PropertyId::LowpassFilterK2,
            ParamId::NumberOfOpenValves => PropertyId::NumberOfOpenValves,
            ParamId::ValveTarget => PropertyId::ValveTarget,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.property().as_str()
    }

    fn is_integer(self) -> bool {
        matches!(self, ParamId::NumberOfOpenValves | ParamId::ValveTarget)
    }

    /// Parse a raw payload into the value type this parameter carries.
    ///
    /// Range validation is left to the owning component.
    pub fn parse_payload(self, payload: &str) -> CoreResult<ParamValue> {
        let trimmed = payload.trim();
        let malformed = || CoreError::MalformedPayload {
            param: self.as_str(),
            payload: payload.to_string(),
        };
        if self.is_integer() {
            trimmed
                .parse::<i64>()
                .map(ParamValue::Integer)
                .map_err(|_| malformed())
        } else {
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(ParamValue::Float(v)),
                _ => Err(malformed()),
            }
        }
    }
}

impl FromStr for ParamId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamId::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::UnknownParam {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed parameter payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Integer(i64),
}

impl ParamValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ParamValue::Float(v) => v,
            ParamValue::Integer(v) => v as f64,
        }
    }

    /// Integer view; fractional floats are rejected.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            ParamValue::Integer(v) => Some(v),
            ParamValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(v as i64),
            ParamValue::Float(_) => None,
        }
    }
}
