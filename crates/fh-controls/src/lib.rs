//! Regulation primitives for the floor-heating controller.
//!
//! # Architecture
//!
//! - [`HeatingCurve`] / [`SetpointCalculator`]: outside temperature to target
//!   supply temperature
//! - [`PidController`]: pure PID step with output clamping and anti-windup
//! - [`SampleGate`]: minimum-interval gating for sampled controllers
//! - [`FlowRegulator`]: wall-clock driven PI loop producing a valve command
//!
//! Parameter setters follow the embedded convention: invalid values are
//! ignored, the previous value stays in effect and the caller gets `false`.

pub mod controller;
pub mod error;
pub mod heating_curve;
pub mod regulator;
pub mod sampled;

pub use controller::{PidController, PidState};
pub use error::{ControlError, ControlResult};
pub use heating_curve::{HeatingCurve, SetpointCalculator};
pub use regulator::{FlowRegulator, RegulatorConfig};
pub use sampled::SampleGate;
