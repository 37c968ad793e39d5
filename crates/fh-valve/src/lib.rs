//! Two-wire motor valve actuation without position feedback.
//!
//! The valve position is estimated by counting motor ticks. [`ValveActuator`]
//! runs on the fast cadence and moves toward the target published through a
//! [`ValveHandle`]; [`ValvePins`] guarantees the open and close lines are never
//! energised together. Drift is removed by periodic full-close calibration.

pub mod actuator;
pub mod drive;
pub mod error;
pub mod handle;

pub use actuator::{MotionState, ValveActuator, ValveConfig, ValveSnapshot};
pub use drive::{Drive, ValvePins};
pub use error::{ValveError, ValveResult};
pub use handle::ValveHandle;
