//! fh-core: shared foundation for the floor-heating controller.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (range helpers)
//! - properties (published property ids, settable parameter ids)
//! - ports (hardware and framework capabilities the control core consumes)
//! - clock (monotonic time sources)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod numeric;
pub mod ports;
pub mod properties;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{CoreError, CoreResult};
pub use numeric::{strictly_within, within};
pub use ports::{
    AnalogChannel, AnalogInput, DigitalOutput, NullSink, PinId, PropertySink, Tickable,
};
pub use properties::{ParamId, ParamValue, PropertyId, PropertyValue};
