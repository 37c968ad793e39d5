//! Simulated hydronic plant and hardware for the floor-heating controller.
//!
//! Provides:
//! - [`Plant`]: mixing valve, supply line and floor loop as first-order lags
//! - [`PinBank`] / [`PlantAdc`]: hardware ports backed by the plant state
//! - [`RecordingSink`]: latest published value per property
//! - [`Simulation`]: the full controller against the plant on a manual clock

pub mod error;
pub mod hardware;
pub mod plant;
pub mod sim;
pub mod sink;

pub use error::{SimError, SimResult};
pub use hardware::{PinBank, PlantAdc};
pub use plant::{Actuation, Plant, PlantConfig, PlantState};
pub use sim::{SimOptions, SimSample, Simulation, run_sim};
pub use sink::{Published, RecordingSink};
