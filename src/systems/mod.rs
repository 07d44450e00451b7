//! Application systems
//!
//! Per-frame systems kept out of main.rs so they can be tested headless.

mod simulation;
mod telemetry;

pub use simulation::{PlayerInput, SimulationResult, SimulationSystem};
pub use telemetry::TelemetryPoller;
