//! Wiring between the event source, routing, and the projection engine.

pub mod router;
pub mod runner;

pub use router::EventRouter;
pub use runner::{RunSummary, Runner, RunnerError};
