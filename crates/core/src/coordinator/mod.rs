//! Job coordinator.
//!
//! Spawns a [`TranscodeWorker`](crate::worker::TranscodeWorker) per accepted
//! upload and relays every worker message, unchanged, to the observer
//! registry.

mod runner;
mod types;

pub use runner::JobCoordinator;
pub use types::CoordinatorStatus;
