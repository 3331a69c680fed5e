//! Notification fan-out to connected observers.

mod registry;

pub use registry::{ObserverConnection, ObserverId, ObserverRegistry};
