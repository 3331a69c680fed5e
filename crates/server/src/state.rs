use std::path::Path;
use std::sync::Arc;

use mediashrink_core::{Config, JobCoordinator, ObserverRegistry, StorageNamer};

/// Shared application state
pub struct AppState {
    config: Config,
    namer: StorageNamer,
    coordinator: JobCoordinator,
}

impl AppState {
    pub fn new(config: Config, coordinator: JobCoordinator) -> Self {
        let namer = StorageNamer::new(&config.storage);
        Self {
            config,
            namer,
            coordinator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn namer(&self) -> &StorageNamer {
        &self.namer
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.storage.upload_dir
    }

    pub fn coordinator(&self) -> &JobCoordinator {
        &self.coordinator
    }

    pub fn registry(&self) -> &Arc<ObserverRegistry> {
        self.coordinator.registry()
    }
}
