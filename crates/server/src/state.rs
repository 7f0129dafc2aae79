use mieszkanieo_core::{Config, JobOrchestrator, JobStore, ListingStore, SanitizedConfig};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    job_store: Arc<dyn JobStore>,
    listing_store: Arc<dyn ListingStore>,
    orchestrator: JobOrchestrator,
}

impl AppState {
    pub fn new(
        config: Config,
        job_store: Arc<dyn JobStore>,
        listing_store: Arc<dyn ListingStore>,
        orchestrator: JobOrchestrator,
    ) -> Self {
        Self {
            config,
            job_store,
            listing_store,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn job_store(&self) -> &dyn JobStore {
        self.job_store.as_ref()
    }

    pub fn listing_store(&self) -> &dyn ListingStore {
        self.listing_store.as_ref()
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    /// Site ids jobs and listings may reference, in configured order.
    pub fn known_sites(&self) -> &[String] {
        self.orchestrator.known_sites()
    }
}
