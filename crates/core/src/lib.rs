pub mod config;
pub mod job;
pub mod listing;
pub mod metrics;
pub mod orchestrator;
pub mod scraper;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    SanitizedConfig, ServerConfig,
};
pub use job::{Job, JobError, JobFilter, JobStatus, JobStore, JobUpdate, NewJob, SqliteJobStore};
pub use listing::{Listing, ListingError, ListingStore, SqliteListingStore, UpsertSummary};
pub use orchestrator::{
    CreateJobRequest, JobOrchestrator, JobOutcome, OrchestratorConfig, OrchestratorError,
};
pub use scraper::{
    ProcessSiteScraper, ScraperConfig, ScraperError, ScraperEvent, SiteDefinition, SiteOutcome,
    SiteScraper, SiteTask,
};
