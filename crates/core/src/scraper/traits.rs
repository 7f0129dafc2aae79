//! Trait definitions for the scraper module.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::ScraperError;
use super::types::{ScraperEvent, SiteOutcome, SiteTask};

/// Runs the scraping for one site of one job.
#[async_trait]
pub trait SiteScraper: Send + Sync {
    /// Returns the name of this scraper implementation.
    fn name(&self) -> &str;

    /// Runs the task to completion.
    ///
    /// Status events are sent in stream order while the run is in progress.
    /// If the receiver is dropped, the run continues without reporting.
    async fn run(
        &self,
        task: SiteTask,
        events: mpsc::Sender<ScraperEvent>,
    ) -> Result<SiteOutcome, ScraperError>;
}
