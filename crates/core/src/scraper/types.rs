//! Types exchanged with site scrapers.

use serde::{Deserialize, Serialize};

/// One job-site pair handed to a scraper. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteTask {
    pub site: String,
    /// Always lower-cased.
    pub city: String,
    pub job_id: String,
    /// Forwarded verbatim; `None` means unbounded.
    pub max_pages: Option<u32>,
}

impl SiteTask {
    pub fn new(
        site: impl Into<String>,
        city: &str,
        job_id: impl Into<String>,
        max_pages: Option<u32>,
    ) -> Self {
        Self {
            site: site.into(),
            city: city.to_lowercase(),
            job_id: job_id.into(),
            max_pages,
        }
    }
}

/// Event emitted while a scraper is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScraperEvent {
    /// A `STATUS:` line, remainder trimmed.
    Status(String),
}

/// Result of a successful scraper run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteOutcome {
    pub site: String,
    /// First `found: N` count in stdout, 0 if absent.
    pub found: u64,
    pub duration_ms: u64,
}
