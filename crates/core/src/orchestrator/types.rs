//! Types for the job orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{JobError, JobStatus};

/// Longest accepted city name, in characters.
pub const MAX_CITY_LEN: usize = 100;

/// Longest accepted caller-supplied job id, in characters.
pub const MAX_JOB_ID_LEN: usize = 50;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Malformed job creation input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested site is not configured.
    #[error("unknown site: {0}")]
    UnknownSite(String),

    /// A job with the caller-supplied id already exists.
    #[error("job already exists: {0}")]
    DuplicateJob(String),

    /// Job not found.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Job store error.
    #[error("job store error: {0}")]
    JobStore(#[from] JobError),
}

/// Request to start a scraping job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJobRequest {
    /// Caller-supplied job id. A UUID is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub city: String,
    /// Sites to scrape, in order.
    pub sites: Vec<String>,
    /// Page limit forwarded to every site. Falls back to the scraper default.
    #[serde(default)]
    pub max_pages: Option<u32>,
}

impl CreateJobRequest {
    pub fn new(city: impl Into<String>, sites: Vec<String>) -> Self {
        Self {
            id: None,
            city: city.into(),
            sites,
            max_pages: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Checks the request against the configured sites.
    pub fn validate(&self, known_sites: &[String]) -> Result<(), OrchestratorError> {
        let city = self.city.trim();
        if city.is_empty() {
            return Err(OrchestratorError::Validation(
                "city cannot be empty".to_string(),
            ));
        }
        if city.chars().count() > MAX_CITY_LEN {
            return Err(OrchestratorError::Validation(format!(
                "city cannot be longer than {} characters",
                MAX_CITY_LEN
            )));
        }

        if let Some(ref id) = self.id {
            let len = id.trim().chars().count();
            if len == 0 || len > MAX_JOB_ID_LEN {
                return Err(OrchestratorError::Validation(format!(
                    "id must be between 1 and {} characters",
                    MAX_JOB_ID_LEN
                )));
            }
        }

        if self.sites.is_empty() {
            return Err(OrchestratorError::Validation(
                "at least one site is required".to_string(),
            ));
        }
        if let Some(unknown) = self.sites.iter().find(|s| !known_sites.contains(s)) {
            return Err(OrchestratorError::UnknownSite(unknown.clone()));
        }

        Ok(())
    }
}

/// How a job run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    /// `Completed` or `Failed`.
    pub status: JobStatus,
    pub total_found: u64,
    pub sites_completed: usize,
    pub error: Option<String>,
}
