//! Job storage trait and types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Job, JobStatus, JobUpdate, NewJob};

/// Error type for job record operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job not found.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A job with this id already exists.
    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    /// The job reached a terminal state and accepts no further writes.
    #[error("Job {job_id} is already {status}")]
    AlreadyFinished { job_id: String, status: JobStatus },

    /// The update is malformed.
    #[error("Invalid update for job {job_id}: {reason}")]
    InvalidUpdate { job_id: String, reason: String },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for querying jobs.
#[derive(Debug, Clone)]
pub struct JobFilter {
    /// Filter by status.
    pub status: Option<JobStatus>,
    /// Filter by city (exact match).
    pub city: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl JobFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            city: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Durable keyed storage for job records.
pub trait JobStore: Send + Sync {
    /// Create a job in the `running` state.
    fn create(&self, new_job: NewJob) -> Result<Job, JobError>;

    /// Get a job by ID.
    fn get(&self, id: &str) -> Result<Option<Job>, JobError>;

    /// List jobs matching the filter, newest first.
    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError>;

    /// Count jobs matching the filter (ignores limit/offset).
    fn count(&self, filter: &JobFilter) -> Result<i64, JobError>;

    /// Apply a partial update and return the resulting record.
    ///
    /// Fails with [`JobError::AlreadyFinished`] once the job is terminal.
    fn update(&self, id: &str, update: JobUpdate) -> Result<Job, JobError>;

    /// Delete completed or failed jobs started before `cutoff`.
    /// Returns the number of deleted jobs.
    fn delete_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize, JobError>;
}

/// Checks an update against the current record before it is written.
///
/// Shared by every store so the terminal-state and `completed_at` rules hold
/// regardless of backend.
pub fn check_update(current: &Job, update: &JobUpdate) -> Result<(), JobError> {
    if current.status.is_terminal() {
        return Err(JobError::AlreadyFinished {
            job_id: current.id.clone(),
            status: current.status,
        });
    }

    if let Some(progress) = update.progress {
        if progress > 100 {
            return Err(JobError::InvalidUpdate {
                job_id: current.id.clone(),
                reason: format!("progress {} is out of range", progress),
            });
        }
    }

    if update.completed_at.is_some() && !update.is_terminal() {
        return Err(JobError::InvalidUpdate {
            job_id: current.id.clone(),
            reason: "completed_at requires a terminal status".to_string(),
        });
    }

    Ok(())
}

/// Applies an already-checked update to a record in memory.
pub fn apply_update(current: Job, update: JobUpdate, now: DateTime<Utc>) -> Job {
    Job {
        status: update.status.unwrap_or(current.status),
        progress: update.progress.unwrap_or(current.progress),
        total_found: update.total_found.unwrap_or(current.total_found),
        current_status_message: update
            .current_status_message
            .or(current.current_status_message),
        error: update.error.or(current.error),
        completed_at: update.completed_at.or(current.completed_at),
        updated_at: now,
        ..current
    }
}
