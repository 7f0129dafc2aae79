//! Job record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a scraping job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Column default; jobs created through the orchestrator start as `Running`.
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns the status as stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `Completed` and `Failed` admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn all() -> [JobStatus; 4] {
        [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// A persisted scraping job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque unique id, immutable.
    pub id: String,
    /// Target region as supplied at creation.
    pub city: String,
    pub status: JobStatus,
    /// Percent in `[0, 100]`, non-decreasing while the job runs.
    pub progress: u8,
    /// Listings discovered by fully completed sites.
    pub total_found: u64,
    /// Last human-readable progress message; no history is kept.
    pub current_status_message: Option<String>,
    pub started_at: DateTime<Utc>,
    /// Set exactly once, together with a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// Root cause, only on `Failed`.
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a job record.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    /// Caller-supplied id; a UUID is generated when `None`.
    pub id: Option<String>,
    pub city: String,
}

impl NewJob {
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            id: None,
            city: city.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Partial update of a job record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub total_found: Option<u64>,
    pub current_status_message: Option<String>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    /// Mid-site progress write.
    pub fn in_progress(progress: u8, total_found: u64, message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Running),
            progress: Some(progress),
            total_found: Some(total_found),
            current_status_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Site finished but more remain.
    pub fn site_finished(progress: u8, total_found: u64) -> Self {
        Self {
            status: Some(JobStatus::Running),
            progress: Some(progress),
            total_found: Some(total_found),
            ..Default::default()
        }
    }

    /// Terminal success.
    pub fn completed(total_found: u64, message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            total_found: Some(total_found),
            current_status_message: Some(message.into()),
            completed_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Terminal failure. Progress and totals keep their last written values.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            completed_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Also records the listing total.
    pub fn with_total_found(mut self, total_found: u64) -> Self {
        self.total_found = Some(total_found);
        self
    }

    /// True if this update moves the job into a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.map(|s| s.is_terminal()).unwrap_or(false)
    }
}
