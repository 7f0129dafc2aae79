//! Scraping job API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mieszkanieo_core::{CreateJobRequest, Job, JobFilter, JobStatus, OrchestratorError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// Maximum allowed limit for job queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for job queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a scraping job
#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    /// Optional caller-supplied id
    pub id: Option<String>,
    #[serde(default)]
    pub city: String,
    /// Sites to scrape, in order
    #[serde(default)]
    pub sites: Vec<String>,
    pub max_pages: Option<u32>,
}

/// Query parameters for listing jobs
#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    /// Filter by status
    pub status: Option<String>,
    /// Maximum number of jobs to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub id: String,
    pub message: String,
}

/// Job record as seen by polling clients
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub city: String,
    pub status: JobStatus,
    pub progress: u8,
    pub total_found: u64,
    pub current_status: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub error: Option<String>,
    pub updated_at: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            city: job.city,
            status: job.status,
            progress: job.progress,
            total_found: job.total_found,
            current_status: job.current_status_message,
            started_at: job.started_at.to_rfc3339(),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
            error: job.error,
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct CancelJobResponse {
    pub id: String,
    pub cancelled: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

type JobApiError = (StatusCode, Json<JobErrorResponse>);

fn job_error(status: StatusCode, error: impl Into<String>) -> JobApiError {
    (
        status,
        Json(JobErrorResponse {
            error: error.into(),
        }),
    )
}

fn orchestrator_error(e: OrchestratorError) -> JobApiError {
    let status = match &e {
        OrchestratorError::Validation(_) | OrchestratorError::UnknownSite(_) => {
            StatusCode::BAD_REQUEST
        }
        OrchestratorError::DuplicateJob(_) => StatusCode::CONFLICT,
        OrchestratorError::JobNotFound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::JobStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    job_error(status, e.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a scraping job. Returns once the job record exists.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> Result<(StatusCode, Json<CreateJobResponse>), impl IntoResponse> {
    let request = CreateJobRequest {
        id: body.id,
        city: body.city,
        sites: body.sites,
        max_pages: body.max_pages,
    };

    match state.orchestrator().submit(request).await {
        Ok(id) => Ok((
            StatusCode::ACCEPTED,
            Json(CreateJobResponse {
                id,
                message: "Scraping job started".to_string(),
            }),
        )),
        Err(e) => {
            if matches!(e, OrchestratorError::JobStore(_)) {
                warn!("Failed to create scraping job: {}", e);
            }
            Err(orchestrator_error(e))
        }
    }
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, impl IntoResponse> {
    match state.job_store().get(&id) {
        Ok(Some(job)) => Ok(Json(JobResponse::from(job))),
        Ok(None) => Err(job_error(
            StatusCode::NOT_FOUND,
            format!("Scraping job not found: {}", id),
        )),
        Err(e) => Err(job_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// List jobs, newest first
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<ListJobsResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = JobFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref status) = params.status {
        match JobStatus::from_str(status) {
            Ok(status) => filter = filter.with_status(status),
            Err(_) => {
                return Err(job_error(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid status: {}", status),
                ))
            }
        }
    }

    let jobs = match state.job_store().list(&filter) {
        Ok(jobs) => jobs,
        Err(e) => return Err(job_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    };

    let total = match state.job_store().count(&filter) {
        Ok(total) => total,
        Err(e) => return Err(job_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    };

    Ok(Json(ListJobsResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Cancel a running job
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CancelJobResponse>, impl IntoResponse> {
    match state.orchestrator().cancel(&id).await {
        Ok(cancelled) => Ok(Json(CancelJobResponse { id, cancelled })),
        Err(e) => Err(orchestrator_error(e)),
    }
}
