//! Job orchestrator implementation.
//!
//! Each submitted job runs on its own task:
//! - Reset: the listing store is cleared before any site runs
//! - Sites: one scraper at a time, in the requested order, fail-fast
//! - Registry: tasks are tracked by job id so they can be awaited or cancelled

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::job::{Job, JobError, JobStatus, JobStore, JobUpdate, NewJob};
use crate::listing::ListingStore;
use crate::metrics;
use crate::scraper::{ScraperError, ScraperEvent, SiteScraper, SiteTask};

use super::config::OrchestratorConfig;
use super::progress::{completion_message, partial_progress, site_completed_progress};
use super::types::{CreateJobRequest, JobOutcome, OrchestratorError};

/// Error recorded when the listing store cannot be cleared.
pub const RESET_FAILED_MESSAGE: &str = "Failed to clear existing listings before scraping";

/// Error recorded when a job is cancelled before finishing.
pub const CANCELLED_MESSAGE: &str = "Job cancelled";

/// Status shown while a job waits for another job to release the listing store.
pub const WAITING_MESSAGE: &str = "Oczekiwanie na zakończenie poprzedniego zadania";

const EVENT_BUFFER: usize = 32;

/// A job task tracked in the registry.
struct RunningJob {
    abort: AbortHandle,
    /// Flips to `true` when the task finishes. Closed if the task is aborted.
    done: watch::Receiver<bool>,
}

/// Drives scraping jobs from creation to a terminal state.
#[derive(Clone)]
pub struct JobOrchestrator {
    config: OrchestratorConfig,
    job_store: Arc<dyn JobStore>,
    listing_store: Arc<dyn ListingStore>,
    scraper: Arc<dyn SiteScraper>,
    known_sites: Arc<Vec<String>>,

    // Runtime state
    lease: Arc<Mutex<()>>,
    running: Arc<RwLock<HashMap<String, RunningJob>>>,
}

impl JobOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        job_store: Arc<dyn JobStore>,
        listing_store: Arc<dyn ListingStore>,
        scraper: Arc<dyn SiteScraper>,
        known_sites: Vec<String>,
    ) -> Self {
        Self {
            config,
            job_store,
            listing_store,
            scraper,
            known_sites: Arc::new(known_sites),
            lease: Arc::new(Mutex::new(())),
            running: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Site ids accepted by [`submit`](Self::submit), in configured order.
    pub fn known_sites(&self) -> &[String] {
        &self.known_sites
    }

    /// Validate the request, create the job record and start the job.
    ///
    /// Returns as soon as the record exists; the job itself runs detached.
    pub async fn submit(&self, request: CreateJobRequest) -> Result<String, OrchestratorError> {
        request.validate(&self.known_sites)?;

        let city = request.city.trim().to_string();
        let mut new_job = NewJob::new(city.clone());
        if let Some(ref id) = request.id {
            new_job = new_job.with_id(id.trim());
        }

        let job = self.job_store.create(new_job).map_err(|e| match e {
            JobError::AlreadyExists(id) => OrchestratorError::DuplicateJob(id),
            other => OrchestratorError::JobStore(other),
        })?;

        info!(
            job_id = %job.id,
            city = %city,
            sites = ?request.sites,
            scraper = self.scraper.name(),
            "Scraping job created"
        );

        self.spawn_job(job.id.clone(), city, request.sites, request.max_pages)
            .await;

        Ok(job.id)
    }

    async fn spawn_job(
        &self,
        job_id: String,
        city: String,
        sites: Vec<String>,
        max_pages: Option<u32>,
    ) {
        let (done_tx, done_rx) = watch::channel(false);

        // Held across the spawn so the task cannot deregister before it is registered.
        let mut running = self.running.write().await;

        let this = self.clone();
        let id = job_id.clone();
        let handle = tokio::spawn(async move {
            this.run_job(&id, &city, &sites, max_pages).await;
            this.running.write().await.remove(&id);
            let _ = done_tx.send(true);
        });

        running.insert(
            job_id,
            RunningJob {
                abort: handle.abort_handle(),
                done: done_rx,
            },
        );
    }

    /// Run a job to its terminal state.
    ///
    /// The job record must already exist. Every outcome, including reset and
    /// scraper failures, is written to the record rather than returned as an error.
    pub async fn run_job(
        &self,
        job_id: &str,
        city: &str,
        sites: &[String],
        max_pages: Option<u32>,
    ) -> JobOutcome {
        let _lease = if self.config.serialize_jobs {
            match self.lease.try_lock() {
                Ok(guard) => Some(guard),
                Err(_) => {
                    debug!(job_id, "Waiting for listing store lease");
                    self.write_progress(
                        job_id,
                        JobUpdate {
                            current_status_message: Some(WAITING_MESSAGE.to_string()),
                            ..Default::default()
                        },
                    );
                    Some(self.lease.lock().await)
                }
            }
        } else {
            None
        };

        metrics::JOBS_STARTED.inc();
        info!(job_id, city, site_count = sites.len(), "Starting scraping job");

        match self.listing_store.clear_all() {
            Ok(deleted) => debug!(job_id, deleted, "Listing store cleared"),
            Err(e) => {
                error!(job_id, error = %e, "Failed to clear listing store");
                return self.finish(job_id, 0, 0, Some(RESET_FAILED_MESSAGE.to_string()));
            }
        }

        let total = sites.len();
        let mut total_found = 0u64;
        let mut completed = 0usize;

        for site in sites {
            let task = SiteTask::new(site.clone(), city, job_id, max_pages);

            match self.run_site(task, completed, total, total_found).await {
                Ok(found) => {
                    total_found = total_found.saturating_add(found);
                    completed += 1;

                    info!(job_id, site = %site, found, total_found, "Site completed");

                    if completed < total {
                        self.write_progress(
                            job_id,
                            JobUpdate::site_finished(
                                site_completed_progress(completed, total),
                                total_found,
                            ),
                        );
                    }
                }
                Err(e) => {
                    let message = format!("Scraping {} failed: {}", site, e.diagnostics_or_unknown());
                    error!(job_id, site = %site, error = %e, "Site scraper failed");
                    return self.finish(job_id, total_found, completed, Some(message));
                }
            }
        }

        self.finish(job_id, total_found, completed, None)
    }

    /// Runs one site, forwarding status events to the job record as they arrive.
    async fn run_site(
        &self,
        task: SiteTask,
        completed: usize,
        total: usize,
        total_found: u64,
    ) -> Result<u64, ScraperError> {
        let job_id = task.job_id.clone();
        let site = task.site.clone();
        let progress = partial_progress(completed, total);
        let start = Instant::now();

        debug!(job_id = %job_id, site = %site, progress, "Starting site");

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let run = self.scraper.run(task, tx);
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                biased;
                Some(event) = rx.recv() => {
                    self.on_event(&job_id, event, progress, total_found);
                }
                result = &mut run => break result,
            }
        };

        // Events sent just before exit are still buffered.
        while let Ok(event) = rx.try_recv() {
            self.on_event(&job_id, event, progress, total_found);
        }

        metrics::SITE_DURATION
            .with_label_values(&[site.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                metrics::SITE_RUNS
                    .with_label_values(&[site.as_str(), "success"])
                    .inc();
                metrics::LISTINGS_FOUND
                    .with_label_values(&[site.as_str()])
                    .inc_by(outcome.found);
                Ok(outcome.found)
            }
            Err(e) => {
                metrics::SITE_RUNS
                    .with_label_values(&[site.as_str(), "failure"])
                    .inc();
                Err(e)
            }
        }
    }

    fn on_event(&self, job_id: &str, event: ScraperEvent, progress: u8, total_found: u64) {
        match event {
            ScraperEvent::Status(message) => {
                debug!(job_id, progress, message = %message, "Scraper status");
                self.write_progress(
                    job_id,
                    JobUpdate::in_progress(progress, total_found, message),
                );
            }
        }
    }

    /// Progress writes are best effort; a lost update must not stop the job.
    fn write_progress(&self, job_id: &str, update: JobUpdate) {
        if let Err(e) = self.job_store.update(job_id, update) {
            warn!(job_id, error = %e, "Failed to update job progress");
        }
    }

    /// Writes the single terminal update for a job.
    fn finish(
        &self,
        job_id: &str,
        total_found: u64,
        sites_completed: usize,
        error: Option<String>,
    ) -> JobOutcome {
        let (status, update) = match error {
            None => {
                let message = completion_message(&self.config.completion_message, total_found);
                (
                    JobStatus::Completed,
                    JobUpdate::completed(total_found, message),
                )
            }
            Some(ref error) => (
                JobStatus::Failed,
                JobUpdate::failed(error.clone()).with_total_found(total_found),
            ),
        };

        if let Err(e) = self.job_store.update(job_id, update) {
            error!(job_id, error = %e, "Failed to record job result");
        }

        metrics::JOBS_FINISHED
            .with_label_values(&[status.as_str()])
            .inc();
        info!(job_id, status = %status, total_found, sites_completed, "Scraping job finished");

        JobOutcome {
            job_id: job_id.to_string(),
            status,
            total_found,
            sites_completed,
            error,
        }
    }

    /// Whether a task for this job is still running.
    pub async fn is_active(&self, job_id: &str) -> bool {
        self.running.read().await.contains_key(job_id)
    }

    /// Ids of all running jobs, sorted.
    pub async fn active_jobs(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.running.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Wait for a job's task to end and return the final record.
    ///
    /// Returns immediately for jobs that are not running.
    pub async fn wait(&self, job_id: &str) -> Result<Job, OrchestratorError> {
        let done = self
            .running
            .read()
            .await
            .get(job_id)
            .map(|job| job.done.clone());

        if let Some(mut done) = done {
            let _ = done.wait_for(|finished| *finished).await;
        }

        self.job_store
            .get(job_id)?
            .ok_or_else(|| OrchestratorError::JobNotFound(job_id.to_string()))
    }

    /// Stop a running job and record it as failed.
    ///
    /// Dropping the task kills its scraper process. Returns `false` if the job
    /// was not running or reached a terminal state on its own first.
    pub async fn cancel(&self, job_id: &str) -> Result<bool, OrchestratorError> {
        let entry = self.running.write().await.remove(job_id);

        let Some(mut entry) = entry else {
            return match self.job_store.get(job_id)? {
                Some(_) => Ok(false),
                None => Err(OrchestratorError::JobNotFound(job_id.to_string())),
            };
        };

        entry.abort.abort();
        let _ = entry.done.wait_for(|finished| *finished).await;

        match self.job_store.get(job_id)? {
            Some(job) if !job.status.is_terminal() => {
                self.job_store
                    .update(job_id, JobUpdate::failed(CANCELLED_MESSAGE))?;
                metrics::JOBS_FINISHED
                    .with_label_values(&[JobStatus::Failed.as_str()])
                    .inc();
                info!(job_id, "Scraping job cancelled");
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(OrchestratorError::JobNotFound(job_id.to_string())),
        }
    }

    /// Cancel every running job.
    pub async fn shutdown(&self) {
        let ids = self.active_jobs().await;
        if !ids.is_empty() {
            info!(count = ids.len(), "Cancelling running scraping jobs");
        }

        for id in ids {
            if let Err(e) = self.cancel(&id).await {
                warn!(job_id = %id, error = %e, "Failed to cancel job during shutdown");
            }
        }
    }

    /// Delete finished jobs started more than `retention_days` ago.
    pub fn prune_finished(&self, retention_days: u32) -> Result<usize, OrchestratorError> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));
        let deleted = self.job_store.delete_finished_before(cutoff)?;
        if deleted > 0 {
            info!(deleted, retention_days, "Pruned finished scraping jobs");
        }
        Ok(deleted)
    }
}
