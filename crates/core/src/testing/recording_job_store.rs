//! Job store wrapper that keeps every successful write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::job::{Job, JobError, JobFilter, JobStore, JobUpdate, NewJob};

/// Wraps a [`JobStore`] and records the record state after each write.
///
/// Rejected updates are counted but not recorded, so the history of a job is
/// exactly the sequence of states a poller could have observed.
pub struct RecordingJobStore {
    inner: Arc<dyn JobStore>,
    history: Mutex<Vec<Job>>,
    rejected: Mutex<Vec<String>>,
    drop_progress: AtomicBool,
}

impl RecordingJobStore {
    pub fn new(inner: Arc<dyn JobStore>) -> Self {
        Self {
            inner,
            history: Mutex::new(Vec::new()),
            rejected: Mutex::new(Vec::new()),
            drop_progress: AtomicBool::new(false),
        }
    }

    /// Rejects every non-terminal update while set.
    pub fn set_drop_progress_writes(&self, drop: bool) {
        self.drop_progress.store(drop, Ordering::SeqCst);
    }

    /// Every recorded state of a job, creation first.
    pub fn history(&self, job_id: &str) -> Vec<Job> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.id == job_id)
            .cloned()
            .collect()
    }

    /// Number of updates the inner store rejected for a job.
    pub fn rejected_count(&self, job_id: &str) -> usize {
        self.rejected
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == job_id)
            .count()
    }
}

impl JobStore for RecordingJobStore {
    fn create(&self, new_job: NewJob) -> Result<Job, JobError> {
        let job = self.inner.create(new_job)?;
        self.history.lock().unwrap().push(job.clone());
        Ok(job)
    }

    fn get(&self, id: &str) -> Result<Option<Job>, JobError> {
        self.inner.get(id)
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError> {
        self.inner.list(filter)
    }

    fn count(&self, filter: &JobFilter) -> Result<i64, JobError> {
        self.inner.count(filter)
    }

    fn update(&self, id: &str, update: JobUpdate) -> Result<Job, JobError> {
        if !update.is_terminal() && self.drop_progress.load(Ordering::SeqCst) {
            self.rejected.lock().unwrap().push(id.to_string());
            return Err(JobError::Database("progress write dropped".to_string()));
        }

        match self.inner.update(id, update) {
            Ok(job) => {
                self.history.lock().unwrap().push(job.clone());
                Ok(job)
            }
            Err(e) => {
                self.rejected.lock().unwrap().push(id.to_string());
                Err(e)
            }
        }
    }

    fn delete_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize, JobError> {
        self.inner.delete_finished_before(cutoff)
    }
}
