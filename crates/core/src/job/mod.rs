//! Scraping job records and their storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteJobStore;
pub use store::{apply_update, check_update, JobError, JobFilter, JobStore};
pub use types::{Job, JobStatus, JobUpdate, NewJob};
