//! Job orchestrator: runs one data refresh per job.
//!
//! A job clears the listing store, then runs each requested site scraper
//! in order, writing progress into the job record as status events arrive:
//! - **Sequential**: one site at a time, in the caller's order
//! - **Fail-fast**: the first failing site ends the job, later sites never run
//! - **Leased**: with `serialize_jobs`, only one job touches the listing store at a time

mod config;
pub mod progress;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::{JobOrchestrator, CANCELLED_MESSAGE, RESET_FAILED_MESSAGE, WAITING_MESSAGE};
pub use types::{CreateJobRequest, JobOutcome, OrchestratorError, MAX_CITY_LEN, MAX_JOB_ID_LEN};
