//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (started, finished by status)
//! - Site scraper runs (result, duration, listings found)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs started total.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mieszkanieo_jobs_started_total", "Total scraping jobs started").unwrap()
});

/// Jobs reaching a terminal state, by status.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mieszkanieo_jobs_finished_total",
            "Total scraping jobs finished",
        ),
        &["status"], // "completed", "failed"
    )
    .unwrap()
});

// =============================================================================
// Site Scraper Metrics
// =============================================================================

/// Scraper runs by site and result.
pub static SITE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mieszkanieo_site_runs_total", "Total site scraper runs"),
        &["site", "result"], // result: "success", "failure"
    )
    .unwrap()
});

/// Scraper run duration in seconds.
pub static SITE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mieszkanieo_site_duration_seconds",
            "Duration of a site scraper run",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["site"],
    )
    .unwrap()
});

/// Listings reported by successful scraper runs.
pub static LISTINGS_FOUND: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mieszkanieo_listings_found_total",
            "Total listings found by site scrapers",
        ),
        &["site"],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(SITE_RUNS.clone()),
        Box::new(SITE_DURATION.clone()),
        Box::new(LISTINGS_FOUND.clone()),
    ]
}
