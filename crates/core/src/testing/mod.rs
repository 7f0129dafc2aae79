//! Testing utilities and mock implementations.
//!
//! This module provides test doubles for the orchestrator's collaborators,
//! allowing job lifecycles to be exercised without real scraper processes.
//!
//! # Example
//!
//! ```rust,ignore
//! use mieszkanieo_core::testing::{MockListingStore, MockSiteScraper, RecordingJobStore};
//!
//! let scraper = MockSiteScraper::new();
//! scraper.succeed("s1", 10).await;
//! scraper.fail("s2", 1, "boom").await;
//!
//! let listings = MockListingStore::new();
//! listings.set_fail_clear(true);
//!
//! // Build a JobOrchestrator from these...
//! ```

mod mock_listing_store;
mod mock_scraper;
mod recording_job_store;

pub use mock_listing_store::MockListingStore;
pub use mock_scraper::MockSiteScraper;
pub use recording_job_store::RecordingJobStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::listing::Listing;

    /// Owned site ids from string literals.
    pub fn sites(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// A valid listing with reasonable defaults.
    pub fn listing(id: &str, site: &str) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Mieszkanie {}", id),
            price: 420_000,
            area: Some(52),
            rooms: Some(3),
            level: Some(2),
            address: "Katowice, Śródmieście".to_string(),
            image: Some(format!("https://img.example.com/{}.jpg", id)),
            link: format!("https://{}.example.com/oferta/{}", site, id),
            site: site.to_string(),
            city: Some("katowice".to_string()),
        }
    }
}
