//! Mock listing store for testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::listing::{Listing, ListingError, ListingStore, UpsertSummary};

/// In-memory listing store with a switchable reset failure.
#[derive(Debug, Default)]
pub struct MockListingStore {
    listings: Mutex<Vec<Listing>>,
    clear_calls: AtomicUsize,
    fail_clear: AtomicBool,
}

impl MockListingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `clear_all` fail.
    pub fn set_fail_clear(&self, fail: bool) {
        self.fail_clear.store(fail, Ordering::SeqCst);
    }

    /// Number of `clear_all` calls, including failed ones.
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of stored listings.
    pub fn listings(&self) -> Vec<Listing> {
        self.listings.lock().unwrap().clone()
    }
}

impl ListingStore for MockListingStore {
    fn clear_all(&self) -> Result<u64, ListingError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(ListingError::Database("database is locked".to_string()));
        }

        let mut listings = self.listings.lock().unwrap();
        let deleted = listings.len() as u64;
        listings.clear();
        Ok(deleted)
    }

    fn bulk_upsert(&self, batch: &[Listing]) -> Result<UpsertSummary, ListingError> {
        let mut listings = self.listings.lock().unwrap();
        let mut summary = UpsertSummary {
            total: batch.len(),
            ..Default::default()
        };

        for listing in batch {
            let exists = listings
                .iter()
                .any(|l| l.id == listing.id || l.link == listing.link);
            if exists {
                summary.skipped += 1;
            } else {
                listings.push(listing.clone());
                summary.saved += 1;
            }
        }

        Ok(summary)
    }

    fn count(&self) -> Result<u64, ListingError> {
        Ok(self.listings.lock().unwrap().len() as u64)
    }
}
