use thiserror::Error;

use super::{Listing, UpsertSummary};

/// Error type for listing storage.
#[derive(Debug, Error)]
pub enum ListingError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// The shared listing table that every job replaces wholesale.
pub trait ListingStore: Send + Sync {
    /// Remove every listing. Returns the number of rows removed.
    fn clear_all(&self) -> Result<u64, ListingError>;

    /// Insert a batch in one transaction.
    ///
    /// Rows that fail individually are counted, not fatal.
    fn bulk_upsert(&self, listings: &[Listing]) -> Result<UpsertSummary, ListingError>;

    /// Number of stored listings.
    fn count(&self) -> Result<u64, ListingError>;
}
