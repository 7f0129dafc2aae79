//! Listing storage: the dataset each scraping job resets and repopulates.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteListingStore;
pub use store::{ListingError, ListingStore};
pub use types::{Listing, UpsertSummary};
