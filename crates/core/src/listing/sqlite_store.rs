//! SQLite-backed listing store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use tracing::warn;

use super::{Listing, ListingError, ListingStore, UpsertSummary};

/// SQLite-backed listing store.
pub struct SqliteListingStore {
    conn: Mutex<Connection>,
}

impl SqliteListingStore {
    /// Open or create the database at `path`.
    pub fn new(path: &Path) -> Result<Self, ListingError> {
        let conn = Connection::open(path).map_err(|e| ListingError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, ListingError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ListingError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ListingError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS properties (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                price INTEGER NOT NULL,
                area INTEGER,
                rooms INTEGER,
                level INTEGER,
                address TEXT NOT NULL,
                image TEXT,
                link TEXT NOT NULL UNIQUE,
                site TEXT NOT NULL,
                city TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_properties_site ON properties(site);
            CREATE INDEX IF NOT EXISTS idx_properties_price ON properties(price);
            "#,
        )
        .map_err(|e| ListingError::Database(e.to_string()))
    }
}

impl ListingStore for SqliteListingStore {
    fn clear_all(&self) -> Result<u64, ListingError> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn
            .execute("DELETE FROM properties", [])
            .map_err(|e| ListingError::Database(e.to_string()))?;
        Ok(deleted as u64)
    }

    fn bulk_upsert(&self, listings: &[Listing]) -> Result<UpsertSummary, ListingError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| ListingError::Database(e.to_string()))?;

        let mut summary = UpsertSummary {
            total: listings.len(),
            ..Default::default()
        };

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO properties (id, title, price, area, rooms, level, address, site, link, image, city) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .map_err(|e| ListingError::Database(e.to_string()))?;

            for listing in listings {
                let result = stmt.execute(params![
                    listing.id.trim(),
                    listing.title.trim(),
                    listing.price,
                    listing.area,
                    listing.rooms,
                    listing.level,
                    listing.address.trim(),
                    listing.site.trim(),
                    listing.link.trim(),
                    listing.image.as_deref().map(str::trim),
                    listing.city.as_deref().map(str::trim),
                ]);

                match result {
                    Ok(0) => summary.skipped += 1,
                    Ok(_) => summary.saved += 1,
                    Err(e) => {
                        warn!(listing_id = %listing.id, error = %e, "Failed to insert listing");
                        summary.errors += 1;
                    }
                }
            }
        }

        tx.commit()
            .map_err(|e| ListingError::Database(e.to_string()))?;

        Ok(summary)
    }

    fn count(&self) -> Result<u64, ListingError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))
            .map_err(|e| ListingError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, link: &str) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Oferta {}", id),
            price: 300_000,
            area: Some(40),
            rooms: Some(2),
            level: None,
            address: "Gliwice".to_string(),
            image: None,
            link: link.to_string(),
            site: "otodom".to_string(),
            city: Some("gliwice".to_string()),
        }
    }

    #[test]
    fn test_bulk_upsert_counts_saved_and_skipped() {
        let store = SqliteListingStore::in_memory().unwrap();
        let first = store
            .bulk_upsert(&[listing("a", "https://x/a"), listing("b", "https://x/b")])
            .unwrap();
        assert_eq!(
            first,
            UpsertSummary {
                total: 2,
                saved: 2,
                skipped: 0,
                errors: 0
            }
        );

        // Same link under a new id and same id under a new link are both ignored.
        let second = store
            .bulk_upsert(&[
                listing("c", "https://x/a"),
                listing("a", "https://x/new"),
                listing("d", "https://x/d"),
            ])
            .unwrap();
        assert_eq!(second.saved, 1);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_clear_all_returns_deleted_count() {
        let store = SqliteListingStore::in_memory().unwrap();
        store
            .bulk_upsert(&[listing("a", "https://x/a"), listing("b", "https://x/b")])
            .unwrap();

        assert_eq!(store.clear_all().unwrap(), 2);
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.clear_all().unwrap(), 0);
    }

    #[test]
    fn test_empty_batch() {
        let store = SqliteListingStore::in_memory().unwrap();
        let summary = store.bulk_upsert(&[]).unwrap();
        assert_eq!(summary, UpsertSummary::default());
    }

    #[test]
    fn test_shares_file_with_job_store() {
        use crate::job::{JobStore, NewJob};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");

        let jobs = crate::job::SqliteJobStore::new(&path).unwrap();
        let listings = SqliteListingStore::new(&path).unwrap();

        jobs.create(NewJob::new("katowice")).unwrap();
        listings
            .bulk_upsert(&[listing("a", "https://x/a")])
            .unwrap();
        assert_eq!(listings.count().unwrap(), 1);
    }
}
