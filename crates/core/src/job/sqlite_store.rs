//! SQLite-backed job store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::store::{apply_update, check_update};
use super::{Job, JobError, JobFilter, JobStatus, JobStore, JobUpdate, NewJob};

const JOB_COLUMNS: &str = "id, city, status, progress, total_found, current_status, started_at, completed_at, error, updated_at";

/// SQLite-backed job store.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Create a new SQLite job store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, JobError> {
        let conn = Connection::open(path).map_err(|e| JobError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite job store (useful for testing).
    pub fn in_memory() -> Result<Self, JobError> {
        let conn = Connection::open_in_memory().map_err(|e| JobError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), JobError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scraping_jobs (
                id TEXT PRIMARY KEY,
                city TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                progress INTEGER NOT NULL DEFAULT 0,
                total_found INTEGER NOT NULL DEFAULT 0,
                current_status TEXT,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                error TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_scraping_jobs_status ON scraping_jobs(status);
            CREATE INDEX IF NOT EXISTS idx_scraping_jobs_started_at ON scraping_jobs(started_at DESC);
            "#,
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &JobFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(ref city) = filter.city {
            conditions.push("city = ?");
            params.push(Box::new(city.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        let id: String = row.get(0)?;
        let city: String = row.get(1)?;
        let status_str: String = row.get(2)?;
        let progress: i64 = row.get(3)?;
        let total_found: i64 = row.get(4)?;
        let current_status_message: Option<String> = row.get(5)?;
        let started_at_str: String = row.get(6)?;
        let completed_at_str: Option<String> = row.get(7)?;
        let error: Option<String> = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        let status = status_str.parse().unwrap_or(JobStatus::Pending);

        Ok(Job {
            id,
            city,
            status,
            progress: progress.clamp(0, 100) as u8,
            total_found: total_found.max(0) as u64,
            current_status_message,
            started_at: Self::parse_timestamp(&started_at_str),
            completed_at: completed_at_str.as_deref().map(Self::parse_timestamp),
            error,
            updated_at: Self::parse_timestamp(&updated_at_str),
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Job>, JobError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM scraping_jobs WHERE id = ?", JOB_COLUMNS),
            params![id],
            Self::row_to_job,
        );

        match result {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(JobError::Database(e.to_string())),
        }
    }
}

impl JobStore for SqliteJobStore {
    fn create(&self, new_job: NewJob) -> Result<Job, JobError> {
        let conn = self.conn.lock().unwrap();

        let id = new_job
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let now = Utc::now();

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO scraping_jobs (id, city, status, progress, total_found, started_at, updated_at) VALUES (?, ?, ?, 0, 0, ?, ?)",
                params![
                    id,
                    new_job.city,
                    JobStatus::Running.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .map_err(|e| JobError::Database(e.to_string()))?;

        if inserted == 0 {
            return Err(JobError::AlreadyExists(id));
        }

        Ok(Job {
            id,
            city: new_job.city,
            status: JobStatus::Running,
            progress: 0,
            total_found: 0,
            current_status_message: None,
            started_at: now,
            completed_at: None,
            error: None,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Job>, JobError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch(&conn, id)
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM scraping_jobs {} ORDER BY started_at DESC, rowid DESC LIMIT ? OFFSET ?",
            JOB_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| JobError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_job)
            .map_err(|e| JobError::Database(e.to_string()))?;

        let mut jobs = Vec::new();
        for row_result in rows {
            jobs.push(row_result.map_err(|e| JobError::Database(e.to_string()))?);
        }

        Ok(jobs)
    }

    fn count(&self, filter: &JobFilter) -> Result<i64, JobError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM scraping_jobs {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| JobError::Database(e.to_string()))
    }

    fn update(&self, id: &str, update: JobUpdate) -> Result<Job, JobError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::fetch(&conn, id)?.ok_or_else(|| JobError::NotFound(id.to_string()))?;
        check_update(&current, &update)?;

        let mut job = apply_update(current, update, Utc::now());
        // SQLite integers are signed.
        job.total_found = job.total_found.min(i64::MAX as u64);

        conn.execute(
            "UPDATE scraping_jobs SET status = ?, progress = ?, total_found = ?, current_status = ?, completed_at = ?, error = ?, updated_at = ? WHERE id = ?",
            params![
                job.status.as_str(),
                job.progress as i64,
                job.total_found as i64,
                job.current_status_message,
                job.completed_at.map(|t| t.to_rfc3339()),
                job.error,
                job.updated_at.to_rfc3339(),
                id,
            ],
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(job)
    }

    fn delete_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize, JobError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM scraping_jobs WHERE status IN ('completed', 'failed') AND started_at < ?",
            params![cutoff.to_rfc3339()],
        )
        .map_err(|e| JobError::Database(e.to_string()))
    }
}
