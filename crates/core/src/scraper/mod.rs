//! Site scrapers: the external processes that fetch listings for one site.
//!
//! The orchestrator only sees the [`SiteScraper`] trait. The production
//! implementation, [`ProcessSiteScraper`], starts one OS process per job-site
//! pair and decodes its stdout with the [`protocol`] parser:
//!
//! - `STATUS:<message>` lines become [`ScraperEvent::Status`] as they arrive
//! - the first `found: <N>` anywhere in stdout is the site's result count
//! - a non-zero exit is a failure carrying the captured stderr
//!
//! # Example
//!
//! ```ignore
//! use mieszkanieo_core::scraper::{ProcessSiteScraper, ScraperConfig, SiteScraper, SiteTask};
//!
//! let scraper = ProcessSiteScraper::new(ScraperConfig::default());
//! let (tx, mut rx) = tokio::sync::mpsc::channel(16);
//!
//! let outcome = scraper
//!     .run(SiteTask::new("otodom", "Katowice", "job-1", Some(3)), tx)
//!     .await?;
//! println!("found {} listings", outcome.found);
//! ```

mod config;
mod error;
mod process;
pub mod protocol;
mod traits;
mod types;

pub use config::{ScraperConfig, SiteDefinition, DEFAULT_SITES};
pub use error::ScraperError;
pub use process::ProcessSiteScraper;
pub use protocol::{parse_found_count, parse_status_line, ProtocolParser};
pub use traits::SiteScraper;
pub use types::{ScraperEvent, SiteOutcome, SiteTask};
