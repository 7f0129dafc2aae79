//! Error types for the scraper module.

use thiserror::Error;

/// Errors that can occur while running a site scraper.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// The site is not configured.
    #[error("Unknown site: {site}")]
    UnknownSite { site: String },

    /// The scraper process could not be started.
    #[error("Failed to launch scraper for {site}: {source}")]
    LaunchFailed {
        site: String,
        #[source]
        source: std::io::Error,
    },

    /// The scraper process exited with a non-zero code.
    #[error("Scraper for {site} exited with code {code:?}")]
    ProcessFailed {
        site: String,
        code: Option<i32>,
        diagnostics: String,
    },

    /// The scraper process exceeded its time limit and was killed.
    #[error("Scraper for {site} timed out after {timeout_secs} seconds")]
    Timeout { site: String, timeout_secs: u64 },

    /// Reading the process output failed; stderr captured so far is kept.
    #[error("Failed to read scraper output for {site}: {source}")]
    Output {
        site: String,
        #[source]
        source: std::io::Error,
        diagnostics: String,
    },

    /// I/O error while talking to the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScraperError {
    /// Creates a new process failed error.
    pub fn process_failed(site: impl Into<String>, code: Option<i32>, diagnostics: String) -> Self {
        Self::ProcessFailed {
            site: site.into(),
            code,
            diagnostics,
        }
    }

    /// The site this error belongs to, when known.
    pub fn site(&self) -> Option<&str> {
        match self {
            Self::UnknownSite { site }
            | Self::LaunchFailed { site, .. }
            | Self::ProcessFailed { site, .. }
            | Self::Timeout { site, .. }
            | Self::Output { site, .. } => Some(site),
            Self::Io(_) => None,
        }
    }

    /// Text recorded on the failed job.
    ///
    /// Captured stderr for process failures, `Unknown error` if it was empty.
    pub fn diagnostics_or_unknown(&self) -> String {
        match self {
            Self::ProcessFailed { diagnostics, .. } => {
                let trimmed = diagnostics.trim();
                if trimmed.is_empty() {
                    "Unknown error".to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Self::LaunchFailed { source, .. } => source.to_string(),
            Self::Output {
                source,
                diagnostics,
                ..
            } => {
                let trimmed = diagnostics.trim();
                if trimmed.is_empty() {
                    source.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            other => other.to_string(),
        }
    }
}
