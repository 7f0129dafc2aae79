//! Mock site scraper for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify, RwLock};

use crate::scraper::{ScraperError, ScraperEvent, SiteOutcome, SiteScraper, SiteTask};

/// How a scripted site run ends.
#[derive(Debug, Clone)]
enum ScriptedResult {
    Found(u64),
    ExitCode { code: i32, stderr: String },
    LaunchError(String),
    Hang,
}

#[derive(Debug, Clone)]
struct SiteScript {
    statuses: Vec<String>,
    result: ScriptedResult,
    gate: Option<Arc<Notify>>,
}

impl Default for SiteScript {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            result: ScriptedResult::Found(0),
            gate: None,
        }
    }
}

/// Mock implementation of the SiteScraper trait.
///
/// Provides controllable behavior for testing:
/// - Script per-site status messages and results
/// - Simulate non-zero exits, launch errors and hung processes
/// - Hold a run until the test releases it
/// - Record every launch for call-count assertions
///
/// Sites without a script succeed with 0 listings.
///
/// # Example
///
/// ```rust,ignore
/// use mieszkanieo_core::testing::MockSiteScraper;
///
/// let scraper = MockSiteScraper::new();
/// scraper.succeed_with_status("s1", 10, &["Pobieranie strony 1"]).await;
/// scraper.fail("s2", 1, "Traceback: boom").await;
///
/// // run a job...
///
/// assert_eq!(scraper.launch_count().await, 2);
/// ```
#[derive(Debug, Default)]
pub struct MockSiteScraper {
    scripts: Arc<RwLock<HashMap<String, SiteScript>>>,
    launches: Arc<RwLock<Vec<SiteTask>>>,
}

impl MockSiteScraper {
    /// Create a new mock scraper.
    pub fn new() -> Self {
        Self::default()
    }

    async fn update_script(&self, site: &str, f: impl FnOnce(&mut SiteScript)) {
        let mut scripts = self.scripts.write().await;
        f(scripts.entry(site.to_string()).or_default());
    }

    /// The site exits 0 after printing `found: <found>`.
    pub async fn succeed(&self, site: &str, found: u64) {
        self.update_script(site, |s| s.result = ScriptedResult::Found(found))
            .await;
    }

    /// Like [`succeed`](Self::succeed), emitting status messages first.
    pub async fn succeed_with_status(&self, site: &str, found: u64, statuses: &[&str]) {
        self.update_script(site, |s| {
            s.statuses = statuses.iter().map(|m| m.to_string()).collect();
            s.result = ScriptedResult::Found(found);
        })
        .await;
    }

    /// The site exits with `code` and the given stderr.
    pub async fn fail(&self, site: &str, code: i32, stderr: &str) {
        let stderr = stderr.to_string();
        self.update_script(site, |s| {
            s.result = ScriptedResult::ExitCode { code, stderr }
        })
        .await;
    }

    /// The site's process cannot be started.
    pub async fn fail_launch(&self, site: &str, message: &str) {
        let message = message.to_string();
        self.update_script(site, |s| s.result = ScriptedResult::LaunchError(message))
            .await;
    }

    /// The site never finishes on its own.
    pub async fn hang(&self, site: &str) {
        self.update_script(site, |s| s.result = ScriptedResult::Hang)
            .await;
    }

    /// Hold the site's run after its status messages until the returned
    /// handle is notified.
    pub async fn gate(&self, site: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        let handle = gate.clone();
        self.update_script(site, |s| s.gate = Some(handle)).await;
        gate
    }

    /// All tasks launched so far, in order.
    pub async fn launches(&self) -> Vec<SiteTask> {
        self.launches.read().await.clone()
    }

    /// Number of launches so far.
    pub async fn launch_count(&self) -> usize {
        self.launches.read().await.len()
    }

    /// Sites launched so far, in order.
    pub async fn launched_sites(&self) -> Vec<String> {
        self.launches
            .read()
            .await
            .iter()
            .map(|t| t.site.clone())
            .collect()
    }
}

#[async_trait]
impl SiteScraper for MockSiteScraper {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(
        &self,
        task: SiteTask,
        events: mpsc::Sender<ScraperEvent>,
    ) -> Result<SiteOutcome, ScraperError> {
        self.launches.write().await.push(task.clone());

        let script = self
            .scripts
            .read()
            .await
            .get(&task.site)
            .cloned()
            .unwrap_or_default();

        if let ScriptedResult::LaunchError(message) = script.result {
            return Err(ScraperError::LaunchFailed {
                site: task.site,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            });
        }

        for status in script.statuses {
            let _ = events.send(ScraperEvent::Status(status)).await;
        }

        if let Some(gate) = script.gate {
            gate.notified().await;
        }

        match script.result {
            ScriptedResult::Found(found) => Ok(SiteOutcome {
                site: task.site,
                found,
                duration_ms: 0,
            }),
            ScriptedResult::ExitCode { code, stderr } => {
                Err(ScraperError::process_failed(task.site, Some(code), stderr))
            }
            ScriptedResult::Hang => std::future::pending().await,
            ScriptedResult::LaunchError(_) => unreachable!("handled before launch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_site_succeeds_with_zero() {
        let scraper = MockSiteScraper::new();
        let (tx, _rx) = mpsc::channel(4);
        let outcome = scraper
            .run(SiteTask::new("s1", "Katowice", "job-1", None), tx)
            .await
            .unwrap();
        assert_eq!(outcome.found, 0);
        assert_eq!(scraper.launched_sites().await, vec!["s1"]);
    }

    #[tokio::test]
    async fn test_scripted_statuses_then_result() {
        let scraper = MockSiteScraper::new();
        scraper.succeed_with_status("s1", 7, &["a", "b"]).await;

        let (tx, mut rx) = mpsc::channel(4);
        let outcome = scraper
            .run(SiteTask::new("s1", "katowice", "job-1", None), tx)
            .await
            .unwrap();

        assert_eq!(outcome.found, 7);
        assert_eq!(rx.recv().await, Some(ScraperEvent::Status("a".to_string())));
        assert_eq!(rx.recv().await, Some(ScraperEvent::Status("b".to_string())));
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let scraper = MockSiteScraper::new();
        scraper.fail("s2", 1, "boom").await;

        let (tx, _rx) = mpsc::channel(4);
        let err = scraper
            .run(SiteTask::new("s2", "katowice", "job-1", None), tx)
            .await
            .unwrap_err();
        assert_eq!(err.diagnostics_or_unknown(), "boom");
    }

    #[tokio::test]
    async fn test_launch_error_is_still_recorded() {
        let scraper = MockSiteScraper::new();
        scraper.fail_launch("s1", "python not found").await;

        let (tx, _rx) = mpsc::channel(4);
        let result = scraper
            .run(SiteTask::new("s1", "katowice", "job-1", None), tx)
            .await;
        assert!(matches!(result, Err(ScraperError::LaunchFailed { .. })));
        assert_eq!(scraper.launch_count().await, 1);
    }
}
