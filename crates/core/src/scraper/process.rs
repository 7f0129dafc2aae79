//! Scraper that runs each site task as an external OS process.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::ScraperConfig;
use super::error::ScraperError;
use super::protocol::ProtocolParser;
use super::traits::SiteScraper;
use super::types::{ScraperEvent, SiteOutcome, SiteTask};

/// Launches `program args... <site config> <city> <job id> [max pages]` per task.
pub struct ProcessSiteScraper {
    config: ScraperConfig,
}

impl ProcessSiteScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    fn build_command(&self, site_config: &str, task: &SiteTask) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg(site_config)
            .arg(&task.city)
            .arg(&task.job_id);

        if let Some(max_pages) = task.max_pages.or(self.config.default_max_pages) {
            cmd.arg(max_pages.to_string());
        }

        if let Some(ref dir) = self.config.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }
}

#[async_trait]
impl SiteScraper for ProcessSiteScraper {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(
        &self,
        task: SiteTask,
        events: mpsc::Sender<ScraperEvent>,
    ) -> Result<SiteOutcome, ScraperError> {
        let start = Instant::now();

        let site = self
            .config
            .site(&task.site)
            .ok_or_else(|| ScraperError::UnknownSite {
                site: task.site.clone(),
            })?;

        debug!(
            site = %task.site,
            job_id = %task.job_id,
            program = %self.config.program,
            site_config = %site.config,
            "Launching scraper process"
        );

        let mut child = self
            .build_command(&site.config, &task)
            .spawn()
            .map_err(|source| ScraperError::LaunchFailed {
                site: task.site.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ScraperError::Io(std::io::Error::other("scraper stdout was not captured"))
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            ScraperError::Io(std::io::Error::other("scraper stderr was not captured"))
        })?;

        // Drained on its own task so a chatty stderr never blocks stdout.
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        let mut parser = ProtocolParser::new();
        // Split on raw bytes; scrapers on legacy consoles may emit non-UTF-8 text.
        let mut lines = BufReader::new(stdout).split(b'\n');

        let run = async {
            while let Some(raw) = lines.next_segment().await? {
                let decoded = String::from_utf8_lossy(&raw);
                let line = decoded.strip_suffix('\r').unwrap_or(&*decoded);
                if let Some(event) = parser.push_stdout_line(line) {
                    // Receiver gone means nobody is listening; keep draining.
                    let _ = events.send(event).await;
                }
            }
            let status = child.wait().await?;
            Ok::<std::process::ExitStatus, std::io::Error>(status)
        };

        let result = match self.config.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), run).await,
            None => Ok(run.await),
        };

        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                let _ = child.kill().await;
                let diagnostics = stderr_task.await.unwrap_or_default();
                warn!(site = %task.site, job_id = %task.job_id, error = %source, "Failed to read scraper output");
                return Err(ScraperError::Output {
                    site: task.site,
                    source,
                    diagnostics,
                });
            }
            Err(_) => {
                let _ = child.kill().await;
                let timeout_secs = self.config.timeout_secs.unwrap_or_default();
                warn!(site = %task.site, job_id = %task.job_id, timeout_secs, "Scraper timed out");
                return Err(ScraperError::Timeout {
                    site: task.site,
                    timeout_secs,
                });
            }
        };

        parser.push_stderr(&stderr_task.await.unwrap_or_default());
        let (found, diagnostics) = parser.finish();

        if !status.success() {
            debug!(
                site = %task.site,
                job_id = %task.job_id,
                code = ?status.code(),
                stderr = %diagnostics,
                "Scraper process failed"
            );
            return Err(ScraperError::process_failed(
                task.site,
                status.code(),
                diagnostics,
            ));
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(site = %task.site, job_id = %task.job_id, found, duration_ms, "Scraper finished");

        Ok(SiteOutcome {
            site: task.site,
            found,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::SiteDefinition;

    #[test]
    fn test_build_command_argument_order() {
        let config = ScraperConfig::with_program("python", vec!["entry.py".to_string()])
            .with_sites(vec![SiteDefinition::new("olx", "cfg/olx.json")]);
        let scraper = ProcessSiteScraper::new(config);
        let task = SiteTask::new("olx", "Gliwice", "job-7", Some(2));

        let cmd = scraper.build_command("cfg/olx.json", &task);
        let std_cmd = cmd.as_std();
        let args: Vec<_> = std_cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(std_cmd.get_program(), "python");
        assert_eq!(args, vec!["entry.py", "cfg/olx.json", "gliwice", "job-7", "2"]);
    }

    #[test]
    fn test_build_command_without_page_limit() {
        let scraper = ProcessSiteScraper::new(ScraperConfig::default());
        let task = SiteTask::new("otodom", "katowice", "job-1", None);

        let cmd = scraper.build_command("cfg/otodom.json", &task);
        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec!["scraper_entry.py", "cfg/otodom.json", "katowice", "job-1"]
        );
    }

    #[test]
    fn test_build_command_uses_default_page_limit() {
        let mut config = ScraperConfig::default();
        config.default_max_pages = Some(5);
        let scraper = ProcessSiteScraper::new(config);
        let task = SiteTask::new("otodom", "katowice", "job-1", None);

        let cmd = scraper.build_command("cfg/otodom.json", &task);
        let last = cmd.as_std().get_args().last().unwrap().to_string_lossy().into_owned();
        assert_eq!(last, "5");
    }

    #[tokio::test]
    async fn test_unknown_site_is_rejected_without_launch() {
        let scraper = ProcessSiteScraper::new(ScraperConfig::default());
        let (tx, _rx) = mpsc::channel(4);
        let result = scraper
            .run(SiteTask::new("zillow", "katowice", "job-1", None), tx)
            .await;
        assert!(matches!(result, Err(ScraperError::UnknownSite { .. })));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_failure() {
        let config = ScraperConfig::with_program("/nonexistent/scraper-binary", vec![]);
        let scraper = ProcessSiteScraper::new(config);
        let (tx, _rx) = mpsc::channel(4);
        let result = scraper
            .run(SiteTask::new("olx", "katowice", "job-1", None), tx)
            .await;
        assert!(matches!(result, Err(ScraperError::LaunchFailed { .. })));
    }
}
