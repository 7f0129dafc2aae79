//! Process scraper tests against small shell scripts.

#![cfg(unix)]

use std::path::Path;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

use mieszkanieo_core::{
    ProcessSiteScraper, ScraperConfig, ScraperError, ScraperEvent, SiteDefinition, SiteScraper,
    SiteTask,
};

/// Writes `body` to a script and builds a scraper that runs it with `/bin/sh`.
fn script_scraper(dir: &Path, body: &str) -> ProcessSiteScraper {
    let script = dir.join("scraper.sh");
    std::fs::write(&script, body).expect("Failed to write script");

    let config = ScraperConfig::with_program(
        "/bin/sh",
        vec![script.to_string_lossy().into_owned()],
    )
    .with_sites(vec![SiteDefinition::new("olx", "cfg/olx.json")]);

    ProcessSiteScraper::new(config)
}

async fn run(
    scraper: &ProcessSiteScraper,
    task: SiteTask,
) -> (Result<u64, ScraperError>, Vec<String>) {
    let (tx, mut rx) = mpsc::channel(64);
    let result = scraper.run(task, tx).await.map(|outcome| outcome.found);

    let mut statuses = Vec::new();
    while let Ok(ScraperEvent::Status(message)) = rx.try_recv() {
        statuses.push(message);
    }
    (result, statuses)
}

#[tokio::test]
async fn test_status_lines_and_found_count() {
    let dir = TempDir::new().unwrap();
    let scraper = script_scraper(
        dir.path(),
        r#"
echo "STATUS: Inicjalizacja Chrome"
echo "some debug output"
echo "STATUS:Pobieranie strony 1  "
echo "found: 12"
"#,
    );

    let (result, statuses) = run(&scraper, SiteTask::new("olx", "Katowice", "job-1", None)).await;

    assert_eq!(assert_ok!(result), 12);
    assert_eq!(statuses, vec!["Inicjalizacja Chrome", "Pobieranie strony 1"]);
}

#[tokio::test]
async fn test_first_found_line_wins() {
    let dir = TempDir::new().unwrap();
    let scraper = script_scraper(
        dir.path(),
        r#"
echo "found: 3"
echo "done, found: 40"
"#,
    );

    let (result, _) = run(&scraper, SiteTask::new("olx", "katowice", "job-1", None)).await;
    assert_eq!(assert_ok!(result), 3);
}

#[tokio::test]
async fn test_missing_found_line_counts_zero() {
    let dir = TempDir::new().unwrap();
    let scraper = script_scraper(dir.path(), "echo 'STATUS: nic'\n");

    let (result, statuses) = run(&scraper, SiteTask::new("olx", "katowice", "job-1", None)).await;
    assert_eq!(assert_ok!(result), 0);
    assert_eq!(statuses, vec!["nic"]);
}

#[tokio::test]
async fn test_non_utf8_output_is_decoded_lossily() {
    let dir = TempDir::new().unwrap();
    let scraper = script_scraper(
        dir.path(),
        r#"
printf 'STATUS: Krak\303\263w \377\n'
echo 'main: found: 7'
"#,
    );

    let (result, statuses) = run(&scraper, SiteTask::new("olx", "krakow", "job-1", None)).await;

    assert_eq!(assert_ok!(result), 7);
    assert_eq!(statuses, vec!["Kraków \u{FFFD}"]);
}

#[tokio::test]
async fn test_task_arguments_are_passed() {
    let dir = TempDir::new().unwrap();
    let scraper = script_scraper(dir.path(), "echo \"STATUS: $1|$2|$3|$4\"\n");

    let (result, statuses) =
        run(&scraper, SiteTask::new("olx", "Gliwice", "job-9", Some(3))).await;

    assert_ok!(result);
    assert_eq!(statuses, vec!["cfg/olx.json|gliwice|job-9|3"]);
}

#[tokio::test]
async fn test_non_zero_exit_captures_stderr() {
    let dir = TempDir::new().unwrap();
    let scraper = script_scraper(
        dir.path(),
        r#"
echo "found: 8"
echo "Traceback: ElementNotFound" >&2
exit 1
"#,
    );

    let (result, _) = run(&scraper, SiteTask::new("olx", "katowice", "job-1", None)).await;

    let err = assert_err!(result);
    match &err {
        ScraperError::ProcessFailed { site, code, .. } => {
            assert_eq!(site, "olx");
            assert_eq!(*code, Some(1));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.diagnostics_or_unknown(), "Traceback: ElementNotFound");
}

#[tokio::test]
async fn test_silent_failure_reports_unknown_error() {
    let dir = TempDir::new().unwrap();
    let scraper = script_scraper(dir.path(), "exit 3\n");

    let (result, _) = run(&scraper, SiteTask::new("olx", "katowice", "job-1", None)).await;

    let err = assert_err!(result);
    assert!(matches!(err, ScraperError::ProcessFailed { code: Some(3), .. }));
    assert_eq!(err.diagnostics_or_unknown(), "Unknown error");
}

#[tokio::test]
async fn test_timeout_kills_process() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("scraper.sh");
    std::fs::write(&script, "echo 'STATUS: start'\nexec sleep 30\n").unwrap();

    let config = ScraperConfig::with_program("/bin/sh", vec![script.to_string_lossy().into_owned()])
        .with_sites(vec![SiteDefinition::new("olx", "cfg/olx.json")])
        .with_timeout(1);
    let scraper = ProcessSiteScraper::new(config);

    let started = std::time::Instant::now();
    let (result, statuses) = run(&scraper, SiteTask::new("olx", "katowice", "job-1", None)).await;

    assert!(matches!(
        result,
        Err(ScraperError::Timeout { timeout_secs: 1, .. })
    ));
    assert_eq!(statuses, vec!["start"]);
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}
