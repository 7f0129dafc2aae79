//! Line-oriented progress protocol spoken by scraper processes.
//!
//! Stdout lines starting with `STATUS:` are progress messages. After exit the
//! whole stdout is scanned for the first `found: <N>`. Stderr is kept verbatim
//! for failure reports and never parsed.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::ScraperEvent;

const STATUS_PREFIX: &str = "STATUS:";

static FOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"found:\s*(\d+)").expect("found pattern is valid"));

/// Returns the trimmed message of a `STATUS:` line.
pub fn parse_status_line(line: &str) -> Option<String> {
    line.strip_prefix(STATUS_PREFIX)
        .map(|rest| rest.trim().to_string())
}

/// Count from the first `found: <N>` in `stdout`, or 0.
///
/// Later matches are ignored even if they differ.
pub fn parse_found_count(stdout: &str) -> u64 {
    FOUND_RE
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Buffers for a single scraper process.
#[derive(Debug, Default)]
pub struct ProtocolParser {
    stdout: String,
    stderr: String,
}

impl ProtocolParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a stdout line, returning a status event if it carries one.
    pub fn push_stdout_line(&mut self, line: &str) -> Option<ScraperEvent> {
        self.stdout.push_str(line);
        self.stdout.push('\n');
        parse_status_line(line).map(ScraperEvent::Status)
    }

    /// Appends diagnostic output.
    pub fn push_stderr(&mut self, chunk: &str) {
        self.stderr.push_str(chunk);
    }

    /// Consumes the parser, returning the found count and captured stderr.
    pub fn finish(self) -> (u64, String) {
        (parse_found_count(&self.stdout), self.stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_is_trimmed() {
        assert_eq!(
            parse_status_line("STATUS:  Pobieranie strony 2  "),
            Some("Pobieranie strony 2".to_string())
        );
    }

    #[test]
    fn test_status_prefix_must_start_line() {
        assert_eq!(parse_status_line("INFO STATUS: nope"), None);
        assert_eq!(parse_status_line("status: lowercase"), None);
    }

    #[test]
    fn test_empty_status_message() {
        assert_eq!(parse_status_line("STATUS:"), Some(String::new()));
    }

    #[test]
    fn test_found_count_inside_longer_line() {
        assert_eq!(parse_found_count("main: found: 37\n"), 37);
        assert_eq!(parse_found_count("found:12"), 12);
    }

    #[test]
    fn test_found_count_missing_is_zero() {
        assert_eq!(parse_found_count("STATUS: done\nbye\n"), 0);
        assert_eq!(parse_found_count(""), 0);
    }

    /// Only the first match counts. Pinned so changing it is a deliberate choice.
    #[test]
    fn test_found_count_first_match_wins() {
        assert_eq!(parse_found_count("found: 3\nfound: 99\n"), 3);
    }

    #[test]
    fn test_parser_emits_events_in_order() {
        let mut parser = ProtocolParser::new();
        let events: Vec<_> = ["STATUS: a", "noise", "STATUS: b", "main: found: 4"]
            .iter()
            .filter_map(|l| parser.push_stdout_line(l))
            .collect();

        assert_eq!(
            events,
            vec![
                ScraperEvent::Status("a".to_string()),
                ScraperEvent::Status("b".to_string()),
            ]
        );

        parser.push_stderr("warning: slow\n");
        let (found, diagnostics) = parser.finish();
        assert_eq!(found, 4);
        assert_eq!(diagnostics, "warning: slow\n");
    }

    #[test]
    fn test_stderr_is_not_parsed_for_counts() {
        let mut parser = ProtocolParser::new();
        parser.push_stderr("found: 50\n");
        assert_eq!(parser.finish().0, 0);
    }
}
