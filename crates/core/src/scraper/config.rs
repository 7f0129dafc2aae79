//! Configuration for site scraper processes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sites known out of the box, in the order the UI offers them.
pub const DEFAULT_SITES: [&str; 5] = ["allegro", "gethome", "nieruchomosci", "olx", "otodom"];

/// One scrapeable site and the config file handed to its scraper process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDefinition {
    /// Identifier used in job creation requests.
    pub id: String,
    /// Site config reference passed as the first positional argument.
    pub config: String,
}

impl SiteDefinition {
    pub fn new(id: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: config.into(),
        }
    }
}

/// How scraper processes are launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Executable to run.
    #[serde(default = "default_program")]
    pub program: String,

    /// Leading arguments placed before the site task arguments.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Working directory for the process. Inherited when unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Wall-clock limit per site. Unbounded when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Page limit used when a job does not specify one.
    #[serde(default)]
    pub default_max_pages: Option<u32>,

    /// Known sites.
    #[serde(default = "default_sites")]
    pub sites: Vec<SiteDefinition>,
}

fn default_program() -> String {
    "python".to_string()
}

fn default_args() -> Vec<String> {
    vec!["scraper_entry.py".to_string()]
}

fn default_sites() -> Vec<SiteDefinition> {
    DEFAULT_SITES
        .iter()
        .map(|id| SiteDefinition::new(*id, format!("cfg/{}.json", id)))
        .collect()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: None,
            timeout_secs: None,
            default_max_pages: None,
            sites: default_sites(),
        }
    }
}

impl ScraperConfig {
    /// Creates a config that runs `program` with the given leading arguments.
    pub fn with_program(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Default::default()
        }
    }

    /// Replaces the site list.
    pub fn with_sites(mut self, sites: Vec<SiteDefinition>) -> Self {
        self.sites = sites;
        self
    }

    /// Sets the per-site timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Sets the working directory.
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Site ids in configured order.
    pub fn site_ids(&self) -> Vec<String> {
        self.sites.iter().map(|s| s.id.clone()).collect()
    }

    /// Looks up a site by id.
    pub fn site(&self, id: &str) -> Option<&SiteDefinition> {
        self.sites.iter().find(|s| s.id == id)
    }
}
