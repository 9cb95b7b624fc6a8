//! Configuration loading and management
//!
//! Handles parsing of `taskboard.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream GraphQL connection
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Custom field names read from each record
    #[serde(default)]
    pub fields: FieldsConfig,

    /// Assignee board configuration
    #[serde(default)]
    pub board: BoardConfig,

    /// Flat table configuration
    #[serde(default)]
    pub table: TableConfig,
}

/// Upstream connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// GraphQL endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Value sent as the company header
    #[serde(default = "default_company")]
    pub company: String,

    /// Company ids used as the fixed todo filter
    #[serde(default = "default_company_ids")]
    pub company_ids: Vec<String>,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.blue.cc/graphql".to_string()
}

fn default_company() -> String {
    "rl-global-logistics".to_string()
}

fn default_company_ids() -> Vec<String> {
    vec!["cm1axd0ao03mftmfmbqn5ptzf".to_string()]
}

fn default_page_size() -> usize {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            company: default_company(),
            company_ids: default_company_ids(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Names of the custom fields the normalizer looks up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsConfig {
    #[serde(default = "default_priority_field")]
    pub priority: String,

    #[serde(default = "default_requestor_field")]
    pub requestor: String,
}

fn default_priority_field() -> String {
    "Priority".to_string()
}

fn default_requestor_field() -> String {
    "Requestor".to_string()
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            priority: default_priority_field(),
            requestor: default_requestor_field(),
        }
    }
}

/// Assignee board configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Tracked staff, by last name. Empty tracks nobody.
    #[serde(default = "default_staff")]
    pub staff: Vec<String>,

    /// Put every assignee on the board, ignoring `staff`
    #[serde(default)]
    pub track_all: bool,

    /// Tasks kept per assignee
    #[serde(default = "default_bucket_size")]
    pub bucket_size: usize,

    /// Drop completed tasks from the board
    #[serde(default = "default_true")]
    pub exclude_done: bool,
}

fn default_staff() -> Vec<String> {
    [
        "Kazmierczak",
        "Sprung",
        "Hiscock",
        "Younis",
        "Nobles",
        "Glynn",
        "Komatineni",
        "Moure",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

fn default_bucket_size() -> usize {
    3
}

fn default_true() -> bool {
    true
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            staff: default_staff(),
            track_all: false,
            bucket_size: default_bucket_size(),
            exclude_done: true,
        }
    }
}

/// Flat table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Description length before truncation
    #[serde(default = "default_description_max_len")]
    pub description_max_len: usize,

    /// Drop completed tasks from the table
    #[serde(default)]
    pub exclude_done: bool,

    /// chrono format string for due dates
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Stages from highest to lowest rank
    #[serde(default = "default_stage_order")]
    pub stage_order: Vec<String>,
}

fn default_description_max_len() -> usize {
    100
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_stage_order() -> Vec<String> {
    vec![
        "Game Changers".to_string(),
        "Fundamentals".to_string(),
        "External Marketing".to_string(),
        "Internal Marketing".to_string(),
        "Parking Lot".to_string(),
    ]
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            description_max_len: default_description_max_len(),
            exclude_done: false,
            date_format: default_date_format(),
            stage_order: default_stage_order(),
        }
    }
}

impl Config {
    /// Load configuration from a `taskboard.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file: an explicit path must exist, otherwise the
    /// working directory and then the platform config dir are tried.
    pub fn discover(explicit: Option<&Path>) -> crate::error::Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        for candidate in Self::search_paths() {
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Candidate config locations, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "taskboard") {
            paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.upstream.validate()?;
        self.fields.validate()?;
        self.board.validate()?;
        self.table.validate()?;
        Ok(())
    }
}

impl UpstreamConfig {
    fn validate(&self) -> crate::error::Result<()> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "upstream.endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        if self.page_size == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "upstream.page_size must be > 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "upstream.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.company_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(crate::error::Error::InvalidConfig(
                "upstream.company_ids cannot include empty entries".to_string(),
            ));
        }
        Ok(())
    }
}

impl FieldsConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.priority.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "fields.priority cannot be empty".to_string(),
            ));
        }
        if self.requestor.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "fields.requestor cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl BoardConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.bucket_size == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "board.bucket_size must be >= 1".to_string(),
            ));
        }
        if self.staff.iter().any(|name| name.trim().is_empty()) {
            return Err(crate::error::Error::InvalidConfig(
                "board.staff cannot include empty entries".to_string(),
            ));
        }
        Ok(())
    }
}

impl TableConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.description_max_len == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "table.description_max_len must be > 0".to_string(),
            ));
        }
        if self.date_format.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "table.date_format cannot be empty".to_string(),
            ));
        }
        if chrono::format::StrftimeItems::new(&self.date_format)
            .any(|item| matches!(item, chrono::format::Item::Error))
        {
            return Err(crate::error::Error::InvalidConfig(format!(
                "table.date_format '{}' is not a valid strftime format",
                self.date_format
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for stage in &self.stage_order {
            let trimmed = stage.trim();
            if trimmed.is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "table.stage_order cannot include empty entries".to_string(),
                ));
            }
            if !seen.insert(trimmed.to_string()) {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "table.stage_order has duplicate entry '{trimmed}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.upstream.endpoint, "https://api.blue.cc/graphql");
        assert_eq!(cfg.upstream.page_size, 500);
        assert_eq!(cfg.upstream.timeout_secs, 30);
        assert_eq!(cfg.fields.priority, "Priority");
        assert_eq!(cfg.fields.requestor, "Requestor");
        assert_eq!(cfg.board.bucket_size, 3);
        assert!(cfg.board.exclude_done);
        assert_eq!(cfg.board.staff.len(), 8);
        assert_eq!(cfg.table.description_max_len, 100);
        assert!(!cfg.table.exclude_done);
        assert_eq!(cfg.table.stage_order[0], "Game Changers");
        assert_eq!(cfg.table.stage_order[4], "Parking Lot");
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        let content = r#"
[upstream]
endpoint = "http://localhost:4000/graphql"
company = "acme"
company_ids = ["c1", "c2"]
page_size = 25
timeout_secs = 5

[fields]
priority = "Urgency"

[board]
staff = ["Lovelace"]
bucket_size = 5
exclude_done = false

[table]
description_max_len = 40
exclude_done = true
date_format = "%d/%m/%Y"
stage_order = ["Now", "Later"]
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.upstream.endpoint, "http://localhost:4000/graphql");
        assert_eq!(cfg.upstream.company, "acme");
        assert_eq!(cfg.upstream.company_ids, vec!["c1", "c2"]);
        assert_eq!(cfg.upstream.page_size, 25);
        assert_eq!(cfg.upstream.timeout_secs, 5);
        assert_eq!(cfg.fields.priority, "Urgency");
        assert_eq!(cfg.fields.requestor, "Requestor");
        assert_eq!(cfg.board.staff, vec!["Lovelace"]);
        assert_eq!(cfg.board.bucket_size, 5);
        assert!(!cfg.board.exclude_done);
        assert_eq!(cfg.table.description_max_len, 40);
        assert!(cfg.table.exclude_done);
        assert_eq!(cfg.table.date_format, "%d/%m/%Y");
        assert_eq!(cfg.table.stage_order, vec!["Now", "Later"]);
    }

    #[test]
    fn zero_bucket_size_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[board]\nbucket_size = 0").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_stage_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[table]\nstage_order = [\"A\", \"A\"]").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn non_http_endpoint_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[upstream]\nendpoint = \"ftp://example\"").expect("write config");

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn discover_requires_explicit_path_to_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let err = Config::discover(Some(&missing)).expect_err("missing config");
        assert_eq!(err.exit_code(), crate::error::exit_codes::USER_ERROR);
    }

    #[test]
    fn save_round_trips_through_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("bucket_size = 3"));
        let loaded = Config::load(&path).expect("reload");
        assert_eq!(loaded.table.stage_order, Config::default().table.stage_order);
    }
}
