//! Configuration file handling.
//!
//! This module handles loading `.testtally.toml` files, merging them with
//! CLI arguments and environment, and validating the result once before
//! any request is made.

use crate::analysis::{extract_ids_from_references, DEFAULT_PAGE_SIZE};
use crate::classifier::default_categories;
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".testtally.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Confluence site and target settings.
    #[serde(default)]
    pub confluence: ConfluenceConfig,

    /// Category name to label keywords.
    #[serde(default = "default_categories")]
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            confluence: ConfluenceConfig::default(),
            categories: default_categories(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Pages requested per listing call.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timeout_seconds: default_timeout(),
            format: OutputFormat::default(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout() -> u64 {
    30
}

/// Confluence connection and target settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfluenceConfig {
    /// Site base URL, including any context path such as `/wiki`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Account used for basic authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// API token. Prefer the CONFLUENCE_API_TOKEN environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Space whose pages are analyzed when no page ids are given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_key: Option<String>,

    /// Explicit page ids to analyze.
    #[serde(default)]
    pub page_ids: Vec<String>,

    /// Set when pages were selected on the command line; the space key is
    /// then never used as a fallback.
    #[serde(skip)]
    pub pages_requested: bool,
}

/// Errors found while validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// The base URL is not an http(s) URL.
    #[error("invalid base URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),

    #[error("page size must be at least 1")]
    ZeroPageSize,

    #[error("timeout must be at least 1 second")]
    ZeroTimeout,

    /// No category has a usable keyword.
    #[error("no categories configured")]
    NoCategories,

    /// Neither a space key nor page ids were given.
    #[error("nothing to analyze: set a space key or page ids")]
    NoTarget,

    /// Pages were selected on the command line but none had a usable id.
    #[error("no page id found in --pages or --url")]
    NoPageIds,
}

/// Validated credentials for a Confluence site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
}

/// What a run analyzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Explicit page ids, in order.
    Pages(Vec<String>),
    /// Every page in a space.
    Space(String),
}

/// Configuration checked by [`Config::validate`], ready for use.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub credentials: Credentials,
    pub target: Target,
    pub page_size: usize,
    pub timeout_seconds: u64,
    pub categories: BTreeMap<String, Vec<String>>,
}

/// Returns the trimmed value when it is present and non-empty.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and the environment variables clap reads for them)
    /// take precedence over config file settings. Only explicitly provided
    /// values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.confluence.base_url = Some(base_url.clone());
        }
        if let Some(ref username) = args.username {
            self.confluence.username = Some(username.clone());
        }
        if let Some(ref api_token) = args.api_token {
            self.confluence.api_token = Some(api_token.clone());
        }
        if let Some(ref space) = args.space {
            self.confluence.space_key = Some(space.clone());
        }

        // Pages given on the command line replace the configured list
        if args.pages.is_some() || !args.urls.is_empty() {
            let mut page_ids = args.pages.clone().unwrap_or_default();
            let referenced = extract_ids_from_references(&args.urls);
            if referenced.len() < args.urls.len() {
                warn!(
                    "Ignored {} of {} page URLs without a /pages/<id> segment",
                    args.urls.len() - referenced.len(),
                    args.urls.len()
                );
            }
            page_ids.extend(referenced);
            self.confluence.page_ids = page_ids;
            self.confluence.pages_requested = true;
        }

        for (name, keywords) in &args.categories {
            self.categories.insert(name.clone(), keywords.clone());
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(page_size) = args.page_size {
            self.general.page_size = page_size;
        }
        if let Some(timeout) = args.timeout {
            self.general.timeout_seconds = timeout;
        }
    }

    /// Check that everything a run needs is present.
    ///
    /// Page ids take precedence over the space key. Pages selected on the
    /// command line that resolve to no id are an error rather than a
    /// fallback to the space.
    pub fn validate(&self) -> Result<RunSettings, ConfigError> {
        let base_url =
            non_empty(&self.confluence.base_url).ok_or(ConfigError::Missing("base_url"))?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }
        let username =
            non_empty(&self.confluence.username).ok_or(ConfigError::Missing("username"))?;
        let api_token =
            non_empty(&self.confluence.api_token).ok_or(ConfigError::Missing("api_token"))?;

        if self.general.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.general.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let has_keywords = self
            .categories
            .values()
            .any(|keywords| keywords.iter().any(|k| !k.trim().is_empty()));
        if !has_keywords {
            return Err(ConfigError::NoCategories);
        }

        let page_ids: Vec<String> = self
            .confluence
            .page_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        let target = if !page_ids.is_empty() {
            Target::Pages(page_ids)
        } else if self.confluence.pages_requested {
            return Err(ConfigError::NoPageIds);
        } else if let Some(space) = non_empty(&self.confluence.space_key) {
            Target::Space(space)
        } else {
            return Err(ConfigError::NoTarget);
        };

        Ok(RunSettings {
            credentials: Credentials {
                base_url,
                username,
                api_token,
            },
            target,
            page_size: self.general.page_size,
            timeout_seconds: self.general.timeout_seconds,
            categories: self.categories.clone(),
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn complete_config() -> Config {
        let mut config = Config::default();
        config.confluence.base_url = Some("https://example.atlassian.net/wiki".to_string());
        config.confluence.username = Some("bot@example.com".to_string());
        config.confluence.api_token = Some("secret".to_string());
        config.confluence.space_key = Some("QA".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.page_size, 25);
        assert_eq!(config.general.format, OutputFormat::Table);
        assert_eq!(config.categories.get("unit"), Some(&vec!["unit".to_string()]));
        assert_eq!(config.categories.get("wdio"), Some(&vec!["wdio".to_string()]));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
page_size = 50
format = "json"

[confluence]
base_url = "https://example.atlassian.net/wiki"
username = "bot@example.com"
space_key = "QA"

[categories]
unit = ["unit", "jest"]
e2e = ["e2e", "end-to-end"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.page_size, 50);
        assert_eq!(config.general.timeout_seconds, 30);
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.confluence.space_key.as_deref(), Some("QA"));
        assert!(config.confluence.api_token.is_none());
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories["unit"], vec!["unit", "jest"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[confluence]\npage_ids = [\"1\", \"2\"]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.confluence.page_ids, vec!["1", "2"]);
        assert!(config.categories.contains_key("unit"));

        std::fs::write(&path, "[general\npage_size = ").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[confluence]"));
        assert!(toml_str.contains("[categories]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.categories, default_categories());
    }

    #[test]
    fn test_validate_space_target() {
        let settings = complete_config().validate().unwrap();
        assert_eq!(settings.target, Target::Space("QA".to_string()));
        assert_eq!(settings.credentials.username, "bot@example.com");
        assert_eq!(settings.page_size, 25);
    }

    #[test]
    fn test_page_ids_take_precedence() {
        let mut config = complete_config();
        config.confluence.page_ids = vec![" 7 ".to_string(), "".to_string(), "8".to_string()];
        let settings = config.validate().unwrap();
        assert_eq!(
            settings.target,
            Target::Pages(vec!["7".to_string(), "8".to_string()])
        );
    }

    #[test]
    fn test_validate_missing_credentials() {
        let mut config = complete_config();
        config.confluence.api_token = Some("   ".to_string());
        assert_eq!(config.validate().unwrap_err(), ConfigError::Missing("api_token"));

        let mut config = complete_config();
        config.confluence.username = None;
        assert_eq!(config.validate().unwrap_err(), ConfigError::Missing("username"));

        let mut config = complete_config();
        config.confluence.base_url = None;
        assert_eq!(config.validate().unwrap_err(), ConfigError::Missing("base_url"));
    }

    #[test]
    fn test_validate_bad_values() {
        let mut config = complete_config();
        config.confluence.base_url = Some("example.atlassian.net".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl(_))));

        let mut config = complete_config();
        config.general.page_size = 0;
        assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroPageSize);

        let mut config = complete_config();
        config.categories = BTreeMap::from([("unit".to_string(), vec![" ".to_string()])]);
        assert_eq!(config.validate().unwrap_err(), ConfigError::NoCategories);

        let mut config = complete_config();
        config.confluence.space_key = None;
        assert_eq!(config.validate().unwrap_err(), ConfigError::NoTarget);
    }

    #[test]
    fn test_merge_with_args() {
        let args = crate::cli::Args::try_parse_from([
            "testtally",
            "--base-url",
            "https://other.example.com",
            "--pages",
            "1",
            "--url",
            "https://other.example.com/pages/42/Report",
            "--url",
            "https://other.example.com/display/QA/Home",
            "--category",
            "e2e=e2e",
            "--format",
            "markdown",
            "--page-size",
            "10",
        ])
        .unwrap();

        let mut config = complete_config();
        config.confluence.page_ids = vec!["99".to_string()];
        config.merge_with_args(&args);

        assert_eq!(
            config.confluence.base_url.as_deref(),
            Some("https://other.example.com")
        );
        assert_eq!(config.confluence.page_ids, vec!["1", "42"]);
        assert_eq!(config.categories["e2e"], vec!["e2e"]);
        assert_eq!(config.categories.len(), 3);
        assert_eq!(config.general.format, OutputFormat::Markdown);
        assert_eq!(config.general.page_size, 10);
    }

    #[test]
    fn test_unresolvable_urls_do_not_fall_back_to_space() {
        let args = crate::cli::Args::try_parse_from([
            "testtally",
            "--url",
            "https://x.example.com/display/QA/Home",
        ])
        .unwrap();

        let mut config = complete_config();
        config.merge_with_args(&args);

        assert!(config.confluence.page_ids.is_empty());
        assert_eq!(config.confluence.space_key.as_deref(), Some("QA"));
        assert_eq!(config.validate().unwrap_err(), ConfigError::NoPageIds);
    }

    #[test]
    fn test_space_used_when_no_pages_requested() {
        let args = crate::cli::Args::try_parse_from(["testtally"]).unwrap();
        let mut config = complete_config();
        config.merge_with_args(&args);
        assert_eq!(
            config.validate().unwrap().target,
            Target::Space("QA".to_string())
        );
    }
}
