//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// TestTally - count test metrics from Confluence tables
///
/// Reads two-column tables ("Unit Tests | 120", "WDIO | 12") from
/// Confluence pages and sums the counts per test category, either for a
/// list of pages or for every page in a space.
///
/// Examples:
///   testtally --space QA
///   testtally --pages 229378,229379 --format json
///   testtally --url https://example.atlassian.net/wiki/spaces/QA/pages/229378/Report
///   testtally --space QA --category e2e=e2e,end-to-end
///   testtally --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Space key whose pages should all be analyzed
    #[arg(short, long, value_name = "KEY", env = "CONFLUENCE_SPACE_KEY")]
    pub space: Option<String>,

    /// Page ids to analyze (comma-separated)
    ///
    /// Takes precedence over --space.
    #[arg(short, long, value_name = "IDS", value_delimiter = ',')]
    pub pages: Option<Vec<String>>,

    /// Page URL to analyze; the id is taken from the `/pages/<id>` segment
    ///
    /// May be repeated. URLs without a page id are ignored.
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Confluence base URL (e.g. https://example.atlassian.net/wiki)
    #[arg(long, value_name = "URL", env = "CONFLUENCE_BASE_URL")]
    pub base_url: Option<String>,

    /// Account used for basic authentication
    #[arg(short, long, value_name = "USER", env = "CONFLUENCE_USERNAME")]
    pub username: Option<String>,

    /// API token used for basic authentication
    #[arg(
        long,
        value_name = "TOKEN",
        env = "CONFLUENCE_API_TOKEN",
        hide_env_values = true
    )]
    pub api_token: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .testtally.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra or replacement category as NAME=KEYWORD[,KEYWORD...]
    ///
    /// Example: --category e2e=e2e,end-to-end
    #[arg(long = "category", value_name = "NAME=KEYWORDS", value_parser = parse_category)]
    pub categories: Vec<(String, Vec<String>)>,

    /// Output format (table, markdown, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of pages requested per listing call
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fail if the space listing cannot be fetched
    ///
    /// Without this flag a listing failure is reported as an empty space.
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .testtally.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text table (default)
    #[default]
    Table,
    /// Markdown table
    Markdown,
    /// JSON document
    Json,
}

/// Parse a `NAME=KEYWORD[,KEYWORD...]` category definition.
fn parse_category(s: &str) -> Result<(String, Vec<String>), String> {
    let (name, keywords) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=KEYWORD[,KEYWORD...], got '{}'", s))?;

    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err("category name must not be empty".to_string());
    }

    let keywords: Vec<String> = keywords
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Err(format!("category '{}' needs at least one keyword", name));
    }

    Ok((name, keywords))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("testtally").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_pages_and_urls() {
        let args = parse(&[
            "--pages",
            "1,2",
            "--url",
            "https://x/wiki/pages/3/A",
            "--url",
            "https://x/wiki/pages/4/B",
        ]);
        assert_eq!(args.pages, Some(vec!["1".to_string(), "2".to_string()]));
        assert_eq!(args.urls.len(), 2);
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(
            parse_category("E2E = e2e, end-to-end ,"),
            Ok((
                "e2e".to_string(),
                vec!["e2e".to_string(), "end-to-end".to_string()]
            ))
        );
        assert!(parse_category("e2e").is_err());
        assert!(parse_category("=x").is_err());
        assert!(parse_category("e2e=").is_err());
    }

    #[test]
    fn test_parse_format() {
        let args = parse(&["--format", "json"]);
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(Args::try_parse_from(["testtally", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["--verbose", "--quiet"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        assert!(parse(&["--page-size", "0"]).validate().is_err());
        assert!(parse(&["--timeout", "0"]).validate().is_err());
        assert!(parse(&["--page-size", "10"]).validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(parse(&[]).log_level(), tracing::Level::INFO);
        assert_eq!(parse(&["-v"]).log_level(), tracing::Level::DEBUG);
        assert_eq!(parse(&["-q"]).log_level(), tracing::Level::ERROR);
    }
}
