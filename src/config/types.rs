//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_API_URL, DEFAULT_API_VERSION, DEFAULT_INCLUDE_AI_INSIGHTS, DEFAULT_PAGE_LIMIT,
    ENV_API_URL, ENV_API_VERSION, LIST_POLL_INTERVAL, MAX_POLL_BACKOFF, REPORT_POLL_INTERVAL,
    REQUEST_TIMEOUT,
};
use crate::models::ReportStatus;
use crate::polling::{PollCadence, PollPolicy};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// Describes where the analysis backend lives and how aggressively reports
/// are polled. It can be constructed programmatically, read from the
/// environment with [`ClientConfig::from_env`], or built from CLI options.
///
/// # Examples
///
/// ```no_run
/// use seo_report_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig {
///     api_url: "https://seo.example.com".to_string(),
///     poll_interval: Duration::from_secs(2),
///     ..Default::default()
/// };
/// assert_eq!(config.base_url(), "https://seo.example.com/api/v1");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (scheme, host, optional port)
    pub api_url: String,

    /// API version prefix appended to `api_url`
    pub api_version: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Delay between fetches of a non-terminal report
    pub poll_interval: Duration,

    /// Double the report poll delay after every non-terminal fetch
    pub poll_backoff: bool,

    /// Give up automatic report polling after this many fetches (unbounded when `None`)
    pub max_polls: Option<usize>,

    /// Delay between refreshes of the report list
    pub list_interval: Duration,

    /// Ask the backend for AI insights on new submissions
    pub include_ai_insights: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            poll_interval: REPORT_POLL_INTERVAL,
            poll_backoff: false,
            max_polls: None,
            list_interval: LIST_POLL_INTERVAL,
            include_ai_insights: DEFAULT_INCLUDE_AI_INSIGHTS,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from `SEO_API_URL` and `SEO_API_VERSION`.
    ///
    /// Missing or blank variables fall back to the documented defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_url: non_blank(ENV_API_URL).unwrap_or(defaults.api_url.clone()),
            api_version: non_blank(ENV_API_VERSION).unwrap_or(defaults.api_version.clone()),
            ..defaults
        }
    }

    /// Full URL prefix for every endpoint, e.g. `http://localhost:8000/api/v1`.
    pub fn base_url(&self) -> String {
        let root = self.api_url.trim().trim_end_matches('/');
        let version = self.api_version.trim().trim_matches('/');
        if version.is_empty() {
            root.to_string()
        } else {
            format!("{}/{}", root, version)
        }
    }

    /// Report poll policy derived from the cadence settings.
    pub fn poll_policy(&self) -> PollPolicy {
        let cadence = if self.poll_backoff {
            PollCadence::Exponential {
                max_delay: MAX_POLL_BACKOFF.max(self.poll_interval),
            }
        } else {
            PollCadence::Fixed
        };
        PollPolicy {
            interval: self.poll_interval,
            cadence,
            max_polls: self.max_polls.map(|max_polls| max_polls.max(1)),
        }
    }
}

/// Command-line options and configuration.
///
/// # Examples
///
/// ```bash
/// # Submit a URL and follow the report until it completes
/// seo_report_client analyze https://example.com
///
/// # Show the dashboard list, refreshing every 10 seconds
/// seo_report_client list --follow
///
/// # Talk to a remote backend
/// SEO_API_URL=https://seo.example.com seo_report_client show 42
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "seo_report_client",
    about = "Submits websites for SEO analysis and follows the resulting reports."
)]
pub struct Opt {
    /// Backend base URL
    #[arg(long, env = ENV_API_URL, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// API version prefix
    #[arg(long, env = ENV_API_VERSION, default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT.as_secs())]
    pub timeout_seconds: u64,

    /// Seconds between fetches of a report that is still being analyzed
    #[arg(long, default_value_t = REPORT_POLL_INTERVAL.as_secs())]
    pub poll_seconds: u64,

    /// Double the report poll delay after every fetch (capped at 60s)
    #[arg(long)]
    pub poll_backoff: bool,

    /// Stop automatic report polling after this many fetches (at least 1)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_polls: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Opt {
    /// Converts the parsed options into a library configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            api_version: self.api_version.clone(),
            request_timeout: Duration::from_secs(self.timeout_seconds.max(1)),
            poll_interval: Duration::from_secs(self.poll_seconds.max(1)),
            poll_backoff: self.poll_backoff,
            max_polls: self
                .max_polls
                .map(|max_polls| usize::try_from(max_polls).unwrap_or(usize::MAX)),
            ..Default::default()
        }
    }
}

/// Subcommands of the CLI.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a URL for analysis and follow the report
    Analyze {
        /// Absolute http:// or https:// URL to analyze
        url: String,

        /// Do not ask the backend for AI insights
        #[arg(long)]
        no_ai: bool,

        /// Return right after submission instead of following the report
        #[arg(long)]
        no_watch: bool,
    },

    /// Fetch a report once and print it
    Show {
        /// Report identifier
        id: u64,
    },

    /// Follow a report until it completes or fails
    Watch {
        /// Report identifier
        id: u64,
    },

    /// List reports
    List {
        /// Number of reports to skip
        #[arg(long, default_value_t = 0)]
        skip: u32,

        /// Page size (1-100)
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,

        /// Only show reports with this status
        #[arg(long)]
        status: Option<ReportStatus>,

        /// Only show reports whose URL contains this text
        #[arg(long)]
        url: Option<String>,

        /// Keep refreshing the list until interrupted
        #[arg(long)]
        follow: bool,
    },

    /// Download the PDF rendering of a completed report
    Download {
        /// Report identifier
        id: u64,

        /// Directory to save the PDF into
        #[arg(long, value_parser, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.api_version, "/api/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.list_interval, Duration::from_secs(10));
        assert!(config.max_polls.is_none());
        assert!(!config.poll_backoff);
        assert!(config.include_ai_insights);
    }

    #[test]
    fn test_base_url_joins_with_single_slash() {
        let mut config = ClientConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8000/api/v1");

        config.api_url = "https://seo.example.com/".to_string();
        config.api_version = "api/v2/".to_string();
        assert_eq!(config.base_url(), "https://seo.example.com/api/v2");

        config.api_version = String::new();
        assert_eq!(config.base_url(), "https://seo.example.com");
    }

    #[test]
    fn test_from_lookup_uses_environment_values() {
        let vars: HashMap<&str, &str> = [
            ("SEO_API_URL", "https://api.example.org"),
            ("SEO_API_VERSION", "/v9"),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.base_url(), "https://api.example.org/v9");
    }

    #[test]
    fn test_from_lookup_falls_back_on_missing_or_blank() {
        let config = ClientConfig::from_lookup(|key| match key {
            "SEO_API_URL" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_poll_policy_follows_config() {
        let config = ClientConfig::default();
        let policy = config.poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert!(matches!(policy.cadence, PollCadence::Fixed));
        assert!(policy.max_polls.is_none());

        let config = ClientConfig {
            poll_backoff: true,
            max_polls: Some(12),
            ..Default::default()
        };
        let policy = config.poll_policy();
        assert!(matches!(policy.cadence, PollCadence::Exponential { .. }));
        assert_eq!(policy.max_polls, Some(12));

        let config = ClientConfig {
            max_polls: Some(0),
            ..Default::default()
        };
        assert_eq!(config.poll_policy().max_polls, Some(1));
    }

    #[test]
    fn test_opt_rejects_zero_max_polls() {
        let rejected = Opt::try_parse_from(["seo_report_client", "--max-polls", "0", "list"]);
        assert!(rejected.is_err());

        let opt = Opt::try_parse_from(["seo_report_client", "--max-polls", "3", "list"])
            .expect("valid arguments");
        assert_eq!(opt.client_config().max_polls, Some(3));
    }

    #[test]
    fn test_opt_parses_list_command() {
        let opt = Opt::try_parse_from([
            "seo_report_client",
            "--api-url",
            "http://backend:9000",
            "list",
            "--status",
            "completed",
            "--limit",
            "25",
            "--follow",
        ])
        .expect("valid arguments");
        assert_eq!(opt.client_config().base_url(), "http://backend:9000/api/v1");
        match opt.command {
            Command::List {
                skip,
                limit,
                status,
                follow,
                ..
            } => {
                assert_eq!(skip, 0);
                assert_eq!(limit, 25);
                assert_eq!(status, Some(ReportStatus::Completed));
                assert!(follow);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_opt_rejects_unknown_status() {
        let result = Opt::try_parse_from(["seo_report_client", "list", "--status", "archived"]);
        assert!(result.is_err());
    }
}
