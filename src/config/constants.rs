//! Configuration constants.
//!
//! Defaults for the backend location, request timeouts and polling cadence.
//! Every value here can be overridden through `ClientConfig`, the CLI, or the
//! environment.

use std::time::Duration;

/// Backend base URL used when `SEO_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// API version prefix used when `SEO_API_VERSION` is not set.
pub const DEFAULT_API_VERSION: &str = "/api/v1";

/// Environment variable holding the backend base URL.
pub const ENV_API_URL: &str = "SEO_API_URL";
/// Environment variable holding the API version prefix.
pub const ENV_API_VERSION: &str = "SEO_API_VERSION";

/// Per-request timeout for every call to the backend.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Polling cadence
/// Delay between fetches of a report whose status is still pending or processing.
pub const REPORT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Delay between refreshes of the dashboard report list.
pub const LIST_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Upper bound for a single delay when exponential poll backoff is enabled.
pub const MAX_POLL_BACKOFF: Duration = Duration::from_secs(60);

// Pagination
/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
/// Largest page size the backend accepts.
pub const MAX_PAGE_LIMIT: u32 = 100;

// Submission
/// Whether new analyses ask the backend for AI insights by default.
pub const DEFAULT_INCLUDE_AI_INSIGHTS: bool = true;

// Download artifact
/// Extension appended to derived PDF filenames.
pub const PDF_EXTENSION: &str = "pdf";
/// Maximum length of a derived filename stem (before the extension).
pub const MAX_FILENAME_STEM_LENGTH: usize = 100;
