//! Request and response shapes for submission and listing.

use serde::{Deserialize, Serialize};

use super::report::{Report, ReportId, ReportStatus};
use crate::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// Body of `POST /seo-reports/analyze`.
///
/// Built for a single call and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub url: String,
    pub include_ai_insights: bool,
}

impl AnalysisRequest {
    pub fn new(url: impl Into<String>, include_ai_insights: bool) -> Self {
        Self {
            url: url.into(),
            include_ai_insights,
        }
    }
}

/// Backend acknowledgement of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub report_id: ReportId,
    /// `processing` for a new analysis, `completed` when the backend reused a
    /// finished report for the same URL.
    pub status: ReportStatus,
    #[serde(default)]
    pub message: String,
}

impl Submission {
    /// User-facing confirmation for this submission.
    pub fn notice(&self) -> &'static str {
        match self.status {
            ReportStatus::Completed => "Analysis completed successfully!",
            _ => "Analysis started! Check back in a few moments.",
        }
    }
}

/// Key of one report-list view: pagination plus filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub skip: u32,
    pub limit: u32,
    pub status: Option<ReportStatus>,
    /// Substring filter on the report URL
    pub url_contains: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_LIMIT)
    }
}

impl ListQuery {
    /// Creates a query; `limit` is clamped to `1..=100`.
    pub fn new(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            status: None,
            url_contains: None,
        }
    }

    pub fn with_status(mut self, status: Option<ReportStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_url_filter(mut self, url_contains: Option<String>) -> Self {
        self.url_contains = url_contains.filter(|s| !s.trim().is_empty());
        self
    }

    /// Query-string pairs in the order the backend documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(url) = &self.url_contains {
            params.push(("url", url.clone()));
        }
        params
    }

    /// One-based page number this query lands on.
    pub fn page(&self) -> u32 {
        self.skip / self.limit.max(1) + 1
    }
}

/// One page of the report list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPage {
    #[serde(default)]
    pub reports: Vec<Report>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl ReportPage {
    /// Number of pages needed for `total` reports.
    pub fn page_count(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }

    /// Reports on this page that are still being analyzed.
    pub fn in_progress(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_terminal()).count()
    }
}
