//! Report repository client.
//!
//! [`ReportApi`] is the seam between the analysis backend and everything that
//! consumes reports. [`ReportClient`] implements it over HTTP; tests and
//! embedders can provide their own implementation.

mod client;
mod download;

use async_trait::async_trait;

use crate::error_handling::ClientError;
use crate::models::{AnalysisRequest, ListQuery, Report, ReportId, ReportPage, Submission};

pub use client::ReportClient;
pub use download::{pdf_filename, PdfDownload, DOWNLOAD_FAILED_NOTICE};

/// Typed access to the analysis backend.
///
/// Implementations must report failures through the [`ClientError`] taxonomy
/// only, so callers never branch on transport details.
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// Starts an analysis. The URL is expected to be validated by the caller.
    async fn submit_for_analysis(&self, request: &AnalysisRequest)
        -> Result<Submission, ClientError>;

    /// Fetches one report. A missing report is `ClientError::NotFound`.
    async fn fetch_report(&self, id: ReportId) -> Result<Report, ClientError>;

    /// Fetches one page of the report list. Read-only.
    async fn fetch_report_list(&self, query: &ListQuery) -> Result<ReportPage, ClientError>;
}
