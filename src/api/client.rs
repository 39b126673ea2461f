//! HTTP implementation of [`ReportApi`].

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::download::{pdf_filename, PdfDownload};
use super::ReportApi;
use crate::config::ClientConfig;
use crate::error_handling::{
    categorize_reqwest_error, categorize_status, ClientError, InitializationError,
};
use crate::initialization::{init_client, parse_base_url};
use crate::models::{AnalysisRequest, ListQuery, Report, ReportId, ReportPage, Submission};

const REPORTS_PATH: &str = "seo-reports";

/// Client for the `/seo-reports` endpoints of the analysis backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ReportClient {
    http: Arc<reqwest::Client>,
    base_url: Url,
}

impl ReportClient {
    /// Creates a client for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, InitializationError> {
        let base_url = parse_base_url(config)?;
        let http = init_client(config)?;
        Ok(Self { http, base_url })
    }

    /// Base URL every endpoint is resolved against (ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Unknown(format!("invalid endpoint '{}': {}", path, e)))
    }

    /// Downloads the PDF rendering of a report.
    ///
    /// `hint` (usually the last fetched snapshot) supplies the title and URL
    /// used to name the file when the backend sends no `Content-Disposition`.
    pub async fn download_pdf(
        &self,
        id: ReportId,
        hint: Option<&Report>,
    ) -> Result<PdfDownload, ClientError> {
        let url = self.endpoint(&format!("{}/{}/pdf", REPORTS_PATH, id))?;
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/pdf")
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;
        let response = ensure_success(response).await?;

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;

        let filename = pdf_filename(
            disposition.as_deref(),
            hint.and_then(|r| r.title.as_deref()),
            hint.map(|r| r.url.as_str()),
            id,
        );
        debug!("Downloaded {} bytes for report {} as {}", bytes.len(), id, filename);

        Ok(PdfDownload {
            filename,
            bytes: bytes.to_vec(),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;
        let response = ensure_success(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::Unknown(format!("unreadable response: {}", e)))
    }
}

/// Passes 2xx responses through and normalizes everything else.
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    // The body only feeds the error message; losing it is not worth a second error.
    let body = response.text().await.unwrap_or_default();
    debug!("Backend answered {}: {}", status, body);
    Err(categorize_status(status, &body))
}

#[async_trait]
impl ReportApi for ReportClient {
    async fn submit_for_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Submission, ClientError> {
        let url = self.endpoint(&format!("{}/analyze", REPORTS_PATH))?;
        debug!("POST {} ({})", url, request.url);
        self.send_json(self.http.post(url).json(request)).await
    }

    async fn fetch_report(&self, id: ReportId) -> Result<Report, ClientError> {
        let url = self.endpoint(&format!("{}/{}", REPORTS_PATH, id))?;
        debug!("GET {}", url);
        self.send_json(self.http.get(url)).await
    }

    async fn fetch_report_list(&self, query: &ListQuery) -> Result<ReportPage, ClientError> {
        let url = self.endpoint(REPORTS_PATH)?;
        debug!("GET {} {:?}", url, query.params());
        self.send_json(self.http.get(url).query(&query.params())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_keep_version_prefix() {
        let client = ReportClient::new(&ClientConfig::default()).expect("valid config");
        assert_eq!(
            client.endpoint("seo-reports/analyze").expect("joinable").as_str(),
            "http://localhost:8000/api/v1/seo-reports/analyze"
        );
        assert_eq!(
            client.endpoint("seo-reports/12/pdf").expect("joinable").as_str(),
            "http://localhost:8000/api/v1/seo-reports/12/pdf"
        );
    }
}
