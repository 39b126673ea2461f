// Shared test helpers: report fixtures and a scripted in-memory backend.
//
// Every test binary includes this module with `mod helpers;`, so not every
// helper is used everywhere.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use seo_report_client::api::ReportApi;
use seo_report_client::models::{
    AnalysisRequest, ListQuery, Report, ReportId, ReportPage, ReportStatus, Submission,
};
use seo_report_client::ClientError;

/// JSON body of a report as the backend serves it.
pub fn report_json(id: u64, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "url": "https://example.com",
        "status": status,
        "title": null,
        "meta_description": null,
        "h1_tags": null,
        "h2_tags": null,
        "images": null,
        "links": null,
        "load_time": null,
        "seo_score": null,
        "accessibility_score": null,
        "performance_score": null,
        "ai_insights": null,
        "ai_recommendations": null,
        "error_message": null,
        "created_at": "2024-06-01T10:00:00",
        "updated_at": null,
    })
}

/// A report with the given status and no content.
pub fn report(id: u64, status: &str) -> Report {
    serde_json::from_value(report_json(id, status)).expect("valid report fixture")
}

/// A completed report with an SEO score.
pub fn completed_report(id: u64, seo_score: f64) -> Report {
    let mut report = report(id, "completed");
    report.title = Some("Example Domain".to_string());
    report.seo_score = Some(seo_score);
    report
}

pub fn submission(id: u64, status: ReportStatus) -> Submission {
    Submission {
        report_id: ReportId(id),
        status,
        message: "Analysis started".to_string(),
    }
}

pub fn page(reports: Vec<Report>, total: u64) -> ReportPage {
    ReportPage {
        reports,
        total,
        page: 1,
        per_page: 10,
    }
}

/// Scripted backend.
///
/// Report scripts are consumed per id; the last entry repeats forever so a
/// report can "stay processing". Every call is recorded with the (possibly
/// paused) Tokio clock.
#[derive(Default)]
pub struct FakeApi {
    submissions: Mutex<VecDeque<Result<Submission, ClientError>>>,
    reports: Mutex<HashMap<ReportId, VecDeque<Result<Report, ClientError>>>>,
    pages: Mutex<VecDeque<Result<ReportPage, ClientError>>>,
    latency: Mutex<Duration>,
    submit_calls: Mutex<Vec<AnalysisRequest>>,
    report_calls: Mutex<Vec<(ReportId, Instant)>>,
    list_calls: Mutex<Vec<(ListQuery, Instant)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submission(self, result: Result<Submission, ClientError>) -> Self {
        self.submissions.lock().unwrap().push_back(result);
        self
    }

    pub fn with_reports(self, id: u64, script: Vec<Result<Report, ClientError>>) -> Self {
        self.reports
            .lock()
            .unwrap()
            .insert(ReportId(id), script.into());
        self
    }

    pub fn with_pages(self, script: Vec<Result<ReportPage, ClientError>>) -> Self {
        *self.pages.lock().unwrap() = script.into();
        self
    }

    /// Simulated response time of every call.
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock().unwrap() = latency;
        self
    }

    /// Appends to the script of `id` (or starts one).
    pub fn push_report(&self, id: u64, result: Result<Report, ClientError>) {
        self.reports
            .lock()
            .unwrap()
            .entry(ReportId(id))
            .or_default()
            .push_back(result);
    }

    /// Replaces the script of `id` with a single repeating entry.
    pub fn set_report(&self, id: u64, result: Result<Report, ClientError>) {
        self.reports
            .lock()
            .unwrap()
            .insert(ReportId(id), VecDeque::from([result]));
    }

    pub fn submit_calls(&self) -> Vec<AnalysisRequest> {
        self.submit_calls.lock().unwrap().clone()
    }

    pub fn report_calls(&self) -> Vec<(ReportId, Instant)> {
        self.report_calls.lock().unwrap().clone()
    }

    pub fn report_call_count(&self, id: u64) -> usize {
        self.report_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| *called == ReportId(id))
            .count()
    }

    pub fn list_calls(&self) -> Vec<(ListQuery, Instant)> {
        self.list_calls.lock().unwrap().clone()
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ReportApi for FakeApi {
    async fn submit_for_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Submission, ClientError> {
        self.submit_calls.lock().unwrap().push(request.clone());
        self.simulate_latency().await;
        self.submissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ClientError::Unknown("no scripted submission".into())))
    }

    async fn fetch_report(&self, id: ReportId) -> Result<Report, ClientError> {
        self.report_calls.lock().unwrap().push((id, Instant::now()));
        self.simulate_latency().await;
        let mut reports = self.reports.lock().unwrap();
        let Some(script) = reports.get_mut(&id) else {
            return Err(ClientError::NotFound);
        };
        if script.len() > 1 {
            script.pop_front().unwrap_or(Err(ClientError::NotFound))
        } else {
            script.front().cloned().unwrap_or(Err(ClientError::NotFound))
        }
    }

    async fn fetch_report_list(&self, query: &ListQuery) -> Result<ReportPage, ClientError> {
        self.list_calls
            .lock()
            .unwrap()
            .push((query.clone(), Instant::now()));
        self.simulate_latency().await;
        let mut pages = self.pages.lock().unwrap();
        if pages.len() > 1 {
            pages.pop_front().unwrap_or_else(|| Ok(page(Vec::new(), 0)))
        } else {
            pages.front().cloned().unwrap_or_else(|| Ok(page(Vec::new(), 0)))
        }
    }
}

/// Seconds elapsed between consecutive calls.
pub fn gaps(instants: &[Instant]) -> Vec<u64> {
    instants
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_secs())
        .collect()
}
