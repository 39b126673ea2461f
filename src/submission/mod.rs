//! Submission controller.
//!
//! Validates a URL, sends it for analysis, and tracks whether a submission is
//! in flight. One controller allows at most one in-flight submission.
//!
//! Success is reported twice, explicitly: as the `Ok` value of
//! [`SubmissionController::submit`], and as one [`SubmissionEvent`] on the
//! controller's broadcast channel for observers such as the list poller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use log::{debug, info, warn};
use regex::Regex;
use tokio::sync::broadcast;

use crate::api::ReportApi;
use crate::config::DEFAULT_INCLUDE_AI_INSIGHTS;
use crate::error_handling::SubmitError;
use crate::models::{AnalysisRequest, Submission};

/// Message for an empty URL field.
pub const URL_REQUIRED_MESSAGE: &str = "URL is required";
/// Message for a URL without an http(s) scheme.
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid URL starting with http:// or https://";

const EVENT_CAPACITY: usize = 16;

static SUBMITTABLE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+").expect("static regex is valid"));

/// Checks a raw URL before anything is sent.
///
/// # Errors
///
/// `SubmitError::Validation` with a user-facing message when the input is
/// empty or does not start with `http://` or `https://` followed by at least
/// one character.
pub fn validate_submission_url(raw_url: &str) -> Result<(), SubmitError> {
    if raw_url.is_empty() {
        return Err(SubmitError::Validation(URL_REQUIRED_MESSAGE.to_string()));
    }
    if !SUBMITTABLE_URL.is_match(raw_url) {
        return Err(SubmitError::Validation(INVALID_URL_MESSAGE.to_string()));
    }
    Ok(())
}

/// Emitted once per successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Accepted {
        url: String,
        submission: Submission,
    },
}

/// Submission lifecycle of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
}

/// Form-side driver of analysis submissions.
pub struct SubmissionController {
    api: Arc<dyn ReportApi>,
    include_ai_insights: bool,
    submitting: AtomicBool,
    input: Mutex<String>,
    events: broadcast::Sender<SubmissionEvent>,
}

/// Clears the submitting flag when dropped, so the flag is released on
/// success, on error, and when the submit future is cancelled.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SubmissionController {
    pub fn new(api: Arc<dyn ReportApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            include_ai_insights: DEFAULT_INCLUDE_AI_INSIGHTS,
            submitting: AtomicBool::new(false),
            input: Mutex::new(String::new()),
            events,
        }
    }

    /// Whether new submissions ask for AI insights (default `true`).
    pub fn with_ai_insights(mut self, include_ai_insights: bool) -> Self {
        self.include_ai_insights = include_ai_insights;
        self
    }

    /// Current value of the URL field.
    pub fn input(&self) -> String {
        self.lock_input().clone()
    }

    /// Replaces the value of the URL field.
    pub fn set_input(&self, value: impl Into<String>) {
        *self.lock_input() = value.into();
    }

    pub fn phase(&self) -> SubmissionPhase {
        if self.is_submitting() {
            SubmissionPhase::Submitting
        } else {
            SubmissionPhase::Idle
        }
    }

    /// `true` while a submission is in flight; new submissions are rejected.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Subscribes to successful-submission events.
    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    /// Submits `raw_url` for analysis.
    ///
    /// `raw_url` becomes the field value first. Invalid input fails before
    /// any network call. On success the field is cleared and one
    /// [`SubmissionEvent::Accepted`] is broadcast; on failure the field keeps
    /// the entered value so it can be corrected.
    ///
    /// # Errors
    ///
    /// - `SubmitError::Validation` for input failing [`validate_submission_url`]
    /// - `SubmitError::Busy` while another submission is in flight
    /// - `SubmitError::Client` when the backend call fails
    pub async fn submit(&self, raw_url: &str) -> Result<Submission, SubmitError> {
        if self.is_submitting() {
            debug!("Rejected submission of {}: another one is in flight", raw_url);
            return Err(SubmitError::Busy);
        }

        self.set_input(raw_url);
        validate_submission_url(raw_url)?;

        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Rejected submission of {}: another one is in flight", raw_url);
            return Err(SubmitError::Busy);
        }
        let _in_flight = InFlight(&self.submitting);

        let request = AnalysisRequest::new(raw_url, self.include_ai_insights);
        match self.api.submit_for_analysis(&request).await {
            Ok(submission) => {
                info!(
                    "Submitted {} as report {} ({})",
                    raw_url, submission.report_id, submission.status
                );
                self.lock_input().clear();
                // No subscribers is fine; the caller still gets the result.
                let _ = self.events.send(SubmissionEvent::Accepted {
                    url: raw_url.to_string(),
                    submission: submission.clone(),
                });
                Ok(submission)
            }
            Err(error) => {
                warn!("Failed to start analysis of {}: {}", raw_url, error);
                Err(SubmitError::from(error))
            }
        }
    }

    fn lock_input(&self) -> MutexGuard<'_, String> {
        // The field is a plain String; a poisoned lock still holds a usable value.
        self.input.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
