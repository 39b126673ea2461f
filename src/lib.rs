//! seo_report_client library: asynchronous SEO report lifecycle client
//!
//! This library submits website URLs to an SEO analysis backend and follows the
//! resulting reports as they move from `pending`/`processing` to `completed` or
//! `failed`. It provides:
//!
//! - a typed repository client for the `/seo-reports` endpoints ([`api`])
//! - a submission controller with local URL validation ([`submission`])
//! - a report polling engine that stops at terminal statuses and a list
//!   polling engine for dashboard views ([`polling`])
//! - a closed error taxonomy every failure is normalized into ([`error_handling`])
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use seo_report_client::api::{ReportApi, ReportClient};
//! use seo_report_client::polling::ReportPoller;
//! use seo_report_client::submission::SubmissionController;
//! use seo_report_client::ClientConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env();
//! let api: Arc<dyn ReportApi> = Arc::new(ReportClient::new(&config)?);
//!
//! let controller = SubmissionController::new(Arc::clone(&api));
//! let submission = controller.submit("https://example.com").await?;
//!
//! let poller = ReportPoller::new(api, config.poll_policy());
//! poller.watch(submission.report_id);
//! let snapshot = poller.settled().await;
//! println!("{:?}", snapshot.state);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! The pollers spawn Tokio tasks. Use `#[tokio::main]` in your application or
//! ensure you're calling library functions within an async context.

pub mod api;
mod app;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod models;
pub mod polling;
pub mod submission;

// Re-export public API
pub use app::{format_load_time, render_report, run_command, score_label};
pub use config::{ClientConfig, LogFormat, LogLevel};
pub use error_handling::{ClientError, ErrorKind, SubmitError};
