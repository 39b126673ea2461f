//! CLI command handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use super::render::{render_page, render_report, status_badge};
use super::shutdown::interrupted;
use crate::api::{ReportApi, ReportClient, DOWNLOAD_FAILED_NOTICE};
use crate::config::{ClientConfig, Command};
use crate::models::{ListQuery, ReportId, ReportStatus};
use crate::polling::{ListPoller, ListState, PollPolicy, PollState, ReportPoller};
use crate::submission::SubmissionController;

/// Runs one CLI command against the backend described by `config`.
///
/// # Errors
///
/// Fails when the client cannot be built, the backend call fails, or a
/// followed report cannot be fetched. A report that ends in `failed` is not
/// an error.
pub async fn run_command(config: ClientConfig, command: Command) -> Result<()> {
    let client = ReportClient::new(&config).context("Failed to create API client")?;
    info!("Using analysis backend at {}", client.base_url());

    match command {
        Command::Analyze {
            url,
            no_ai,
            no_watch,
        } => {
            let api: Arc<dyn ReportApi> = Arc::new(client);
            let controller = SubmissionController::new(Arc::clone(&api))
                .with_ai_insights(config.include_ai_insights && !no_ai);
            let submission = controller.submit(&url).await?;
            println!("{}", submission.notice());
            println!("Report ID: {}", submission.report_id);
            if no_watch {
                return Ok(());
            }
            follow_report(api, config.poll_policy(), submission.report_id).await
        }
        Command::Show { id } => {
            let id = ReportId(id);
            let report = client
                .fetch_report(id)
                .await
                .with_context(|| format!("Failed to fetch report {}", id))?;
            print!("{}", render_report(&report));
            Ok(())
        }
        Command::Watch { id } => {
            follow_report(Arc::new(client), config.poll_policy(), ReportId(id)).await
        }
        Command::List {
            skip,
            limit,
            status,
            url,
            follow,
        } => {
            let query = ListQuery::new(skip, limit)
                .with_status(status)
                .with_url_filter(url);
            if follow {
                follow_list(Arc::new(client), &config, query).await
            } else {
                let page = client
                    .fetch_report_list(&query)
                    .await
                    .context("Failed to fetch reports")?;
                print!("{}", render_page(&page));
                Ok(())
            }
        }
        Command::Download { id, output_dir } => {
            download(&client, ReportId(id), &output_dir).await
        }
    }
}

/// Polls a report until it settles or the user interrupts.
async fn follow_report(api: Arc<dyn ReportApi>, policy: PollPolicy, id: ReportId) -> Result<()> {
    let poller = ReportPoller::new(api, policy);
    let mut updates = poller.subscribe();
    poller.watch(id);

    let interrupt = interrupted();
    tokio::pin!(interrupt);

    let mut last_status: Option<ReportStatus> = None;
    let settled = loop {
        let snapshot = updates.borrow_and_update().clone();
        if let PollState::Ready(status) = snapshot.state {
            if last_status != Some(status) {
                println!("Report {}: {}", id, status_badge(status));
                last_status = Some(status);
            }
        }
        if snapshot.state.is_settled() {
            break snapshot;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break poller.snapshot();
                }
            }
            _ = &mut interrupt => {
                poller.detach();
                println!("Stopped watching report {}", id);
                return Ok(());
            }
        }
    };

    match settled.state {
        PollState::Errored(error) => {
            Err(error).with_context(|| format!("Failed to fetch report {}", id))
        }
        PollState::Stalled => {
            let status = settled.report.map(|r| r.status.to_string());
            bail!(
                "Report {} is still {} after automatic polling stopped",
                id,
                status.as_deref().unwrap_or("in progress")
            )
        }
        _ => {
            if let Some(report) = settled.report {
                print!("{}", render_report(&report));
            }
            Ok(())
        }
    }
}

/// Prints the report list on every refresh until the user interrupts.
async fn follow_list(api: Arc<dyn ReportApi>, config: &ClientConfig, query: ListQuery) -> Result<()> {
    let poller = ListPoller::new(api, config.list_interval);
    let mut updates = poller.subscribe();
    poller.watch(query);

    let interrupt = interrupted();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            _ = &mut interrupt => {
                poller.detach();
                return Ok(());
            }
        }

        let snapshot = updates.borrow_and_update().clone();
        match (&snapshot.state, &snapshot.page) {
            (ListState::Ready, Some(page)) => {
                println!();
                print!("{}", render_page(page));
            }
            (ListState::Errored(error), _) => {
                eprintln!("Failed to refresh reports: {}", error);
            }
            _ => {}
        }
    }
}

async fn download(client: &ReportClient, id: ReportId, output_dir: &Path) -> Result<()> {
    // Title and URL only name the file; download without them if the fetch fails.
    let hint = match client.fetch_report(id).await {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Could not fetch report {} for naming the PDF: {}", id, e);
            None
        }
    };

    let pdf = match client.download_pdf(id, hint.as_ref()).await {
        Ok(pdf) => pdf,
        Err(e) => {
            warn!("Downloading PDF of report {} failed: {}", id, e);
            bail!(DOWNLOAD_FAILED_NOTICE);
        }
    };
    let path = match pdf.save_into(output_dir).await {
        Ok(path) => path,
        Err(e) => {
            warn!("Saving {} into {} failed: {}", pdf.filename, output_dir.display(), e);
            bail!(DOWNLOAD_FAILED_NOTICE);
        }
    };
    println!("Saved {}", path.display());
    Ok(())
}
