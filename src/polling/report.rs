//! Report polling engine.
//!
//! One [`ReportPoller`] follows one report id at a time. A single spawned task
//! fetches the report, publishes the result, and decides whether to schedule
//! the next fetch:
//!
//! - `pending` / `processing`: wait for the next delay of the [`PollPolicy`]
//!   schedule, then fetch again;
//! - `completed` / `failed`: stop for good;
//! - fetch error: stop and surface the error until the caller refreshes;
//! - schedule exhausted: stop in [`PollState::Stalled`].
//!
//! Fetches for one id never overlap because the task awaits each fetch before
//! sleeping. Every snapshot write carries the generation the task was started
//! with and is dropped if the poller has moved on (detached or switched ids),
//! so nothing lands after teardown.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::policy::PollPolicy;
use super::state::{PollState, ReportSnapshot};
use crate::api::ReportApi;
use crate::error_handling::ClientError;
use crate::models::{Report, ReportId};

/// Follows a report until it reaches a terminal status.
///
/// Dropping the poller detaches it.
pub struct ReportPoller {
    api: Arc<dyn ReportApi>,
    policy: PollPolicy,
    snapshot: Arc<watch::Sender<ReportSnapshot>>,
    control: Mutex<Control>,
}

struct Control {
    generation: u64,
    cancel: CancellationToken,
    wake: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl Control {
    fn task_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

/// How a new polling run treats the snapshot it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Start {
    /// New id: previous report is discarded.
    Fresh,
    /// Same id: previous report stays visible while loading.
    Resume,
}

impl ReportPoller {
    pub fn new(api: Arc<dyn ReportApi>, policy: PollPolicy) -> Self {
        let (snapshot, _) = watch::channel(ReportSnapshot::idle());
        Self {
            api,
            policy,
            snapshot: Arc::new(snapshot),
            control: Mutex::new(Control {
                generation: 0,
                cancel: CancellationToken::new(),
                wake: Arc::new(Notify::new()),
                task: None,
            }),
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Starts following `id`.
    ///
    /// A different id cancels any scheduled fetch of the previous one and
    /// resets the snapshot to `Loading` with no report. Watching the id that
    /// is already being polled changes nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch(&self, id: ReportId) {
        let mut control = self.lock_control();
        let current = self.snapshot.borrow().report_id;
        if current == Some(id) && control.task_running() {
            debug!("Report {} is already being polled", id);
            return;
        }
        let start = if current == Some(id) {
            Start::Resume
        } else {
            Start::Fresh
        };
        self.start(&mut control, id, start);
    }

    /// Asks for fresh data without overriding the terminal contract.
    ///
    /// - in progress: fetch now, then keep the regular schedule;
    /// - errored or stalled: fetch again and resume automatic polling;
    /// - loading: the in-flight fetch already answers the request;
    /// - terminal or idle: nothing happens, the snapshot is kept.
    pub fn refresh(&self) {
        let mut control = self.lock_control();
        let (id, state) = {
            let snapshot = self.snapshot.borrow();
            (snapshot.report_id, snapshot.state.clone())
        };
        let Some(id) = id else {
            debug!("Refresh ignored: no report is being watched");
            return;
        };

        if control.task.is_none() {
            debug!("Refresh ignored: poller for report {} is detached", id);
            return;
        }

        match state {
            PollState::Ready(status) if status.is_terminal() => {
                debug!("Refresh ignored: report {} is already {}", id, status);
            }
            PollState::Loading if control.task_running() => {
                debug!("Refresh of report {} joins the fetch in flight", id);
            }
            PollState::Ready(_) if control.task_running() => {
                debug!("Refreshing report {} out of schedule", id);
                control.wake.notify_one();
            }
            _ => {
                info!("Resuming polling of report {}", id);
                self.start(&mut control, id, Start::Resume);
            }
        }
    }

    /// Fetches the current report again, even after a terminal status.
    ///
    /// Automatic polling resumes only if the fetched status is in progress.
    pub fn reload(&self) {
        let mut control = self.lock_control();
        let Some(id) = self.snapshot.borrow().report_id else {
            debug!("Reload ignored: no report is being watched");
            return;
        };
        info!("Reloading report {}", id);
        self.start(&mut control, id, Start::Resume);
    }

    /// Stops polling. No snapshot update lands after this returns.
    ///
    /// The last snapshot stays readable; a fetch that was loading is
    /// reported as `Idle`.
    pub fn detach(&self) {
        let mut control = self.lock_control();
        control.cancel.cancel();
        control.generation += 1;
        control.task = None;
        let generation = control.generation;
        self.snapshot.send_modify(|snapshot| {
            snapshot.generation = generation;
            if snapshot.state == PollState::Loading {
                snapshot.state = PollState::Idle;
            }
        });
        if let Some(id) = self.snapshot.borrow().report_id {
            debug!("Detached from report {}", id);
        }
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<ReportSnapshot> {
        self.snapshot.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> ReportSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Waits until polling stops on its own: terminal status, fetch error,
    /// exhausted schedule, or idle.
    pub async fn settled(&self) -> ReportSnapshot {
        let mut receiver = self.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let settled = match receiver.wait_for(|snapshot| snapshot.state.is_settled()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    fn start(&self, control: &mut Control, id: ReportId, start: Start) {
        control.cancel.cancel();
        control.generation += 1;
        control.cancel = CancellationToken::new();
        control.wake = Arc::new(Notify::new());

        let generation = control.generation;
        self.snapshot.send_modify(|snapshot| {
            if start == Start::Fresh {
                snapshot.report = None;
            }
            snapshot.report_id = Some(id);
            snapshot.state = PollState::Loading;
            snapshot.generation = generation;
        });
        debug!("Polling report {} (generation {})", id, generation);

        let run = PollRun {
            api: Arc::clone(&self.api),
            policy: self.policy,
            snapshot: Arc::clone(&self.snapshot),
            cancel: control.cancel.clone(),
            wake: Arc::clone(&control.wake),
            id,
            generation,
        };
        control.task = Some(tokio::spawn(run.execute()));
    }

    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ReportPoller {
    fn drop(&mut self) {
        self.detach();
    }
}

/// One polling run for one id and generation.
struct PollRun {
    api: Arc<dyn ReportApi>,
    policy: PollPolicy,
    snapshot: Arc<watch::Sender<ReportSnapshot>>,
    cancel: CancellationToken,
    wake: Arc<Notify>,
    id: ReportId,
    generation: u64,
}

/// What the run does after applying a fetch result.
enum Next {
    Schedule,
    Stop,
}

impl PollRun {
    async fn execute(self) {
        let mut schedule = self.policy.schedule();
        let mut fetches = 0usize;

        loop {
            if !self.publish(|snapshot| snapshot.state = PollState::Loading) {
                return;
            }

            let result = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.api.fetch_report(self.id) => result,
            };
            fetches += 1;

            match self.apply(result) {
                Some(Next::Schedule) => {}
                Some(Next::Stop) | None => return,
            }

            let Some(delay) = schedule.next() else {
                warn!(
                    "Report {} still in progress after {} fetches; automatic polling stopped",
                    self.id, fetches
                );
                self.publish(|snapshot| snapshot.state = PollState::Stalled);
                return;
            };

            debug!("Next fetch of report {} in {:?}", self.id, delay);
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
                _ = self.wake.notified() => {
                    debug!("Out-of-schedule fetch of report {}", self.id);
                }
            }
        }
    }

    /// Publishes one fetch result. `None` when this run is stale.
    fn apply(&self, result: Result<Report, ClientError>) -> Option<Next> {
        match result {
            Ok(report) => {
                let status = report.status;
                let applied = self.publish(|snapshot| {
                    if let Some(previous) = &snapshot.report {
                        if !previous.status.can_advance_to(status) {
                            warn!(
                                "Report {} went from {} back to {}",
                                self.id, previous.status, status
                            );
                        }
                    }
                    snapshot.state = PollState::Ready(status);
                    snapshot.report = Some(report);
                });
                if !applied {
                    return None;
                }
                if status.is_terminal() {
                    info!("Report {} is {}; polling stopped", self.id, status);
                    Some(Next::Stop)
                } else {
                    debug!("Report {} is {}", self.id, status);
                    Some(Next::Schedule)
                }
            }
            Err(error) => {
                warn!("Fetching report {} failed: {}", self.id, error);
                self.publish(|snapshot| snapshot.state = PollState::Errored(error));
                Some(Next::Stop)
            }
        }
    }

    /// Applies `update` if this run is still current; returns whether it did.
    fn publish(&self, update: impl FnOnce(&mut ReportSnapshot)) -> bool {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.generation != self.generation {
                return false;
            }
            update(snapshot);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisRequest, ListQuery, ReportPage, ReportStatus, Submission};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::time::Instant;

    struct Scripted {
        responses: Mutex<VecDeque<Result<Report, ClientError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Report, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReportApi for Scripted {
        async fn submit_for_analysis(&self, _: &AnalysisRequest) -> Result<Submission, ClientError> {
            unreachable!("not used by the report poller")
        }

        async fn fetch_report(&self, _: ReportId) -> Result<Report, ClientError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ClientError::Unknown("script exhausted".into())))
        }

        async fn fetch_report_list(&self, _: &ListQuery) -> Result<ReportPage, ClientError> {
            unreachable!("not used by the report poller")
        }
    }

    fn report(id: u64, status: &str) -> Report {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "url": "https://example.com",
            "status": status,
            "created_at": "2024-01-01T00:00:00",
        }))
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_terminal_status() {
        let api = Scripted::new(vec![
            Ok(report(1, "processing")),
            Ok(report(1, "completed")),
        ]);
        let poller = ReportPoller::new(api.clone(), PollPolicy::default());
        poller.watch(ReportId(1));

        let snapshot = poller.settled().await;
        assert_eq!(snapshot.state, PollState::Ready(ReportStatus::Completed));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_suppresses_scheduled_fetch() {
        let api = Scripted::new(vec![Ok(report(1, "processing"))]);
        let poller = ReportPoller::new(api.clone(), PollPolicy::default());
        poller.watch(ReportId(1));

        let mut receiver = poller.subscribe();
        receiver
            .wait_for(|s| s.state == PollState::Ready(ReportStatus::Processing))
            .await
            .unwrap();
        poller.detach();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.call_count(), 1);
        assert_eq!(
            poller.snapshot().state,
            PollState::Ready(ReportStatus::Processing)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_stops_polling() {
        let api = Scripted::new(vec![Err(ClientError::NotFound)]);
        let poller = ReportPoller::new(api.clone(), PollPolicy::default());
        poller.watch(ReportId(9));

        let snapshot = poller.settled().await;
        assert_eq!(snapshot.state, PollState::Errored(ClientError::NotFound));
        assert!(snapshot.report.is_none());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_polls_stalls() {
        let api = Scripted::new(vec![
            Ok(report(1, "pending")),
            Ok(report(1, "processing")),
        ]);
        let policy = PollPolicy::default().with_max_polls(2);
        let poller = ReportPoller::new(api.clone(), policy);
        poller.watch(ReportId(1));

        let snapshot = poller.settled().await;
        assert_eq!(snapshot.state, PollState::Stalled);
        assert_eq!(
            snapshot.report.map(|r| r.status),
            Some(ReportStatus::Processing)
        );
        assert_eq!(api.call_count(), 2);
    }
}
