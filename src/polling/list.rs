//! List polling engine.
//!
//! Refreshes one page of the report list on a fixed interval for as long as
//! it is attached. There is no terminal state: fetch errors are published and
//! the next tick tries again.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::state::{ListSnapshot, ListState};
use crate::api::ReportApi;
use crate::models::ListQuery;
use crate::submission::SubmissionEvent;

/// Keeps one page of the report list fresh.
///
/// Dropping the poller detaches it and ends any submission follower.
pub struct ListPoller {
    api: Arc<dyn ReportApi>,
    interval: Duration,
    snapshot: Arc<watch::Sender<ListSnapshot>>,
    control: Mutex<ListControl>,
    shutdown: CancellationToken,
}

struct ListControl {
    generation: u64,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    attached: bool,
}

impl ListPoller {
    pub fn new(api: Arc<dyn ReportApi>, interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(ListSnapshot::idle());
        Self {
            api,
            interval,
            snapshot: Arc::new(snapshot),
            control: Mutex::new(ListControl {
                generation: 0,
                cancel: CancellationToken::new(),
                refresh: Arc::new(Notify::new()),
                attached: false,
            }),
            shutdown: CancellationToken::new(),
        }
    }

    /// Starts refreshing the page described by `query`.
    ///
    /// The first fetch happens immediately. A query different from the
    /// current one cancels the old schedule and clears the page; the same
    /// query while attached changes nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch(&self, query: ListQuery) {
        let mut control = self.lock_control();
        if control.attached && self.snapshot.borrow().query.as_ref() == Some(&query) {
            debug!("List query {:?} is already being polled", query);
            return;
        }

        control.cancel.cancel();
        control.generation += 1;
        control.cancel = CancellationToken::new();
        control.refresh = Arc::new(Notify::new());
        control.attached = true;

        let generation = control.generation;
        self.snapshot.send_modify(|snapshot| {
            snapshot.query = Some(query.clone());
            snapshot.state = ListState::Loading;
            snapshot.page = None;
            snapshot.generation = generation;
        });
        debug!(
            "Polling report list (page {}, every {:?})",
            query.page(),
            self.interval
        );

        let run = ListRun {
            api: Arc::clone(&self.api),
            interval: self.interval,
            snapshot: Arc::clone(&self.snapshot),
            cancel: control.cancel.clone(),
            refresh: Arc::clone(&control.refresh),
            query,
            generation,
        };
        tokio::spawn(run.execute());
    }

    /// Fetches now, outside the schedule. The interval keeps its phase.
    pub fn refresh(&self) {
        let control = self.lock_control();
        if !control.attached {
            debug!("List refresh ignored: poller is detached");
            return;
        }
        debug!("Refreshing report list out of schedule");
        control.refresh.notify_one();
    }

    /// Stops refreshing. No snapshot update lands after this returns.
    pub fn detach(&self) {
        let mut control = self.lock_control();
        control.cancel.cancel();
        control.generation += 1;
        control.attached = false;
        let generation = control.generation;
        self.snapshot.send_modify(|snapshot| {
            snapshot.generation = generation;
            if snapshot.state == ListState::Loading {
                snapshot.state = ListState::Idle;
            }
        });
        debug!("Detached from report list");
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Refreshes the list out of schedule after every accepted submission.
    ///
    /// The follower ends when the submission channel closes or the poller
    /// is dropped.
    pub fn follow_submissions(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<SubmissionEvent>,
    ) -> JoinHandle<()> {
        let poller = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => return,
                    event = events.recv() => event,
                };
                match event {
                    Ok(SubmissionEvent::Accepted { submission, .. }) => {
                        debug!(
                            "Report {} submitted; refreshing report list",
                            submission.report_id
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!("Missed {} submission events; refreshing report list", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
                match poller.upgrade() {
                    Some(poller) => poller.refresh(),
                    None => return,
                }
            }
        })
    }

    fn lock_control(&self) -> MutexGuard<'_, ListControl> {
        self.control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ListPoller {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.detach();
    }
}

struct ListRun {
    api: Arc<dyn ReportApi>,
    interval: Duration,
    snapshot: Arc<watch::Sender<ListSnapshot>>,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    query: ListQuery,
    generation: u64,
}

impl ListRun {
    async fn execute(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // The first tick completes immediately.
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {}
            }

            self.publish(|snapshot| snapshot.state = ListState::Loading);
            let result = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.api.fetch_report_list(&self.query) => result,
            };

            match result {
                Ok(page) => {
                    debug!(
                        "Report list: {} of {} reports ({} in progress)",
                        page.reports.len(),
                        page.total,
                        page.in_progress()
                    );
                    self.publish(|snapshot| {
                        snapshot.state = ListState::Ready;
                        snapshot.page = Some(page);
                    });
                }
                Err(error) => {
                    warn!("Refreshing report list failed: {}", error);
                    self.publish(|snapshot| snapshot.state = ListState::Errored(error));
                }
            }
        }
    }

    fn publish(&self, update: impl FnOnce(&mut ListSnapshot)) -> bool {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.generation != self.generation {
                return false;
            }
            update(snapshot);
            true
        })
    }
}
