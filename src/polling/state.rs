//! Observable snapshots published by the polling engines.

use crate::error_handling::ClientError;
use crate::models::{ListQuery, Report, ReportId, ReportPage, ReportStatus};

/// Where a report poller stands.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// No report is being watched.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch succeeded with this status.
    Ready(ReportStatus),
    /// The last fetch failed; polling waits for an explicit refresh.
    Errored(ClientError),
    /// The poll cap ran out while the report was still in progress.
    Stalled,
}

impl PollState {
    /// `true` when no further fetch is coming without a caller action.
    pub fn is_settled(&self) -> bool {
        match self {
            PollState::Idle | PollState::Errored(_) | PollState::Stalled => true,
            PollState::Ready(status) => status.is_terminal(),
            PollState::Loading => false,
        }
    }
}

/// What a report poller currently knows.
///
/// `report` is replaced wholesale on every successful fetch and kept while a
/// new fetch is loading or after a fetch error.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSnapshot {
    pub report_id: Option<ReportId>,
    pub state: PollState,
    pub report: Option<Report>,
    pub(crate) generation: u64,
}

impl ReportSnapshot {
    pub(crate) fn idle() -> Self {
        Self {
            report_id: None,
            state: PollState::Idle,
            report: None,
            generation: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == PollState::Loading
    }

    pub fn error(&self) -> Option<&ClientError> {
        match &self.state {
            PollState::Errored(error) => Some(error),
            _ => None,
        }
    }
}

/// Where a list poller stands.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Idle,
    Loading,
    Ready,
    /// The last refresh failed; the schedule keeps running.
    Errored(ClientError),
}

/// What a list poller currently knows.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub query: Option<ListQuery>,
    pub state: ListState,
    /// Last page fetched for `query`.
    pub page: Option<ReportPage>,
    pub(crate) generation: u64,
}

impl ListSnapshot {
    pub(crate) fn idle() -> Self {
        Self {
            query: None,
            state: ListState::Idle,
            page: None,
            generation: 0,
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        match &self.state {
            ListState::Errored(error) => Some(error),
            _ => None,
        }
    }
}
