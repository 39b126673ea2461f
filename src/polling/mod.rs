//! Polling engines.
//!
//! [`ReportPoller`] follows one report until the backend reports a terminal
//! status; [`ListPoller`] keeps a page of the report list fresh. Both publish
//! their state through `tokio::sync::watch` snapshots and stop cleanly on
//! `detach()` or drop.

mod list;
mod policy;
mod report;
mod state;

pub use list::ListPoller;
pub use policy::{backoff_policy, PollCadence, PollPolicy};
pub use report::ReportPoller;
pub use state::{ListSnapshot, ListState, PollState, ReportSnapshot};
