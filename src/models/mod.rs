//! Data model shared by the repository client, the submission controller and
//! the pollers.

mod report;
mod request;

pub use report::{ImageInfo, LinkInfo, Report, ReportId, ReportStatus, Scores};
pub use request::{AnalysisRequest, ListQuery, ReportPage, Submission};

