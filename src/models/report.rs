//! Report entity as served by the analysis backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

/// Backend-assigned report identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ReportId {
    fn from(id: u64) -> Self {
        ReportId(id)
    }
}

/// Lifecycle status of a report.
///
/// Moves forward only: `pending → processing → completed | failed`.
/// `completed` and `failed` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIterMacro,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Processing => "processing",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
        }
    }

    /// `true` for `completed` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Failed)
    }

    /// Position in the lifecycle; both terminal statuses share the last rank.
    pub fn rank(&self) -> u8 {
        match self {
            ReportStatus::Pending => 0,
            ReportStatus::Processing => 1,
            ReportStatus::Completed | ReportStatus::Failed => 2,
        }
    }

    /// Whether `next` is a legal observation after `self`.
    ///
    /// Staying put is legal. Leaving a terminal status is not, not even for
    /// the other terminal status.
    pub fn can_advance_to(&self, next: ReportStatus) -> bool {
        if self.is_terminal() {
            return *self == next;
        }
        next.rank() >= self.rank()
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "processing" => Ok(ReportStatus::Processing),
            "completed" => Ok(ReportStatus::Completed),
            "failed" => Ok(ReportStatus::Failed),
            other => Err(format!(
                "unknown report status '{}' (expected pending, processing, completed or failed)",
                other
            )),
        }
    }
}

/// Image found on the analyzed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub src: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alt: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub width: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub height: Option<String>,
}

/// Link found on the analyzed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub href: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rel: Vec<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// The three headline scores, each in `[0, 100]` or absent when not computed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scores {
    pub seo: Option<f64>,
    pub accessibility: Option<f64>,
    pub performance: Option<f64>,
}

/// Snapshot of one analysis report.
///
/// The backend is the only writer. Clients hold whole copies and replace
/// them on every fetch; fields are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub url: String,
    pub status: ReportStatus,

    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub h1_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub h2_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<ImageInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<LinkInfo>,

    /// Page load time in seconds
    #[serde(default)]
    pub load_time: Option<f64>,
    #[serde(default)]
    pub seo_score: Option<f64>,
    #[serde(default)]
    pub accessibility_score: Option<f64>,
    #[serde(default)]
    pub performance_score: Option<f64>,

    /// May arrive after `completed` is first observed.
    #[serde(default)]
    pub ai_insights: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ai_recommendations: Vec<String>,

    /// Only set when `status` is `failed`.
    #[serde(default)]
    pub error_message: Option<String>,

    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn scores(&self) -> Scores {
        Scores {
            seo: self.seo_score,
            accessibility: self.accessibility_score,
            performance: self.performance_score,
        }
    }

    /// Whether any page content has been extracted yet.
    pub fn has_content(&self) -> bool {
        self.title.is_some()
            || self.meta_description.is_some()
            || !self.h1_tags.is_empty()
            || !self.h2_tags.is_empty()
            || !self.images.is_empty()
            || !self.links.is_empty()
    }

    /// Whether AI enrichment has landed.
    pub fn has_ai_insights(&self) -> bool {
        self.ai_insights.as_deref().is_some_and(|s| !s.trim().is_empty())
            || !self.ai_recommendations.is_empty()
    }

    /// Hostname of the analyzed URL, if it parses.
    pub fn hostname(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts strings or numbers (`"120"` or `120`) for image dimensions.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Parses RFC 3339 timestamps, or naive ISO-8601 ones interpreted as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}
