//! PDF artifact download and filename derivation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{MAX_FILENAME_STEM_LENGTH, PDF_EXTENSION};
use crate::models::ReportId;

/// Message shown for any download failure, whatever the cause.
pub const DOWNLOAD_FAILED_NOTICE: &str = "Failed to download PDF. Please try again later.";

static DISPOSITION_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\*?\s*=\s*(?:"([^"]*)"|'([^']*)'|([^;\r\n]*))"#)
        .expect("static regex is valid")
});

// Extended `filename*=` values carry a `charset'language'` prefix.
static EXTENDED_VALUE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$&+^`{}~_-]+'[A-Za-z0-9-]*'").expect("static regex is valid")
});

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static regex is valid"));

/// A downloaded report rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDownload {
    /// Name to save the file under; never empty, never just an extension.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PdfDownload {
    /// Writes the PDF into `dir` under [`PdfDownload::filename`].
    ///
    /// Returns the full path that was written.
    pub async fn save_into(&self, dir: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

/// Picks the filename for a downloaded report PDF.
///
/// In order of preference:
/// 1. the `filename=` token of `Content-Disposition`, quotes stripped,
///    leading/trailing underscores trimmed, reduced to its last path
///    component;
/// 2. the report title, else the URL hostname without a leading `www.`,
///    lowercased with every run of non-alphanumeric characters collapsed to
///    one `_`, plus `.pdf`;
/// 3. `report-{id}.pdf`.
///
/// A candidate that ends up empty or extension-only falls through to the next.
///
/// # Examples
///
/// ```
/// use seo_report_client::api::pdf_filename;
/// use seo_report_client::models::ReportId;
///
/// let id = ReportId(3);
/// assert_eq!(pdf_filename(Some(r#"attachment; filename="My_Report.pdf""#), None, None, id), "My_Report.pdf");
/// assert_eq!(pdf_filename(None, Some("Example Domain"), None, id), "example_domain.pdf");
/// assert_eq!(pdf_filename(None, None, Some("https://www.foo.com"), id), "foo_com.pdf");
/// assert_eq!(pdf_filename(None, None, None, id), "report-3.pdf");
/// ```
pub fn pdf_filename(
    content_disposition: Option<&str>,
    title: Option<&str>,
    url: Option<&str>,
    id: ReportId,
) -> String {
    if let Some(name) = content_disposition.and_then(filename_from_disposition) {
        return name;
    }

    let derived = title
        .and_then(sanitized_stem)
        .or_else(|| url.and_then(hostname_of).as_deref().and_then(sanitized_stem));
    if let Some(stem) = derived {
        return format!("{}.{}", stem, PDF_EXTENSION);
    }

    format!("report-{}.{}", id, PDF_EXTENSION)
}

fn filename_from_disposition(header: &str) -> Option<String> {
    let captures = DISPOSITION_FILENAME.captures(header)?;
    let raw = captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))?
        .as_str();

    let raw = EXTENDED_VALUE_PREFIX.replace(raw, "");
    let unquoted = raw.replace(['"', '\''], "");
    let last_component = unquoted
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let name = last_component.trim().trim_matches('_');

    is_usable_filename(name).then(|| name.to_string())
}

fn hostname_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Lowercased, underscore-collapsed stem, or `None` if nothing survives.
fn sanitized_stem(base: &str) -> Option<String> {
    let collapsed = NON_ALPHANUMERIC_RUN.replace_all(base, "_");
    let mut stem = collapsed.trim_matches('_').to_lowercase();
    if stem.len() > MAX_FILENAME_STEM_LENGTH {
        // Only ASCII survives the collapse, so byte truncation is safe.
        stem.truncate(MAX_FILENAME_STEM_LENGTH);
        stem = stem.trim_end_matches('_').to_string();
    }
    (!stem.is_empty()).then_some(stem)
}

fn is_usable_filename(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.')
}
