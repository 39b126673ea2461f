//! Terminal rendering of reports and report lists.

use std::fmt::Write as _;

use colored::Colorize;
use strum::IntoEnumIterator;

use crate::models::{Report, ReportPage, ReportStatus};

/// Label for a 0-100 score.
pub fn score_label(score: Option<f64>) -> &'static str {
    match score {
        None => "N/A",
        Some(s) if s >= 80.0 => "Excellent",
        Some(s) if s >= 60.0 => "Good",
        Some(s) if s >= 40.0 => "Fair",
        Some(_) => "Poor",
    }
}

/// Formats a load time given in seconds: `850ms` below one second, `1.25s` otherwise.
pub fn format_load_time(seconds: Option<f64>) -> String {
    match seconds {
        None => "N/A".to_string(),
        Some(s) if s < 1.0 => format!("{}ms", (s * 1000.0).round() as u64),
        Some(s) => format!("{:.2}s", s),
    }
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.0} ({})", s, score_label(score)),
        None => score_label(None).to_string(),
    }
}

/// Colored status word for terminal output.
pub fn status_badge(status: ReportStatus) -> colored::ColoredString {
    match status {
        ReportStatus::Pending => status.as_str().yellow(),
        ReportStatus::Processing => status.as_str().blue(),
        ReportStatus::Completed => status.as_str().green(),
        ReportStatus::Failed => status.as_str().red(),
    }
}

/// Full plain-text rendering of one report.
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();
    let host = report.hostname().unwrap_or_else(|| report.url.clone());
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Report #{} for {}", report.id, host);
    let _ = writeln!(out, "  URL:     {}", report.url);
    let _ = writeln!(out, "  Status:  {}", report.status);
    let _ = writeln!(out, "  Created: {}", report.created_at.format("%Y-%m-%d %H:%M:%S UTC"));

    match report.status {
        ReportStatus::Pending | ReportStatus::Processing => {
            let _ = writeln!(out, "  Analysis in progress...");
            return out;
        }
        ReportStatus::Failed => {
            let reason = report.error_message.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "  Analysis failed: {}", reason);
            return out;
        }
        ReportStatus::Completed => {}
    }

    let scores = report.scores();
    let _ = writeln!(out, "  SEO score:           {}", format_score(scores.seo));
    let _ = writeln!(out, "  Accessibility score: {}", format_score(scores.accessibility));
    let _ = writeln!(out, "  Performance score:   {}", format_score(scores.performance));
    let _ = writeln!(out, "  Load time:           {}", format_load_time(report.load_time));

    if report.has_content() {
        let _ = writeln!(out, "  Title:            {}", report.title.as_deref().unwrap_or("-"));
        let _ = writeln!(
            out,
            "  Meta description: {}",
            report.meta_description.as_deref().unwrap_or("-")
        );
        let _ = writeln!(out, "  H1 tags: {}", report.h1_tags.len());
        for tag in &report.h1_tags {
            let _ = writeln!(out, "    - {}", tag);
        }
        let _ = writeln!(out, "  H2 tags: {}", report.h2_tags.len());
        let missing_alt = report.images.iter().filter(|i| i.alt.trim().is_empty()).count();
        let _ = writeln!(
            out,
            "  Images:  {} ({} without alt text)",
            report.images.len(),
            missing_alt
        );
        let _ = writeln!(out, "  Links:   {}", report.links.len());
    }

    if report.has_ai_insights() {
        if let Some(insights) = report.ai_insights.as_deref().filter(|s| !s.trim().is_empty()) {
            let _ = writeln!(out, "  AI insights:");
            for line in insights.lines() {
                let _ = writeln!(out, "    {}", line);
            }
        }
        if !report.ai_recommendations.is_empty() {
            let _ = writeln!(out, "  Recommendations:");
            for (n, recommendation) in report.ai_recommendations.iter().enumerate() {
                let _ = writeln!(out, "    {}. {}", n + 1, recommendation);
            }
        }
    }

    out
}

/// One line per report plus a paging footer.
pub fn render_page(page: &ReportPage) -> String {
    let mut out = String::new();
    if page.reports.is_empty() {
        let _ = writeln!(out, "No reports yet.");
    }
    for report in &page.reports {
        let _ = writeln!(
            out,
            "{:>6}  {:<10}  {:<9}  {}",
            report.id,
            report.status.as_str(),
            score_label(report.seo_score),
            report.url
        );
    }

    let counts: Vec<String> = ReportStatus::iter()
        .filter_map(|status| {
            let count = page.reports.iter().filter(|r| r.status == status).count();
            (count > 0).then(|| format!("{} {}", count, status))
        })
        .collect();
    let _ = write!(
        out,
        "Page {} of {} ({} reports total)",
        page.page,
        page.page_count().max(1),
        page.total
    );
    if !counts.is_empty() {
        let _ = write!(out, ": {}", counts.join(", "));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(json: serde_json::Value) -> Report {
        let mut base = serde_json::json!({
            "id": 42,
            "url": "https://www.example.com/page",
            "status": "completed",
            "created_at": "2024-05-01T12:00:00Z",
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), json.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(base).expect("valid report")
    }

    #[test]
    fn test_score_label_thresholds() {
        assert_eq!(score_label(Some(100.0)), "Excellent");
        assert_eq!(score_label(Some(80.0)), "Excellent");
        assert_eq!(score_label(Some(79.9)), "Good");
        assert_eq!(score_label(Some(60.0)), "Good");
        assert_eq!(score_label(Some(40.0)), "Fair");
        assert_eq!(score_label(Some(39.5)), "Poor");
        assert_eq!(score_label(Some(0.0)), "Poor");
        assert_eq!(score_label(None), "N/A");
    }

    #[test]
    fn test_format_load_time() {
        assert_eq!(format_load_time(Some(0.85)), "850ms");
        assert_eq!(format_load_time(Some(0.0)), "0ms");
        assert_eq!(format_load_time(Some(1.0)), "1.00s");
        assert_eq!(format_load_time(Some(2.346)), "2.35s");
        assert_eq!(format_load_time(None), "N/A");
    }

    #[test]
    fn test_render_completed_report() {
        let text = render_report(&report(serde_json::json!({
            "title": "Example Domain",
            "seo_score": 88,
            "performance_score": 35,
            "load_time": 0.42,
            "h1_tags": ["Example Domain"],
            "images": [{"src": "/a.png", "alt": ""}],
            "ai_recommendations": ["Add a meta description"],
        })));
        assert!(text.contains("Report #42 for www.example.com"));
        assert!(text.contains("SEO score:           88 (Excellent)"));
        assert!(text.contains("Accessibility score: N/A"));
        assert!(text.contains("Performance score:   35 (Poor)"));
        assert!(text.contains("Load time:           420ms"));
        assert!(text.contains("Images:  1 (1 without alt text)"));
        assert!(text.contains("1. Add a meta description"));
    }

    #[test]
    fn test_render_in_progress_and_failed() {
        let text = render_report(&report(serde_json::json!({"status": "processing"})));
        assert!(text.contains("Analysis in progress..."));
        assert!(!text.contains("SEO score"));

        let text = render_report(&report(serde_json::json!({
            "status": "failed",
            "error_message": "Timeout while fetching page",
        })));
        assert!(text.contains("Analysis failed: Timeout while fetching page"));
    }

    #[test]
    fn test_render_page_summary() {
        let page = ReportPage {
            reports: vec![
                report(serde_json::json!({"id": 1, "seo_score": 65})),
                report(serde_json::json!({"id": 2, "status": "processing"})),
            ],
            total: 12,
            page: 1,
            per_page: 10,
        };
        let text = render_page(&page);
        assert!(text.contains("Good"));
        assert!(text.contains("Page 1 of 2 (12 reports total): 1 processing, 1 completed"));

        let empty = ReportPage {
            reports: vec![],
            total: 0,
            page: 1,
            per_page: 10,
        };
        assert!(render_page(&empty).starts_with("No reports yet."));
    }
}
