//! AI signals report feed - turns a dated signals report into a situation.
//!
//! The report is fetched over HTTP and rendered either as the narrative the
//! report already carries, or as a digest of its per-country signals
//! filtered by severity.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Fetch timeout.
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the report feed.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("AI_REPORT_URL not configured")]
    NotConfigured,

    #[error("failed to fetch AI signals report: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI signals report API returned status {0}")]
    Status(u16),

    #[error("failed to parse AI signals report: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One daily signals report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalReport {
    pub id: i64,
    pub report_date: String,
    pub day_start: String,
    pub day_end: String,
    /// Pre-written narrative
    pub report_content: String,
    pub report_data: ReportData,
    pub signals_processed: u32,
    pub top_severity: u8,
    pub source_analysis_ids: Vec<i64>,
    pub subreddits_covered: Vec<String>,
    pub generation_cost_usd: f64,
    pub created_at: String,
}

/// Structured part of a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportData {
    pub by_country: BTreeMap<String, Vec<Signal>>,
    pub by_subcategory: BTreeMap<String, Vec<Signal>>,
    pub week_label: String,
    pub generated_at: String,
    pub top_severity: u8,
    pub total_signals: u32,
    pub subreddit_sources: Vec<String>,
}

/// A single severity-scored signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signal {
    pub id: i64,
    pub title: String,
    pub region: String,
    pub country: String,
    pub evidence: Option<String>,
    /// 0-10
    pub severity: u8,
    pub subreddit: String,
    pub description: String,
    pub subcategory: String,
}

/// Fetches the latest report from `url`.
pub async fn fetch_report(url: &str) -> Result<SignalReport, ReportError> {
    if url.trim().is_empty() {
        return Err(ReportError::NotConfigured);
    }
    debug!(url, "fetching AI signals report");

    let client = Client::builder().timeout(REPORT_TIMEOUT).build()?;
    let response = client.get(url).send().await?;
    if response.status() != reqwest::StatusCode::OK {
        return Err(ReportError::Status(response.status().as_u16()));
    }

    let body = response.text().await?;
    let report: SignalReport = serde_json::from_str(&body)?;
    debug!(
        date = %report.report_date,
        signals = report.report_data.total_signals,
        "retrieved AI signals report"
    );
    Ok(report)
}

/// The report's own narrative, dated.
pub fn narrative(report: &SignalReport) -> String {
    format!(
        "AI signals briefing as of {}:\n\n{}",
        report.report_date, report.report_content
    )
}

/// Per-country bulleted digest of signals at or above `min_severity`.
///
/// Countries are ordered by their highest remaining severity, then by code.
pub fn digest(report: &SignalReport, min_severity: u8) -> String {
    let mut countries: Vec<(&str, Vec<&Signal>, u8)> = report
        .report_data
        .by_country
        .iter()
        .filter_map(|(code, signals)| {
            let kept: Vec<&Signal> = signals.iter().filter(|s| s.severity >= min_severity).collect();
            let max = kept.iter().map(|s| s.severity).max()?;
            Some((code.as_str(), kept, max))
        })
        .collect();
    // BTreeMap iteration already orders codes; the stable sort keeps that for ties
    countries.sort_by(|a, b| b.2.cmp(&a.2));

    let mut out = format!("Current AI signals briefing as of {}:\n\n", report.report_date);
    for (code, signals, max) in &countries {
        let _ = writeln!(out, "## {} (max severity: {}/10)", code, max);
        for s in signals {
            let _ = writeln!(out, "- [Severity {}] {}: {}", s.severity, s.title, s.description);
        }
        out.push('\n');
    }
    if countries.is_empty() {
        out.push_str("No significant signals above the severity threshold.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(title: &str, severity: u8) -> Signal {
        Signal {
            title: title.to_string(),
            description: format!("{} details", title),
            severity,
            ..Signal::default()
        }
    }

    fn report() -> SignalReport {
        let mut by_country = BTreeMap::new();
        by_country.insert("US".to_string(), vec![signal("chips", 6), signal("noise", 2)]);
        by_country.insert("JP".to_string(), vec![signal("rates", 8)]);
        by_country.insert("DE".to_string(), vec![signal("energy", 6)]);
        by_country.insert("FR".to_string(), vec![signal("minor", 1)]);
        SignalReport {
            report_date: "2026-01-15".to_string(),
            report_content: "Markets were calm.".to_string(),
            report_data: ReportData {
                by_country,
                ..ReportData::default()
            },
            ..SignalReport::default()
        }
    }

    #[test]
    fn test_narrative() {
        assert_eq!(
            narrative(&report()),
            "AI signals briefing as of 2026-01-15:\n\nMarkets were calm."
        );
    }

    #[test]
    fn test_digest_orders_and_filters() {
        let text = digest(&report(), 5);
        let expected = "Current AI signals briefing as of 2026-01-15:\n\n\
## JP (max severity: 8/10)\n\
- [Severity 8] rates: rates details\n\n\
## DE (max severity: 6/10)\n\
- [Severity 6] energy: energy details\n\n\
## US (max severity: 6/10)\n\
- [Severity 6] chips: chips details\n\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_digest_nothing_above_threshold() {
        let text = digest(&report(), 9);
        assert!(text.ends_with("No significant signals above the severity threshold.\n"));
        assert!(!text.contains("##"));
    }

    #[test]
    fn test_report_parses_with_missing_fields() {
        let json = r#"{
            "report_date": "2026-01-15",
            "report_content": "c",
            "report_data": {"by_country": {"JP": [{"title": "t", "severity": 7, "evidence": null}]}}
        }"#;
        let report: SignalReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.report_data.by_country["JP"][0].severity, 7);
        assert!(report.report_data.by_country["JP"][0].evidence.is_none());
    }

    #[tokio::test]
    async fn test_empty_url_is_not_configured() {
        assert!(matches!(fetch_report("").await, Err(ReportError::NotConfigured)));
    }
}
