//! Output module for research reports
//!
//! This module handles:
//! - Building the downstream research output (highlights, pages, sitemap, findings)
//! - Writing it as a JSON report
//! - Generating a markdown summary of a crawl
//! - Reporting statistics of stored crawls

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::crawler::CrawlResult;
use crate::enrich::PageEnrichment;
use crate::findings::Findings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Number of key features quoted in the highlights
const HIGHLIGHT_FEATURES: usize = 3;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One page as listed in the research output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    pub depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A sitemap entry; `parent` is null for the start page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
    pub depth: u32,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sitemap {
    /// Pages in crawl order
    pub flat: Vec<SitemapEntry>,
}

/// The research result in its downstream shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchOutput {
    pub highlights: Vec<String>,
    pub pages: Vec<PageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<Sitemap>,
    pub findings: Findings,
}

/// Builds the research output for a crawl
///
/// # Arguments
///
/// * `result` - The crawl result
/// * `include_sitemap` - Whether to attach the flat sitemap
/// * `enrichments` - Page summaries from enrichment, possibly empty
pub fn build_output(
    result: &CrawlResult,
    include_sitemap: bool,
    enrichments: &[PageEnrichment],
) -> ResearchOutput {
    let summaries: HashMap<&str, &str> = enrichments
        .iter()
        .filter_map(|e| e.summary.as_deref().map(|s| (e.url.as_str(), s)))
        .collect();

    let pages = result
        .pages
        .iter()
        .map(|page| PageSummary {
            url: page.url.clone(),
            title: page.title.clone(),
            page_type: Some(page.classification.page_type.as_str().to_string()),
            depth: page.depth,
            summary: summaries.get(page.url.as_str()).map(|s| s.to_string()),
        })
        .collect();

    let sitemap = include_sitemap.then(|| Sitemap {
        flat: result
            .pages
            .iter()
            .map(|page| SitemapEntry {
                url: page.url.clone(),
                depth: page.depth,
                parent: page.parent_url.clone(),
            })
            .collect(),
    });

    ResearchOutput {
        highlights: build_highlights(result),
        pages,
        sitemap,
        findings: result.findings.clone(),
    }
}

/// Derives the highlight lines from a crawl result
pub fn build_highlights(result: &CrawlResult) -> Vec<String> {
    let findings = &result.findings;
    let mut highlights = vec![format!(
        "Crawled {} pages ({} errors)",
        result.pages.len(),
        result.errors.len()
    )];

    if let Some(value_prop) = &findings.value_prop {
        highlights.push(format!("Value proposition: {}", value_prop));
    }

    if findings.mentions_pricing {
        highlights.push(format!(
            "Pricing mentioned; {} pricing page(s) found",
            findings.pricing_page_urls.len()
        ));
    } else {
        highlights.push("No pricing signals found".to_string());
    }

    if !findings.key_features.is_empty() {
        let features: Vec<&str> = findings
            .key_features
            .iter()
            .take(HIGHLIGHT_FEATURES)
            .map(String::as_str)
            .collect();
        highlights.push(format!("Key features: {}", features.join("; ")));
    }

    if !findings.partners_integrations.is_empty() {
        highlights.push(format!(
            "Partners/integrations: {}",
            findings.partners_integrations.join(", ")
        ));
    }

    if let Some(metric) = findings.noteworthy_metrics.first() {
        highlights.push(format!("Notable metric: {}", metric));
    }

    highlights
}

/// Writes the research output as pretty-printed JSON
pub fn write_json_report(output: &ResearchOutput, output_path: &Path) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(output)?;

    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    Ok(())
}
