//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a research
//! crawl, including highlights, findings, crawled pages and errors.

use crate::crawler::CrawlError;
use crate::output::{OutputResult, ResearchOutput};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary of a research output
///
/// # Arguments
///
/// * `output` - The research output
/// * `errors` - Per-page crawl errors
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    output: &ResearchOutput,
    errors: &[CrawlError],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(output, errors);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a research output as markdown
pub fn format_markdown_summary(output: &ResearchOutput, errors: &[CrawlError]) -> String {
    let mut md = String::new();
    let findings = &output.findings;

    md.push_str("# Website Research Summary\n\n");

    if let Some(start) = output.pages.first() {
        md.push_str(&format!("- **Start URL**: {}\n", start.url));
    }
    md.push_str(&format!("- **Pages**: {}\n", output.pages.len()));
    md.push_str(&format!("- **Errors**: {}\n\n", errors.len()));

    // Highlights
    md.push_str("## Highlights\n\n");
    for highlight in &output.highlights {
        md.push_str(&format!("- {}\n", highlight));
    }
    md.push('\n');

    // Findings
    md.push_str("## Findings\n\n");
    md.push_str(&format!(
        "- **Value Proposition**: {}\n",
        findings.value_prop.as_deref().unwrap_or("n/a")
    ));
    md.push_str(&format!(
        "- **Mentions Pricing**: {}\n",
        if findings.mentions_pricing { "yes" } else { "no" }
    ));
    md.push_str(&format!(
        "- **Coverage**: {} pages considered, {} URLs in evidence\n\n",
        findings.coverage.pages_considered, findings.coverage.unique_urls_in_evidence
    ));

    push_list(&mut md, "Pricing Pages", &findings.pricing_page_urls);
    push_list(&mut md, "Key Features", &findings.key_features);
    push_list(&mut md, "Partners and Integrations", &findings.partners_integrations);
    push_list(&mut md, "Noteworthy Metrics", &findings.noteworthy_metrics);

    // Pages
    if !output.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| Depth | Type | URL | Title |\n");
        md.push_str("|-------|------|-----|-------|\n");
        for page in &output.pages {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                page.depth,
                page.page_type.as_deref().unwrap_or("other"),
                page.url,
                escape_cell(page.title.as_deref().unwrap_or(""))
            ));
        }
        md.push('\n');

        let summarized: Vec<_> = output
            .pages
            .iter()
            .filter_map(|p| p.summary.as_deref().map(|s| (p.url.as_str(), s)))
            .collect();
        if !summarized.is_empty() {
            md.push_str("## Page Summaries\n\n");
            for (url, summary) in summarized {
                md.push_str(&format!("- **{}**: {}\n", url, summary));
            }
            md.push('\n');
        }
    }

    // Errors
    if !errors.is_empty() {
        md.push_str("## Errors\n\n");
        md.push_str("| Depth | URL | Error |\n");
        md.push_str("|-------|-----|-------|\n");
        for error in errors {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                error.depth,
                error.url,
                escape_cell(&error.error)
            ));
        }
        md.push('\n');
    }

    md
}

fn push_list(md: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("### {}\n\n", heading));
    for item in items {
        md.push_str(&format!("- {}\n", item));
    }
    md.push('\n');
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Findings;
    use crate::output::PageSummary;

    fn create_test_output() -> ResearchOutput {
        ResearchOutput {
            highlights: vec!["Crawled 2 pages (1 errors)".to_string()],
            pages: vec![
                PageSummary {
                    url: "https://acme.test/".to_string(),
                    title: Some("Acme | Home".to_string()),
                    page_type: Some("home".to_string()),
                    depth: 0,
                    summary: Some("Acme sells ads.".to_string()),
                },
                PageSummary {
                    url: "https://acme.test/pricing".to_string(),
                    title: None,
                    page_type: Some("pricing".to_string()),
                    depth: 1,
                    summary: None,
                },
            ],
            sitemap: None,
            findings: Findings {
                mentions_pricing: true,
                key_features: vec!["Automated bidding across every channel".to_string()],
                ..Findings::default()
            },
        }
    }

    #[test]
    fn test_format_markdown_summary() {
        let errors = [CrawlError::robots_blocked("https://acme.test/admin", 1)];
        let markdown = format_markdown_summary(&create_test_output(), &errors);

        assert!(markdown.contains("# Website Research Summary"));
        assert!(markdown.contains("- **Start URL**: https://acme.test/"));
        assert!(markdown.contains("- Crawled 2 pages (1 errors)"));
        assert!(markdown.contains("- **Mentions Pricing**: yes"));
        assert!(markdown.contains("### Key Features"));
        assert!(markdown.contains("| 0 | home | https://acme.test/ | Acme \\| Home |"));
        assert!(markdown.contains("- **https://acme.test/**: Acme sells ads."));
        assert!(markdown.contains("| 1 | https://acme.test/admin | Blocked by robots.txt |"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let markdown = format_markdown_summary(&create_test_output(), &[]);

        assert!(!markdown.contains("## Errors"));
        assert!(!markdown.contains("### Partners and Integrations"));
        assert!(markdown.contains("- **Value Proposition**: n/a"));
    }

    #[test]
    fn test_generate_markdown_summary_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&create_test_output(), &[], &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Website Research Summary"));
    }
}
