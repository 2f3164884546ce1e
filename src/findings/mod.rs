//! Findings aggregation
//!
//! Distills business-relevant signals from the pages collected by a crawl:
//! - Value proposition
//! - Key features
//! - Partners and integrations
//! - Pricing signals and pricing page URLs
//! - Noteworthy metrics
//!
//! Findings are recomputed from the full page list on every call, re-reading
//! each page's retained HTML. All mining is heuristic and best effort.

mod rules;
mod sentences;

pub use rules::{brands_in, is_partner_alt, is_pricing_path, known_brand, KNOWN_BRANDS};
pub use sentences::{clean_snippet, dedup_key, split_sentences};

use crate::crawler::{extract_image_alts, extract_visible_text, PageRecord};
use rules::{
    FEATURE_CUE, FEATURE_MAX_CHARS, FEATURE_MIN_CHARS, MAX_FEATURES, MAX_METRICS, METRIC,
    METRIC_MAX_CHARS, PRICING_TEXT, TITLE_RELEVANCE, VALUE_PROP, VALUE_PROP_MAX_CHARS,
    VALUE_PROP_MIN_CHARS,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// How much of the crawl backs the findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub pages_considered: usize,
    /// Number of pricing URLs, or `pages_considered` when there are none
    pub unique_urls_in_evidence: usize,
}

/// Aggregated findings for one crawl
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    pub mentions_pricing: bool,
    pub pricing_page_urls: Vec<String>,
    pub value_prop: Option<String>,
    pub key_features: Vec<String>,
    pub partners_integrations: Vec<String>,
    pub noteworthy_metrics: Vec<String>,
    pub coverage: Coverage,
}

/// Text and alt texts recovered from one page's HTML
struct PageText<'a> {
    page: &'a PageRecord,
    text: String,
    image_alts: Vec<String>,
}

impl<'a> PageText<'a> {
    fn from_page(page: &'a PageRecord) -> Self {
        if page.raw_html.is_empty() {
            return Self {
                page,
                text: page.text.clone(),
                image_alts: Vec::new(),
            };
        }

        Self {
            page,
            text: extract_visible_text(&page.raw_html),
            image_alts: extract_image_alts(&page.raw_html),
        }
    }
}

/// Computes findings from the pages of a crawl
///
/// # Arguments
///
/// * `pages` - Page records in crawl order
///
/// # Returns
///
/// A fresh `Findings` value; an empty page list yields empty findings.
pub fn aggregate_findings(pages: &[PageRecord]) -> Findings {
    let texts: Vec<PageText<'_>> = pages.iter().map(PageText::from_page).collect();
    let sentences: Vec<String> = texts
        .iter()
        .flat_map(|page| split_sentences(&page.text))
        .collect();
    let corpus = texts
        .iter()
        .map(|page| page.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let pricing_page_urls = pricing_urls(pages);
    let mentions_pricing = PRICING_TEXT.is_match(&corpus) || !pricing_page_urls.is_empty();

    let coverage = Coverage {
        pages_considered: pages.len(),
        unique_urls_in_evidence: if pricing_page_urls.is_empty() {
            pages.len()
        } else {
            pricing_page_urls.len()
        },
    };

    let findings = Findings {
        mentions_pricing,
        value_prop: value_prop(&sentences, pages),
        key_features: key_features(&sentences),
        partners_integrations: partners(&corpus, &texts),
        noteworthy_metrics: metrics(&sentences),
        pricing_page_urls,
        coverage,
    };

    tracing::debug!(
        "Findings from {} pages: pricing={}, {} features, {} partners, {} metrics",
        pages.len(),
        findings.mentions_pricing,
        findings.key_features.len(),
        findings.partners_integrations.len(),
        findings.noteworthy_metrics.len()
    );

    findings
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// First relevant sentence of reasonable length, else a relevant page title
fn value_prop(sentences: &[String], pages: &[PageRecord]) -> Option<String> {
    sentences
        .iter()
        .find(|sentence| {
            let len = char_len(sentence);
            (VALUE_PROP_MIN_CHARS..=VALUE_PROP_MAX_CHARS).contains(&len)
                && VALUE_PROP.is_match(sentence)
        })
        .map(|sentence| clean_snippet(sentence))
        .or_else(|| {
            pages
                .iter()
                .filter_map(|page| page.title.as_deref())
                .find(|title| TITLE_RELEVANCE.is_match(title))
                .map(clean_snippet)
        })
}

/// Keeps snippets in order, dropping ones whose dedup key was already seen
fn dedup_capped<'a>(candidates: impl Iterator<Item = &'a String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for candidate in candidates {
        if kept.len() >= cap {
            break;
        }
        let cleaned = clean_snippet(candidate);
        if seen.insert(dedup_key(&cleaned)) {
            kept.push(cleaned);
        }
    }

    kept
}

fn key_features(sentences: &[String]) -> Vec<String> {
    let candidates = sentences.iter().filter(|sentence| {
        let len = char_len(sentence);
        (FEATURE_MIN_CHARS..=FEATURE_MAX_CHARS).contains(&len) && FEATURE_CUE.is_match(sentence)
    });
    dedup_capped(candidates, MAX_FEATURES)
}

fn metrics(sentences: &[String]) -> Vec<String> {
    let candidates = sentences
        .iter()
        .filter(|sentence| char_len(sentence) <= METRIC_MAX_CHARS && METRIC.is_match(sentence));
    dedup_capped(candidates, MAX_METRICS)
}

/// Known brands in the text plus partner-like image alt texts, sorted
fn partners(corpus: &str, texts: &[PageText<'_>]) -> Vec<String> {
    let mut found: BTreeSet<String> = brands_in(corpus)
        .into_iter()
        .map(str::to_string)
        .collect();

    for alt in texts.iter().flat_map(|page| page.image_alts.iter()) {
        if is_partner_alt(alt) {
            found.insert(alt.trim().to_string());
        }
    }

    found.into_iter().collect()
}

/// Page URLs and outbound links with a pricing path, in discovery order
fn pricing_urls(pages: &[PageRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    let candidates = pages.iter().flat_map(|page| {
        std::iter::once(&page.url).chain(page.outbound_links.iter())
    });

    for candidate in candidates {
        let Ok(parsed) = Url::parse(candidate) else {
            continue;
        };
        if is_pricing_path(parsed.path()) && seen.insert(candidate.clone()) {
            urls.push(candidate.clone());
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{Classification, PageType};
    use chrono::Utc;

    fn page(url: &str, title: Option<&str>, html: &str, links: &[&str]) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            parent_url: None,
            depth: 0,
            http_status: 200,
            content_type: "text/html".to_string(),
            title: title.map(str::to_string),
            meta_description: None,
            language: None,
            text: extract_visible_text(html),
            raw_html: html.to_string(),
            outbound_links: links.iter().map(|l| l.to_string()).collect(),
            fetched_at: Utc::now(),
            classification: Classification {
                page_type: PageType::Other,
                confidence: 0.3,
            },
        }
    }

    #[test]
    fn test_empty_pages() {
        let findings = aggregate_findings(&[]);
        assert!(!findings.mentions_pricing);
        assert!(findings.value_prop.is_none());
        assert_eq!(findings.coverage, Coverage::default());
    }

    #[test]
    fn test_pricing_text_mention() {
        let pages = [page(
            "https://acme.test/",
            None,
            "<body><p>Our pricing starts at $49/month</p></body>",
            &[],
        )];
        let findings = aggregate_findings(&pages);
        assert!(findings.mentions_pricing);
        assert!(findings.pricing_page_urls.is_empty());
        assert_eq!(findings.coverage.unique_urls_in_evidence, 1);
    }

    #[test]
    fn test_pricing_urls_from_links() {
        let pages = [
            page(
                "https://acme.test/",
                None,
                "<body>Hello</body>",
                &["https://acme.test/about", "https://acme.test/pricing"],
            ),
            page("https://acme.test/pricing", None, "<body>Plans</body>", &[]),
        ];
        let findings = aggregate_findings(&pages);
        assert!(findings.mentions_pricing);
        assert_eq!(findings.pricing_page_urls, vec!["https://acme.test/pricing"]);
        assert_eq!(findings.coverage.pages_considered, 2);
        assert_eq!(findings.coverage.unique_urls_in_evidence, 1);
    }

    #[test]
    fn test_value_prop_sentence() {
        let html = "<body><h1>Hi.</h1><p>Acme is the AI platform that grows ecommerce revenue for modern brands. Contact us.</p></body>";
        let findings = aggregate_findings(&[page("https://acme.test/", None, html, &[])]);
        assert_eq!(
            findings.value_prop.as_deref(),
            Some("Acme is the AI platform that grows ecommerce revenue for modern brands.")
        );
    }

    #[test]
    fn test_value_prop_falls_back_to_title() {
        let findings = aggregate_findings(&[page(
            "https://acme.test/",
            Some("Acme | Marketing Analytics"),
            "<body>Short.</body>",
            &[],
        )]);
        assert_eq!(findings.value_prop.as_deref(), Some("Acme | Marketing Analytics"));

        let none = aggregate_findings(&[page("https://acme.test/", Some("Welcome"), "<body>Hi</body>", &[])]);
        assert!(none.value_prop.is_none());
    }

    #[test]
    fn test_features_deduplicated() {
        let html = "<body><p>Automatically track every order across your store. \
                    Automatically track every order across your store</p></body>";
        let findings = aggregate_findings(&[page("https://acme.test/", None, html, &[])]);
        assert_eq!(
            findings.key_features,
            vec!["Automatically track every order across your store."]
        );
    }

    #[test]
    fn test_features_capped() {
        let body: String = (0..15)
            .map(|i| format!("<p>Automatically optimize campaign number {} for every shopper.</p>", i))
            .collect();
        let html = format!("<body>{}</body>", body);
        let findings = aggregate_findings(&[page("https://acme.test/", None, &html, &[])]);
        assert_eq!(findings.key_features.len(), MAX_FEATURES);
    }

    #[test]
    fn test_partners_from_text_and_alts() {
        let html = r#"<body>
            <p>Works with Shopify and Klaviyo out of the box.</p>
            <img src="a.png" alt="Acme Pay">
            <img src="b.png" alt="stripe">
            <img src="c.png" alt="screenshot of the dashboard">
            </body>"#;
        let findings = aggregate_findings(&[page("https://acme.test/", None, html, &[])]);
        assert_eq!(
            findings.partners_integrations,
            vec!["Acme Pay", "Klaviyo", "Shopify", "stripe"]
        );
    }

    #[test]
    fn test_metrics() {
        let html = "<body><p>Brands see 32% higher ROAS. We love our customers. \
                    Over 1,200 stores rely on Acme.</p></body>";
        let findings = aggregate_findings(&[page("https://acme.test/", None, html, &[])]);
        assert_eq!(
            findings.noteworthy_metrics,
            vec!["Brands see 32% higher ROAS.", "Over 1,200 stores rely on Acme."]
        );
    }

    #[test]
    fn test_aggregation_is_repeatable() {
        let pages = [page(
            "https://acme.test/",
            None,
            "<body><p>Increase revenue by 20% with automated flows for Shopify.</p></body>",
            &[],
        )];
        assert_eq!(aggregate_findings(&pages), aggregate_findings(&pages));
    }
}
