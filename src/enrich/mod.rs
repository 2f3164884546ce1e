//! Page enrichment through a text-completion service
//!
//! Enrichment adds a two-sentence summary and a list of structured entities
//! (products, integrations, plans, prices) to each crawled page. It is
//! optional: findings never depend on it, and a failing completion service
//! only costs the enrichment of the affected page.

mod client;

pub use client::HttpCompletionClient;

use crate::crawler::PageRecord;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum summary length (characters)
pub const SUMMARY_MAX_CHARS: usize = 600;

/// Maximum page text sent in one prompt (characters)
pub const PROMPT_TEXT_MAX_CHARS: usize = 12_000;

const SUMMARY_SYSTEM_PROMPT: &str =
    "Summarize the following webpage content in exactly 2 concise sentences.";

const ENTITY_SYSTEM_PROMPT: &str =
    "Extract structured entities from webpage content. Be concise.";

static PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[$€£]?\d{1,3}(?:,\d{3})*(?:\.\d{2})?$|^[$€£]?\d+(?:\.\d{2})?$")
        .expect("Invalid price regex")
});

/// A text-completion capability
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends a system instruction and a user prompt, returning the generated text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// A structured fact extracted from a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Enrichment produced for one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageEnrichment {
    pub url: String,
    pub summary: Option<String>,
    pub entities: Vec<Entity>,
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((offset, _)) => &s[..offset],
        None => s,
    }
}

/// Asks for a two-sentence summary of a page
///
/// The reply is trimmed and capped at [`SUMMARY_MAX_CHARS`].
pub async fn summarize_page(
    service: &dyn CompletionService,
    url: &str,
    text: &str,
) -> Result<String> {
    let prompt = format!("URL: {}\n\n{}", url, truncate_chars(text, PROMPT_TEXT_MAX_CHARS));
    let reply = service.complete(SUMMARY_SYSTEM_PROMPT, &prompt).await?;
    Ok(truncate_chars(reply.trim(), SUMMARY_MAX_CHARS).to_string())
}

/// Asks for the structured entities mentioned on a page
///
/// Unparseable replies yield no entities rather than an error.
pub async fn extract_entities(service: &dyn CompletionService, text: &str) -> Result<Vec<Entity>> {
    let prompt = format!(
        "Extract entities from this page. Capture product names, integrations, plan names, and price points.\n\n\
         Return JSON array like:\n\
         [{{\"type\":\"product\",\"value\":\"X\"}},{{\"type\":\"price\",\"value\":\"$99\"}}]\n\n\
         Content:\n{}",
        truncate_chars(text, PROMPT_TEXT_MAX_CHARS)
    );
    let reply = service.complete(ENTITY_SYSTEM_PROMPT, &prompt).await?;
    Ok(parse_entities(&reply))
}

/// Summarizes and extracts entities for every page with text
///
/// Failures are logged and leave the affected field empty.
pub async fn enrich_pages(
    service: &dyn CompletionService,
    pages: &[PageRecord],
) -> Vec<PageEnrichment> {
    let mut enriched = Vec::new();

    for page in pages.iter().filter(|page| !page.text.trim().is_empty()) {
        let summary = match summarize_page(service, &page.url, &page.text).await {
            Ok(summary) if !summary.is_empty() => Some(summary),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Summary failed for {}: {:#}", page.url, e);
                None
            }
        };

        let entities = match extract_entities(service, &page.text).await {
            Ok(entities) => entities,
            Err(e) => {
                tracing::warn!("Entity extraction failed for {}: {:#}", page.url, e);
                Vec::new()
            }
        };

        tracing::debug!(
            "Enriched {}: summary={}, {} entities",
            page.url,
            summary.is_some(),
            entities.len()
        );

        enriched.push(PageEnrichment {
            url: page.url.clone(),
            summary,
            entities,
        });
    }

    enriched
}

/// Parses a completion reply into entities
///
/// Accepts a bare JSON array or an object with an `entities` array, optionally
/// wrapped in a markdown code fence. Types are normalized, empty entries are
/// dropped, and `price` entities must look like a price.
pub fn parse_entities(reply: &str) -> Vec<Entity> {
    let body = strip_code_fence(reply);
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to parse entities: {}", e);
            return Vec::new();
        }
    };

    let items = match parsed {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("entities") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items.iter().filter_map(entity_from_value).collect()
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn entity_from_value(item: &Value) -> Option<Entity> {
    let entity_type = normalize_type(item.get("type")?.as_str()?);
    let value = match item.get("value")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if entity_type.is_empty() || value.is_empty() {
        return None;
    }
    if entity_type == "price" && !looks_like_price(&value) {
        return None;
    }

    Some(Entity {
        entity_type,
        value,
        confidence: item.get("confidence").and_then(Value::as_f64),
    })
}

/// Maps free-form entity type names onto a small vocabulary
pub fn normalize_type(raw: &str) -> String {
    let key = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();

    let normalized = match key.as_str() {
        "integration" | "integrations" => "integration",
        "plan" | "plan_name" => "plan",
        "case_study" | "case" | "case_studies" | "case_study_name" | "case_study_brand" => {
            "case_study"
        }
        "price" | "pricing" => "price",
        "product" | "tool" => "product",
        "url" | "link" => "url",
        "team_member" | "teammember" | "team" => "team_member",
        other => other,
    };

    normalized.to_string()
}

/// Checks for values like `$1,234.56`, `€99` or `99.00`
pub fn looks_like_price(value: &str) -> bool {
    PRICE.is_match(value.trim())
}
