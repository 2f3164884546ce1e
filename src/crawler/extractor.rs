//! HTML content extraction
//!
//! This module turns a fetched HTML document into the pieces the crawler and
//! findings aggregator consume:
//! - Page title and meta description
//! - Primary language subtag
//! - Visible body text (script, style, iframe and noscript removed)
//! - Same-origin outbound links, canonicalized and de-duplicated
//! - Image alt texts
//!
//! Parsing is best effort. Malformed markup yields empty or partial fields,
//! never an error.

use crate::url::{canonical_url, same_origin};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text content is never visible
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "iframe", "noscript"];

/// Elements that separate their text from the surrounding text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "option", "p", "pre", "section", "summary", "table",
    "td", "th", "tr", "ul",
];

/// Fields extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    /// Primary language subtag, e.g. `en` for `en-US`
    pub language: Option<String>,
    /// Visible text with whitespace collapsed
    pub text: String,
    /// Canonical same-origin links in document order
    pub outbound_links: Vec<String>,
    pub image_alts: Vec<String>,
}

/// Extracts metadata, text and links from an HTML document
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the document was served from; relative links are
///   resolved against it and only links on the same origin are kept
///
/// # Example
///
/// ```
/// use site_research::crawler::extract;
/// use url::Url;
///
/// let html = r#"<html lang="en-US"><head><title>Acme</title></head>
///     <body><a href="/pricing">Pricing</a></body></html>"#;
/// let base = Url::parse("https://acme.test/").unwrap();
/// let content = extract(html, &base);
/// assert_eq!(content.title.as_deref(), Some("Acme"));
/// assert_eq!(content.language.as_deref(), Some("en"));
/// assert_eq!(content.outbound_links, vec!["https://acme.test/pricing".to_string()]);
/// ```
pub fn extract(html: &str, base_url: &Url) -> ExtractedContent {
    let document = Html::parse_document(html);

    ExtractedContent {
        title: extract_title(&document),
        meta_description: extract_meta_description(&document),
        language: extract_language(&document),
        text: visible_text(&document),
        outbound_links: extract_links(&document, base_url),
        image_alts: image_alts(&document),
    }
}

/// Returns the visible body text of an HTML document
pub fn extract_visible_text(html: &str) -> String {
    visible_text(&Html::parse_document(html))
}

/// Returns the non-empty `alt` attributes of all images, whitespace collapsed
pub fn extract_image_alts(html: &str) -> Vec<String> {
    image_alts(&Html::parse_document(html))
}

/// Collapses all runs of whitespace to a single space and trims the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .find(|title| !title.is_empty())
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

fn extract_meta_description(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(document, r#"meta[property="og:description"]"#))
}

fn extract_language(document: &Html) -> Option<String> {
    let from_html = Selector::parse("html[lang]").ok().and_then(|selector| {
        document
            .select(&selector)
            .filter_map(|element| element.value().attr("lang"))
            .find_map(primary_subtag)
    });

    from_html.or_else(|| {
        meta_content(document, r#"meta[property="og:locale"]"#)
            .as_deref()
            .and_then(primary_subtag)
    })
}

/// Reduces `en-US` / `en_US` to `en`
fn primary_subtag(tag: &str) -> Option<String> {
    let primary = tag
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if primary.is_empty() {
        None
    } else {
        Some(primary)
    }
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    HIDDEN_ELEMENTS.contains(&element.value().name())
}

fn visible_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    push_visible_text(root, &mut text);
    collapse_whitespace(&text)
}

/// Appends the visible text under `element`
///
/// Adjacent inline text is concatenated as-is; block boundaries become a space.
fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    if is_hidden(&element) {
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&element.value().name());
    if block {
        out.push(' ');
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            push_visible_text(child_element, out);
        } else if let Node::Text(text) = child.value() {
            out.push_str(&**text);
        }
    }

    if block {
        out.push(' ');
    }
}

fn image_alts(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("img[alt]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("alt"))
        .map(collapse_whitespace)
        .filter(|alt| !alt.is_empty())
        .collect()
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(link) = resolve_link(href, base_url) {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

/// Resolves a link href to a canonical same-origin URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - non-HTTP(S) URLs after resolution
/// - URLs on another origin
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    if !same_origin(&absolute, base_url) {
        return None;
    }

    canonical_url(absolute.as_str()).ok().map(String::from)
}
