//! Heuristic page classification
//!
//! Classification is an ordered list of rules; the first rule whose predicate
//! matches decides the page type and confidence. Rules are tried in this order:
//! 1. Exact root path → home
//! 2. URL path keywords
//! 3. Title keywords (lower confidence)
//! 4. Privacy/terms phrases in the first 2000 characters of text
//! 5. Fallback → other
//!
//! Keyword matching is a case-insensitive substring test.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Number of leading text characters inspected by text rules
pub const TEXT_PREFIX_CHARS: usize = 2000;

/// Confidence of the fallback classification
pub const DEFAULT_CONFIDENCE: f32 = 0.3;

/// Type of a crawled page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    Home,
    About,
    Contact,
    Pricing,
    Product,
    Blog,
    CaseStudy,
    Privacy,
    Terms,
    Other,
}

impl PageType {
    /// Stable string form, used in output and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Home => "home",
            PageType::About => "about",
            PageType::Contact => "contact",
            PageType::Pricing => "pricing",
            PageType::Product => "product",
            PageType::Blog => "blog",
            PageType::CaseStudy => "case-study",
            PageType::Privacy => "privacy",
            PageType::Terms => "terms",
            PageType::Other => "other",
        }
    }

    /// Parses the string form produced by [`PageType::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "home" => Some(PageType::Home),
            "about" => Some(PageType::About),
            "contact" => Some(PageType::Contact),
            "pricing" => Some(PageType::Pricing),
            "product" => Some(PageType::Product),
            "blog" => Some(PageType::Blog),
            "case-study" => Some(PageType::CaseStudy),
            "privacy" => Some(PageType::Privacy),
            "terms" => Some(PageType::Terms),
            "other" => Some(PageType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub confidence: f32,
}

/// Which input a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSource {
    /// Exact match on the URL path
    RootPath,
    /// Substring of the lower-cased URL path
    Path,
    /// Substring of the lower-cased title
    Title,
    /// Substring of the lower-cased text prefix
    Text,
}

/// One entry of the rule chain
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub source: RuleSource,
    pub keywords: &'static [&'static str],
    pub page_type: PageType,
    pub confidence: f32,
}

impl Rule {
    fn matches(&self, input: &RuleInput<'_>) -> bool {
        match self.source {
            RuleSource::RootPath => self.keywords.contains(&input.path.as_str()),
            RuleSource::Path => contains_any(&input.path, self.keywords),
            RuleSource::Title => contains_any(&input.title, self.keywords),
            RuleSource::Text => contains_any(input.text_prefix, self.keywords),
        }
    }
}

const fn rule(
    source: RuleSource,
    keywords: &'static [&'static str],
    page_type: PageType,
    confidence: f32,
) -> Rule {
    Rule {
        source,
        keywords,
        page_type,
        confidence,
    }
}

/// The ordered rule chain; the first matching rule wins
pub const RULES: &[Rule] = &[
    rule(RuleSource::RootPath, &["/", "/index", "/index.html"], PageType::Home, 0.95),
    rule(RuleSource::Path, &["about", "team", "company", "who-we-are"], PageType::About, 0.9),
    rule(
        RuleSource::Path,
        &["contact", "contact-us", "support", "help", "get-in-touch"],
        PageType::Contact,
        0.9,
    ),
    rule(RuleSource::Path, &["pricing", "plans", "plan", "packages"], PageType::Pricing, 0.92),
    rule(RuleSource::Path, &["privacy", "privacy-policy"], PageType::Privacy, 0.98),
    rule(
        RuleSource::Path,
        &["terms", "terms-of-service", "tos", "legal"],
        PageType::Terms,
        0.95,
    ),
    rule(
        RuleSource::Path,
        &["blog", "news", "stories", "insights", "articles"],
        PageType::Blog,
        0.85,
    ),
    rule(
        RuleSource::Path,
        &["case", "case-study", "case-studies", "customers", "success-stories"],
        PageType::CaseStudy,
        0.85,
    ),
    rule(
        RuleSource::Path,
        &["product", "products", "shop", "store", "item", "sku", "catalog"],
        PageType::Product,
        0.75,
    ),
    rule(RuleSource::Title, &["about", "our team", "company"], PageType::About, 0.7),
    rule(RuleSource::Title, &["contact", "support"], PageType::Contact, 0.7),
    rule(RuleSource::Title, &["pricing", "plans", "packages"], PageType::Pricing, 0.75),
    rule(RuleSource::Title, &["privacy"], PageType::Privacy, 0.85),
    rule(RuleSource::Title, &["terms"], PageType::Terms, 0.85),
    rule(
        RuleSource::Title,
        &["blog", "news", "insights", "stories", "articles"],
        PageType::Blog,
        0.7,
    ),
    rule(
        RuleSource::Title,
        &["case study", "case studies", "customers", "success stories"],
        PageType::CaseStudy,
        0.7,
    ),
    rule(RuleSource::Title, &["product", "shop", "store"], PageType::Product, 0.65),
    rule(RuleSource::Text, &["privacy policy"], PageType::Privacy, 0.7),
    rule(
        RuleSource::Text,
        &["terms of service", "terms and conditions"],
        PageType::Terms,
        0.7,
    ),
];

struct RuleInput<'a> {
    path: String,
    title: String,
    text_prefix: &'a str,
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

/// Lower-cases the first `TEXT_PREFIX_CHARS` characters of `text`
fn text_prefix(text: &str) -> String {
    text.chars()
        .take(TEXT_PREFIX_CHARS)
        .collect::<String>()
        .to_lowercase()
}

/// Classifies a page from its URL, title and visible text
///
/// Pure and deterministic. An unparseable URL is classified on title and
/// text alone.
///
/// # Example
///
/// ```
/// use site_research::crawler::{classify, PageType};
///
/// let home = classify("https://site.com/", "", "");
/// assert_eq!(home.page_type, PageType::Home);
/// assert_eq!(home.confidence, 0.95);
/// assert_eq!(classify("https://site.com/random-slug", "", "").page_type, PageType::Other);
/// ```
pub fn classify(url: &str, title: &str, text: &str) -> Classification {
    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .ok()
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| "/".to_string());
    let prefix = text_prefix(text);
    let input = RuleInput {
        path,
        title: title.to_lowercase(),
        text_prefix: &prefix,
    };

    RULES
        .iter()
        .find(|rule| rule.matches(&input))
        .map(|rule| Classification {
            page_type: rule.page_type,
            confidence: rule.confidence,
        })
        .unwrap_or(Classification {
            page_type: PageType::Other,
            confidence: DEFAULT_CONFIDENCE,
        })
}
