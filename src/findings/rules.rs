//! Keyword patterns and brand lists used by the findings miner

use once_cell::sync::Lazy;
use regex::Regex;

/// Value-proposition length window (characters)
pub const VALUE_PROP_MIN_CHARS: usize = 40;
pub const VALUE_PROP_MAX_CHARS: usize = 180;

/// Key-feature length window (characters)
pub const FEATURE_MIN_CHARS: usize = 40;
pub const FEATURE_MAX_CHARS: usize = 220;

/// Longest sentence considered as a metric (characters)
pub const METRIC_MAX_CHARS: usize = 240;

/// Longest image alt text considered as a partner name (characters)
pub const ALT_MAX_CHARS: usize = 40;

pub const MAX_FEATURES: usize = 10;
pub const MAX_METRICS: usize = 10;

/// Well-known platforms and tools, matched case-sensitively as whole words
pub const KNOWN_BRANDS: &[&str] = &[
    "Amazon",
    "BigCommerce",
    "Facebook",
    "Google",
    "Google Ads",
    "Gorgias",
    "HubSpot",
    "Instagram",
    "Intercom",
    "Klaviyo",
    "LinkedIn",
    "Magento",
    "Mailchimp",
    "Meta",
    "Microsoft",
    "Notion",
    "PayPal",
    "Pinterest",
    "Recharge",
    "Salesforce",
    "Segment",
    "Shopify",
    "Slack",
    "Snapchat",
    "Stripe",
    "TikTok",
    "WooCommerce",
    "Yotpo",
    "YouTube",
    "Zapier",
    "Zendesk",
];

/// Domain-relevance terms a value proposition must mention
pub static VALUE_PROP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:ai|platform|pricing|roas|optimi[sz]\w*|automat\w*|analytics|growth|revenue|customers?|marketing|e-?commerce|software|solutions?)\b",
    )
    .expect("Invalid value proposition regex")
});

/// Looser relevance test applied to page titles
pub static TITLE_RELEVANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:ai|platform|software|solutions?|tools?|apps?|analytics|marketing|commerce|automation|growth|optimi[sz]\w*)\b",
    )
    .expect("Invalid title relevance regex")
});

/// Action verbs that mark a sentence as a feature description
pub static FEATURE_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:identify|identifies|automatically|automate[sd]?|increase[sd]?|optimi[sz]e[sd]?|boosts?|reduces?|tracks?|analy[sz]es?|generates?|improves?|grows?|predicts?|discovers?|manages?|integrates?|launch(?:es)?|scales?|saves?)\b",
    )
    .expect("Invalid feature cue regex")
});

/// Pricing vocabulary and currency amounts
pub static PRICING_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:pricing|prices?|per month|per year|per user|free trial|subscriptions?|billed (?:monthly|annually))\b|[$€£]\s?\d|/mo(?:nth)?\b",
    )
    .expect("Invalid pricing text regex")
});

/// URL paths that point at pricing pages
pub static PRICING_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/(?:pricing|plans?|packages)(?:[/.\-_]|$)").expect("Invalid pricing path regex")
});

/// A percentage or a number with at least two digits
pub static METRIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:[.,]\d+)?\s?%|\d{2,}").expect("Invalid metric regex")
});

/// One to four capitalized words, e.g. `Acme Pay` or `Google Cloud`
pub static CAPITALIZED_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Za-z0-9&.+'\-]*(?: [A-Z][A-Za-z0-9&.+'\-]*){0,3}$")
        .expect("Invalid capitalized phrase regex")
});

/// Secondary delimiters used to break up overlong feature lists
pub static SECONDARY_DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;—·•]").expect("Invalid secondary delimiter regex"));

/// Bracketed ellipses left behind by truncated copy
pub static BRACKETED_ELLIPSIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\[(]\s*(?:\.{3}|…)\s*[\])]").expect("Invalid bracketed ellipsis regex")
});

static BRAND_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    KNOWN_BRANDS
        .iter()
        .map(|brand| {
            let pattern = format!(r"\b{}\b", regex::escape(brand));
            (
                *brand,
                Regex::new(&pattern).expect("Invalid brand regex"),
            )
        })
        .collect()
});

/// Returns every known brand mentioned in `text` as a whole word
pub fn brands_in(text: &str) -> Vec<&'static str> {
    BRAND_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(brand, _)| *brand)
        .collect()
}

/// Returns the known brand equal to `candidate`, ignoring case
pub fn known_brand(candidate: &str) -> Option<&'static str> {
    KNOWN_BRANDS
        .iter()
        .find(|brand| brand.eq_ignore_ascii_case(candidate.trim()))
        .copied()
}

/// Checks whether an image alt text reads like a partner name
pub fn is_partner_alt(alt: &str) -> bool {
    let alt = alt.trim();
    !alt.is_empty()
        && alt.chars().count() <= ALT_MAX_CHARS
        && (known_brand(alt).is_some() || CAPITALIZED_PHRASE.is_match(alt))
}

/// Checks whether a URL path points at a pricing page
pub fn is_pricing_path(path: &str) -> bool {
    PRICING_PATH.is_match(path)
}
