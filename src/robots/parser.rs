//! Robots.txt parser implementation
//!
//! Only the `User-agent: *` group and its `Disallow` directives are honored.
//! `Allow`, `Crawl-delay`, `Sitemap`, wildcards and agent-specific groups are
//! ignored.

use chrono::{DateTime, Duration, Utc};
use url::Url;

/// Disallow rules for a single origin
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsPolicy {
    /// Origin the rules apply to (`scheme://host[:port]`)
    pub origin: String,

    /// Path prefixes that may not be fetched
    pub disallowed_path_prefixes: Vec<String>,

    /// When the policy was fetched (or the fetch was attempted)
    pub fetched_at: DateTime<Utc>,
}

impl RobotsPolicy {
    /// Builds a policy from raw robots.txt content
    pub fn from_content(origin: &str, content: &str) -> Self {
        Self {
            origin: origin.to_string(),
            disallowed_path_prefixes: parse_disallow_rules(content),
            fetched_at: Utc::now(),
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// This is cached when robots.txt is missing or cannot be fetched.
    pub fn allow_all(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            disallowed_path_prefixes: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Checks if a URL's path is allowed; the query string is ignored
    pub fn is_allowed(&self, url: &Url) -> bool {
        self.is_path_allowed(url.path())
    }

    /// Checks a bare path against the disallow prefixes
    pub fn is_path_allowed(&self, path: &str) -> bool {
        !self
            .disallowed_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Checks if the policy is older than the given time-to-live
    pub fn is_stale(&self, ttl: Duration) -> bool {
        Utc::now() - self.fetched_at >= ttl
    }

    /// Returns true when no path is disallowed
    pub fn allows_everything(&self) -> bool {
        self.disallowed_path_prefixes.is_empty()
    }
}

/// Extracts the `Disallow` prefixes of the `User-agent: *` group
///
/// Consecutive `User-agent` lines form one group; the group applies when any
/// of its agents is `*` (optionally quoted). An empty `Disallow:` value allows
/// everything and contributes no rule.
pub fn parse_disallow_rules(content: &str) -> Vec<String> {
    let mut disallows = Vec::new();
    let mut in_wildcard_group = false;
    let mut previous_was_agent = false;

    for raw_line in content.lines() {
        let line = match raw_line.find('#') {
            Some(idx) => &raw_line[..idx],
            None => raw_line,
        }
        .trim();

        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                let is_wildcard = value == "*" || value == "\"*\"";
                if previous_was_agent {
                    in_wildcard_group |= is_wildcard;
                } else {
                    in_wildcard_group = is_wildcard;
                }
                previous_was_agent = true;
            }
            "disallow" => {
                previous_was_agent = false;
                if in_wildcard_group && !value.is_empty() && value != "\"" {
                    disallows.push(value.to_string());
                }
            }
            _ => {
                previous_was_agent = false;
            }
        }
    }

    disallows
}
