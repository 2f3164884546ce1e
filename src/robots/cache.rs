//! Robots.txt caching implementation
//!
//! Policies are cached per origin and expire after a configurable TTL
//! (6 hours by default). The cache is owned by whoever runs the crawl and can
//! be shared between crawls; the map is guarded by an async mutex.

use crate::robots::{fetch_robots, RobotsPolicy};
use crate::url::origin_of;
use chrono::Duration;
use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Default time-to-live for cached policies
pub const DEFAULT_ROBOTS_TTL_HOURS: i64 = 6;

/// TTL-cached robots.txt policies keyed by origin
pub struct RobotsCache {
    client: Client,
    user_agent: String,
    fetch_timeout: std::time::Duration,
    ttl: Duration,
    entries: Mutex<HashMap<String, RobotsPolicy>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt fetches
    /// * `user_agent` - User agent sent with each fetch
    /// * `fetch_timeout` - Hard timeout for a robots.txt request
    /// * `ttl` - How long a cached policy stays valid
    pub fn new(
        client: Client,
        user_agent: impl Into<String>,
        fetch_timeout: std::time::Duration,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            fetch_timeout,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks if a URL may be fetched
    ///
    /// Never fails: a robots.txt that is missing, unreachable or unreadable is
    /// cached as allow-all for the TTL.
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let policy = self.policy_for(url).await;
        let allowed = policy.is_allowed(url);
        if !allowed {
            tracing::debug!("robots.txt for {} disallows {}", policy.origin, url.path());
        }
        allowed
    }

    /// Returns the cached policy for the URL's origin, fetching it if absent or stale
    pub async fn policy_for(&self, url: &Url) -> RobotsPolicy {
        let origin = origin_of(url);

        {
            let entries = self.entries.lock().await;
            if let Some(policy) = entries.get(&origin) {
                if !policy.is_stale(self.ttl) {
                    tracing::trace!("Using cached robots.txt for {}", origin);
                    return policy.clone();
                }
            }
        }

        tracing::debug!("Fetching robots.txt for {}", origin);
        let policy = match fetch_robots(&self.client, &origin, &self.user_agent, self.fetch_timeout)
            .await
        {
            Some(content) => RobotsPolicy::from_content(&origin, &content),
            None => RobotsPolicy::allow_all(&origin),
        };

        self.insert(policy.clone()).await;
        policy
    }

    /// Stores a policy, replacing any previous entry for its origin
    pub async fn insert(&self, policy: RobotsPolicy) {
        let mut entries = self.entries.lock().await;
        entries.insert(policy.origin.clone(), policy);
    }

    /// Drops every cached policy
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of cached origins
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true when nothing is cached
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
