//! Scheduler for managing the crawl frontier and politeness pacing
//!
//! This module handles:
//! - FIFO queue management for breadth-first traversal
//! - The visited set (marked on dequeue) and the queued set
//! - Depth-bounded link admission
//! - Respecting a minimum delay between successive requests

use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Canonical URL to fetch
    pub url: String,

    /// Link distance from the start URL
    pub depth: u32,

    /// Page the URL was discovered on; None for the start URL
    pub parent_url: Option<String>,
}

impl QueueItem {
    /// Creates the depth-0 item for a crawl's start URL
    pub fn root(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            parent_url: None,
        }
    }
}

/// Scheduler manages the frontier queue and request pacing for one crawl
///
/// A scheduler is owned by a single crawl run and never shared.
pub struct Scheduler {
    /// Frontier in discovery order
    queue: VecDeque<QueueItem>,

    /// Canonical URLs already dequeued
    visited: HashSet<String>,

    /// Canonical URLs currently in the queue
    queued: HashSet<String>,

    /// Links found at this depth or deeper are not followed
    max_depth: u32,

    /// Minimum time between successive requests
    request_delay: Duration,

    last_request: Option<Instant>,
}

impl Scheduler {
    /// Creates a new scheduler seeded with the start item
    ///
    /// # Arguments
    ///
    /// * `start` - The depth-0 queue item
    /// * `max_depth` - Maximum depth of any enqueued item
    /// * `request_delay` - Politeness delay between requests
    pub fn new(start: QueueItem, max_depth: u32, request_delay: Duration) -> Self {
        let mut queued = HashSet::new();
        queued.insert(start.url.clone());

        Self {
            queue: VecDeque::from([start]),
            visited: HashSet::new(),
            queued,
            max_depth,
            request_delay,
            last_request: None,
        }
    }

    /// Gets the next unvisited item and marks it visited
    ///
    /// # Returns
    ///
    /// * `Some(QueueItem)` - The next item in FIFO order
    /// * `None` - The frontier is empty
    pub fn next_item(&mut self) -> Option<QueueItem> {
        while let Some(item) = self.queue.pop_front() {
            self.queued.remove(&item.url);

            if !self.visited.insert(item.url.clone()) {
                tracing::trace!("Skipping already visited {}", item.url);
                continue;
            }

            return Some(item);
        }

        None
    }

    /// Marks a URL visited, returning false if it already was
    ///
    /// Used for the post-redirect URL of a fetch.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Enqueues links discovered on a page at `depth`
    ///
    /// Links are admitted at `depth + 1` only while `depth < max_depth`, and
    /// only if they are neither visited nor already queued.
    ///
    /// # Returns
    ///
    /// The number of links added to the frontier
    pub fn enqueue_links(&mut self, links: &[String], depth: u32, parent_url: &str) -> usize {
        if depth >= self.max_depth {
            return 0;
        }

        let mut added = 0;
        for link in links {
            if self.visited.contains(link) || self.queued.contains(link) {
                continue;
            }

            self.queued.insert(link.clone());
            self.queue.push_back(QueueItem {
                url: link.clone(),
                depth: depth + 1,
                parent_url: Some(parent_url.to_string()),
            });
            added += 1;
        }

        tracing::trace!("Enqueued {} links from {}", added, parent_url);
        added
    }

    /// Waits until the politeness delay since the previous request has elapsed
    pub async fn wait_for_turn(&mut self) {
        if let Some(last) = self.last_request {
            let ready_at = last + self.request_delay;
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
