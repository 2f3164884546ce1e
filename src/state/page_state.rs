/// Outcome of a single dequeued queue item
///
/// The outcome decides whether the item becomes a page record, a crawl
/// error, or nothing at all.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    /// HTML page fetched and recorded
    Accepted,

    /// robots.txt disallows the path
    RobotsBlocked,

    /// Transport failure, timeout, non-2xx status or off-origin redirect
    FetchFailed,

    /// Response was not HTML; silently excluded
    NonHtmlSkipped,
}

impl PageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::RobotsBlocked => "robots_blocked",
            Self::FetchFailed => "fetch_failed",
            Self::NonHtmlSkipped => "non_html_skipped",
        }
    }

    /// Returns true if this outcome is recorded as a crawl error
    pub fn is_error(&self) -> bool {
        matches!(self, Self::RobotsBlocked | Self::FetchFailed)
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
