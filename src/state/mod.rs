//! State module for tracking crawl progress
//!
//! `PageState` is the outcome of one dequeued queue item.

mod page_state;

pub use page_state::PageState;
