//! Feed source abstraction layer.
//!
//! This module defines the [`FeedSource`] trait and the page types it
//! produces.  Concrete sources live in sub-modules: [`reddit`] for paginated
//! subreddit listings and [`rss`] for single-page RSS feeds.
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory (e.g. `lemmy.rs`).
//! 2. Define a struct and implement [`FeedSource`] for it.  Fetch bytes
//!    through a [`Transport`](crate::transport::Transport) so tests can
//!    substitute a fake.
//! 3. Add `mod lemmy;` below and re-export your struct.
//! 4. Construct it in `main.rs`.
//!
//! The pager, thumbnail loader and UI are all source-agnostic.

mod item;
mod reddit;
mod rss;

pub use item::FeedItem;
pub use reddit::RedditSource;
pub use rss::RssSource;

use crate::error::FeedError;

/// Opaque continuation token handed back to the source for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedPage {
    /// Items in the order the source returned them.
    pub items: Vec<FeedItem>,
    /// Cursor for the following page; `None` means the feed is exhausted.
    pub next: Option<Cursor>,
}

/// Trait that every feed source must implement.
///
/// [`fetch_page()`](FeedSource::fetch_page) runs on the page worker thread,
/// so implementations must be [`Send`].
///
/// ## Implementing a new source
///
/// ```ignore
/// pub struct MySource { /* config fields */ }
///
/// impl FeedSource for MySource {
///     fn name(&self) -> &str { "my-source" }
///
///     fn fetch_page(&self, selector: &str, cursor: Option<&Cursor>) -> Result<FeedPage, FeedError> {
///         // Perform HTTP / IO, then convert into FeedItem values.
///         todo!()
///     }
/// }
/// ```
pub trait FeedSource: Send {
    /// Human-readable label shown in the status bar.
    fn name(&self) -> &str;

    /// Fetch the page of `selector` that follows `cursor` (`None` for the
    /// first page).
    fn fetch_page(&self, selector: &str, cursor: Option<&Cursor>) -> Result<FeedPage, FeedError>;
}
