//! RSS feed source implementation.
//!
//! The selector is the feed URL itself.  RSS has no continuation token, so
//! every feed is a single page and the pager goes straight to exhausted after
//! the first fetch.
//!
//! Thumbnails come from the Media RSS `<media:thumbnail url="...">` element,
//! falling back to an `image/*` enclosure.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Cursor, FeedItem, FeedPage, FeedSource};
use crate::error::FeedError;
use crate::transport::Transport;

/// An RSS feed data source.
///
/// Fetches over a [`Transport`] and parses RSS 2.0 with the [`rss`] crate.
pub struct RssSource {
    transport: Arc<dyn Transport>,
}

impl RssSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Parse an already-fetched [`rss::Channel`] into [`FeedItem`]s.
    ///
    /// This is a pure function (no I/O) so that tests can exercise the
    /// parsing logic without hitting the network.
    pub fn parse_channel(channel: &rss::Channel, fallback_label: &str) -> Vec<FeedItem> {
        let label = if channel.title().is_empty() {
            fallback_label
        } else {
            channel.title()
        };

        channel
            .items()
            .iter()
            .map(|item| {
                // Prefer <guid>, fall back to <link>, then empty string.
                let id = item
                    .guid()
                    .map(|g| g.value().to_string())
                    .or_else(|| item.link().map(String::from))
                    .unwrap_or_default();

                // Parse RFC-2822 date; gracefully degrade to None on failure.
                let created = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                    .map(|dt| dt.with_timezone(&Utc));

                let link = item.link().map(String::from);

                FeedItem {
                    id,
                    title: item.title().unwrap_or("(untitled)").to_string(),
                    thumbnail_url: thumbnail_of(item),
                    comments_url: item.comments().map(String::from).or_else(|| link.clone()),
                    link,
                    author: item.author().map(String::from),
                    score: None,
                    num_comments: None,
                    created,
                    source_name: label.to_string(),
                }
            })
            .collect()
    }
}

fn thumbnail_of(item: &rss::Item) -> Option<String> {
    let media = item
        .extensions()
        .get("media")
        .and_then(|ns| ns.get("thumbnail"))
        .and_then(|thumbs| thumbs.first())
        .and_then(|thumb| thumb.attrs().get("url"))
        .cloned();

    media.or_else(|| {
        item.enclosure()
            .filter(|e| e.mime_type().starts_with("image/"))
            .map(|e| e.url().to_string())
    })
}

impl FeedSource for RssSource {
    fn name(&self) -> &str {
        "rss"
    }

    fn fetch_page(&self, selector: &str, _cursor: Option<&Cursor>) -> Result<FeedPage, FeedError> {
        let body = self.transport.fetch_bytes(selector)?;
        let channel = rss::Channel::read_from(body.as_slice())?;
        Ok(FeedPage {
            items: Self::parse_channel(&channel, selector),
            next: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
