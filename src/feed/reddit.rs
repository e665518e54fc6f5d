//! Subreddit listing source.
//!
//! Reads the public `hot.json` listing endpoint.  Pagination follows the
//! listing's `after` fullname; a `null` `after` ends the feed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Cursor, FeedItem, FeedPage, FeedSource};
use crate::error::FeedError;
use crate::transport::Transport;

pub struct RedditSource {
    transport: Arc<dyn Transport>,
    base_url: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    /// Fullname, e.g. `t3_1abcde`.
    name: String,
    title: String,
    thumbnail: Option<String>,
    url: Option<String>,
    permalink: String,
    author: Option<String>,
    score: Option<i64>,
    num_comments: Option<u64>,
    created_utc: Option<f64>,
    subreddit_name_prefixed: Option<String>,
}

impl RedditSource {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, page_size: u32) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size,
        }
    }

    /// Listing URL for `selector` (`aww`, `r/aww` and `/r/aww` are equivalent).
    pub fn page_url(&self, selector: &str, cursor: Option<&Cursor>) -> String {
        let mut url = format!(
            "{}{}/hot.json?limit={}&raw_json=1",
            self.base_url,
            normalize_selector(selector),
            self.page_size
        );
        if let Some(cursor) = cursor {
            url.push_str("&after=");
            url.push_str(cursor.as_str());
        }
        url
    }

    /// Parse a listing document.  Pure, so tests can skip the network.
    pub fn parse_listing(&self, body: &[u8]) -> Result<FeedPage, FeedError> {
        let listing: Listing = serde_json::from_slice(body)?;

        let items = listing
            .data
            .children
            .into_iter()
            .map(|child| self.to_item(child.data))
            .collect();

        let next = listing
            .data
            .after
            .filter(|after| !after.is_empty())
            .map(Cursor::new);

        Ok(FeedPage { items, next })
    }

    fn to_item(&self, post: Post) -> FeedItem {
        let created = post
            .created_utc
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0));

        FeedItem {
            id: post.name,
            title: unescape_html(&post.title),
            thumbnail_url: post
                .thumbnail
                .filter(|t| !t.is_empty())
                .map(|t| unescape_html(&t)),
            link: post.url.map(|u| unescape_html(&u)),
            comments_url: Some(format!("{}{}", self.base_url, post.permalink)),
            author: post.author,
            score: post.score,
            num_comments: post.num_comments,
            created,
            source_name: post.subreddit_name_prefixed.unwrap_or_default(),
        }
    }
}

impl FeedSource for RedditSource {
    fn name(&self) -> &str {
        "reddit"
    }

    fn fetch_page(&self, selector: &str, cursor: Option<&Cursor>) -> Result<FeedPage, FeedError> {
        let body = self.transport.fetch_bytes(&self.page_url(selector, cursor))?;
        self.parse_listing(&body)
    }
}

/// `aww` / `r/aww` / `/r/aww/` all become `/r/aww`.
fn normalize_selector(selector: &str) -> String {
    let trimmed = selector.trim().trim_matches('/');
    if trimmed.starts_with("r/") || trimmed.starts_with("user/") || trimmed.is_empty() {
        format!("/{trimmed}")
    } else {
        format!("/r/{trimmed}")
    }
}

/// Undo the entity escaping Reddit applies when `raw_json` is ignored.
fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
