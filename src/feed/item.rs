//! The core data type shared across all feed sources.
//!
//! `FeedItem` represents a single post from any source (a subreddit listing,
//! an RSS channel, ...).  Every source converts its native format into
//! `FeedItem`s so the pager and the UI can stay source-agnostic.

use chrono::{DateTime, Utc};

/// A single feed entry, normalised from any data source.
///
/// Items keep the order their source returned them in; there is no sorting
/// and no de-duplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// Stable identifier (Reddit fullname, RSS guid or link).
    pub id: String,

    /// Human-readable headline.
    pub title: String,

    /// Source URL of the thumbnail.
    ///
    /// `None` is a normal state (text posts, feeds without media); the row
    /// shows the placeholder.
    pub thumbnail_url: Option<String>,

    /// Where the post points (article, image, video ...).
    pub link: Option<String>,

    /// Discussion page for the post.
    pub comments_url: Option<String>,

    pub author: Option<String>,

    pub score: Option<i64>,

    pub num_comments: Option<u64>,

    /// Submission time.
    pub created: Option<DateTime<Utc>>,

    /// Name of the feed this came from (e.g. "r/aww").
    pub source_name: String,
}

impl FeedItem {
    /// Compact age such as `42s`, `7m`, `3h` or `12d`.
    pub fn age(&self, now: DateTime<Utc>) -> Option<String> {
        let secs = (now - self.created?).num_seconds().max(0);
        Some(match secs {
            0..=59 => format!("{secs}s"),
            60..=3_599 => format!("{}m", secs / 60),
            3_600..=86_399 => format!("{}h", secs / 3_600),
            _ => format!("{}d", secs / 86_400),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::test_support::make_item;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn age_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut item = make_item("1", "Post");

        item.created = Some(now - Duration::seconds(42));
        assert_eq!(item.age(now).as_deref(), Some("42s"));

        item.created = Some(now - Duration::minutes(7));
        assert_eq!(item.age(now).as_deref(), Some("7m"));

        item.created = Some(now - Duration::hours(3));
        assert_eq!(item.age(now).as_deref(), Some("3h"));

        item.created = Some(now - Duration::days(12));
        assert_eq!(item.age(now).as_deref(), Some("12d"));
    }

    #[test]
    fn future_timestamps_clamp_to_zero() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut item = make_item("1", "Post");
        item.created = Some(now + Duration::minutes(5));
        assert_eq!(item.age(now).as_deref(), Some("0s"));
    }

    #[test]
    fn undated_item_has_no_age() {
        let item = make_item("1", "Post");
        assert!(item.age(Utc::now()).is_none());
    }
}
