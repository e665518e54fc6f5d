//! Error taxonomy for the fetch layer.
//!
//! Thumbnail-side errors never reach the renderer: the coordinator collapses
//! them into [`ThumbnailResult::Failed`](crate::thumbnail::ThumbnailResult).
//! Page-side errors surface to the [`Pager`](crate::pager::Pager) as a
//! recoverable condition.  End-of-feed is *not* an error; it is a
//! [`FeedPage`](crate::feed::FeedPage) without a continuation cursor.

use std::any::Any;

use thiserror::Error;

/// Failure to retrieve bytes for a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("failed to read response: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Body(e.to_string())
        }
    }
}

/// The fetched bytes could not be decoded as an image.
#[derive(Debug, Error)]
#[error("could not decode image: {0}")]
pub struct DecodeError(#[from] pub image::ImageError);

/// Failure to produce a [`FeedPage`](crate::feed::FeedPage).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not parse feed: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<rss::Error> for FeedError {
    fn from(e: rss::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Best-effort text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
