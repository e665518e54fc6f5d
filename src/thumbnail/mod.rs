//! Asynchronous thumbnail loading.
//!
//! ```text
//! get_thumbnail()  ──►  FetchCoordinator  ──►  worker pool  ──►  Transport
//!   (request.rs)        (coordinator.rs)        (threads)
//!        ▲                     │ store
//!        │                     ▼
//!   dispatch_pending() ◄── resolution queue ◄── ThumbnailCache (cache.rs)
//! ```
//!
//! Every result produced on a worker thread re-enters the UI thread through
//! the resolution queue; callbacks never run on a worker.

mod cache;
mod coordinator;
mod request;

pub use cache::ThumbnailCache;
pub use coordinator::FetchCoordinator;
pub use request::Thumbnails;

use std::fmt;
use std::sync::Arc;

use image::imageops::FilterType;

use crate::error::DecodeError;

/// Preview grid width in pixels (one terminal column per pixel).
pub const PREVIEW_WIDTH: u32 = 6;
/// Preview grid height in pixels (two pixels per terminal row).
pub const PREVIEW_HEIGHT: u32 = 4;

/// Identifies a thumbnail resource by its source URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey(String);

impl ThumbnailKey {
    /// Accept only absolute http(s) URLs.
    ///
    /// Reddit fills the thumbnail field with markers such as `self`,
    /// `default` or `nsfw` when a post has no image; those yield `None`.
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        if url.starts_with("https://") || url.starts_with("http://") {
            Some(Self(url.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThumbnailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a thumbnail lookup.
///
/// `Ready` and `Failed` are terminal: once the cache holds one of them for a
/// key it never changes for the rest of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailResult {
    Pending,
    Ready(Arc<Thumbnail>),
    Failed,
}

impl ThumbnailResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The image to draw, substituting `placeholder` for anything but `Ready`.
    pub fn display(&self, placeholder: &Arc<Thumbnail>) -> Arc<Thumbnail> {
        match self {
            Self::Ready(image) => Arc::clone(image),
            Self::Pending | Self::Failed => Arc::clone(placeholder),
        }
    }
}

/// A decoded image, reduced to a tiny RGB grid for terminal display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    width: u32,
    height: u32,
    preview: Vec<[u8; 3]>,
}

impl Thumbnail {
    /// Decode any format the `image` crate was built with.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self::from_image(&image))
    }

    pub fn from_image(image: &image::DynamicImage) -> Self {
        // Nearest keeps flat colours exact and works in both directions.
        let preview = image
            .resize_exact(PREVIEW_WIDTH, PREVIEW_HEIGHT, FilterType::Nearest)
            .to_rgb8()
            .pixels()
            .map(|p| p.0)
            .collect();

        Self {
            width: image.width(),
            height: image.height(),
            preview,
        }
    }

    /// Built-in neutral checker tile used when no placeholder file is configured.
    pub fn placeholder() -> Self {
        let preview = (0..PREVIEW_HEIGHT)
            .flat_map(|y| {
                (0..PREVIEW_WIDTH).map(move |x| {
                    if (x + y) % 2 == 0 {
                        [58, 58, 58]
                    } else {
                        [88, 88, 88]
                    }
                })
            })
            .collect();

        Self {
            width: PREVIEW_WIDTH,
            height: PREVIEW_HEIGHT,
            preview,
        }
    }

    /// Original (pre-reduction) dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Colour of a preview pixel; out-of-range coordinates read as black.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= PREVIEW_WIDTH || y >= PREVIEW_HEIGHT {
            return [0, 0, 0];
        }
        self.preview
            .get((y * PREVIEW_WIDTH + x) as usize)
            .copied()
            .unwrap_or([0, 0, 0])
    }
}
