//! Entry point used by row rendering.

use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

use super::{FetchCoordinator, Thumbnail, ThumbnailKey, ThumbnailResult};

/// Thumbnail lookups for the UI, with placeholder substitution.
pub struct Thumbnails {
    coordinator: FetchCoordinator,
    placeholder: Arc<Thumbnail>,
}

impl Thumbnails {
    pub fn new(coordinator: FetchCoordinator, placeholder: Arc<Thumbnail>) -> Self {
        Self {
            coordinator,
            placeholder,
        }
    }

    /// Return what to draw right now and arrange for `on_resolved` to be
    /// called with the final outcome.
    ///
    /// A missing or non-http(s) `url` resolves to `Failed` before this
    /// returns and never touches the network.  `on_resolved` always runs on
    /// the thread that calls [`dispatch_pending`](Self::dispatch_pending);
    /// it should only schedule a redraw.
    pub fn get_thumbnail(
        &self,
        url: Option<&str>,
        on_resolved: impl FnOnce(ThumbnailResult) + Send + 'static,
    ) -> Arc<Thumbnail> {
        let Some(key) = url.and_then(ThumbnailKey::parse) else {
            on_resolved(ThumbnailResult::Failed);
            return Arc::clone(&self.placeholder);
        };

        let current = self.coordinator.lookup(&key).display(&self.placeholder);
        self.coordinator.request(key, on_resolved);
        current
    }

    /// The image to draw if the outcome for `url` is already settled.
    ///
    /// `None` means a [`get_thumbnail`](Self::get_thumbnail) call is still
    /// needed (or one is already in flight).
    pub fn peek(&self, url: Option<&str>) -> Option<Arc<Thumbnail>> {
        let Some(key) = url.and_then(ThumbnailKey::parse) else {
            return Some(Arc::clone(&self.placeholder));
        };

        let result = self.coordinator.lookup(&key);
        result.is_terminal().then(|| result.display(&self.placeholder))
    }

    pub fn placeholder(&self) -> &Arc<Thumbnail> {
        &self.placeholder
    }

    /// See [`FetchCoordinator::dispatch_pending`].
    pub fn dispatch_pending(&self) -> usize {
        self.coordinator.dispatch_pending()
    }

    #[cfg(test)]
    pub fn dispatch_next(&self, timeout: Duration) -> bool {
        self.coordinator.dispatch_next(timeout)
    }

    /// `(ready, failed, in_flight)`.
    pub fn stats(&self) -> (usize, usize, usize) {
        self.coordinator.stats()
    }
}
