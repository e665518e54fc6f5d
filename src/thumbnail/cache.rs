//! In-memory record of resolved thumbnails.
//!
//! There is no eviction: the set of thumbnails a session scrolls past is
//! small, and a terminal entry must stay put so repeated renders never
//! trigger a second fetch.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::{Thumbnail, ThumbnailKey, ThumbnailResult};

/// Terminal outcomes keyed by source URL.
///
/// Not synchronised on its own; the [`FetchCoordinator`](super::FetchCoordinator)
/// owns it behind its lock.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: HashMap<ThumbnailKey, Resolved>,
}

/// A cache entry; `Pending` is never stored.
#[derive(Debug, Clone)]
enum Resolved {
    Ready(Arc<Thumbnail>),
    Failed,
}

impl ThumbnailCache {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// `Pending` if nothing is known about `key` yet.
    pub fn lookup(&self, key: &ThumbnailKey) -> ThumbnailResult {
        match self.entries.get(key) {
            Some(Resolved::Ready(image)) => ThumbnailResult::Ready(Arc::clone(image)),
            Some(Resolved::Failed) => ThumbnailResult::Failed,
            None => ThumbnailResult::Pending,
        }
    }

    /// Record a terminal outcome.
    ///
    /// Storing `Pending` is a no-op.  A key that already holds a terminal
    /// entry keeps it; the coordinator's one-fetch-per-key rule means this
    /// only happens on a logic error.
    pub fn store(&mut self, key: ThumbnailKey, result: ThumbnailResult) {
        let resolved = match result {
            ThumbnailResult::Ready(image) => Resolved::Ready(image),
            ThumbnailResult::Failed => Resolved::Failed,
            ThumbnailResult::Pending => return,
        };

        if self.entries.contains_key(&key) {
            debug_assert!(false, "thumbnail for {key} resolved twice");
            warn!(%key, "ignoring second resolution of cached thumbnail");
            return;
        }

        self.entries.insert(key, resolved);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(ready, failed)` entry counts, shown in the status bar.
    pub fn counts(&self) -> (usize, usize) {
        self.entries
            .values()
            .fold((0, 0), |(ready, failed), entry| match entry {
                Resolved::Ready(_) => (ready + 1, failed),
                Resolved::Failed => (ready, failed + 1),
            })
    }
}
