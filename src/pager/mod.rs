//! Incremental pagination.
//!
//! The [`Pager`] owns the loaded items for the active feed and decides when
//! to ask the page worker for more.  It lives on the UI thread; the only
//! cross-thread traffic is [`PageRequest`] out and [`PageMsg`] back.
//!
//! ```text
//!            on_scroll(near_end)            Ok(page), next = Some
//!   Idle ─────────────────────────► Fetching ──────────────────────► Idle
//!    ▲                                 │ │
//!    │           Err(e)                │ │ Ok(page), next = None
//!    └─────────────────────────────────┘ └─────────────────────────► Exhausted
//! ```
//!
//! [`select_feed`](Pager::select_feed) returns to `Idle` from any state and
//! bumps the epoch; results tagged with an older epoch are dropped.

pub mod worker;

use std::sync::mpsc::Sender;

use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::feed::{Cursor, FeedItem};

pub use worker::{PageMsg, PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// Ready to fetch on the next near-end signal.
    Idle,
    /// One page request is outstanding.
    Fetching,
    /// The source reported no further pages.
    Exhausted,
}

/// What [`Pager::on_page`] did with a result.
#[derive(Debug, PartialEq)]
pub enum PageOutcome {
    /// This many items were appended (possibly zero).
    Appended(usize),
    /// The result belonged to a feed that is no longer selected.
    Stale,
    /// The fetch failed; the pager is idle again.
    Failed(FeedError),
}

pub struct Pager {
    selector: String,
    items: Vec<FeedItem>,
    cursor: Option<Cursor>,
    state: PagerState,
    epoch: u64,
    requests: Sender<PageRequest>,
}

impl Pager {
    pub fn new(selector: impl Into<String>, requests: Sender<PageRequest>) -> Self {
        Self {
            selector: selector.into(),
            items: Vec::new(),
            cursor: None,
            state: PagerState::Idle,
            epoch: 0,
            requests,
        }
    }

    /// Feed the scroll-proximity signal.  Returns whether a page request was
    /// issued.
    ///
    /// Requests go out only from `Idle`, so at most one page fetch is ever
    /// outstanding.
    pub fn on_scroll(&mut self, near_end: bool) -> bool {
        if !near_end || self.state != PagerState::Idle {
            return false;
        }

        let request = PageRequest {
            epoch: self.epoch,
            selector: self.selector.clone(),
            cursor: self.cursor.clone(),
        };

        if self.requests.send(request).is_err() {
            warn!("page worker is gone; cannot load more items");
            return false;
        }

        debug!(selector = %self.selector, cursor = ?self.cursor, "requested next page");
        self.state = PagerState::Fetching;
        true
    }

    /// Apply a page result from the worker.
    pub fn on_page(&mut self, msg: PageMsg) -> PageOutcome {
        if msg.epoch != self.epoch {
            debug!(stale = msg.epoch, current = self.epoch, "dropping page for previous feed");
            return PageOutcome::Stale;
        }

        match msg.result {
            Ok(page) => {
                let count = page.items.len();
                self.items.extend(page.items);

                self.state = if page.next.is_some() {
                    PagerState::Idle
                } else {
                    info!(selector = %self.selector, total = self.items.len(), "feed exhausted");
                    PagerState::Exhausted
                };
                self.cursor = page.next;

                PageOutcome::Appended(count)
            }
            Err(e) => {
                self.state = PagerState::Idle;
                PageOutcome::Failed(e)
            }
        }
    }

    /// Switch to another feed, discarding everything loaded so far.
    ///
    /// A fetch still in flight for the old feed is not cancelled; its result
    /// arrives with the old epoch and is ignored.
    pub fn select_feed(&mut self, selector: impl Into<String>) {
        self.selector = selector.into();
        self.items.clear();
        self.cursor = None;
        self.state = PagerState::Idle;
        self.epoch += 1;
        info!(selector = %self.selector, epoch = self.epoch, "switched feed");
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    #[cfg(test)]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Whether the viewport has reached the trailing `threshold` rows.
///
/// `offset` is the index of the first visible item and `viewport` the
/// number of items that fit on screen.  An empty list is always near its
/// end, which is what starts the first load.
pub fn near_end(offset: usize, viewport: usize, total: usize, threshold: usize) -> bool {
    offset
        .saturating_add(viewport)
        .saturating_add(threshold)
        >= total
}
