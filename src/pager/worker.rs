//! Background page fetching.
//!
//! Runs on a dedicated thread that executes page requests one at a time and
//! sends results to the UI thread over an [`mpsc`] channel.  Every request
//! carries the pager's epoch so the UI can drop results that belong to a
//! feed it has already switched away from.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use crate::error::{panic_message, FeedError};
use crate::feed::{Cursor, FeedPage, FeedSource};

/// A page request issued by the [`Pager`](super::Pager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub epoch: u64,
    pub selector: String,
    pub cursor: Option<Cursor>,
}

/// Messages sent from the page worker to the UI thread.
#[derive(Debug)]
pub struct PageMsg {
    /// Epoch of the request that produced this result.
    pub epoch: u64,
    pub result: Result<FeedPage, FeedError>,
}

/// Spawn the page worker thread.
///
/// Returns the request sender to hand to the pager and a receiver that the
/// main loop should drain on every tick.  The thread exits when either end
/// is dropped.
pub fn spawn(source: Box<dyn FeedSource>) -> (mpsc::Sender<PageRequest>, mpsc::Receiver<PageMsg>) {
    let (request_tx, request_rx) = mpsc::channel::<PageRequest>();
    let (msg_tx, msg_rx) = mpsc::channel();

    thread::spawn(move || {
        while let Ok(request) = request_rx.recv() {
            debug!(
                source = source.name(),
                selector = %request.selector,
                cursor = ?request.cursor,
                epoch = request.epoch,
                "fetching page"
            );

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                source.fetch_page(&request.selector, request.cursor.as_ref())
            }))
            .unwrap_or_else(|payload| {
                Err(FeedError::Parse(format!(
                    "source panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });
            if let Err(e) = &result {
                warn!(source = source.name(), selector = %request.selector, error = %e, "page fetch failed");
            }

            // If the receiver is gone the main thread has exited.
            if msg_tx
                .send(PageMsg {
                    epoch: request.epoch,
                    result,
                })
                .is_err()
            {
                return;
            }
        }
    });

    (request_tx, msg_rx)
}
