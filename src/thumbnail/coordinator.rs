//! Deduplicating fetch engine for thumbnails.
//!
//! Admission and resolution both happen under one lock around the cache and
//! the in-flight table, so at most one transport fetch per URL is ever
//! outstanding.  Workers never call back into the UI: they post a
//! [`Delivery`] onto the resolution queue, and the UI thread runs the waiters
//! when it calls [`FetchCoordinator::dispatch_pending`].

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
#[cfg(test)]
use std::time::Duration;

use tracing::{debug, warn};

use super::{Thumbnail, ThumbnailCache, ThumbnailKey, ThumbnailResult};
use crate::error::panic_message;
use crate::transport::Transport;

/// Callback registered by a requester; invoked exactly once.
pub type Waiter = Box<dyn FnOnce(ThumbnailResult) + Send>;

/// A resolved fetch on its way back to the UI thread.
struct Delivery {
    key: ThumbnailKey,
    result: ThumbnailResult,
    waiters: Vec<Waiter>,
}

#[derive(Default)]
struct State {
    cache: ThumbnailCache,
    /// Keys with an outstanding fetch, and who is waiting on each (FIFO).
    in_flight: HashMap<ThumbnailKey, Vec<Waiter>>,
}

pub struct FetchCoordinator {
    state: Arc<Mutex<State>>,
    request_tx: Sender<ThumbnailKey>,
    delivery_tx: Sender<Delivery>,
    delivery_rx: Receiver<Delivery>,
}

impl FetchCoordinator {
    /// Start `workers` fetch threads pulling from a shared request queue.
    ///
    /// Workers exit once the coordinator is dropped and the request channel
    /// closes.
    pub fn new(transport: Arc<dyn Transport>, workers: usize) -> Self {
        let state = Arc::new(Mutex::new(State::default()));
        let (request_tx, request_rx) = channel::<ThumbnailKey>();
        let (delivery_tx, delivery_rx) = channel::<Delivery>();

        spawn_workers(workers, request_rx, &state, &transport, &delivery_tx);

        Self {
            state,
            request_tx,
            delivery_tx,
            delivery_rx,
        }
    }

    /// Ask for `key`, calling `callback` once its outcome is known.
    ///
    /// A cached outcome invokes `callback` before this returns.  Otherwise
    /// the callback waits for [`dispatch_pending`](Self::dispatch_pending)
    /// to deliver the resolution.
    pub fn request(&self, key: ThumbnailKey, callback: impl FnOnce(ThumbnailResult) + Send + 'static) {
        let mut state = lock(&self.state);

        let cached = state.cache.lookup(&key);
        if cached.is_terminal() {
            drop(state);
            callback(cached);
            return;
        }

        if let Some(waiters) = state.in_flight.get_mut(&key) {
            waiters.push(Box::new(callback));
            return;
        }

        state.in_flight.insert(key.clone(), vec![Box::new(callback)]);
        drop(state);

        debug!(%key, "fetching thumbnail");
        if self.request_tx.send(key.clone()).is_err() {
            warn!(%key, "thumbnail workers are gone; resolving as failed");
            resolve(&self.state, &self.delivery_tx, key, ThumbnailResult::Failed);
        }
    }

    pub fn lookup(&self, key: &ThumbnailKey) -> ThumbnailResult {
        lock(&self.state).cache.lookup(key)
    }

    /// `(ready, failed, in_flight)` counts.
    pub fn stats(&self) -> (usize, usize, usize) {
        let state = lock(&self.state);
        let (ready, failed) = state.cache.counts();
        (ready, failed, state.in_flight.len())
    }

    /// Run the waiters of every delivery that has arrived, without blocking.
    ///
    /// Must be called from the thread that owns the UI.  Returns the number
    /// of keys resolved.
    pub fn dispatch_pending(&self) -> usize {
        let mut resolved = 0;
        while let Ok(delivery) = self.delivery_rx.try_recv() {
            deliver(delivery);
            resolved += 1;
        }
        resolved
    }

    /// Block up to `timeout` for a single delivery and run its waiters.
    #[cfg(test)]
    pub fn dispatch_next(&self, timeout: Duration) -> bool {
        match self.delivery_rx.recv_timeout(timeout) {
            Ok(delivery) => {
                deliver(delivery);
                true
            }
            Err(_) => false,
        }
    }
}

fn spawn_workers(
    count: usize,
    request_rx: Receiver<ThumbnailKey>,
    state: &Arc<Mutex<State>>,
    transport: &Arc<dyn Transport>,
    delivery_tx: &Sender<Delivery>,
) {
    let request_rx = Arc::new(Mutex::new(request_rx));

    for _ in 0..count {
        let rx = Arc::clone(&request_rx);
        let state = Arc::clone(state);
        let transport = Arc::clone(transport);
        let tx = delivery_tx.clone();

        thread::spawn(move || loop {
            let key = {
                let rx = rx.lock().unwrap_or_else(PoisonError::into_inner);
                match rx.recv() {
                    Ok(key) => key,
                    Err(_) => return, // coordinator dropped
                }
            };
            // A panicking decoder or transport must still resolve the key.
            let result = panic::catch_unwind(AssertUnwindSafe(|| fetch(transport.as_ref(), &key)))
                .unwrap_or_else(|payload| {
                    warn!(%key, panic = %panic_message(payload.as_ref()), "thumbnail fetch panicked");
                    ThumbnailResult::Failed
                });
            resolve(&state, &tx, key, result);
        });
    }
}

/// Transport plus decode; every failure collapses to `Failed`.
fn fetch(transport: &dyn Transport, key: &ThumbnailKey) -> ThumbnailResult {
    let bytes = match transport.fetch_bytes(key.as_str()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(%key, error = %e, "thumbnail fetch failed");
            return ThumbnailResult::Failed;
        }
    };

    match Thumbnail::decode(&bytes) {
        Ok(image) => {
            let (width, height) = image.dimensions();
            debug!(%key, width, height, "thumbnail decoded");
            ThumbnailResult::Ready(Arc::new(image))
        }
        Err(e) => {
            debug!(%key, error = %e, "thumbnail decode failed");
            ThumbnailResult::Failed
        }
    }
}

/// Store the outcome, retire the in-flight entry and queue its waiters.
fn resolve(state: &Mutex<State>, tx: &Sender<Delivery>, key: ThumbnailKey, result: ThumbnailResult) {
    let waiters = {
        let mut state = lock(state);
        state.cache.store(key.clone(), result.clone());
        state.in_flight.remove(&key).unwrap_or_default()
    };

    // The receiver only disappears with the coordinator itself.
    let _ = tx.send(Delivery { key, result, waiters });
}

fn deliver(delivery: Delivery) {
    let Delivery { key, result, waiters } = delivery;
    debug!(%key, waiters = waiters.len(), "delivering thumbnail");
    for waiter in waiters {
        waiter(result.clone());
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
