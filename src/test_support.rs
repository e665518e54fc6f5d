//! Shared fakes for unit tests.

use std::collections::HashMap;
use std::io::Cursor as IoCursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::{FeedError, TransportError};
use crate::feed::{Cursor, FeedItem, FeedPage, FeedSource};
use crate::transport::Transport;

/// Shorthand constructor for tests.
pub fn make_item(id: &str, title: &str) -> FeedItem {
    FeedItem {
        id: id.to_string(),
        title: title.to_string(),
        thumbnail_url: None,
        link: None,
        comments_url: None,
        author: None,
        score: None,
        num_comments: None,
        created: None,
        source_name: "test".to_string(),
    }
}

/// Encode a solid-colour PNG.
pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut out = IoCursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// In-memory [`Transport`] with canned responses and an optional gate that
/// holds every fetch until [`open`](FakeTransport::open) is called.
pub struct FakeTransport {
    responses: HashMap<String, Result<Vec<u8>, TransportError>>,
    calls: AtomicUsize,
    gate: Mutex<bool>,
    opened: Condvar,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: AtomicUsize::new(0),
            gate: Mutex::new(true),
            opened: Condvar::new(),
        }
    }

    /// Fetches block until `open()`.
    pub fn gated() -> Self {
        let transport = Self::new();
        *transport.gate.lock().unwrap() = false;
        transport
    }

    pub fn with(mut self, url: &str, response: Result<Vec<u8>, TransportError>) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn open(&self) {
        *self.gate.lock().unwrap() = true;
        self.opened.notify_all();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut open = self.gate.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        drop(open);

        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(TransportError::Status(404)))
    }
}

/// In-memory [`FeedSource`] keyed by `(selector, cursor)`.
pub struct FakeSource {
    pages: HashMap<(String, Option<String>), Result<FeedPage, FeedError>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self { pages: HashMap::new() }
    }

    pub fn with(mut self, selector: &str, cursor: Option<&str>, page: Result<FeedPage, FeedError>) -> Self {
        self.pages
            .insert((selector.to_string(), cursor.map(String::from)), page);
        self
    }
}

impl FeedSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    fn fetch_page(&self, selector: &str, cursor: Option<&Cursor>) -> Result<FeedPage, FeedError> {
        let key = (selector.to_string(), cursor.map(|c| c.as_str().to_string()));
        self.pages
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(FeedError::Parse(format!("no page for {key:?}"))))
    }
}
