use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ratatui::widgets::ListState;
use tracing::{info, warn};

use crate::feed::FeedItem;
use crate::pager::{near_end, PageMsg, PageOutcome, Pager, PagerState};
use crate::thumbnail::{Thumbnail, Thumbnails};

/// Shared "something visible changed" flag.
///
/// Thumbnail callbacks set it; the main loop redraws when it is set.
#[derive(Debug, Clone, Default)]
pub struct Repaint(Arc<AtomicBool>);

impl Repaint {
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

pub struct App {
    /// Loaded items and paging state for the active feed.
    pub pager: Pager,
    pub thumbnails: Thumbnails,
    selectors: Vec<String>,
    selector_index: usize,
    prefetch_threshold: usize,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Number of items that fit in the list viewport, as of the last draw.
    pub viewport_items: usize,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status message.
    pub status: String,
    repaint: Repaint,
}

impl App {
    /// `selectors` must be non-empty; the pager is expected to start on the
    /// first one.
    pub fn new(pager: Pager, thumbnails: Thumbnails, selectors: Vec<String>, prefetch_threshold: usize) -> Self {
        let repaint = Repaint::default();
        repaint.request();
        Self {
            pager,
            thumbnails,
            selectors,
            selector_index: 0,
            prefetch_threshold,
            list_state: ListState::default(),
            viewport_items: 0,
            quit: false,
            status: "Starting…".into(),
            repaint,
        }
    }

    // -- feed growth ---------------------------------------------------------

    /// Apply a page result from the worker.
    pub fn apply_page(&mut self, msg: PageMsg) {
        match self.pager.on_page(msg) {
            PageOutcome::Appended(count) => {
                self.status = if self.pager.state() == PagerState::Exhausted {
                    format!("Loaded {count} items; end of {}", self.pager.selector())
                } else {
                    format!("Loaded {count} items")
                };
                if self.list_state.selected().is_none() && !self.pager.is_empty() {
                    self.list_state.select(Some(0));
                }
                self.repaint.request();
                // A short page may still leave the viewport near the end.  An
                // empty one waits for the next scroll instead of re-asking.
                if count > 0 {
                    self.check_scroll();
                }
            }
            PageOutcome::Failed(e) => {
                self.status = format!("Error: {e} (press r to retry)");
                self.repaint.request();
            }
            PageOutcome::Stale => {}
        }
    }

    /// Derive the scroll-proximity signal and hand it to the pager.
    pub fn check_scroll(&mut self) {
        let near = near_end(
            self.first_visible(),
            self.viewport_items,
            self.pager.len(),
            self.prefetch_threshold,
        );
        if self.pager.on_scroll(near) {
            self.status = format!("Loading {}…", self.pager.selector());
            self.repaint.request();
        }
    }

    /// Record how many items fit on screen.  A change (terminal resize)
    /// can bring the end of the list into view without any key press.
    pub fn set_viewport(&mut self, items: usize) {
        if items != self.viewport_items {
            self.viewport_items = items;
            self.check_scroll();
        }
    }

    /// Explicit user retry after a failed page load.
    pub fn retry(&mut self) {
        if self.pager.on_scroll(true) {
            self.status = format!("Loading {}…", self.pager.selector());
            self.repaint.request();
        }
    }

    /// Index of the first row on screen, accounting for a selection that
    /// moved below the viewport since the last draw.
    pub fn first_visible(&self) -> usize {
        let offset = self.list_state.offset();
        match self.list_state.selected() {
            Some(selected) if self.viewport_items > 0 => {
                offset.max((selected + 1).saturating_sub(self.viewport_items))
            }
            _ => offset,
        }
    }

    // -- feed selection ------------------------------------------------------

    pub fn selector(&self) -> &str {
        self.pager.selector()
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn selector_index(&self) -> usize {
        self.selector_index
    }

    pub fn next_feed(&mut self) {
        if self.selectors.is_empty() {
            return;
        }
        self.switch_feed((self.selector_index + 1) % self.selectors.len());
    }

    pub fn previous_feed(&mut self) {
        if self.selectors.is_empty() {
            return;
        }
        let len = self.selectors.len();
        self.switch_feed((self.selector_index + len - 1) % len);
    }

    fn switch_feed(&mut self, index: usize) {
        if index == self.selector_index {
            return;
        }
        self.selector_index = index;
        self.pager.select_feed(self.selectors[index].clone());
        self.list_state = ListState::default();
        self.repaint.request();
        self.check_scroll();
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        self.move_selection(|i, _| i + 1);
    }

    pub fn select_previous(&mut self) {
        self.move_selection(|i, _| i.saturating_sub(1));
    }

    pub fn page_down(&mut self) {
        self.move_selection(|i, page| i + page);
    }

    pub fn page_up(&mut self) {
        self.move_selection(|i, page| i.saturating_sub(page));
    }

    pub fn select_first(&mut self) {
        self.move_selection(|_, _| 0);
    }

    pub fn select_last(&mut self) {
        self.move_selection(|_, _| usize::MAX);
    }

    fn move_selection(&mut self, step: impl FnOnce(usize, usize) -> usize) {
        let len = self.pager.len();
        if len == 0 {
            return;
        }
        let page = self.viewport_items.max(1);
        let i = match self.list_state.selected() {
            Some(i) => step(i, page).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.repaint.request();
        self.check_scroll();
    }

    pub fn selected_item(&self) -> Option<&FeedItem> {
        self.list_state
            .selected()
            .and_then(|i| self.pager.items().get(i))
    }

    // -- external actions ----------------------------------------------------

    pub fn open_link(&mut self) {
        if let Some(item) = self.selected_item() {
            let (id, url) = (item.id.clone(), item.link.clone());
            self.open_in_browser(&id, url, "link");
        }
    }

    pub fn open_comments(&mut self) {
        if let Some(item) = self.selected_item() {
            let (id, url) = (item.id.clone(), item.comments_url.clone());
            self.open_in_browser(&id, url, "comments");
        }
    }

    fn open_in_browser(&mut self, id: &str, url: Option<String>, what: &str) {
        let Some(url) = url else {
            self.status = format!("No {what} for this post");
            self.repaint.request();
            return;
        };
        info!(%id, %url, "opening {what}");
        self.status = match open::that(&url) {
            Ok(()) => format!("Opened {url}"),
            Err(e) => {
                warn!(%url, error = %e, "could not launch browser");
                format!("Could not open {url}: {e}")
            }
        };
        self.repaint.request();
    }

    // -- thumbnails ----------------------------------------------------------

    /// Image to draw for `item`'s row.
    ///
    /// Settled rows are a plain cache lookup; only rows still unresolved go
    /// through [`Thumbnails::get_thumbnail`], whose callback asks for a
    /// redraw.
    pub fn thumbnail_for(&self, item: &FeedItem) -> Arc<Thumbnail> {
        let url = item.thumbnail_url.as_deref();
        if let Some(image) = self.thumbnails.peek(url) {
            return image;
        }
        let repaint = self.repaint.clone();
        self.thumbnails.get_thumbnail(url, move |_| repaint.request())
    }

    /// Run callbacks for thumbnails that finished since the last call.
    pub fn pump_thumbnails(&self) -> usize {
        self.thumbnails.dispatch_pending()
    }

    // -- redraw --------------------------------------------------------------

    pub fn request_repaint(&self) {
        self.repaint.request();
    }

    /// Whether a redraw is due; clears the flag.
    pub fn take_repaint(&self) -> bool {
        self.repaint.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::feed::{Cursor, FeedPage};
    use crate::pager::PageRequest;
    use crate::test_support::{make_item, png_bytes, FakeTransport};
    use crate::thumbnail::FetchCoordinator;
    use std::sync::mpsc::{channel, Receiver};
    use std::time::Duration;

    fn app_with(transport: FakeTransport) -> (App, Receiver<PageRequest>) {
        let (tx, rx) = channel();
        let pager = Pager::new("/r/aww", tx);
        let thumbnails = Thumbnails::new(
            FetchCoordinator::new(Arc::new(transport), 2),
            Arc::new(Thumbnail::placeholder()),
        );
        let selectors = vec!["/r/aww".to_string(), "/r/funny".to_string()];
        (App::new(pager, thumbnails, selectors, 2), rx)
    }

    fn app() -> (App, Receiver<PageRequest>) {
        app_with(FakeTransport::new())
    }

    fn page_msg(app: &App, ids: &[&str], next: Option<&str>) -> PageMsg {
        PageMsg {
            epoch: app.pager.epoch(),
            result: Ok(FeedPage {
                items: ids.iter().map(|id| make_item(id, id)).collect(),
                next: next.map(Cursor::new),
            }),
        }
    }

    fn ten() -> Vec<&'static str> {
        vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty_and_wants_a_draw() {
        let (app, _rx) = app();
        assert!(app.pager.is_empty());
        assert!(!app.quit);
        assert!(app.list_state.selected().is_none());
        assert!(app.take_repaint());
        assert!(!app.take_repaint());
    }

    // -- feed growth ---------------------------------------------------------

    #[test]
    fn empty_list_triggers_initial_load() {
        let (mut app, rx) = app();
        app.check_scroll();
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(app.pager.state(), PagerState::Fetching);
    }

    #[test]
    fn appended_page_selects_first_row() {
        let (mut app, _rx) = app();
        app.viewport_items = 4;
        app.check_scroll();

        let msg = page_msg(&app, &ten(), Some("c1"));
        app.apply_page(msg);

        assert_eq!(app.pager.len(), 10);
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.status, "Loaded 10 items");
    }

    #[test]
    fn scrolling_near_the_end_loads_the_next_page() {
        let (mut app, rx) = app();
        app.viewport_items = 4;
        app.check_scroll();
        let msg = page_msg(&app, &ten(), Some("c1"));
        app.apply_page(msg);
        assert_eq!(rx.try_iter().count(), 1, "first page only; viewport is not near the end");

        // Row 6 selected puts rows 3..=6 on screen: 3 + 4 + 2 < 10.
        for _ in 0..6 {
            app.select_next();
        }
        assert_eq!(rx.try_iter().count(), 0);

        app.select_next();
        let requests: Vec<PageRequest> = rx.try_iter().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].cursor, Some(Cursor::new("c1")));

        // More movement while the fetch is outstanding sends nothing.
        app.select_last();
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn empty_page_with_cursor_does_not_refetch_immediately() {
        let (mut app, rx) = app();
        app.check_scroll();
        assert_eq!(rx.try_iter().count(), 1);

        let msg = page_msg(&app, &[], Some("c1"));
        app.apply_page(msg);

        assert_eq!(app.pager.state(), PagerState::Idle);
        assert_eq!(rx.try_iter().count(), 0, "no request loop on empty pages");

        // The next scroll signal picks up from the returned cursor.
        app.check_scroll();
        let requests: Vec<PageRequest> = rx.try_iter().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].cursor, Some(Cursor::new("c1")));
    }

    #[test]
    fn growing_viewport_loads_more() {
        let (mut app, rx) = app();
        app.set_viewport(1);
        assert_eq!(rx.try_iter().count(), 1, "empty list loads on first layout");
        let msg = page_msg(&app, &["a", "b", "c", "d", "e", "f"], Some("c1"));
        app.apply_page(msg);
        assert_eq!(rx.try_iter().count(), 0, "0 + 1 + 2 < 6");

        app.set_viewport(1);
        assert_eq!(rx.try_iter().count(), 0, "unchanged size is a no-op");

        app.set_viewport(4);
        let requests: Vec<PageRequest> = rx.try_iter().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].cursor, Some(Cursor::new("c1")));
    }

    #[test]
    fn failed_page_sets_status_and_waits_for_retry() {
        let (mut app, rx) = app();
        app.check_scroll();
        app.apply_page(PageMsg {
            epoch: app.pager.epoch(),
            result: Err(TransportError::Status(503).into()),
        });

        assert!(app.status.starts_with("Error:"));
        assert_eq!(app.pager.state(), PagerState::Idle);
        assert_eq!(rx.try_iter().count(), 1);

        app.retry();
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn switching_feed_resets_and_reloads() {
        let (mut app, rx) = app();
        app.check_scroll();
        let msg = page_msg(&app, &["a", "b"], Some("c1"));
        app.apply_page(msg);
        rx.try_iter().count();

        app.next_feed();
        assert_eq!(app.selector(), "/r/funny");
        assert_eq!(app.selector_index(), 1);
        assert!(app.pager.is_empty());
        assert!(app.list_state.selected().is_none());

        let requests: Vec<PageRequest> = rx.try_iter().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].selector, "/r/funny");

        app.previous_feed();
        assert_eq!(app.selector(), "/r/aww");
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn navigation_on_empty_is_noop() {
        let (mut app, _rx) = app();
        app.select_next();
        app.select_previous();
        app.select_first();
        app.select_last();
        app.page_down();
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn selection_clamps_at_both_ends() {
        let (mut app, _rx) = app();
        app.viewport_items = 3;
        app.check_scroll();
        let msg = page_msg(&app, &["a", "b", "c"], None);
        app.apply_page(msg);

        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));

        app.page_down();
        assert_eq!(app.list_state.selected(), Some(2));

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));

        app.page_up();
        assert_eq!(app.list_state.selected(), Some(0));

        app.select_last();
        assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("c"));
    }

    #[test]
    fn first_visible_follows_selection_below_viewport() {
        let (mut app, _rx) = app();
        app.viewport_items = 4;
        app.list_state.select(Some(9));
        assert_eq!(app.first_visible(), 6);
    }

    #[test]
    fn opening_without_a_url_reports_it() {
        let (mut app, _rx) = app();
        app.check_scroll();
        let msg = page_msg(&app, &["a"], None);
        app.apply_page(msg);

        app.open_link();
        assert_eq!(app.status, "No link for this post");
        app.open_comments();
        assert_eq!(app.status, "No comments for this post");
    }

    // -- thumbnails ----------------------------------------------------------

    #[test]
    fn resolved_thumbnail_requests_repaint() {
        let transport = FakeTransport::new().with("https://t/a.png", Ok(png_bytes(3, 3, [7, 7, 7])));
        let (app, _rx) = app_with(transport);
        app.take_repaint();

        let mut item = make_item("a", "A");
        item.thumbnail_url = Some("https://t/a.png".into());

        let first = app.thumbnail_for(&item);
        assert!(Arc::ptr_eq(&first, app.thumbnails.placeholder()));
        assert!(!app.take_repaint());

        assert!(app.thumbnails.dispatch_next(Duration::from_secs(5)));
        assert!(app.take_repaint());
        assert_eq!(app.thumbnail_for(&item).pixel(0, 0), [7, 7, 7]);
        assert!(!app.take_repaint(), "settled rows do not ask for more redraws");
    }

    #[test]
    fn item_without_thumbnail_uses_placeholder() {
        let (app, _rx) = app();
        let shown = app.thumbnail_for(&make_item("a", "A"));
        assert!(Arc::ptr_eq(&shown, app.thumbnails.placeholder()));
        assert_eq!(app.pump_thumbnails(), 0);
    }
}
