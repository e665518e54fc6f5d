//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Adding a new keybinding is
//! a single match arm in [`handle_key_event`].
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_key_event`] that calls it.
//! 3. Update the help text in `ui::draw_status_bar`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::PageDown | KeyCode::Char(' ') => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_feed(),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.previous_feed(),
        KeyCode::Enter | KeyCode::Char('o') => app.open_link(),
        KeyCode::Char('c') => app.open_comments(),
        KeyCode::Char('r') => app.retry(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::Pager;
    use crate::test_support::FakeTransport;
    use crate::thumbnail::{FetchCoordinator, Thumbnail, Thumbnails};
    use crossterm::event::{KeyEventState, KeyModifiers};
    use std::sync::mpsc::{channel, Receiver};
    use std::sync::Arc;

    fn app() -> (App, Receiver<crate::pager::PageRequest>) {
        let (tx, rx) = channel();
        let thumbnails = Thumbnails::new(
            FetchCoordinator::new(Arc::new(FakeTransport::new()), 1),
            Arc::new(Thumbnail::placeholder()),
        );
        let app = App::new(
            Pager::new("/r/aww", tx),
            thumbnails,
            vec!["/r/aww".into(), "/r/funny".into()],
            5,
        );
        (app, rx)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_and_esc_quit() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let (mut app, _rx) = app();
            handle_key_event(&mut app, press(code));
            assert!(app.quit);
        }
    }

    #[test]
    fn release_events_are_ignored() {
        let (mut app, _rx) = app();
        let mut key = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        handle_key_event(&mut app, key);
        assert!(!app.quit);

        key.kind = KeyEventKind::Repeat;
        handle_key_event(&mut app, key);
        assert!(!app.quit);
    }

    #[test]
    fn tab_switches_feed() {
        let (mut app, _rx) = app();
        handle_key_event(&mut app, press(KeyCode::Tab));
        assert_eq!(app.selector(), "/r/funny");
        handle_key_event(&mut app, press(KeyCode::BackTab));
        assert_eq!(app.selector(), "/r/aww");
    }

    #[test]
    fn r_retries_a_page_load() {
        let (mut app, rx) = app();
        handle_key_event(&mut app, press(KeyCode::Char('r')));
        assert_eq!(rx.try_iter().count(), 1);
    }
}
