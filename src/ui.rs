//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is four rows: feed tabs, the scrollable post list, a details
//!   panel for the selected post, and a one-line status bar.
//! * Each post occupies two terminal rows.  Its thumbnail is drawn as a
//!   small grid of `▀` half blocks (foreground = upper pixel, background =
//!   lower pixel).
//! * Thumbnails are requested only for rows around the viewport; rows far
//!   off screen keep the placeholder until they scroll into view.

use std::sync::Arc;

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs},
    Frame,
};

use crate::app::App;
use crate::feed::FeedItem;
use crate::pager::PagerState;
use crate::thumbnail::{Thumbnail, PREVIEW_HEIGHT, PREVIEW_WIDTH};

/// Terminal rows per post.
const ROWS_PER_ITEM: u16 = 2;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [tabs_area, main_area, detail_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(ROWS_PER_ITEM + 2),
        Constraint::Length(4),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_tabs(app, frame, tabs_area);
    draw_feed_list(app, frame, main_area);
    draw_details(app, frame, detail_area);
    draw_status_bar(app, frame, status_area);
}

/// Render the feed selector tabs.
fn draw_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let tabs = Tabs::new(app.selectors().iter().map(String::as_str))
        .select(app.selector_index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

/// Render the scrollable post list.
fn draw_feed_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let inner_height = area.height.saturating_sub(2);
    app.set_viewport(usize::from(inner_height / ROWS_PER_ITEM));

    // Rows that may be on screen this frame, plus a margin either side.
    let margin = app.viewport_items;
    let first = app.first_visible().saturating_sub(margin);
    let last = app.first_visible() + app.viewport_items + margin;

    let images: Vec<Arc<Thumbnail>> = app
        .pager
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if (first..last).contains(&i) {
                app.thumbnail_for(item)
            } else {
                Arc::clone(app.thumbnails.placeholder())
            }
        })
        .collect();

    let now = Utc::now();
    let list_items: Vec<ListItem> = app
        .pager
        .items()
        .iter()
        .zip(&images)
        .map(|(item, image)| ListItem::new(post_text(item, image, now)))
        .collect();

    let title = format!(" {} ", app.selector());
    let list = List::new(list_items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn post_text<'a>(item: &'a FeedItem, image: &Thumbnail, now: chrono::DateTime<Utc>) -> Text<'a> {
    let mut meta = Vec::new();
    if let Some(score) = item.score {
        meta.push(Span::styled(format!("▲{score} "), Style::default().fg(Color::Yellow)));
    }
    if let Some(comments) = item.num_comments {
        meta.push(Span::styled(format!("{comments} comments "), Style::default().fg(Color::Green)));
    }
    if !item.source_name.is_empty() {
        meta.push(Span::styled(format!("{} ", item.source_name), Style::default().fg(Color::Magenta)));
    }
    if let Some(author) = &item.author {
        meta.push(Span::styled(format!("u/{author} "), Style::default().fg(Color::Cyan)));
    }
    if let Some(age) = item.age(now) {
        meta.push(Span::styled(age, Style::default().fg(Color::DarkGray)));
    }

    let mut title_line = thumbnail_row(image, 0);
    title_line.push(Span::raw(" "));
    title_line.push(Span::styled(item.title.as_str(), Style::default().fg(Color::White)));

    let mut meta_line = thumbnail_row(image, 1);
    meta_line.push(Span::raw(" "));
    meta_line.extend(meta);

    Text::from(vec![Line::from(title_line), Line::from(meta_line)])
}

/// One terminal row of the preview: two pixel rows per character cell.
fn thumbnail_row(image: &Thumbnail, row: u32) -> Vec<Span<'static>> {
    let upper = row * 2;
    if upper >= PREVIEW_HEIGHT {
        return Vec::new();
    }
    (0..PREVIEW_WIDTH)
        .map(|x| {
            let [tr, tg, tb] = image.pixel(x, upper);
            let [br, bg, bb] = image.pixel(x, upper + 1);
            Span::styled(
                "▀",
                Style::default()
                    .fg(Color::Rgb(tr, tg, tb))
                    .bg(Color::Rgb(br, bg, bb)),
            )
        })
        .collect()
}

/// Render the selected post's title and its open actions.
fn draw_details(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::TOP);

    let Some(item) = app.selected_item() else {
        frame.render_widget(block, area);
        return;
    };

    let link = item.link.as_deref().unwrap_or("(no link)");
    let lines = vec![
        Line::from(Span::styled(
            item.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(link, Style::default().fg(Color::Blue))),
        Line::from(vec![
            Span::styled("[o]", Style::default().fg(Color::Yellow)),
            Span::raw(" Open Link   "),
            Span::styled("[c]", Style::default().fg(Color::Yellow)),
            Span::raw(" Open Comments"),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let (ready, failed, loading) = app.thumbnails.stats();
    let state = match app.pager.state() {
        PagerState::Idle => "",
        PagerState::Fetching => " (loading)",
        PagerState::Exhausted => " (end)",
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} items{state}", app.pager.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("thumbs {ready}✓ {failed}✗ {loading}…"),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  q: quit  ↑/↓: scroll  Tab: feed  o/c: open  r: retry"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
