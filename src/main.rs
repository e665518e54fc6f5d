//! livescroll-reddit: an endlessly scrolling subreddit feed for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────────┐ PageMsg  ┌──────────┐  draw()  ┌──────────┐
//! │ pager/worker  │ ───────► │  app.rs  │ ───────► │  ui.rs   │
//! │   (thread)    │ (channel)│ (state)  │          │ (render) │
//! └───────────────┘          └──────────┘          └──────────┘
//!        ▲ PageRequest         ▲      ▲
//!        └─────────────────────┘      │ handle_key_event()
//!                                ┌──────────┐
//! ┌───────────────┐ Delivery     │ input.rs │
//! │  thumbnail/   │ ──► dispatch_pending() on this thread
//! │ (worker pool) │
//! └───────────────┘
//! ```
//!
//! * **`feed/`**: the `FeedSource` trait with Reddit and RSS implementations.
//! * **`pager/`**: pagination state machine plus the page-fetch thread.
//! * **`thumbnail/`**: cache, deduplicating fetch coordinator, request API.
//! * **`transport`**: blocking HTTP behind a trait so tests can fake it.
//! * **`app`**: owns all application state (pager, selection, status).
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.
//! * **`main`**: wires everything together: parse args, set up the terminal,
//!   and run the event loop.

mod app;
mod config;
mod error;
mod feed;
mod input;
mod pager;
mod thumbnail;
mod transport;
mod ui;

#[cfg(test)]
mod test_support;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info, warn};

use app::App;
use config::Config;
use feed::{FeedSource, RedditSource, RssSource};
use pager::Pager;
use thumbnail::{FetchCoordinator, Thumbnail, Thumbnails};
use transport::{HttpTransport, Transport};

/// Scroll a subreddit in the terminal with inline thumbnails.
#[derive(Parser, Debug)]
#[command(name = "livescroll-reddit", version, about)]
struct Cli {
    /// Path to the config file (defaults to the user config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Write logs here instead of the user cache directory.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Subreddit to show, e.g. `aww` or `/r/aww`.  Repeat to add tabs.
    #[arg(short = 's', long = "subreddit", conflicts_with = "rss")]
    subreddits: Vec<String>,

    /// Read RSS feed URLs instead of Reddit.  Repeat to add tabs.
    #[arg(long = "rss")]
    rss: Vec<String>,
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
///
/// Worker threads catch their own panics and keep running, so a panic off
/// the UI thread is only logged; printing it would scribble over the screen.
fn install_panic_hook() {
    let ui_thread = std::thread::current().id();
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if std::thread::current().id() != ui_thread {
            error!("worker thread {info}");
            return;
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("livescroll-reddit").join("livescroll.log"))
}

/// Log to a file; the terminal belongs to the UI.  If the file cannot be
/// opened the app runs without logging.
fn init_logging(path: Option<&Path>) {
    let Some(path) = path else { return };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = File::options().create(true).append(true).open(path) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

/// The configured placeholder image, or the built-in tile.
fn load_placeholder(path: Option<&Path>) -> Thumbnail {
    let Some(path) = path else {
        return Thumbnail::placeholder();
    };
    let decoded = fs::read(path)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| Thumbnail::decode(&bytes).map_err(anyhow::Error::from));
    match decoded {
        Ok(image) => image,
        Err(e) => {
            warn!("placeholder {}: {e:#}; using built-in tile", path.display());
            Thumbnail::placeholder()
        }
    }
}

/// Apply command-line overrides and pick the feed source.
fn build_source(
    cli: &Cli,
    config: &mut Config,
    transport: Arc<dyn Transport>,
) -> Box<dyn FeedSource> {
    if !cli.rss.is_empty() {
        config.feed.selectors = cli.rss.clone();
        return Box::new(RssSource::new(transport));
    }
    if !cli.subreddits.is_empty() {
        config.feed.selectors = cli.subreddits.clone();
    }
    Box::new(RedditSource::new(
        transport,
        config.feed.base_url.clone(),
        config.feed.page_size,
    ))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli.log_file.clone().or_else(default_log_path);
    init_logging(log_path.as_deref());

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    info!("Loading configuration from {}", config_path.display());
    let mut config = Config::load(&config_path)?;

    // -- wire up the core ----------------------------------------------------
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(config.timeout(), &config.network.user_agent)?);
    let source = build_source(&cli, &mut config, Arc::clone(&transport));
    info!(source = source.name(), feeds = ?config.feed.selectors, "starting");

    let placeholder = Arc::new(load_placeholder(config.thumbnails.placeholder.as_deref()));
    let thumbnails = Thumbnails::new(
        FetchCoordinator::new(transport, config.network.thumbnail_workers),
        placeholder,
    );

    let (page_tx, page_rx) = pager::worker::spawn(source);
    let selectors = config.feed.selectors.clone();
    let pager = Pager::new(selectors[0].clone(), page_tx);
    let mut app = App::new(pager, thumbnails, selectors, config.feed.prefetch_threshold);
    app.check_scroll();

    // -- terminal setup (Drop restores on exit or panic) ---------------------
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;

    // -- main event loop -----------------------------------------------------
    // Each iteration:
    //   1. Apply finished pages.
    //   2. Run thumbnail callbacks on this thread.
    //   3. Redraw if anything visible changed.
    //   4. Poll for keyboard input (up to tick_rate).
    let tick_rate = Duration::from_millis(50);

    loop {
        while let Ok(msg) = page_rx.try_recv() {
            app.apply_page(msg);
        }

        app.pump_thumbnails();

        if app.take_repaint() {
            guard.terminal.draw(|f| ui::draw(&mut app, f))?;
        }

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => {
                    input::handle_key_event(&mut app, key);
                    app.request_repaint();
                }
                Event::Resize(..) => app.request_repaint(),
                _ => {}
            }
        }

        if app.quit {
            break;
        }
    }

    info!("exiting");
    Ok(())
}
