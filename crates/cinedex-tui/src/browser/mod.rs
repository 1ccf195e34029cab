//! Movie browser TUI main loop.

/// Browser state types.
pub mod state;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cinedex_api::tmdb::{TmdbApi, movie_page_url};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

use self::state::{BrowserState, InputMode, KeyAction};
use crate::dispatch::{Dispatcher, FetchOutcome};
use crate::filter::parse_year;
use crate::orchestrator::DEFAULT_DEBOUNCE;

/// Upper bound on how long the loop waits for a key press.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Browser settings.
#[derive(Debug, Clone)]
pub struct BrowseOptions {
    /// Quiet period before a search-text edit triggers a fetch.
    pub debounce: Duration,
}

impl Default for BrowseOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Runs the movie browser TUI.
///
/// Blocks the calling thread; fetches run on `handle`. Call it from
/// `spawn_blocking` or a thread outside the runtime.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
pub fn run_browser<C>(client: Arc<C>, handle: Handle, options: &BrowseOptions) -> Result<()>
where
    C: TmdbApi + Send + Sync + 'static,
{
    let (dispatcher, mut rx) = Dispatcher::new(client, handle);
    let mut state = BrowserState::new(options.debounce);

    for command in state.orchestrator.mount() {
        dispatcher.dispatch(command);
    }

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut state, &dispatcher, &mut rx);

    state.orchestrator.unmount();

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop.
fn run_event_loop<C>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut BrowserState,
    dispatcher: &Dispatcher<C>,
    rx: &mut UnboundedReceiver<FetchOutcome>,
) -> Result<()>
where
    C: TmdbApi + Send + Sync + 'static,
{
    loop {
        while let Ok(outcome) = rx.try_recv() {
            state.apply(outcome);
            if let Some(request) = state.orchestrator.take_follow_up() {
                dispatcher.fetch(request);
            }
        }
        if let Some(request) = state.orchestrator.poll_debounce(Instant::now()) {
            dispatcher.fetch(request);
        }

        terminal
            .draw(|frame| ui::draw(frame, state))
            .context("failed to draw TUI")?;

        let timeout = state
            .orchestrator
            .debounce_remaining(Instant::now())
            .map_or(POLL_INTERVAL, |remaining| remaining.min(POLL_INTERVAL));

        if event::poll(timeout).context("failed to poll events")?
            && let Event::Key(key) = event::read().context("failed to read event")?
            && key.kind == KeyEventKind::Press
        {
            let action = match state.input_mode {
                InputMode::Normal => handle_normal_input(state, key.code, key.modifiers),
                InputMode::Search => {
                    handle_search_input(state, key.code, key.modifiers, Instant::now())
                }
                InputMode::Year => handle_year_input(state, key.code, key.modifiers),
            };
            match action {
                KeyAction::None => {}
                KeyAction::Fetch(request) => dispatcher.fetch(request),
                KeyAction::Open(url) => open_url(&url),
                KeyAction::Quit => return Ok(()),
            }
        }
    }
}

/// Returns `true` for Ctrl-C.
fn is_interrupt(key: KeyCode, modifiers: KeyModifiers) -> bool {
    key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL)
}

/// Handles key input in normal mode.
fn handle_normal_input(
    state: &mut BrowserState,
    key: KeyCode,
    modifiers: KeyModifiers,
) -> KeyAction {
    if is_interrupt(key, modifiers) {
        return KeyAction::Quit;
    }
    match key {
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => {
            state.move_up();
            KeyAction::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.move_down();
            KeyAction::None
        }
        KeyCode::Right | KeyCode::Char('n') => state.orchestrator.next_page().into(),
        KeyCode::Left | KeyCode::Char('p') => state.orchestrator.prev_page().into(),
        KeyCode::Char(']') => state.orchestrator.raise_min_rating().into(),
        KeyCode::Char('[') => state.orchestrator.lower_min_rating().into(),
        KeyCode::Char('g') => state.orchestrator.cycle_genre(true).into(),
        KeyCode::Char('G') => state.orchestrator.cycle_genre(false).into(),
        KeyCode::Char('s') => KeyAction::Fetch(state.orchestrator.cycle_sort()),
        KeyCode::Char('x') => KeyAction::Fetch(state.orchestrator.reset_filters()),
        KeyCode::Char('/') => {
            state.input_mode = InputMode::Search;
            KeyAction::None
        }
        KeyCode::Char('y') => {
            state.begin_year_input();
            KeyAction::None
        }
        KeyCode::Char('o') => state
            .selected_movie()
            .map_or(KeyAction::None, |movie| {
                KeyAction::Open(movie_page_url(movie.id))
            }),
        _ => KeyAction::None,
    }
}

/// Handles key input in search mode. Edits are debounced; Enter is not.
fn handle_search_input(
    state: &mut BrowserState,
    key: KeyCode,
    modifiers: KeyModifiers,
    now: Instant,
) -> KeyAction {
    if is_interrupt(key, modifiers) {
        return KeyAction::Quit;
    }
    match key {
        KeyCode::Esc => {
            state.input_mode = InputMode::Normal;
            KeyAction::None
        }
        KeyCode::Enter => {
            state.input_mode = InputMode::Normal;
            KeyAction::Fetch(state.orchestrator.submit_search())
        }
        KeyCode::Backspace => {
            state.orchestrator.pop_search_char(now);
            KeyAction::None
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            state.orchestrator.set_search_text(String::new(), now);
            KeyAction::None
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            state.orchestrator.push_search_char(c, now);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

/// Handles key input in year mode.
fn handle_year_input(state: &mut BrowserState, key: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    if is_interrupt(key, modifiers) {
        return KeyAction::Quit;
    }
    match key {
        KeyCode::Esc => {
            state.year_input.clear();
            state.input_mode = InputMode::Normal;
            KeyAction::None
        }
        KeyCode::Enter => {
            state.input_mode = InputMode::Normal;
            let input = std::mem::take(&mut state.year_input);
            match parse_year(&input) {
                Some(year) => KeyAction::Fetch(state.orchestrator.set_year(year)),
                None => {
                    tracing::debug!(input, "Ignoring invalid year input");
                    KeyAction::None
                }
            }
        }
        KeyCode::Backspace => {
            state.year_input.pop();
            KeyAction::None
        }
        KeyCode::Char(c) if c.is_ascii_digit() && state.year_input.len() < 4 => {
            state.year_input.push(c);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

/// Opens a URL in the system browser.
fn open_url(url: &str) {
    if let Err(e) = open::that(url) {
        tracing::warn!(url, error = %e, "Failed to open browser");
    }
}
