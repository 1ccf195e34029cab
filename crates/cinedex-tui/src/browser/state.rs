//! Browser TUI state management.

use std::time::Duration;

use cinedex_api::tmdb::Movie;
use ratatui::widgets::TableState;

use crate::dispatch::FetchOutcome;
use crate::orchestrator::{FetchRequest, QueryOrchestrator};

/// Input mode for the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode.
    Normal,
    /// Search text input mode.
    Search,
    /// Release year input mode.
    Year,
}

/// What the event loop must do after a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    /// Nothing.
    None,
    /// Dispatch a movie fetch.
    Fetch(FetchRequest),
    /// Open a URL in the system browser.
    Open(String),
    /// Leave the browser.
    Quit,
}

impl From<Option<FetchRequest>> for KeyAction {
    fn from(request: Option<FetchRequest>) -> Self {
        request.map_or(Self::None, Self::Fetch)
    }
}

/// State for the browser TUI.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct BrowserState {
    /// Query state machine.
    pub orchestrator: QueryOrchestrator,
    /// Current input mode.
    pub input_mode: InputMode,
    /// Year input buffer.
    pub year_input: String,
    /// Table state for the movie list (handles selection and scroll).
    pub table_state: TableState,
}

impl BrowserState {
    /// Creates an idle browser state.
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            orchestrator: QueryOrchestrator::new(debounce),
            input_mode: InputMode::Normal,
            year_input: String::new(),
            table_state: TableState::default(),
        }
    }

    /// Returns the cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    /// Returns the movie under the cursor (if any).
    #[must_use]
    pub fn selected_movie(&self) -> Option<&Movie> {
        self.orchestrator.movies().get(self.cursor())
    }

    /// Moves cursor up.
    pub fn move_up(&mut self) {
        let current = self.cursor();
        if current > 0 {
            self.table_state.select(Some(current.saturating_sub(1)));
        }
    }

    /// Moves cursor down.
    pub fn move_down(&mut self) {
        let next = self.cursor().saturating_add(1);
        if next < self.orchestrator.movies().len() {
            self.table_state.select(Some(next));
        }
    }

    /// Applies a finished fetch. Returns `true` when the view changed.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::Movies { seq, result } => {
                let applied = self.orchestrator.complete(seq, result);
                if applied {
                    self.select_first_movie();
                }
                applied
            }
            FetchOutcome::Genres(result) => {
                self.orchestrator.set_genres(result);
                true
            }
        }
    }

    /// Comma-separated genre names of a movie, skipping unknown IDs.
    #[must_use]
    pub fn genre_labels(&self, movie: &Movie) -> String {
        movie
            .genre_ids
            .iter()
            .filter_map(|&id| self.orchestrator.genre_name(id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Enters year input, seeding the buffer with the active year.
    pub fn begin_year_input(&mut self) {
        self.year_input = self
            .orchestrator
            .filters()
            .year
            .map(|y| y.to_string())
            .unwrap_or_default();
        self.input_mode = InputMode::Year;
    }

    /// Selects the first movie, or nothing when the list is empty.
    fn select_first_movie(&mut self) {
        let selection = (!self.orchestrator.movies().is_empty()).then_some(0);
        self.table_state.select(selection);
    }
}
