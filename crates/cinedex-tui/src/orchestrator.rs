//! Query orchestrator.
//!
//! Owns the search text, pagination and the last result set, decides between
//! search and discover mode on every change, and emits [`FetchRequest`]s for
//! the dispatcher to execute. Completions come back through
//! [`QueryOrchestrator::complete`]; only the most recently issued request may
//! update the view.

use std::time::{Duration, Instant};

use cinedex_api::tmdb::{
    DiscoverMovieParams, Genre, Movie, MoviePage, SearchMovieParams, SortKey, TmdbError,
};

use crate::debounce::Debouncer;
use crate::filter::{FilterController, FilterState, PageReset};

/// Default quiet period before a search-text edit triggers a fetch.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Message shown when a search or discover fetch fails.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load movies";

/// Message shown when the landing popular fetch fails.
pub const POPULAR_ERROR_MESSAGE: &str = "Failed to fetch popular movies";

/// Which endpoint a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Landing view (`movie/popular`).
    Popular,
    /// Free-text title search.
    Search,
    /// Filter-driven browsing.
    Discover,
}

impl Mode {
    /// Returns a short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Popular => "Popular",
            Self::Search => "Search",
            Self::Discover => "Discover",
        }
    }
}

/// A movie list query.
#[derive(Debug, Clone, PartialEq)]
pub enum MovieQuery {
    /// Popular movies (no filters).
    Popular {
        /// Result page.
        page: u32,
    },
    /// Title search.
    Search(SearchMovieParams),
    /// Filtered discover.
    Discover(DiscoverMovieParams),
}

impl MovieQuery {
    /// Returns the mode of this query.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Popular { .. } => Mode::Popular,
            Self::Search(_) => Mode::Search,
            Self::Discover(_) => Mode::Discover,
        }
    }

    /// Returns the requested page.
    #[must_use]
    pub const fn page(&self) -> u32 {
        match self {
            Self::Popular { page } => *page,
            Self::Search(params) => params.page,
            Self::Discover(params) => params.page,
        }
    }
}

/// A movie fetch tagged with its sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// What to fetch.
    pub query: MovieQuery,
}

/// Work the dispatcher must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Load the genre list (once per session).
    FetchGenres,
    /// Load a movie list.
    FetchMovies(FetchRequest),
}

impl From<FetchRequest> for Command {
    fn from(request: FetchRequest) -> Self {
        Self::FetchMovies(request)
    }
}

/// Outcome of a movie fetch, normalized across endpoints.
pub type MovieResult = Result<MoviePage, TmdbError>;

/// Fetch cycle status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing requested yet.
    Idle,
    /// The latest request is in flight.
    Loading,
    /// The latest request succeeded.
    Ready,
    /// The latest request failed.
    Error(String),
}

/// Search/discover query state machine.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct QueryOrchestrator {
    /// Raw search text as typed.
    search_text: String,
    /// Current page (1-based).
    page: u32,
    /// Total pages reported by the last successful fetch.
    total_pages: u32,
    /// Discover filters.
    filters: FilterController,
    /// Search-text debounce timer.
    debouncer: Debouncer,
    /// Movies of the last successful fetch.
    movies: Vec<Movie>,
    /// Session genre list.
    genres: Vec<Genre>,
    /// Fetch cycle status.
    status: FetchStatus,
    /// Mode of the latest issued request.
    mode: Mode,
    /// Sequence number of the latest issued request.
    latest_seq: u64,
    /// Whether the latest issued request is still pending.
    in_flight: bool,
    /// Whether the session is active.
    mounted: bool,
    /// Fetch issued by a completion, waiting to be dispatched.
    follow_up: Option<FetchRequest>,
}

impl QueryOrchestrator {
    /// Creates an idle orchestrator with the given debounce delay.
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            search_text: String::new(),
            page: 1,
            total_pages: 1,
            filters: FilterController::new(),
            debouncer: Debouncer::new(debounce),
            movies: Vec::new(),
            genres: Vec::new(),
            status: FetchStatus::Idle,
            mode: Mode::Popular,
            latest_seq: 0,
            in_flight: false,
            mounted: false,
            follow_up: None,
        }
    }

    // --- Accessors ---

    /// Raw search text.
    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Current page.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Total pages of the current result set.
    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Current filters.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        self.filters.state()
    }

    /// Movies of the current result set.
    #[must_use]
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Genres loaded for this session.
    #[must_use]
    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    /// Fetch cycle status.
    #[must_use]
    pub const fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// Mode of the latest issued request.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Mode the next fetch will use, from the current search text.
    #[must_use]
    pub fn active_mode(&self) -> Mode {
        if self.search_text.trim().is_empty() {
            Mode::Discover
        } else {
            Mode::Search
        }
    }

    /// Returns `true` while the latest request is pending.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Returns `true` when "previous page" is allowed.
    #[must_use]
    pub const fn can_prev(&self) -> bool {
        self.page > 1 && !self.in_flight
    }

    /// Returns `true` when "next page" is allowed.
    #[must_use]
    pub const fn can_next(&self) -> bool {
        self.page < self.total_pages && !self.in_flight
    }

    /// Returns `true` while a debounced search is waiting to fire.
    #[must_use]
    pub const fn is_debounce_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Time left before the pending debounce fires.
    #[must_use]
    pub fn debounce_remaining(&self, now: Instant) -> Option<Duration> {
        self.debouncer.remaining(now)
    }

    /// Looks up a genre name in the session genre list.
    #[must_use]
    pub fn genre_name(&self, id: u32) -> Option<&str> {
        self.genres
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }

    // --- Lifecycle ---

    /// Starts the session: loads genres and the popular landing list.
    ///
    /// The landing fetch ignores filters and search text.
    pub fn mount(&mut self) -> Vec<Command> {
        self.mounted = true;
        self.page = 1;
        let request = self.issue(MovieQuery::Popular { page: 1 });
        vec![Command::FetchGenres, Command::FetchMovies(request)]
    }

    /// Ends the session: cancels the debounce and ignores in-flight results.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.in_flight = false;
        self.follow_up = None;
        if self.debouncer.cancel() {
            tracing::debug!("Cancelled pending search debounce on unmount");
        }
    }

    // --- Search text ---

    /// Replaces the search text and restarts the debounce timer.
    ///
    /// Setting the text it already holds is a no-op.
    pub fn set_search_text(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        if text == self.search_text {
            return;
        }
        self.search_text = text;
        self.debouncer.schedule(now);
    }

    /// Appends a character to the search text.
    pub fn push_search_char(&mut self, ch: char, now: Instant) {
        self.search_text.push(ch);
        self.debouncer.schedule(now);
    }

    /// Removes the last character of the search text.
    pub fn pop_search_char(&mut self, now: Instant) {
        if self.search_text.pop().is_some() {
            self.debouncer.schedule(now);
        }
    }

    /// Fires the debounced fetch once the quiet period has elapsed.
    ///
    /// The fetch always starts from page 1 and uses the mode implied by the
    /// text at firing time.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<FetchRequest> {
        if !self.mounted || !self.debouncer.fire(now) {
            return None;
        }
        self.page = 1;
        Some(self.fetch())
    }

    /// Submits the search immediately, bypassing the debounce.
    pub fn submit_search(&mut self) -> FetchRequest {
        self.debouncer.cancel();
        self.page = 1;
        self.fetch()
    }

    // --- Pagination ---

    /// Moves to the next page. `None` when disabled.
    pub fn next_page(&mut self) -> Option<FetchRequest> {
        if !self.can_next() {
            return None;
        }
        self.page = self.page.saturating_add(1);
        Some(self.fetch())
    }

    /// Moves to the previous page. `None` when disabled.
    pub fn prev_page(&mut self) -> Option<FetchRequest> {
        if !self.can_prev() {
            return None;
        }
        self.page = self.page.saturating_sub(1).max(1);
        Some(self.fetch())
    }

    // --- Filters ---

    /// Sets the rating floor and refetches from page 1.
    pub fn set_min_rating(&mut self, rating: Option<u8>) -> FetchRequest {
        let reset = self.filters.set_min_rating(rating);
        self.refetch_after(reset)
    }

    /// Raises the rating floor by one step. `None` when already at the top.
    pub fn raise_min_rating(&mut self) -> Option<FetchRequest> {
        let reset = self.filters.raise_min_rating()?;
        Some(self.refetch_after(reset))
    }

    /// Lowers the rating floor by one step. `None` when no floor is set.
    pub fn lower_min_rating(&mut self) -> Option<FetchRequest> {
        let reset = self.filters.lower_min_rating()?;
        Some(self.refetch_after(reset))
    }

    /// Sets the release year and refetches from page 1.
    pub fn set_year(&mut self, year: Option<u32>) -> FetchRequest {
        let reset = self.filters.set_year(year);
        self.refetch_after(reset)
    }

    /// Sets the genre and refetches from page 1.
    pub fn set_genre(&mut self, genre_id: Option<u32>) -> FetchRequest {
        let reset = self.filters.set_genre(genre_id);
        self.refetch_after(reset)
    }

    /// Steps through `All -> genre[0] -> ... -> genre[n-1] -> All`.
    ///
    /// `None` when no genres are loaded.
    pub fn cycle_genre(&mut self, forward: bool) -> Option<FetchRequest> {
        if self.genres.is_empty() {
            return None;
        }
        let current = self
            .filters()
            .genre_id
            .and_then(|id| self.genres.iter().position(|g| g.id == id));
        let last = self.genres.len().saturating_sub(1);
        let next = match (current, forward) {
            (None, true) => Some(0),
            (None, false) => Some(last),
            (Some(i), true) if i >= last => None,
            (Some(i), true) => Some(i.saturating_add(1)),
            (Some(0), false) => None,
            (Some(i), false) => Some(i.saturating_sub(1)),
        };
        let genre_id = next.and_then(|i| self.genres.get(i)).map(|g| g.id);
        Some(self.set_genre(genre_id))
    }

    /// Sets the sort order and refetches from page 1.
    pub fn set_sort(&mut self, sort: SortKey) -> FetchRequest {
        let reset = self.filters.set_sort(sort);
        self.refetch_after(reset)
    }

    /// Advances to the next sort order and refetches from page 1.
    pub fn cycle_sort(&mut self) -> FetchRequest {
        let next = self.filters().sort.next();
        self.set_sort(next)
    }

    /// Clears all filters and refetches from page 1.
    pub fn reset_filters(&mut self) -> FetchRequest {
        let reset = self.filters.reset();
        self.refetch_after(reset)
    }

    // --- Completions ---

    /// Applies a movie fetch result.
    ///
    /// Results of anything but the latest issued request are discarded.
    /// Returns `true` when the result was applied.
    ///
    /// When upstream reports fewer pages than the one requested, the last
    /// valid page is requested instead; collect it with
    /// [`take_follow_up`](Self::take_follow_up).
    pub fn complete(&mut self, seq: u64, result: MovieResult) -> bool {
        if !self.mounted || seq != self.latest_seq {
            tracing::debug!(
                seq,
                latest = self.latest_seq,
                "Discarding superseded fetch result"
            );
            return false;
        }
        self.in_flight = false;

        match result {
            Ok(page) => {
                self.total_pages = page.total_pages.max(1);
                if self.page > self.total_pages {
                    tracing::debug!(
                        seq,
                        requested = self.page,
                        total_pages = self.total_pages,
                        "Requested page is past the end; refetching last page"
                    );
                    self.page = self.total_pages;
                    self.movies.clear();
                    self.follow_up = Some(self.fetch());
                    return true;
                }
                self.movies = page.movies;
                self.status = FetchStatus::Ready;
                tracing::debug!(
                    seq,
                    count = self.movies.len(),
                    page = self.page,
                    total_pages = self.total_pages,
                    "Fetch applied"
                );
            }
            Err(err) => {
                tracing::warn!(
                    seq,
                    error = %err,
                    status = ?err.status(),
                    upstream_message = ?err.upstream_message(),
                    "Movie fetch failed"
                );
                let message = if self.mode == Mode::Popular {
                    POPULAR_ERROR_MESSAGE
                } else {
                    LOAD_ERROR_MESSAGE
                };
                self.movies.clear();
                self.status = FetchStatus::Error(String::from(message));
            }
        }
        true
    }

    /// Takes the fetch issued by the last completion, if any.
    pub const fn take_follow_up(&mut self) -> Option<FetchRequest> {
        self.follow_up.take()
    }

    /// Stores the session genre list. Failures leave it empty.
    pub fn set_genres(&mut self, result: Result<Vec<Genre>, TmdbError>) {
        match result {
            Ok(genres) => {
                tracing::debug!(count = genres.len(), "Loaded genre list");
                self.genres = genres;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load genres; genre filter disabled");
            }
        }
    }

    // --- Internals ---

    /// Resets to page 1 after a filter change and refetches.
    fn refetch_after(&mut self, _reset: PageReset) -> FetchRequest {
        self.page = 1;
        self.fetch()
    }

    /// Builds the query for the active mode at the current page.
    fn current_query(&self) -> MovieQuery {
        let text = self.search_text.trim();
        if text.is_empty() {
            MovieQuery::Discover(self.filters().discover_params(self.page))
        } else {
            let mut params = SearchMovieParams::new(text).page(self.page);
            if let Some(year) = self.filters().year {
                params = params.year(year);
            }
            MovieQuery::Search(params)
        }
    }

    /// Issues a fetch for the active mode.
    fn fetch(&mut self) -> FetchRequest {
        let query = self.current_query();
        self.issue(query)
    }

    /// Tags a query with the next sequence number and enters `Loading`.
    fn issue(&mut self, query: MovieQuery) -> FetchRequest {
        self.latest_seq = self.latest_seq.saturating_add(1);
        self.in_flight = true;
        self.mode = query.mode();
        self.status = FetchStatus::Loading;
        tracing::debug!(
            seq = self.latest_seq,
            mode = self.mode.label(),
            page = query.page(),
            "Issuing movie fetch"
        );
        FetchRequest {
            seq: self.latest_seq,
            query,
        }
    }
}
