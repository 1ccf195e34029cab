//! TMDB API response types and request parameters.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Base URL for poster images at `w500` size.
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Base URL for movie pages on the TMDB website.
const MOVIE_PAGE_BASE_URL: &str = "https://www.themoviedb.org/movie";

/// Builds the full poster URL from a TMDB `poster_path`.
#[must_use]
pub fn poster_url(path: &str) -> String {
    format!("{POSTER_BASE_URL}{path}")
}

/// Builds the TMDB website URL for a movie.
#[must_use]
pub fn movie_page_url(id: u64) -> String {
    format!("{MOVIE_PAGE_BASE_URL}/{id}")
}

// --- Movie ---

/// A movie as returned by the list endpoints.
///
/// Passed through to the view as-is; never mutated locally.
#[derive(Debug, Clone, Deserialize)]
pub struct Movie {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    #[serde(default)]
    pub title: String,
    /// Vote average (0.0 - 10.0).
    #[serde(default)]
    pub vote_average: f64,
    /// Release date (YYYY-MM-DD, empty or null when unknown).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
}

impl Movie {
    /// Returns the four-digit release year, if the release date carries one.
    #[must_use]
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
    }

    /// Returns the full poster URL, if the movie has a poster.
    #[must_use]
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path.as_deref().map(poster_url)
    }
}

/// A page of movies from `search/movie` or `discover/movie`.
#[derive(Debug, Clone)]
pub struct MoviePage {
    /// Movies in upstream order.
    pub movies: Vec<Movie>,
    /// Total number of pages (always at least 1).
    pub total_pages: u32,
    /// Total number of results.
    pub total_results: u32,
}

/// Raw body of the movie list endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct MovieListResponse {
    /// Movies (absent means empty).
    #[serde(default)]
    pub results: Vec<Movie>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Total number of results.
    #[serde(default)]
    pub total_results: Option<u32>,
}

impl From<MovieListResponse> for MoviePage {
    fn from(response: MovieListResponse) -> Self {
        Self {
            movies: response.results,
            total_pages: response.total_pages.filter(|&n| n > 0).unwrap_or(1),
            total_results: response.total_results.unwrap_or(0),
        }
    }
}

// --- Genres ---

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre display name.
    pub name: String,
}

/// Raw body of `genre/movie/list`.
#[derive(Debug, Deserialize)]
pub(crate) struct GenreListResponse {
    /// Genres (absent means empty).
    #[serde(default)]
    pub genres: Vec<Genre>,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TmdbErrorResponse {
    /// TMDB error code.
    #[allow(dead_code)]
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
}

// --- Sort Order ---

/// Sort orders supported by the discover endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Most popular first.
    #[default]
    PopularityDesc,
    /// Highest rated first.
    VoteAverageDesc,
    /// Newest first.
    PrimaryReleaseDateDesc,
}

impl SortKey {
    /// All sort keys in display order.
    pub const ALL: [Self; 3] = [
        Self::PopularityDesc,
        Self::VoteAverageDesc,
        Self::PrimaryReleaseDateDesc,
    ];

    /// Returns the `sort_by` query value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PopularityDesc => "popularity.desc",
            Self::VoteAverageDesc => "vote_average.desc",
            Self::PrimaryReleaseDateDesc => "primary_release_date.desc",
        }
    }

    /// Returns a short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PopularityDesc => "Popularity \u{2193}",
            Self::VoteAverageDesc => "Rating \u{2193}",
            Self::PrimaryReleaseDateDesc => "Newest \u{2193}",
        }
    }

    /// Returns the next sort key, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::PopularityDesc => Self::VoteAverageDesc,
            Self::VoteAverageDesc => Self::PrimaryReleaseDateDesc,
            Self::PrimaryReleaseDateDesc => Self::PopularityDesc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown sort key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key: {0} (expected popularity.desc, vote_average.desc or primary_release_date.desc)")]
pub struct ParseSortKeyError(String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ParseSortKeyError(String::from(s)))
    }
}

// --- Request Parameters ---

/// Parameters for `search/movie` endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMovieParams {
    /// Search query (required, non-empty).
    pub query: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Filter by release year.
    pub year: Option<u32>,
    /// Include adult content (client default: false).
    pub include_adult: Option<bool>,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            year: None,
            include_adult: None,
        }
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the year filter.
    #[must_use]
    pub const fn year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    /// Overrides the adult content flag.
    #[must_use]
    pub const fn include_adult(mut self, include: bool) -> Self {
        self.include_adult = Some(include);
        self
    }

    /// Builds the query pairs for this request.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut query: Vec<(&'static str, String)> = vec![
            ("query", self.query.clone()),
            ("page", self.page.to_string()),
        ];
        if let Some(year) = self.year {
            query.push(("year", year.to_string()));
        }
        if let Some(include) = self.include_adult {
            query.push(("include_adult", include.to_string()));
        }
        query
    }
}

/// Parameters for `discover/movie` endpoint.
///
/// Every optional filter is sent only when present.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverMovieParams {
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Sort order.
    pub sort_by: SortKey,
    /// Minimum vote average (`vote_average.gte`).
    pub min_vote_average: Option<f64>,
    /// Release year.
    pub year: Option<u32>,
    /// Genre ID (`with_genres`).
    pub genre_id: Option<u32>,
    /// Include adult content (client default: false).
    pub include_adult: Option<bool>,
}

impl Default for DiscoverMovieParams {
    fn default() -> Self {
        Self {
            page: 1,
            sort_by: SortKey::default(),
            min_vote_average: None,
            year: None,
            genre_id: None,
            include_adult: None,
        }
    }
}

impl DiscoverMovieParams {
    /// Builds the query pairs for this request.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut query: Vec<(&'static str, String)> = vec![
            ("sort_by", String::from(self.sort_by.as_str())),
            ("page", self.page.to_string()),
        ];
        if let Some(rating) = self.min_vote_average {
            query.push(("vote_average.gte", rating.to_string()));
        }
        if let Some(year) = self.year {
            query.push(("year", year.to_string()));
        }
        if let Some(genre_id) = self.genre_id {
            query.push(("with_genres", genre_id.to_string()));
        }
        if let Some(include) = self.include_adult {
            query.push(("include_adult", include.to_string()));
        }
        query
    }
}
