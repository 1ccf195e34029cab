//! Filter state controller.
//!
//! Holds the discover filters. Every setter replaces exactly one field and
//! hands back a [`PageReset`] so the caller moves pagination back to page 1.

use cinedex_api::tmdb::{DiscoverMovieParams, SortKey};

/// Highest value of the rating slider.
pub const MAX_RATING: u8 = 9;

/// Accepted release years.
pub const YEAR_RANGE: std::ops::RangeInclusive<u32> = 1900..=2100;

/// Active discover filters. Absent fields apply no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Minimum vote average.
    pub min_rating: Option<u8>,
    /// Release year.
    pub year: Option<u32>,
    /// Genre ID.
    pub genre_id: Option<u32>,
    /// Sort order.
    pub sort: SortKey,
}

impl FilterState {
    /// Builds discover parameters for the given page.
    #[must_use]
    pub fn discover_params(&self, page: u32) -> DiscoverMovieParams {
        DiscoverMovieParams {
            page,
            sort_by: self.sort,
            min_vote_average: self.min_rating.map(f64::from),
            year: self.year,
            genre_id: self.genre_id,
            include_adult: None,
        }
    }
}

/// Signal that pagination must go back to page 1.
#[must_use = "a filter change must reset the page"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageReset;

/// Owns the [`FilterState`] and exposes controlled setters.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct FilterController {
    state: FilterState,
}

impl FilterController {
    /// Creates a controller with no filters and the default sort.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current filters.
    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    /// Sets the rating floor. `0` or `None` removes it.
    pub fn set_min_rating(&mut self, rating: Option<u8>) -> PageReset {
        self.state.min_rating = rating.filter(|&r| r > 0).map(|r| r.min(MAX_RATING));
        PageReset
    }

    /// Raises the rating floor by one step. `None` when already at the top.
    pub fn raise_min_rating(&mut self) -> Option<PageReset> {
        let current = self.state.min_rating.unwrap_or(0);
        (current < MAX_RATING).then(|| self.set_min_rating(Some(current.saturating_add(1))))
    }

    /// Lowers the rating floor by one step. `None` when no floor is set.
    pub fn lower_min_rating(&mut self) -> Option<PageReset> {
        let current = self.state.min_rating?;
        Some(self.set_min_rating(Some(current.saturating_sub(1))))
    }

    /// Sets the release year. `None` removes it.
    pub fn set_year(&mut self, year: Option<u32>) -> PageReset {
        self.state.year = year;
        PageReset
    }

    /// Sets the genre. `None` removes it.
    pub fn set_genre(&mut self, genre_id: Option<u32>) -> PageReset {
        self.state.genre_id = genre_id;
        PageReset
    }

    /// Sets the sort order.
    pub fn set_sort(&mut self, sort: SortKey) -> PageReset {
        self.state.sort = sort;
        PageReset
    }

    /// Clears every filter and restores the default sort in one update.
    pub fn reset(&mut self) -> PageReset {
        self.state = FilterState::default();
        PageReset
    }
}

/// Parses year input. Empty input means "no year"; `None` means invalid.
#[must_use]
pub fn parse_year(input: &str) -> Option<Option<u32>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    trimmed
        .parse::<u32>()
        .ok()
        .filter(|year| YEAR_RANGE.contains(year))
        .map(Some)
}
