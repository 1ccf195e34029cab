//! TMDB API client module.
//!
//! Issues read-only requests against the TMDB API v3 movie endpoints
//! (popular, search, genre list, discover) and normalizes the responses.

mod api;
mod client;
mod error;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::TmdbError;
pub use types::{
    DiscoverMovieParams, Genre, Movie, MoviePage, ParseSortKeyError, SearchMovieParams, SortKey,
    movie_page_url, poster_url,
};
