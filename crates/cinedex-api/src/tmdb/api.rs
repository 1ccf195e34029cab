//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::TmdbError;
use super::types::{DiscoverMovieParams, Genre, Movie, MoviePage, SearchMovieParams};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
/// Each operation issues exactly one request; nothing is retried or cached.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Fetches the popular movie list (`movie/popular`).
    ///
    /// A response without `results` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the status is not a
    /// success, or the body cannot be decoded.
    async fn popular_movies(&self, page: u32) -> Result<Vec<Movie>, TmdbError>;

    /// Searches movies by title (`search/movie`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the status is not a
    /// success, or the body cannot be decoded.
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<MoviePage, TmdbError>;

    /// Fetches the movie genre list (`genre/movie/list`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the status is not a
    /// success, or the body cannot be decoded.
    async fn movie_genres(&self) -> Result<Vec<Genre>, TmdbError>;

    /// Browses the catalog with filters (`discover/movie`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the status is not a
    /// success, or the body cannot be decoded.
    async fn discover_movie(&self, params: &DiscoverMovieParams) -> Result<MoviePage, TmdbError>;
}
