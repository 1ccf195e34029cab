//! API client library for cinedex.
//!
//! Provides a typed client for the TMDB movie catalog API.

/// TMDB API client.
pub mod tmdb;
