//! `TmdbClient` - TMDB API client implementation.

use std::fmt;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::api::TmdbApi;
use super::error::TmdbError;
use super::types::{
    DiscoverMovieParams, Genre, GenreListResponse, Movie, MovieListResponse, MoviePage,
    SearchMovieParams,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// TMDB API client.
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// API key (sent as the `api_key` query parameter).
    api_key: String,
    /// Response language, sent only when configured.
    language: Option<String>,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// Builder for `TmdbClient`.
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    language: Option<String>,
}

impl fmt::Debug for TmdbClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClientBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("language", &self.language)
            .finish()
    }
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user_agent: None,
            language: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (e.g. "en-US").
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set or empty.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .context("api_key is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_key,
            language: self.language,
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Appends the client-wide defaults to request parameters.
    ///
    /// `include_adult=false` and the configured language are added only when
    /// the caller has not set them already.
    fn with_defaults(&self, mut query: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(ref language) = self.language
            && !query.iter().any(|(k, _)| *k == "language")
        {
            query.push(("language", language.clone()));
        }
        if !query.iter().any(|(k, _)| *k == "include_adult") {
            query.push(("include_adult", String::from("false")));
        }
        query
    }

    /// Sends one GET request with the API key and query params.
    ///
    /// Non-success statuses become `TmdbError::Upstream`; nothing is retried.
    #[instrument(skip_all, fields(path = path))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&'static str, String)>,
    ) -> Result<T, TmdbError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|source| TmdbError::InvalidPath {
                path: String::from(path),
                source,
            })?;
        let query = self.with_defaults(query);

        tracing::debug!(path, ?query, "TMDB API request");

        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("api_key", self.api_key.as_str())])
            .query(&query)
            .send()
            .await
            .map_err(|e| TmdbError::network(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            tracing::error!(path, status = status.as_u16(), %body, "TMDB API error");
            return Err(TmdbError::Upstream {
                path: String::from(path),
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TmdbError::network(path, e))?;
        serde_json::from_str(&body).map_err(|source| TmdbError::Decode {
            path: String::from(path),
            source,
        })
    }
}

impl TmdbApi for TmdbClient {
    #[instrument(skip_all)]
    async fn popular_movies(&self, page: u32) -> Result<Vec<Movie>, TmdbError> {
        let query = vec![("page", page.to_string())];
        let response: MovieListResponse = self.get_json("movie/popular", query).await?;
        Ok(response.results)
    }

    #[instrument(skip_all)]
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<MoviePage, TmdbError> {
        let response: MovieListResponse =
            self.get_json("search/movie", params.query_pairs()).await?;
        Ok(response.into())
    }

    #[instrument(skip_all)]
    async fn movie_genres(&self) -> Result<Vec<Genre>, TmdbError> {
        let response: GenreListResponse = self.get_json("genre/movie/list", Vec::new()).await?;
        Ok(response.genres)
    }

    #[instrument(skip_all)]
    async fn discover_movie(&self, params: &DiscoverMovieParams) -> Result<MoviePage, TmdbError> {
        let response: MovieListResponse =
            self.get_json("discover/movie", params.query_pairs()).await?;
        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::tmdb::SortKey;

    fn test_client(mock_server: &MockServer) -> TmdbClient {
        let base_url = format!("{}/3/", mock_server.uri());
        TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_key() {
        // Arrange & Act
        let result = TmdbClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("api_key is required")
        );
    }

    #[test]
    fn test_builder_rejects_blank_api_key() {
        // Arrange & Act
        let result = TmdbClient::builder()
            .api_key("   ")
            .user_agent("test/0.0.0")
            .build();

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = TmdbClient::builder().api_key("test-key").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[tokio::test]
    async fn test_configured_language_reaches_requests() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/genre_movie_list.json");

        Mock::given(method("GET"))
            .and(path("/3/genre/movie/list"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("language", "ja-JP"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = TmdbClient::builder()
            .base_url(Url::parse(&format!("{}/3/", mock_server.uri())).unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .language("ja-JP")
            .build()
            .unwrap();

        // Act
        let genres = client.movie_genres().await.unwrap();

        // Assert
        assert_eq!(genres.len(), 5);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        // Arrange
        let client = TmdbClient::builder()
            .api_key("super-secret")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let debug = format!("{client:?} {:?}", TmdbClient::builder().api_key("super-secret"));

        // Assert
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_with_defaults_keeps_explicit_include_adult() {
        // Arrange
        let client = TmdbClient::builder()
            .api_key("k")
            .user_agent("test/0.0.0")
            .language("ja-JP")
            .build()
            .unwrap();

        // Act
        let defaulted = client.with_defaults(vec![("page", String::from("1"))]);
        let explicit = client.with_defaults(vec![("include_adult", String::from("true"))]);

        // Assert
        assert!(defaulted.contains(&("include_adult", String::from("false"))));
        assert!(defaulted.contains(&("language", String::from("ja-JP"))));
        assert_eq!(
            explicit
                .iter()
                .filter(|(k, _)| *k == "include_adult")
                .count(),
            1
        );
        assert!(explicit.contains(&("include_adult", String::from("true"))));
    }

    #[test]
    fn test_parse_popular_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/movie_popular.json");

        // Act
        let response: MovieListResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[0].id, 1_022_789);
        assert_eq!(response.results[0].genre_ids, vec![16, 10751, 12]);
    }

    #[test]
    fn test_parse_genre_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/genre_movie_list.json");

        // Act
        let response: GenreListResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.genres.len(), 5);
        assert_eq!(
            response.genres[0],
            Genre {
                id: 28,
                name: String::from("Action")
            }
        );
    }

    #[tokio::test]
    async fn test_popular_movies_via_http() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/movie_popular.json");

        Mock::given(method("GET"))
            .and(path("/3/movie/popular"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("page", "1"))
            .and(query_param("include_adult", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let movies = client.popular_movies(1).await.unwrap();

        // Assert
        assert_eq!(movies.len(), 3);
        assert_eq!(movies[1].title, "Deadpool & Wolverine");
    }

    #[tokio::test]
    async fn test_popular_movies_without_results_is_empty() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/3/movie/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"page":1}"#))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let movies = client.popular_movies(1).await.unwrap();

        // Assert
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_search_movie_via_http() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_batman.json");

        Mock::given(method("GET"))
            .and(path("/3/search/movie"))
            .and(query_param("query", "batman"))
            .and(query_param("page", "1"))
            .and(query_param("include_adult", "false"))
            .and(query_param_is_missing("year"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let page = client
            .search_movie(&SearchMovieParams::new("batman"))
            .await
            .unwrap();

        // Assert
        assert_eq!(page.movies.len(), 3);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.total_results, 93);
    }

    #[tokio::test]
    async fn test_search_movie_sends_year_when_set() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_batman.json");

        Mock::given(method("GET"))
            .and(path("/3/search/movie"))
            .and(query_param("year", "1989"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let params = SearchMovieParams::new("batman").page(2).year(1989);

        // Act & Assert (mock expect(1) verifies the query)
        client.search_movie(&params).await.unwrap();
    }

    #[tokio::test]
    async fn test_movie_genres_via_http() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/genre_movie_list.json");

        Mock::given(method("GET"))
            .and(path("/3/genre/movie/list"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("include_adult", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let genres = client.movie_genres().await.unwrap();

        // Assert
        assert_eq!(genres.len(), 5);
        assert_eq!(genres[4].name, "Drama");
    }

    #[tokio::test]
    async fn test_discover_omits_absent_filters_via_http() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/discover_movie.json");

        Mock::given(method("GET"))
            .and(path("/3/discover/movie"))
            .and(query_param("sort_by", "popularity.desc"))
            .and(query_param("page", "1"))
            .and(query_param_is_missing("vote_average.gte"))
            .and(query_param_is_missing("year"))
            .and(query_param_is_missing("with_genres"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let page = client
            .discover_movie(&DiscoverMovieParams::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(page.movies.len(), 2);
        assert_eq!(page.total_pages, 42);
    }

    #[tokio::test]
    async fn test_discover_sends_present_filters_via_http() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/discover_movie.json");

        Mock::given(method("GET"))
            .and(path("/3/discover/movie"))
            .and(query_param("sort_by", "vote_average.desc"))
            .and(query_param("page", "2"))
            .and(query_param("vote_average.gte", "7"))
            .and(query_param("year", "2020"))
            .and(query_param("with_genres", "28"))
            .and(query_param("include_adult", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let params = DiscoverMovieParams {
            page: 2,
            sort_by: SortKey::VoteAverageDesc,
            min_vote_average: Some(7.0),
            year: Some(2020),
            genre_id: Some(28),
            include_adult: None,
        };

        // Act & Assert (mock expect(1) verifies the query)
        client.discover_movie(&params).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_error_returns_upstream_error() {
        // Arrange
        let mock_server = MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let err = client
            .search_movie(&SearchMovieParams::new("test"))
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(
            err,
            TmdbError::Upstream { status: 401, ref body, .. } if body == error_body
        ));
        assert!(err.to_string().contains("TMDB API error"));
        assert!(err.upstream_message().unwrap().contains("Invalid API key"));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn test_http_429_is_not_retried() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let result = client.movie_genres().await;

        // Assert
        assert_eq!(result.unwrap_err().status(), Some(429));
    }

    #[tokio::test]
    async fn test_invalid_json_returns_decode_error() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // Act
        let result = client.discover_movie(&DiscoverMovieParams::default()).await;

        // Assert
        assert!(matches!(result, Err(TmdbError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_server_returns_network_error() {
        // Arrange
        let client = TmdbClient::builder()
            .base_url(Url::parse("http://127.0.0.1:9/3/").unwrap())
            .api_key("secret-key")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let err = client.popular_movies(1).await.unwrap_err();

        // Assert
        assert!(matches!(err, TmdbError::Network { .. }));
        let chain = format!("{err:?}");
        assert!(!chain.contains("secret-key"));
    }
}
