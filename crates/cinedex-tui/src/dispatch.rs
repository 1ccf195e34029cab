//! Executes orchestrator commands on the tokio runtime.
//!
//! Each command runs as its own task; results come back over an unbounded
//! channel tagged with the sequence number they were issued under. Tasks are
//! never aborted. Stale results are filtered by the orchestrator instead.

use std::fmt;
use std::sync::Arc;

use cinedex_api::tmdb::{Genre, MoviePage, TmdbApi, TmdbError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::orchestrator::{Command, FetchRequest, MovieQuery, MovieResult};

/// A finished fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Movie list result for request `seq`.
    Movies {
        /// Sequence number of the originating request.
        seq: u64,
        /// Fetch result.
        result: MovieResult,
    },
    /// Genre list result.
    Genres(Result<Vec<Genre>, TmdbError>),
}

/// Spawns fetch tasks and forwards their results.
pub struct Dispatcher<C> {
    client: Arc<C>,
    handle: Handle,
    tx: UnboundedSender<FetchOutcome>,
}

impl<C> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

impl<C> Dispatcher<C>
where
    C: TmdbApi + Send + Sync + 'static,
{
    /// Creates a dispatcher and the receiver its results arrive on.
    #[must_use]
    pub fn new(client: Arc<C>, handle: Handle) -> (Self, UnboundedReceiver<FetchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { client, handle, tx }, rx)
    }

    /// Runs a command in the background.
    pub fn dispatch(&self, command: Command) {
        match command {
            Command::FetchGenres => self.fetch_genres(),
            Command::FetchMovies(request) => self.fetch(request),
        }
    }

    /// Runs a movie fetch in the background.
    pub fn fetch(&self, request: FetchRequest) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let FetchRequest { seq, query } = request;
            let result = run_query(client.as_ref(), &query).await;
            if tx.send(FetchOutcome::Movies { seq, result }).is_err() {
                tracing::debug!(seq, "Browser closed; dropping fetch result");
            }
        });
    }

    fn fetch_genres(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = client.movie_genres().await;
            if tx.send(FetchOutcome::Genres(result)).is_err() {
                tracing::debug!("Browser closed; dropping genre list");
            }
        });
    }
}

/// Executes a single query against the API, normalizing to [`MoviePage`].
///
/// Popular results are a plain list and are reported as a single page.
///
/// # Errors
///
/// Returns the API error unchanged.
pub async fn run_query<C>(client: &C, query: &MovieQuery) -> MovieResult
where
    C: TmdbApi + Sync,
{
    match query {
        MovieQuery::Popular { page } => {
            let movies = client.popular_movies(*page).await?;
            let total_results = u32::try_from(movies.len()).unwrap_or(u32::MAX);
            Ok(MoviePage {
                movies,
                total_pages: 1,
                total_results,
            })
        }
        MovieQuery::Search(params) => client.search_movie(params).await,
        MovieQuery::Discover(params) => client.discover_movie(params).await,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use std::sync::Mutex;
    use std::time::Duration;

    use cinedex_api::tmdb::{DiscoverMovieParams, Movie, SearchMovieParams};

    use super::*;

    /// Records calls and answers from canned data.
    #[derive(Default)]
    struct StubApi {
        calls: Mutex<Vec<String>>,
        fail_genres: bool,
        /// Delay applied to discover requests, keyed by page.
        slow_page: Option<u32>,
    }

    impl StubApi {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn movie(id: u64) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            vote_average: 6.5,
            release_date: None,
            genre_ids: Vec::new(),
            poster_path: None,
            overview: None,
        }
    }

    impl TmdbApi for StubApi {
        async fn popular_movies(&self, page: u32) -> Result<Vec<Movie>, TmdbError> {
            self.record(format!("popular:{page}"));
            Ok(vec![movie(1), movie(2)])
        }

        async fn search_movie(&self, params: &SearchMovieParams) -> Result<MoviePage, TmdbError> {
            self.record(format!("search:{}:{}", params.query, params.page));
            Ok(MoviePage {
                movies: vec![movie(3)],
                total_pages: 5,
                total_results: 93,
            })
        }

        async fn movie_genres(&self) -> Result<Vec<Genre>, TmdbError> {
            self.record(String::from("genres"));
            if self.fail_genres {
                return Err(TmdbError::Upstream {
                    path: String::from("genre/movie/list"),
                    status: 503,
                    body: String::new(),
                });
            }
            Ok(vec![Genre {
                id: 28,
                name: String::from("Action"),
            }])
        }

        async fn discover_movie(
            &self,
            params: &DiscoverMovieParams,
        ) -> Result<MoviePage, TmdbError> {
            self.record(format!("discover:{}", params.page));
            if self.slow_page == Some(params.page) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(MoviePage {
                movies: vec![movie(u64::from(params.page))],
                total_pages: 9,
                total_results: 180,
            })
        }
    }

    #[tokio::test]
    async fn test_run_query_wraps_popular_as_single_page() {
        // Arrange
        let api = StubApi::default();

        // Act
        let page = run_query(&api, &MovieQuery::Popular { page: 1 })
            .await
            .unwrap();

        // Assert
        assert_eq!(page.movies.len(), 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_results, 2);
        assert_eq!(*api.calls.lock().unwrap(), vec!["popular:1"]);
    }

    #[tokio::test]
    async fn test_run_query_routes_by_mode() {
        // Arrange
        let api = StubApi::default();

        // Act
        let searched = run_query(
            &api,
            &MovieQuery::Search(SearchMovieParams::new("batman").page(2)),
        )
        .await
        .unwrap();
        let discovered = run_query(
            &api,
            &MovieQuery::Discover(DiscoverMovieParams {
                page: 3,
                ..DiscoverMovieParams::default()
            }),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(searched.total_pages, 5);
        assert_eq!(discovered.movies.first().unwrap().id, 3);
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec!["search:batman:2", "discover:3"]
        );
    }

    #[tokio::test]
    async fn test_dispatch_forwards_seq_and_genres() {
        // Arrange
        let api = Arc::new(StubApi::default());
        let (dispatcher, mut rx) = Dispatcher::new(Arc::clone(&api), Handle::current());

        // Act
        dispatcher.dispatch(Command::FetchGenres);
        let first = rx.recv().await.unwrap();
        dispatcher.dispatch(Command::FetchMovies(FetchRequest {
            seq: 7,
            query: MovieQuery::Popular { page: 1 },
        }));
        let second = rx.recv().await.unwrap();

        // Assert
        let FetchOutcome::Genres(Ok(genres)) = first else {
            panic!("expected genres, got {first:?}");
        };
        assert_eq!(genres.len(), 1);
        let FetchOutcome::Movies { seq, result } = second else {
            panic!("expected movies, got {second:?}");
        };
        assert_eq!(seq, 7);
        assert_eq!(result.unwrap().movies.len(), 2);
    }

    #[tokio::test]
    async fn test_genre_failure_is_forwarded() {
        // Arrange
        let api = Arc::new(StubApi {
            fail_genres: true,
            ..StubApi::default()
        });
        let (dispatcher, mut rx) = Dispatcher::new(api, Handle::current());

        // Act
        dispatcher.dispatch(Command::FetchGenres);
        let outcome = rx.recv().await.unwrap();

        // Assert
        let FetchOutcome::Genres(Err(err)) = outcome else {
            panic!("expected genre error, got {outcome:?}");
        };
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        // Arrange
        let api = Arc::new(StubApi {
            slow_page: Some(1),
            ..StubApi::default()
        });
        let (dispatcher, mut rx) = Dispatcher::new(api, Handle::current());
        let discover = |seq: u64, page: u32| FetchRequest {
            seq,
            query: MovieQuery::Discover(DiscoverMovieParams {
                page,
                ..DiscoverMovieParams::default()
            }),
        };

        // Act: the older request is slower
        dispatcher.fetch(discover(1, 1));
        dispatcher.fetch(discover(2, 2));
        let mut seqs = Vec::new();
        for _ in 0..2 {
            if let FetchOutcome::Movies { seq, .. } = rx.recv().await.unwrap() {
                seqs.push(seq);
            }
        }

        // Assert
        assert_eq!(seqs, vec![2, 1]);
    }
}
