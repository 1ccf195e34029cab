//! cinedex - TMDB movie discovery CLI and terminal browser.

/// Application configuration (TOML).
mod config;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::runtime::Handle;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, TmdbConfig, resolve_config_path};
use cinedex_api::tmdb::{
    DiscoverMovieParams, Movie, SearchMovieParams, SortKey, TmdbApi, TmdbClient,
};
use cinedex_tui::{BrowseOptions, run_browser};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Query TMDB API.
    Tmdb(TmdbCommand),
    /// Browse movies interactively via TUI.
    Browse(BrowseArgs),
}

/// Arguments for the `tmdb` subcommand.
#[derive(clap::Args)]
struct TmdbCommand {
    /// TMDB subcommand to run.
    #[command(subcommand)]
    command: TmdbSubcommands,
}

/// Available TMDB subcommands.
#[derive(Subcommand)]
enum TmdbSubcommands {
    /// List popular movies.
    Popular(TmdbPopularArgs),
    /// Search movies by title.
    Search(TmdbSearchArgs),
    /// List movie genres.
    Genres,
    /// Browse movies with filters.
    Discover(TmdbDiscoverArgs),
}

/// Arguments for the `tmdb popular` subcommand.
#[derive(clap::Args)]
struct TmdbPopularArgs {
    /// Result page (1-based).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

/// Arguments for the `tmdb search` subcommand.
#[derive(clap::Args)]
struct TmdbSearchArgs {
    /// Search query (e.g. "Batman").
    #[arg(long, required = true, value_parser = parse_query)]
    query: String,
    /// Result page (1-based).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
    /// Filter by release year.
    #[arg(long)]
    year: Option<u32>,
}

/// Arguments for the `tmdb discover` subcommand.
#[derive(clap::Args)]
struct TmdbDiscoverArgs {
    /// Result page (1-based).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
    /// Sort order (popularity.desc, vote_average.desc, primary_release_date.desc).
    #[arg(long, default_value_t = SortKey::default())]
    sort: SortKey,
    /// Minimum vote average (0 to 10).
    #[arg(long, value_parser = parse_min_rating)]
    min_rating: Option<f64>,
    /// Release year.
    #[arg(long)]
    year: Option<u32>,
    /// Genre ID (see `tmdb genres`).
    #[arg(long)]
    genre: Option<u32>,
}

/// Arguments for the `browse` subcommand.
#[derive(clap::Args)]
struct BrowseArgs {
    /// Write logs to this file (the terminal is taken by the UI).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Highest vote average TMDB reports.
const MAX_RATING: f64 = 10.0;

/// Parses a search query, trimming it and rejecting blank input.
fn parse_query(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(String::from("query must not be blank"));
    }
    Ok(trimmed.to_owned())
}

/// Parses a rating floor in `0..=10`.
fn parse_min_rating(value: &str) -> Result<f64, String> {
    let rating: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {e}"))?;
    if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
        return Err(format!("rating must be between 0 and {MAX_RATING}"));
    }
    Ok(rating)
}

/// Builds a `TmdbClient` from the `TMDB_API_KEY` environment variable.
///
/// # Errors
///
/// Returns an error if `TMDB_API_KEY` is not set, the configured base URL is
/// invalid, or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(config: &TmdbConfig) -> Result<TmdbClient> {
    let api_key = std::env::var("TMDB_API_KEY")
        .context("TMDB_API_KEY environment variable is required")?;

    let mut builder = TmdbClient::builder().api_key(api_key).user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(base_url) = &config.base_url {
        let url = Url::parse(base_url)
            .with_context(|| format!("invalid tmdb.base_url in config: {base_url}"))?;
        builder = builder.base_url(url);
    }
    if let Some(language) = &config.language {
        builder = builder.language(language);
    }

    builder.build().context("failed to build TMDB client")
}

/// Logs a movie table.
fn log_movies(movies: &[Movie]) {
    tracing::info!("ID\tYear\tRating\tTitle");
    for movie in movies {
        tracing::info!(
            "{}\t{}\t{:.1}\t{}",
            movie.id,
            movie.release_year().unwrap_or("-"),
            movie.vote_average,
            movie.title,
        );
    }
}

/// Runs the `tmdb popular` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_tmdb_popular(args: &TmdbPopularArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(&config.tmdb)?;

    let movies = client
        .popular_movies(args.page)
        .await
        .context("TMDB movie/popular request failed")?;

    tracing::info!("Results: {}", movies.len());
    log_movies(&movies);

    Ok(())
}

/// Runs the `tmdb search` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_tmdb_search(args: &TmdbSearchArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(&config.tmdb)?;

    let mut params = SearchMovieParams::new(&args.query).page(args.page);
    if let Some(year) = args.year {
        params = params.year(year);
    }

    let page = client
        .search_movie(&params)
        .await
        .context("TMDB search/movie request failed")?;

    tracing::info!(
        "Total results: {} (page {} / {})",
        page.total_results,
        args.page,
        page.total_pages
    );
    log_movies(&page.movies);

    Ok(())
}

/// Runs the `tmdb genres` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_tmdb_genres(config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(&config.tmdb)?;

    let genres = client
        .movie_genres()
        .await
        .context("TMDB genre/movie/list request failed")?;

    tracing::info!("ID\tName");
    for genre in &genres {
        tracing::info!("{}\t{}", genre.id, genre.name);
    }

    Ok(())
}

/// Runs the `tmdb discover` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_tmdb_discover(args: &TmdbDiscoverArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(&config.tmdb)?;

    let params = DiscoverMovieParams {
        page: args.page,
        sort_by: args.sort,
        min_vote_average: args.min_rating,
        year: args.year,
        genre_id: args.genre,
        include_adult: None,
    };

    let page = client
        .discover_movie(&params)
        .await
        .context("TMDB discover/movie request failed")?;

    tracing::info!(
        "Total results: {} (page {} / {}, sort: {})",
        page.total_results,
        args.page,
        page.total_pages,
        args.sort.label()
    );
    log_movies(&page.movies);

    Ok(())
}

/// Runs the `browse` subcommand.
///
/// The TUI loop blocks, so it runs on the blocking pool while fetches use
/// the runtime's worker threads.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the TUI fails.
#[instrument(skip_all)]
async fn run_browse(config: &AppConfig) -> Result<()> {
    let client = Arc::new(build_tmdb_client(&config.tmdb)?);
    let options = BrowseOptions {
        debounce: config.browse.debounce(),
    };
    tracing::info!(debounce_ms = config.browse.debounce_ms, "Starting browser");

    let handle = Handle::current();
    tokio::task::spawn_blocking(move || run_browser(client, handle, &options))
        .await
        .context("browser task failed")?
}

/// Chooses the default log filter and output for a command.
///
/// `browse` owns the terminal, so it logs to `--log-file` or nowhere.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
fn log_destination(command: &Commands) -> Result<(&'static str, BoxMakeWriter, bool)> {
    match command {
        Commands::Browse(BrowseArgs {
            log_file: Some(path),
        }) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Ok(("info", BoxMakeWriter::new(Mutex::new(file)), false))
        }
        Commands::Browse(_) => Ok(("off", BoxMakeWriter::new(std::io::sink), false)),
        Commands::Tmdb(_) => Ok(("info", BoxMakeWriter::new(std::io::stdout), true)),
    }
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (default_filter, writer, ansi) = log_destination(&cli.command)?;

    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_filter)),
            )
            .with_target(false)
            .with_writer(writer)
            .with_ansi(ansi)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(writer)
            .with_ansi(ansi);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let config_path = resolve_config_path(cli.dir.as_ref())?;
    let config = AppConfig::load(&config_path)?;

    match cli.command {
        Commands::Tmdb(tmdb) => match tmdb.command {
            TmdbSubcommands::Popular(args) => run_tmdb_popular(&args, &config).await,
            TmdbSubcommands::Search(args) => run_tmdb_search(&args, &config).await,
            TmdbSubcommands::Genres => run_tmdb_genres(&config).await,
            TmdbSubcommands::Discover(args) => run_tmdb_discover(&args, &config).await,
        },
        Commands::Browse(_) => run_browse(&config).await,
    }
}
