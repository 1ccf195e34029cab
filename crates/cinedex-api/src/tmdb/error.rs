//! `TmdbError` - failures of a single TMDB request.

use super::types::TmdbErrorResponse;

/// Error returned by every TMDB operation.
///
/// `Upstream` and `Network` are the two kinds callers distinguish for
/// diagnostics; the remaining variants cover local failures around a request.
/// None of them carry the API key.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum TmdbError {
    /// The upstream answered with a non-success HTTP status.
    #[error("TMDB API error (HTTP {status}) for {path}")]
    Upstream {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// No response was received.
    #[error("TMDB request failed: {path}")]
    Network {
        /// Request path.
        path: String,
        /// Underlying transport error (URL stripped).
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the expected JSON shape.
    #[error("failed to decode TMDB response: {path}")]
    Decode {
        /// Request path.
        path: String,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The request path could not be joined onto the base URL.
    #[error("failed to join URL path: {path}")]
    InvalidPath {
        /// Request path.
        path: String,
        /// URL parse error.
        #[source]
        source: url::ParseError,
    },
}

impl TmdbError {
    /// Wraps a transport error, dropping the URL so the API key never leaks
    /// into messages.
    pub(crate) fn network(path: &str, source: reqwest::Error) -> Self {
        Self::Network {
            path: String::from(path),
            source: source.without_url(),
        }
    }

    /// Returns the HTTP status for upstream errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when the upstream answered with an error status.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Extracts TMDB's `status_message` from an upstream error body.
    #[must_use]
    pub fn upstream_message(&self) -> Option<String> {
        let Self::Upstream { body, .. } = self else {
            return None;
        };
        serde_json::from_str::<TmdbErrorResponse>(body)
            .map(|response| response.status_message)
            .ok()
    }
}
