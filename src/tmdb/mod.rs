//! TMDB API client
//!
//! Thin typed wrapper over the TMDB v3 REST API, covering the endpoints the
//! gateway proxies. Responses are kept as `serde_json::Value`; the gateway's
//! formatting layer shapes them for clients.

mod client;

pub use client::TmdbClient;

use thiserror::Error;

/// Base URL of the TMDB v3 API
pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB never serves pages past this index
pub const MAX_TMDB_PAGES: u64 = 500;

/// TMDB never reports more results than this
pub const MAX_TMDB_RESULTS: u64 = 10_000;

/// Errors returned by the TMDB client
#[derive(Debug, Error)]
pub enum TmdbError {
    /// Error during network communication
    #[error("Network error: {0}")]
    Network(String),
    /// Non-success status from the API
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Cleaned-up error message
        message: String,
    },
    /// The requested resource does not exist (404)
    #[error("Resource not found")]
    NotFound,
    /// TMDB rate limit exceeded (429)
    #[error("Rate limit exceeded")]
    RateLimit,
    /// Error during JSON deserialization
    #[error("JSON error: {0}")]
    Json(String),
}

/// The two media kinds the gateway serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Feature films
    Movie,
    /// TV shows
    Tv,
}

impl MediaType {
    /// Parse the path segment used by both TMDB and the gateway routes
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::Tv),
            _ => None,
        }
    }

    /// The URL path segment / JSON value for this media type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// Capitalized form used in error messages ("Movie not found")
    #[must_use]
    pub const fn title_case(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Tv => "Tv",
        }
    }
}
