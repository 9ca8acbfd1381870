//! HTTP gateway
//!
//! Exposes the TMDB proxy API under `/api`, with response caching and
//! per-endpoint cache statistics.

pub mod cache;
pub mod formats;
pub mod genres;
mod handlers;

pub use cache::ResponseCache;
pub use genres::GenreCache;

use crate::tmdb::TmdbClient;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Shared state for all gateway handlers
pub struct AppState {
    /// TMDB API client
    pub tmdb: TmdbClient,
    /// Response cache with hit statistics
    pub cache: ResponseCache,
    /// Genre id -> name lookup, loaded at startup
    pub genres: GenreCache,
}

/// Build the gateway router. Static segments win over parameterized ones,
/// so `/api/movie/upcoming` and `/api/{media_type}/{tmdb_id}` coexist.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/cache/stats", get(handlers::cache_stats))
        .route("/api/search", get(handlers::search))
        .route("/api/collection/{collection_id}", get(handlers::collection))
        .route("/api/person/{person_id}", get(handlers::person_details))
        .route(
            "/api/person/{person_id}/combined_credits",
            get(handlers::person_combined_credits),
        )
        .route("/api/movie/upcoming", get(handlers::movie_upcoming))
        .route("/api/tv/on_the_air", get(handlers::tv_on_the_air))
        .route("/api/tv/{tmdb_id}/seasons", get(handlers::tv_seasons))
        .route(
            "/api/tv/{tmdb_id}/season/{season_number}",
            get(handlers::tv_season),
        )
        .route("/api/{media_type}/latest", get(handlers::latest))
        .route("/api/{media_type}/popular", get(handlers::popular))
        .route("/api/{media_type}/top_rated", get(handlers::top_rated))
        .route("/api/{media_type}/trending", get(handlers::trending))
        .route("/api/{media_type}/discover", get(handlers::discover))
        .route("/api/{media_type}/{tmdb_id}", get(handlers::media_by_id))
        .route(
            "/api/{media_type}/{tmdb_id}/keywords",
            get(handlers::keywords),
        )
        .route(
            "/api/{media_type}/{tmdb_id}/credits",
            get(handlers::media_credits),
        )
        .with_state(state)
}
