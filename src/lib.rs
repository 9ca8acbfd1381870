//! filmgate - movie/TV metadata gateway
//!
//! An HTTP gateway in front of the TMDB v3 API with in-process response
//! caching, plus a parser for the legacy deployment's pip requirements
//! manifests.

/// HTTP gateway: router, handlers, response shaping and caching
pub mod api;
/// Configuration management
pub mod config;
/// Requirements manifest parsing
pub mod manifest;
/// TMDB API client
pub mod tmdb;
