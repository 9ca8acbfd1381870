//! HTTP client for the TMDB v3 API
//!
//! Handles request construction, status triage and JSON parsing so the
//! gateway handlers only deal with `TmdbError` and response values.

use super::{MediaType, TmdbError, TMDB_BASE_URL};
use crate::config::Settings;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Client for the TMDB v3 API
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: HttpClient,
    api_key: String,
    language: String,
    base_url: String,
}

impl TmdbClient {
    /// Create a new client with the given key, language and request timeout
    #[must_use]
    pub fn new(api_key: &str, language: &str, timeout_secs: u64) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| HttpClient::new());

        Self {
            http,
            api_key: api_key.to_string(),
            language: language.to_string(),
            base_url: TMDB_BASE_URL.to_string(),
        }
    }

    /// Create a client from application settings
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.tmdb_api_key,
            &settings.tmdb_language,
            settings.http_timeout_secs,
        )
    }

    /// Override the API base URL (used by tests to point at a mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Send a GET request and return the parsed JSON response.
    ///
    /// `with_language` mirrors which TMDB endpoints the legacy gateway
    /// called with a `language` parameter.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        with_language: bool,
    ) -> Result<Value, TmdbError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(path = path, "TMDB request");

        let mut request = self.http.get(&url).query(&[("api_key", &self.api_key)]);
        if with_language {
            request = request.query(&[("language", &self.language)]);
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 404 {
                return Err(TmdbError::NotFound);
            }
            if status.as_u16() == 429 {
                return Err(TmdbError::RateLimit);
            }

            let error_text = response.text().await.unwrap_or_default();

            // Detect HTML error pages from Nginx/proxies
            let trimmed = error_text.trim_start();
            let is_html = trimmed.starts_with("<!DOCTYPE")
                || trimmed.starts_with("<html")
                || trimmed.starts_with("<HTML");

            let message = if is_html {
                // Don't include raw HTML in error message
                "Server returned HTML error page".to_string()
            } else if error_text.chars().count() > 500 {
                let truncated: String = error_text.chars().take(500).collect();
                format!("{truncated}... (truncated)")
            } else {
                error_text
            };

            return Err(TmdbError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TmdbError::Json(e.to_string()))
    }

    /// Multi search across movies, TV shows and people
    ///
    /// # Errors
    ///
    /// Returns a `TmdbError` on network, status or parse failure (all
    /// endpoint methods below share this contract).
    pub async fn search_multi(&self, query: &str, page: u64) -> Result<Value, TmdbError> {
        let page = page.to_string();
        self.get_json(
            "search/multi",
            &[("query", query), ("page", &page)],
            true,
        )
        .await
    }

    /// Full details for a movie or TV show
    pub async fn details(&self, media: MediaType, id: &str) -> Result<Value, TmdbError> {
        self.get_json(&format!("{}/{id}", media.as_str()), &[], true)
            .await
    }

    /// Cast and crew credits for a movie or TV show
    pub async fn credits(&self, media: MediaType, id: &str) -> Result<Value, TmdbError> {
        self.get_json(&format!("{}/{id}/credits", media.as_str()), &[], true)
            .await
    }

    /// Videos (trailers, teasers, ...) for a movie or TV show
    pub async fn videos(&self, media: MediaType, id: &str) -> Result<Value, TmdbError> {
        self.get_json(&format!("{}/{id}/videos", media.as_str()), &[], true)
            .await
    }

    /// Certification data: `release_dates` for movies, `content_ratings`
    /// for TV shows
    pub async fn certifications(&self, media: MediaType, id: &str) -> Result<Value, TmdbError> {
        let path = match media {
            MediaType::Movie => format!("movie/{id}/release_dates"),
            MediaType::Tv => format!("tv/{id}/content_ratings"),
        };
        self.get_json(&path, &[], false).await
    }

    /// Keywords for a movie or TV show
    pub async fn keywords(&self, media: MediaType, id: &str) -> Result<Value, TmdbError> {
        self.get_json(&format!("{}/{id}/keywords", media.as_str()), &[], false)
            .await
    }

    /// Person details
    pub async fn person_details(&self, id: &str) -> Result<Value, TmdbError> {
        self.get_json(&format!("person/{id}"), &[], true).await
    }

    /// Combined movie and TV credits for a person
    pub async fn person_combined_credits(&self, id: &str) -> Result<Value, TmdbError> {
        self.get_json(&format!("person/{id}/combined_credits"), &[], true)
            .await
    }

    /// A movie collection with its parts
    pub async fn collection(&self, id: &str) -> Result<Value, TmdbError> {
        self.get_json(&format!("collection/{id}"), &[], true).await
    }

    /// Season details with episodes for a TV show
    pub async fn season(&self, tv_id: &str, season_number: u64) -> Result<Value, TmdbError> {
        self.get_json(&format!("tv/{tv_id}/season/{season_number}"), &[], true)
            .await
    }

    /// Popular movies or TV shows, paged
    pub async fn popular(&self, media: MediaType, page: u64) -> Result<Value, TmdbError> {
        let page = page.to_string();
        self.get_json(
            &format!("{}/popular", media.as_str()),
            &[("page", &page)],
            true,
        )
        .await
    }

    /// Top-rated movies or TV shows, paged
    pub async fn top_rated(&self, media: MediaType, page: u64) -> Result<Value, TmdbError> {
        let page = page.to_string();
        self.get_json(
            &format!("{}/top_rated", media.as_str()),
            &[("page", &page)],
            true,
        )
        .await
    }

    /// Upcoming movies, paged
    pub async fn upcoming(&self, page: u64) -> Result<Value, TmdbError> {
        let page = page.to_string();
        self.get_json("movie/upcoming", &[("page", &page)], true)
            .await
    }

    /// TV shows currently on the air, paged
    pub async fn on_the_air(&self, page: u64) -> Result<Value, TmdbError> {
        let page = page.to_string();
        self.get_json("tv/on_the_air", &[("page", &page)], true)
            .await
    }

    /// Trending movies or TV shows for a time window ("day" or "week")
    pub async fn trending(
        &self,
        media: MediaType,
        time_window: &str,
        page: u64,
    ) -> Result<Value, TmdbError> {
        let page = page.to_string();
        self.get_json(
            &format!("trending/{}/{time_window}", media.as_str()),
            &[("page", &page)],
            true,
        )
        .await
    }

    /// Discover movies or TV shows with arbitrary filter parameters
    pub async fn discover(
        &self,
        media: MediaType,
        params: &[(String, String)],
    ) -> Result<Value, TmdbError> {
        let borrowed: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.get_json(&format!("discover/{}", media.as_str()), &borrowed, true)
            .await
    }

    /// The most recently created movie or TV show entry
    pub async fn latest(&self, media: MediaType) -> Result<Value, TmdbError> {
        self.get_json(&format!("{}/latest", media.as_str()), &[], true)
            .await
    }

    /// The full genre list for a media type
    pub async fn genre_list(&self, media: MediaType) -> Result<Value, TmdbError> {
        self.get_json(&format!("genre/{}/list", media.as_str()), &[], true)
            .await
    }
}
