//! Genre id -> name cache
//!
//! TMDB list endpoints only carry `genre_ids`; the gateway resolves them
//! through this cache, loaded once at startup. A load failure leaves the
//! maps empty and the gateway running, matching the legacy behavior.

use crate::tmdb::{MediaType, TmdbClient};
use serde_json::Value;
use std::collections::HashMap;
use tracing::error;

/// Startup cache mapping genre ids to display names, per media type
#[derive(Debug, Default)]
pub struct GenreCache {
    movie: HashMap<u64, String>,
    tv: HashMap<u64, String>,
}

impl GenreCache {
    /// Empty cache; genre names resolve to nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load both genre lists from TMDB. Failures are logged and leave the
    /// corresponding map empty.
    pub async fn load(tmdb: &TmdbClient) -> Self {
        let mut cache = Self::default();
        for media in [MediaType::Movie, MediaType::Tv] {
            match tmdb.genre_list(media).await {
                Ok(body) => {
                    let map = match media {
                        MediaType::Movie => &mut cache.movie,
                        MediaType::Tv => &mut cache.tv,
                    };
                    for genre in body["genres"].as_array().into_iter().flatten() {
                        if let (Some(id), Some(name)) =
                            (genre["id"].as_u64(), genre["name"].as_str())
                        {
                            map.insert(id, name.to_string());
                        }
                    }
                }
                Err(e) => error!("Error loading {} genre cache: {e}", media.as_str()),
            }
        }
        cache
    }

    /// Look up a genre name
    #[must_use]
    pub fn name(&self, media: MediaType, id: u64) -> Option<&str> {
        let map = match media {
            MediaType::Movie => &self.movie,
            MediaType::Tv => &self.tv,
        };
        map.get(&id).map(String::as_str)
    }

    /// Resolve a raw `genre_ids` array to known names, skipping unknown ids
    #[must_use]
    pub fn resolve(&self, media: MediaType, genre_ids: Option<&Vec<Value>>) -> Vec<String> {
        genre_ids
            .into_iter()
            .flatten()
            .filter_map(Value::as_u64)
            .filter_map(|id| self.name(media, id).map(ToString::to_string))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn with_entries(movie: &[(u64, &str)], tv: &[(u64, &str)]) -> Self {
        Self {
            movie: movie
                .iter()
                .map(|(id, name)| (*id, (*name).to_string()))
                .collect(),
            tv: tv
                .iter()
                .map(|(id, name)| (*id, (*name).to_string()))
                .collect(),
        }
    }
}
