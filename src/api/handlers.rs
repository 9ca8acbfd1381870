//! Gateway endpoint handlers
//!
//! Each handler mirrors a route of the legacy gateway: the same paths,
//! query parameters, status codes, `{"error": ...}` bodies and cache keys.

use super::cache::{TTL_DETAIL, TTL_DISCOVER, TTL_LIST, TTL_LONG};
use super::formats;
use super::AppState;
use crate::tmdb::{MediaType, TmdbError};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Map a TMDB error to the gateway's status-code contract
fn map_tmdb_error(e: &TmdbError, context: &str, not_found_message: &str) -> Response {
    match e {
        TmdbError::RateLimit => {
            error!("TMDB rate limit exceeded");
            error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded, try again later",
            )
        }
        TmdbError::NotFound => {
            warn!("{context}: {not_found_message}");
            error_response(StatusCode::NOT_FOUND, not_found_message)
        }
        other => {
            error!("Error in {context}: {other}");
            internal_error()
        }
    }
}

/// `page` query parameter with the legacy gateway's lenient parsing: anything
/// that isn't a positive integer falls back to 1
fn page_param(params: &HashMap<String, String>) -> u64 {
    params
        .get("page")
        .and_then(|p| p.parse::<u64>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

fn parse_media_type(media_type: &str) -> Result<MediaType, Response> {
    MediaType::parse(media_type).ok_or_else(|| {
        warn!("Invalid media_type: {media_type}");
        error_response(StatusCode::BAD_REQUEST, "Invalid media type")
    })
}

fn require_valid_id(id: &str, message: &str) -> Result<(), Response> {
    if formats::validate_id(id) {
        Ok(())
    } else {
        warn!("{message}: {id}");
        Err(error_response(StatusCode::BAD_REQUEST, message))
    }
}

/// Serve from cache or build, recording per-endpoint hit statistics
async fn serve_cached<F, Fut>(
    state: &AppState,
    key: String,
    endpoint: String,
    ttl: Duration,
    build: F,
) -> Response
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, Response>>,
{
    if let Some(body) = state.cache.get(&key).await {
        state.cache.record(&endpoint, true);
        return Json((*body).clone()).into_response();
    }
    state.cache.record(&endpoint, false);

    match build().await {
        Ok(value) => {
            state.cache.insert(key, value.clone(), ttl).await;
            Json(value).into_response()
        }
        Err(response) => response,
    }
}

/// GET /api/cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Response {
    Json(json!({ "cache_stats": state.cache.stats_snapshot() })).into_response()
}

/// GET /api/search?query=...&page=N
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(query) = params.get("query").filter(|q| !q.is_empty()) else {
        warn!("No query parameter provided");
        return error_response(StatusCode::BAD_REQUEST, "Query parameter is required");
    };
    let page = page_param(&params);
    info!("Received search query: {query}, page: {page}");

    let body = match state.tmdb.search_multi(query, page).await {
        Ok(body) => body,
        Err(e) => return map_tmdb_error(&e, "search", "No results found"),
    };

    let results: Vec<Value> = body["results"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let media = MediaType::parse(item["media_type"].as_str()?)?;
            Some(formats::format_media_light(item, media, &state.genres))
        })
        .collect();

    let (total_results, total_pages) = formats::clamp_totals(&body);
    Json(formats::page_envelope(
        results,
        page,
        total_pages,
        total_results,
    ))
    .into_response()
}

/// GET /api/person/{person_id}
pub async fn person_details(
    State(state): State<Arc<AppState>>,
    Path(person_id): Path<String>,
) -> Response {
    if let Err(resp) = require_valid_id(&person_id, "Invalid person ID") {
        return resp;
    }
    info!("Fetching person details for TMDB ID: {person_id}");

    match state.tmdb.person_details(&person_id).await {
        Ok(person) => Json(formats::format_person(&person)).into_response(),
        Err(e) => map_tmdb_error(&e, "person_details", "Person not found"),
    }
}

/// GET /api/person/{person_id}/combined_credits
pub async fn person_combined_credits(
    State(state): State<Arc<AppState>>,
    Path(person_id): Path<String>,
) -> Response {
    if let Err(resp) = require_valid_id(&person_id, "Invalid person ID") {
        return resp;
    }
    info!("Fetching combined credits for person TMDB ID: {person_id}");

    let key = format!("person_{person_id}_combined_credits");
    let endpoint = format!("person/{person_id}/combined_credits");
    serve_cached(&state, key, endpoint, TTL_LONG, || async {
        let person = state
            .tmdb
            .person_details(&person_id)
            .await
            .map_err(|e| map_tmdb_error(&e, "person_combined_credits", "Person not found"))?;
        let body = state
            .tmdb
            .person_combined_credits(&person_id)
            .await
            .map_err(|e| map_tmdb_error(&e, "person_combined_credits", "Credits not found"))?;

        let mut credits: Vec<Value> = Vec::new();
        for (role, list) in [("cast", &body["cast"]), ("crew", &body["crew"])] {
            for item in list.as_array().into_iter().flatten() {
                if let Some(credit) = formats::format_combined_credit(item, role) {
                    credits.push(credit);
                }
            }
        }
        credits.sort_by(|a, b| {
            let pa = a["popularity"].as_f64().unwrap_or(0.0);
            let pb = b["popularity"].as_f64().unwrap_or(0.0);
            pb.total_cmp(&pa)
        });

        Ok(json!({
            "person_id": person_id,
            "name": person["name"].as_str().unwrap_or("N/A"),
            "credits": credits,
        }))
    })
    .await
}

/// GET /api/{media_type}/latest
pub async fn latest(
    State(state): State<Arc<AppState>>,
    Path(media_type): Path<String>,
) -> Response {
    let media = match parse_media_type(&media_type) {
        Ok(media) => media,
        Err(resp) => return resp,
    };
    info!("Fetching latest for media_type: {media_type}");

    match state.tmdb.latest(media).await {
        Ok(body) => {
            let formatted = formats::format_media_light(&body, media, &state.genres);
            Json(json!({ "results": [formatted] })).into_response()
        }
        Err(TmdbError::NotFound) => {
            warn!("No latest {media_type} found");
            Json(json!({ "results": [] })).into_response()
        }
        Err(e) => map_tmdb_error(&e, "latest", "Not found"),
    }
}

/// GET /api/{media_type}/{tmdb_id}
pub async fn media_by_id(
    State(state): State<Arc<AppState>>,
    Path((media_type, tmdb_id)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = require_valid_id(&tmdb_id, "Invalid TMDB ID") {
        return resp;
    }
    let media = match parse_media_type(&media_type) {
        Ok(media) => media,
        Err(resp) => return resp,
    };
    info!("Received {media_type} TMDB ID: {tmdb_id}");

    let key = format!("{media_type}_{tmdb_id}");
    let endpoint = format!("{media_type}/{tmdb_id}");
    let not_found = format!("{} not found", media.title_case());
    serve_cached(&state, key, endpoint, TTL_DETAIL, || async {
        let (details, credits, videos, certifications) = tokio::join!(
            state.tmdb.details(media, &tmdb_id),
            state.tmdb.credits(media, &tmdb_id),
            state.tmdb.videos(media, &tmdb_id),
            state.tmdb.certifications(media, &tmdb_id),
        );
        let details = details.map_err(|e| map_tmdb_error(&e, "media_by_id", &not_found))?;

        // Secondary lookups degrade to "N/A" fields rather than failing
        // the whole response.
        Ok(formats::format_media(
            &details,
            credits.ok().as_ref(),
            videos.ok().as_ref(),
            certifications.ok().as_ref(),
            media,
        ))
    })
    .await
}

/// GET /api/{media_type}/{tmdb_id}/keywords
pub async fn keywords(
    State(state): State<Arc<AppState>>,
    Path((media_type, tmdb_id)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = require_valid_id(&tmdb_id, "Invalid TMDB ID") {
        return resp;
    }
    let media = match parse_media_type(&media_type) {
        Ok(media) => media,
        Err(resp) => return resp,
    };
    info!("Fetching keywords for {media_type} TMDB ID: {tmdb_id}");

    let key = format!("{media_type}_{tmdb_id}_keywords");
    let endpoint = format!("{media_type}/{tmdb_id}/keywords");
    let not_found = format!("{} not found", media.title_case());
    serve_cached(&state, key, endpoint, TTL_LONG, || async {
        let body = state
            .tmdb
            .keywords(media, &tmdb_id)
            .await
            .map_err(|e| map_tmdb_error(&e, "keywords", &not_found))?;

        // Movies nest keywords under "keywords", TV under "results"
        let raw_key = match media {
            MediaType::Movie => "keywords",
            MediaType::Tv => "results",
        };
        let keywords: Vec<Value> = body[raw_key]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|kw| {
                let id = kw["id"].as_u64()?;
                let name = kw["name"].as_str()?;
                Some(json!({ "name": name, "tmdb_id": id.to_string() }))
            })
            .collect();

        Ok(json!({
            "tmdb_id": tmdb_id,
            "media_type": media.as_str(),
            "keywords": keywords,
        }))
    })
    .await
}

/// GET /api/{media_type}/{tmdb_id}/credits
pub async fn media_credits(
    State(state): State<Arc<AppState>>,
    Path((media_type, tmdb_id)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = require_valid_id(&tmdb_id, "Invalid TMDB ID") {
        return resp;
    }
    let media = match parse_media_type(&media_type) {
        Ok(media) => media,
        Err(resp) => return resp,
    };
    info!("Fetching credits for {media_type} TMDB ID: {tmdb_id}");

    let key = format!("{media_type}_{tmdb_id}_credits");
    let endpoint = format!("{media_type}/{tmdb_id}/credits");
    serve_cached(&state, key, endpoint, TTL_LONG, || async {
        let (credits, details) = tokio::join!(
            state.tmdb.credits(media, &tmdb_id),
            state.tmdb.details(media, &tmdb_id),
        );
        let credits =
            credits.map_err(|e| map_tmdb_error(&e, "media_credits", "Credits not found"))?;
        let details =
            details.map_err(|e| map_tmdb_error(&e, "media_credits", "Credits not found"))?;

        let cast: Vec<Value> = credits["cast"]
            .as_array()
            .into_iter()
            .flatten()
            .take(10)
            .filter(|person| person["name"].as_str().is_some())
            .map(formats::format_cast_member)
            .collect();

        let mut directors: Vec<Value> = credits["crew"]
            .as_array()
            .into_iter()
            .flatten()
            .filter(|person| person["job"] == "Director")
            .map(|person| formats::format_director(person, None))
            .collect();

        if directors.is_empty() && media == MediaType::Tv {
            directors = details["created_by"]
                .as_array()
                .into_iter()
                .flatten()
                .filter(|person| person["name"].as_str().is_some())
                .map(|person| formats::format_director(person, Some("Creator")))
                .collect();
            if directors.is_empty() {
                warn!("No directors or creators found for TV TMDB ID: {tmdb_id}");
            }
        }

        let title = formats::non_empty_str(&details, "title")
            .or_else(|| formats::non_empty_str(&details, "name"))
            .unwrap_or("N/A");

        Ok(json!({
            "tmdb_id": tmdb_id,
            "title": title,
            "media_type": media.as_str(),
            "cast": cast,
            "directors": directors,
        }))
    })
    .await
}

/// GET /api/collection/{collection_id}
pub async fn collection(
    State(state): State<Arc<AppState>>,
    Path(collection_id): Path<String>,
) -> Response {
    if let Err(resp) = require_valid_id(&collection_id, "Invalid collection ID") {
        return resp;
    }
    info!("Fetching collection with ID: {collection_id}");

    let key = format!("collection_{collection_id}");
    let endpoint = format!("collection/{collection_id}");
    serve_cached(&state, key, endpoint, TTL_LONG, || async {
        let body = state
            .tmdb
            .collection(&collection_id)
            .await
            .map_err(|e| map_tmdb_error(&e, "collection", "Collection not found"))?;

        let mut parts: Vec<Value> = body["parts"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|part| formats::format_collection_part(part, &state.genres))
            .collect();
        // Undated parts sort first, as if released in 1900
        parts.sort_by(|a, b| {
            let date = |p: &Value| match p["release_date"].as_str() {
                Some("N/A") | None => "1900-01-01".to_string(),
                Some(d) => d.to_string(),
            };
            date(a).cmp(&date(b))
        });

        let total = parts.len();
        Ok(json!({
            "tmdb_id": body["id"].as_u64().map_or_else(String::new, |i| i.to_string()),
            "name": body["name"].as_str().unwrap_or("N/A"),
            "overview": formats::non_empty_str(&body, "overview").unwrap_or("N/A"),
            "poster": formats::image_url("original", formats::non_empty_str(&body, "poster_path")),
            "backdrop": formats::image_url("w780", formats::non_empty_str(&body, "backdrop_path")),
            "parts": parts,
            "total_results": total,
        }))
    })
    .await
}

/// GET /api/tv/{tmdb_id}/seasons
pub async fn tv_seasons(
    State(state): State<Arc<AppState>>,
    Path(tmdb_id): Path<String>,
) -> Response {
    if let Err(resp) = require_valid_id(&tmdb_id, "Invalid TMDB ID") {
        return resp;
    }
    info!("Fetching seasons for TV TMDB ID: {tmdb_id}");

    let key = format!("tv_{tmdb_id}_seasons");
    let endpoint = format!("tv/{tmdb_id}/seasons");
    serve_cached(&state, key, endpoint, TTL_LONG, || async {
        let details = state
            .tmdb
            .details(MediaType::Tv, &tmdb_id)
            .await
            .map_err(|e| map_tmdb_error(&e, "tv_seasons", "TV show not found"))?;

        let seasons: Vec<Value> = details["seasons"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|season| {
                let number = season["season_number"].as_u64().unwrap_or(0);
                json!({
                    "season_number": number,
                    "name": formats::non_empty_str(season, "name")
                        .map_or_else(|| format!("Season {number}"), ToString::to_string),
                    "episode_count": season["episode_count"].as_u64().unwrap_or(0),
                    "air_date": formats::non_empty_str(season, "air_date").unwrap_or("N/A"),
                    "poster": formats::image_url(
                        "original",
                        formats::non_empty_str(season, "poster_path"),
                    ),
                    "overview": formats::non_empty_str(season, "overview").unwrap_or("N/A"),
                    "vote_average": match &season["vote_average"] {
                        Value::Number(n) => n.to_string(),
                        _ => "N/A".to_string(),
                    },
                })
            })
            .collect();

        let total = seasons.len();
        Ok(json!({
            "tmdb_id": tmdb_id,
            "title": details["name"].as_str().unwrap_or("N/A"),
            "total_seasons": total,
            "seasons": seasons,
        }))
    })
    .await
}

/// GET /api/tv/{tmdb_id}/season/{season_number}
pub async fn tv_season(
    State(state): State<Arc<AppState>>,
    Path((tmdb_id, season_number)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = require_valid_id(&tmdb_id, "Invalid TMDB ID") {
        return resp;
    }
    let season_number: u64 = match season_number.parse::<i64>() {
        Ok(n) if n >= 0 => n.unsigned_abs(),
        Ok(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Season number must be non-negative",
            )
        }
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid season number"),
    };
    info!("Fetching season {season_number} for TV TMDB ID: {tmdb_id}");

    let key = format!("tv_{tmdb_id}_season_{season_number}");
    let endpoint = format!("tv/{tmdb_id}/season/{season_number}");
    serve_cached(&state, key, endpoint, TTL_LONG, || async {
        let body = state
            .tmdb
            .season(&tmdb_id, season_number)
            .await
            .map_err(|e| map_tmdb_error(&e, "tv_season", "Season not found"))?;

        let episodes: Vec<Value> = body["episodes"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|ep| {
                json!({
                    "episode_number": ep["episode_number"].as_u64(),
                    "name": formats::non_empty_str(ep, "name").unwrap_or("N/A"),
                    "air_date": formats::non_empty_str(ep, "air_date").unwrap_or("N/A"),
                    "overview": formats::non_empty_str(ep, "overview").unwrap_or("N/A"),
                    "poster": formats::image_url(
                        "original",
                        formats::non_empty_str(ep, "still_path"),
                    ),
                    "vote_average": match &ep["vote_average"] {
                        Value::Number(n) => n.to_string(),
                        _ => "N/A".to_string(),
                    },
                    "runtime": ep["runtime"]
                        .as_u64()
                        .filter(|r| *r > 0)
                        .map_or_else(|| "N/A".to_string(), |r| format!("{r} min")),
                    "guest_stars": formats::list_to_str(ep["guest_stars"].as_array(), "name"),
                })
            })
            .collect();

        let total = episodes.len();
        Ok(json!({
            "season_number": season_number,
            "season_title": formats::non_empty_str(&body, "name")
                .map_or_else(|| format!("Season {season_number}"), ToString::to_string),
            "episodes": episodes,
            "total_episodes": total,
        }))
    })
    .await
}

/// Shared body of the paged list endpoints: fetch, light-format, envelope
async fn paged_list(
    state: &AppState,
    media: MediaType,
    page: u64,
    key: String,
    endpoint: String,
    fetch: impl Future<Output = Result<Value, TmdbError>>,
    context: &str,
) -> Response {
    serve_cached(state, key, endpoint, TTL_LIST, || async {
        let body = fetch
            .await
            .map_err(|e| map_tmdb_error(&e, context, "Not found"))?;

        let results: Vec<Value> = body["results"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|item| formats::format_media_light(item, media, &state.genres))
            .collect();

        let (total_results, total_pages) = formats::clamp_totals(&body);
        Ok(formats::page_envelope(
            results,
            page,
            total_pages,
            total_results,
        ))
    })
    .await
}

/// GET /api/{media_type}/popular?page=N
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Path(media_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let media = match parse_media_type(&media_type) {
        Ok(media) => media,
        Err(resp) => return resp,
    };
    let page = page_param(&params);
    info!("Fetching popular {media_type}s, page: {page}");

    paged_list(
        &state,
        media,
        page,
        format!("{media_type}_popular_page_{page}"),
        format!("{media_type}/popular/page/{page}"),
        state.tmdb.popular(media, page),
        "popular",
    )
    .await
}

/// GET /api/{media_type}/top_rated?page=N
pub async fn top_rated(
    State(state): State<Arc<AppState>>,
    Path(media_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let media = match parse_media_type(&media_type) {
        Ok(media) => media,
        Err(resp) => return resp,
    };
    let page = page_param(&params);
    info!("Fetching top-rated {media_type}s, page: {page}");

    paged_list(
        &state,
        media,
        page,
        format!("{media_type}_top_rated_page_{page}"),
        format!("{media_type}/top_rated/page/{page}"),
        state.tmdb.top_rated(media, page),
        "top_rated",
    )
    .await
}

/// GET /api/movie/upcoming?page=N
pub async fn movie_upcoming(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let page = page_param(&params);
    info!("Fetching upcoming movies, page: {page}");

    paged_list(
        &state,
        MediaType::Movie,
        page,
        format!("movie_upcoming_page_{page}"),
        format!("movie/upcoming/page/{page}"),
        state.tmdb.upcoming(page),
        "movie_upcoming",
    )
    .await
}

/// GET /api/tv/on_the_air?page=N
pub async fn tv_on_the_air(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let page = page_param(&params);
    info!("Fetching on the air TV shows, page: {page}");

    paged_list(
        &state,
        MediaType::Tv,
        page,
        format!("tv_on_the_air_page_{page}"),
        format!("tv/on_the_air/page/{page}"),
        state.tmdb.on_the_air(page),
        "tv_on_the_air",
    )
    .await
}

/// GET /api/{media_type}/trending?time_window=day|week&page=N
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Path(media_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let media = match parse_media_type(&media_type) {
        Ok(media) => media,
        Err(resp) => return resp,
    };
    let page = page_param(&params);
    let time_window = params
        .get("time_window")
        .map_or("week", String::as_str)
        .to_string();
    info!("Fetching trending {media_type}s, page: {page}, time_window: {time_window}");

    let key = format!("{media_type}_trending_{time_window}_page_{page}");
    let endpoint = format!("{media_type}/trending/{time_window}/page/{page}");
    serve_cached(&state, key, endpoint, TTL_LIST, || async {
        let body = match state.tmdb.trending(media, &time_window, page).await {
            Ok(body) => body,
            // A bad time window comes back as a TMDB client error; the
            // legacy gateway served an empty page for it.
            Err(TmdbError::NotFound | TmdbError::Api { .. }) => {
                warn!("No trending {}s found", media.as_str());
                return Ok(formats::empty_page(page));
            }
            Err(e) => return Err(map_tmdb_error(&e, "trending", "Not found")),
        };

        let results: Vec<Value> = body["results"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|item| formats::format_media_light(item, media, &state.genres))
            .collect();

        let (total_results, total_pages) = formats::clamp_totals(&body);
        Ok(formats::page_envelope(
            results,
            page,
            total_pages,
            total_results,
        ))
    })
    .await
}

/// Translate gateway discover parameters into TMDB query parameters
fn discover_params(media: MediaType, params: &HashMap<String, String>, page: u64) -> Vec<(String, String)> {
    let sort_by = formats::validate_sort_by(
        params.get("sort_by").map_or("popularity.desc", String::as_str),
    );
    let date_field = match media {
        MediaType::Movie => "primary_release_date",
        MediaType::Tv => "first_air_date",
    };

    let mut out = vec![
        ("page".to_string(), page.to_string()),
        (
            "sort_by".to_string(),
            sort_by.replace("release_date", date_field),
        ),
    ];
    if let Some(genre) = params.get("genre").filter(|v| !v.is_empty()) {
        out.push(("with_genres".to_string(), genre.clone()));
    }
    if let Some(year) = params.get("year").filter(|v| !v.is_empty()) {
        let year_field = match media {
            MediaType::Movie => "primary_release_year",
            MediaType::Tv => "first_air_date_year",
        };
        out.push((year_field.to_string(), year.clone()));
    }
    if let Some(country) = params.get("country").filter(|v| !v.is_empty()) {
        out.push(("with_origin_country".to_string(), country.to_uppercase()));
    }
    if let Some(language) = params.get("language").filter(|v| !v.is_empty()) {
        out.push(("with_original_language".to_string(), language.clone()));
    }
    for bound in ["vote_average.gte", "vote_average.lte"] {
        if let Some(value) = params
            .get(bound)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| *v != 0.0)
        {
            out.push((bound.to_string(), value.to_string()));
        }
    }
    out
}

/// GET /api/{media_type}/discover?...
pub async fn discover(
    State(state): State<Arc<AppState>>,
    Path(media_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let media = match parse_media_type(&media_type) {
        Ok(media) => media,
        Err(resp) => return resp,
    };
    let page = page_param(&params);
    let tmdb_params = discover_params(media, &params, page);
    info!("Discovering {media_type}s with filters: {tmdb_params:?}");

    // Deterministic cache key from the sorted raw query parameters
    let mut sorted: Vec<(&String, &String)> = params.iter().collect();
    sorted.sort();
    let query_repr: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    let key = format!("{media_type}_discover_{}", query_repr.join("&"));
    let endpoint = format!("{media_type}/discover");

    serve_cached(&state, key, endpoint, TTL_DISCOVER, || async {
        let body = state
            .tmdb
            .discover(media, &tmdb_params)
            .await
            .map_err(|e| map_tmdb_error(&e, "discover", "Not found"))?;

        let results: Vec<Value> = body["results"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|item| formats::format_media_light(item, media, &state.genres))
            .collect();

        let (total_results, total_pages) = formats::clamp_totals(&body);
        Ok(formats::page_envelope(
            results,
            page,
            total_pages,
            total_results,
        ))
    })
    .await
}
