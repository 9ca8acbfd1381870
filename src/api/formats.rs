//! Response shaping for gateway endpoints
//!
//! Ports the legacy gateway's formatting rules: image URL sizes, "N/A"
//! placeholders, year extraction, comma-joined name lists and the light vs.
//! full media payloads.

use super::genres::GenreCache;
use crate::tmdb::{MediaType, MAX_TMDB_PAGES, MAX_TMDB_RESULTS};
use lazy_regex::lazy_regex;
use serde_json::{json, Value};

/// Base URL for TMDB-hosted images
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Match all-digit TMDB ids
static RE_TMDB_ID: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"^\d+$");

const VALID_SORT_OPTIONS: &[&str] = &[
    "popularity.desc",
    "popularity.asc",
    "vote_average.desc",
    "vote_average.asc",
    "release_date.desc",
    "release_date.asc",
];

/// Whether a path id is a well-formed TMDB id
#[must_use]
pub fn validate_id(id: &str) -> bool {
    RE_TMDB_ID.is_match(id)
}

/// Clamp a `sort_by` parameter to the whitelist, defaulting to
/// `popularity.desc`
#[must_use]
pub fn validate_sort_by(sort_by: &str) -> &str {
    if VALID_SORT_OPTIONS.contains(&sort_by) {
        sort_by
    } else {
        "popularity.desc"
    }
}

/// Build an image URL, or "" when the path is absent
#[must_use]
pub fn image_url(size: &str, path: Option<&str>) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{IMAGE_BASE_URL}/{size}{p}"),
        _ => String::new(),
    }
}

/// A string field, treating empty strings and null as absent
#[must_use]
pub fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value[key].as_str().filter(|s| !s.is_empty())
}

fn str_or_na(value: &Value, key: &str) -> String {
    non_empty_str(value, key)
        .unwrap_or("N/A")
        .to_string()
}

/// The year portion of a date string, or "N/A"
#[must_use]
pub fn year_of(date: Option<&str>) -> String {
    date.and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

/// Release date for movies, first air date for TV, whichever is present
fn release_date_of(value: &Value) -> Option<&str> {
    non_empty_str(value, "release_date").or_else(|| non_empty_str(value, "first_air_date"))
}

/// `vote_average` rendered as a string, or "N/A"
fn rating_of(value: &Value) -> String {
    match &value["vote_average"] {
        Value::Number(n) => n.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Join up to 10 `key` fields from an object array with ", ", or "N/A"
#[must_use]
pub fn list_to_str(items: Option<&Vec<Value>>, key: &str) -> String {
    let names: Vec<&str> = items
        .into_iter()
        .flatten()
        .take(10)
        .filter_map(|item| non_empty_str(item, key))
        .collect();
    if names.is_empty() {
        "N/A".to_string()
    } else {
        names.join(", ")
    }
}

/// First YouTube trailer URL from a videos payload, or "N/A"
#[must_use]
pub fn trailer_url(videos: Option<&Value>) -> String {
    videos
        .and_then(|v| v["results"].as_array())
        .into_iter()
        .flatten()
        .find(|video| video["type"] == "Trailer" && video["site"] == "YouTube")
        .and_then(|video| video["key"].as_str())
        .map_or_else(
            || "N/A".to_string(),
            |key| format!("https://www.youtube.com/watch?v={key}"),
        )
}

/// US certification from a `release_dates` (movie) or `content_ratings`
/// (TV) payload, or "N/A"
#[must_use]
pub fn us_certification(certifications: Option<&Value>, media: MediaType) -> String {
    let Some(results) = certifications.and_then(|c| c["results"].as_array()) else {
        return "N/A".to_string();
    };
    let us = results.iter().find(|entry| entry["iso_3166_1"] == "US");
    let rating = match media {
        MediaType::Movie => us
            .and_then(|entry| entry["release_dates"].as_array())
            .and_then(|dates| dates.first())
            .and_then(|date| non_empty_str(date, "certification"))
            .map(ToString::to_string),
        MediaType::Tv => us
            .and_then(|entry| non_empty_str(entry, "rating"))
            .map(ToString::to_string),
    };
    rating.unwrap_or_else(|| "N/A".to_string())
}

/// Director for the full payload: first crew member with job "Director",
/// falling back to the creator list for TV
fn director_of(details: &Value, credits: Option<&Value>, media: MediaType) -> Value {
    let from_crew = credits
        .and_then(|c| c["crew"].as_array())
        .into_iter()
        .flatten()
        .find(|person| person["job"] == "Director")
        .and_then(|person| person["name"].as_str());

    match (from_crew, media) {
        (Some(name), _) => Value::String(name.to_string()),
        (None, MediaType::Tv) => {
            Value::String(list_to_str(details["created_by"].as_array(), "name"))
        }
        (None, MediaType::Movie) => Value::Null,
    }
}

/// Full single-title payload served by `/{media_type}/{tmdb_id}`
#[must_use]
pub fn format_media(
    details: &Value,
    credits: Option<&Value>,
    videos: Option<&Value>,
    certifications: Option<&Value>,
    media: MediaType,
) -> Value {
    let id = details["id"].as_u64().unwrap_or_default();
    let title = non_empty_str(details, "title")
        .or_else(|| non_empty_str(details, "name"))
        .unwrap_or("N/A");
    let release_date = release_date_of(details);

    let cast = credits.map_or_else(
        || "N/A".to_string(),
        |c| list_to_str(c["cast"].as_array(), "name"),
    );

    let runtime = details["runtime"]
        .as_u64()
        .filter(|r| *r > 0)
        .map_or_else(|| "N/A".to_string(), |r| format!("{r} min"));

    let mut result = json!({
        "title": title,
        "poster": image_url("original", non_empty_str(details, "poster_path")),
        "backdrop": image_url("w780", non_empty_str(details, "backdrop_path")),
        "year": year_of(release_date),
        "rating": rating_of(details),
        "vote_count": details["vote_count"].as_u64().unwrap_or(0),
        "popularity": details["popularity"].as_f64().unwrap_or(0.0),
        "content_rating": us_certification(certifications, media),
        "genres": list_to_str(details["genres"].as_array(), "name"),
        "runtime": runtime,
        "director": director_of(details, credits, media),
        "cast": cast,
        "languages": list_to_str(details["spoken_languages"].as_array(), "english_name"),
        "countries": list_to_str(details["production_countries"].as_array(), "name"),
        "production_companies": list_to_str(details["production_companies"].as_array(), "name"),
        "status": str_or_na(details, "status"),
        "tagline": str_or_na(details, "tagline"),
        "release_date": release_date.unwrap_or("N/A"),
        "plot": str_or_na(details, "overview"),
        "trailer": trailer_url(videos),
        "url": format!("https://www.themoviedb.org/{}/{id}", media.as_str()),
        "tmdb_id": id.to_string(),
        "imdb_id": details["imdb_id"].as_str().unwrap_or(""),
        "media_type": media.as_str(),
    });

    match media {
        MediaType::Movie => {
            result["budget"] = json!(details["budget"].as_u64().unwrap_or(0));
            result["revenue"] = json!(details["revenue"].as_u64().unwrap_or(0));
            if let Some(collection) = details["belongs_to_collection"].as_object() {
                let coll = Value::Object(collection.clone());
                result["collection"] = json!({
                    "id": coll["id"].as_u64().map_or_else(String::new, |i| i.to_string()),
                    "name": str_or_na(&coll, "name"),
                    "poster": image_url("original", non_empty_str(&coll, "poster_path")),
                });
            }
        }
        MediaType::Tv => {
            result["networks"] = json!(list_to_str(details["networks"].as_array(), "name"));
            result["number_of_seasons"] =
                json!(details["number_of_seasons"].as_u64().unwrap_or(0));
            result["number_of_episodes"] =
                json!(details["number_of_episodes"].as_u64().unwrap_or(0));
        }
    }

    result
}

/// Light list-entry payload used by search, discover and the paged lists
#[must_use]
pub fn format_media_light(item: &Value, media: MediaType, genres: &GenreCache) -> Value {
    let id = item["id"].as_u64().unwrap_or_default();
    let title = non_empty_str(item, "title")
        .or_else(|| non_empty_str(item, "name"))
        .unwrap_or("N/A");
    let release_date = release_date_of(item);

    let resolved = genres.resolve(media, item["genre_ids"].as_array());
    let genre_names = if resolved.is_empty() {
        "N/A".to_string()
    } else {
        resolved.join(", ")
    };

    let mut result = json!({
        "title": title,
        "poster": image_url("original", non_empty_str(item, "poster_path")),
        "backdrop": image_url("w780", non_empty_str(item, "backdrop_path")),
        "year": year_of(release_date),
        "rating": rating_of(item),
        "vote_count": item["vote_count"].as_u64().unwrap_or(0),
        "popularity": item["popularity"].as_f64().unwrap_or(0.0),
        "genres": genre_names,
        "plot": str_or_na(item, "overview"),
        "release_date": release_date.unwrap_or("N/A"),
        "url": format!("https://www.themoviedb.org/{}/{id}", media.as_str()),
        "tmdb_id": id.to_string(),
        "media_type": media.as_str(),
    });

    if media == MediaType::Tv {
        let countries: Vec<&str> = item["origin_country"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        result["origin_country"] = json!(if countries.is_empty() {
            "N/A".to_string()
        } else {
            countries.join(", ")
        });
    }

    result
}

/// Person payload served by `/person/{person_id}`
#[must_use]
pub fn format_person(person: &Value) -> Value {
    json!({
        "person_id": person["id"].as_u64().map_or_else(String::new, |i| i.to_string()),
        "name": str_or_na(person, "name"),
        "birthday": str_or_na(person, "birthday"),
        "biography": str_or_na(person, "biography"),
        "profile_path": image_url("w185", non_empty_str(person, "profile_path")),
        "known_for_department": str_or_na(person, "known_for_department"),
    })
}

/// Cast entry for the `/credits` endpoint
#[must_use]
pub fn format_cast_member(person: &Value) -> Value {
    json!({
        "name": str_or_na(person, "name"),
        "character": str_or_na(person, "character"),
        "tmdb_id": person["id"].as_u64().map_or_else(String::new, |i| i.to_string()),
        "profile_path": image_url("w185", non_empty_str(person, "profile_path")),
        "known_for_department": str_or_na(person, "known_for_department"),
    })
}

/// Director entry for the `/credits` endpoint; `department` is "Creator"
/// for the TV created-by fallback
#[must_use]
pub fn format_director(person: &Value, department: Option<&str>) -> Value {
    json!({
        "name": str_or_na(person, "name"),
        "tmdb_id": person["id"].as_u64().map_or_else(String::new, |i| i.to_string()),
        "profile_path": image_url("w185", non_empty_str(person, "profile_path")),
        "department": department.map_or_else(|| str_or_na(person, "department"), ToString::to_string),
        "known_for_department": str_or_na(person, "known_for_department"),
    })
}

/// One combined-credits entry; returns `None` for non movie/tv credits
#[must_use]
pub fn format_combined_credit(item: &Value, role: &str) -> Option<Value> {
    let media = MediaType::parse(item["media_type"].as_str()?)?;
    let id = item["id"].as_u64()?;
    let title = non_empty_str(item, "title")
        .or_else(|| non_empty_str(item, "name"))
        .unwrap_or("N/A");
    let release_date = release_date_of(item);

    let mut credit = json!({
        "title": title,
        "media_type": media.as_str(),
        "tmdb_id": id.to_string(),
        "poster": image_url("original", non_empty_str(item, "poster_path")),
        "backdrop": image_url("w780", non_empty_str(item, "backdrop_path")),
        "role": role,
        "release_date": release_date.unwrap_or("N/A"),
        "year": year_of(release_date),
        "vote_average": rating_of(item),
        "vote_count": item["vote_count"].as_u64().unwrap_or(0),
        "popularity": item["popularity"].as_f64().unwrap_or(0.0),
    });
    if role == "cast" {
        credit["character"] = json!(str_or_na(item, "character"));
    } else {
        credit["job"] = json!(str_or_na(item, "job"));
    }
    Some(credit)
}

/// Collection part in light-movie shape (genres via the movie genre map)
#[must_use]
pub fn format_collection_part(part: &Value, genres: &GenreCache) -> Value {
    let id = part["id"].as_u64().unwrap_or_default();
    let release_date = non_empty_str(part, "release_date");

    let resolved = genres.resolve(MediaType::Movie, part["genre_ids"].as_array());
    let genre_names = if resolved.is_empty() {
        "N/A".to_string()
    } else {
        resolved.join(", ")
    };

    json!({
        "title": str_or_na(part, "title"),
        "poster": image_url("original", non_empty_str(part, "poster_path")),
        "backdrop": image_url("w780", non_empty_str(part, "backdrop_path")),
        "year": year_of(release_date),
        "rating": rating_of(part),
        "vote_count": part["vote_count"].as_u64().unwrap_or(0),
        "popularity": part["popularity"].as_f64().unwrap_or(0.0),
        "genres": genre_names,
        "plot": str_or_na(part, "overview"),
        "release_date": release_date.unwrap_or("N/A"),
        "url": format!("https://www.themoviedb.org/movie/{id}"),
        "tmdb_id": id.to_string(),
        "media_type": "movie",
    })
}

/// Totals from a TMDB list page, clamped to the API's hard maxima
#[must_use]
pub fn clamp_totals(page_body: &Value) -> (u64, u64) {
    let total_results = page_body["total_results"]
        .as_u64()
        .unwrap_or(0)
        .min(MAX_TMDB_RESULTS);
    let total_pages = page_body["total_pages"]
        .as_u64()
        .unwrap_or(1)
        .min(MAX_TMDB_PAGES);
    (total_results, total_pages)
}

/// Standard paged envelope: `{"results", "page": "N of M", totals}`
#[must_use]
pub fn page_envelope(results: Vec<Value>, page: u64, total_pages: u64, total_results: u64) -> Value {
    json!({
        "results": results,
        "page": format!("{page} of {total_pages}"),
        "total_results": total_results,
        "total_pages": total_pages,
    })
}

/// Empty first page, served when upstream reports nothing
#[must_use]
pub fn empty_page(page: u64) -> Value {
    page_envelope(Vec::new(), page, 1, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_validation() {
        assert!(validate_id("603"));
        assert!(validate_id("0"));
        assert!(!validate_id(""));
        assert!(!validate_id("60a3"));
        assert!(!validate_id("-1"));
    }

    #[test]
    fn sort_by_whitelist() {
        assert_eq!(validate_sort_by("vote_average.asc"), "vote_average.asc");
        assert_eq!(validate_sort_by("runtime.desc"), "popularity.desc");
        assert_eq!(validate_sort_by(""), "popularity.desc");
    }

    #[test]
    fn image_urls() {
        assert_eq!(
            image_url("original", Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/original/abc.jpg"
        );
        assert_eq!(image_url("w780", None), "");
        assert_eq!(image_url("w185", Some("")), "");
    }

    #[test]
    fn year_extraction() {
        assert_eq!(year_of(Some("1999-03-31")), "1999");
        assert_eq!(year_of(Some("")), "N/A");
        assert_eq!(year_of(None), "N/A");
    }

    #[test]
    fn list_to_str_caps_at_ten() {
        let items: Vec<Value> = (0..15).map(|i| json!({"name": format!("G{i}")})).collect();
        let joined = list_to_str(Some(&items), "name");
        assert_eq!(joined.split(", ").count(), 10);
        assert!(joined.starts_with("G0"));

        assert_eq!(list_to_str(None, "name"), "N/A");
        assert_eq!(list_to_str(Some(&Vec::new()), "name"), "N/A");
    }

    #[test]
    fn trailer_picks_youtube_trailer() {
        let videos = json!({"results": [
            {"type": "Teaser", "site": "YouTube", "key": "teaser"},
            {"type": "Trailer", "site": "Vimeo", "key": "vimeo"},
            {"type": "Trailer", "site": "YouTube", "key": "abc123"},
        ]});
        assert_eq!(
            trailer_url(Some(&videos)),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert_eq!(trailer_url(None), "N/A");
    }

    #[test]
    fn us_certification_movie_and_tv() {
        let movie = json!({"results": [
            {"iso_3166_1": "DE", "release_dates": [{"certification": "12"}]},
            {"iso_3166_1": "US", "release_dates": [{"certification": "R"}]},
        ]});
        assert_eq!(us_certification(Some(&movie), MediaType::Movie), "R");

        let tv = json!({"results": [{"iso_3166_1": "US", "rating": "TV-MA"}]});
        assert_eq!(us_certification(Some(&tv), MediaType::Tv), "TV-MA");

        assert_eq!(us_certification(None, MediaType::Movie), "N/A");
        let empty_cert = json!({"results": [{"iso_3166_1": "US", "release_dates": [{"certification": ""}]}]});
        assert_eq!(us_certification(Some(&empty_cert), MediaType::Movie), "N/A");
    }

    #[test]
    fn full_movie_payload() {
        let details = json!({
            "id": 603,
            "title": "The Matrix",
            "poster_path": "/p.jpg",
            "release_date": "1999-03-31",
            "vote_average": 8.2,
            "vote_count": 26000,
            "popularity": 85.5,
            "genres": [{"name": "Action"}, {"name": "Science Fiction"}],
            "runtime": 136,
            "spoken_languages": [{"english_name": "English"}],
            "production_countries": [{"name": "United States of America"}],
            "production_companies": [{"name": "Warner Bros."}],
            "status": "Released",
            "tagline": "Welcome to the Real World.",
            "overview": "A hacker learns the truth.",
            "imdb_id": "tt0133093",
            "budget": 63_000_000u64,
            "revenue": 463_517_383u64,
            "belongs_to_collection": {"id": 2344, "name": "The Matrix Collection", "poster_path": "/c.jpg"},
        });
        let credits = json!({
            "cast": [{"name": "Keanu Reeves"}, {"name": "Laurence Fishburne"}],
            "crew": [{"name": "Lana Wachowski", "job": "Director"}],
        });

        let media = format_media(&details, Some(&credits), None, None, MediaType::Movie);
        assert_eq!(media["title"], "The Matrix");
        assert_eq!(media["year"], "1999");
        assert_eq!(media["rating"], "8.2");
        assert_eq!(media["runtime"], "136 min");
        assert_eq!(media["director"], "Lana Wachowski");
        assert_eq!(media["cast"], "Keanu Reeves, Laurence Fishburne");
        assert_eq!(media["genres"], "Action, Science Fiction");
        assert_eq!(media["trailer"], "N/A");
        assert_eq!(media["tmdb_id"], "603");
        assert_eq!(media["url"], "https://www.themoviedb.org/movie/603");
        assert_eq!(media["budget"], 63_000_000u64);
        assert_eq!(media["collection"]["id"], "2344");
        assert_eq!(media["collection"]["poster"], "https://image.tmdb.org/t/p/original/c.jpg");
    }

    #[test]
    fn tv_payload_falls_back_to_creators() {
        let details = json!({
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "created_by": [{"name": "Vince Gilligan"}],
            "networks": [{"name": "AMC"}],
            "number_of_seasons": 5,
            "number_of_episodes": 62,
        });
        let credits = json!({"cast": [], "crew": []});

        let media = format_media(&details, Some(&credits), None, None, MediaType::Tv);
        assert_eq!(media["title"], "Breaking Bad");
        assert_eq!(media["director"], "Vince Gilligan");
        assert_eq!(media["networks"], "AMC");
        assert_eq!(media["number_of_seasons"], 5);
        assert_eq!(media["runtime"], "N/A");
        assert!(media.get("budget").is_none());
    }

    #[test]
    fn light_payload_resolves_genres() {
        let genres = GenreCache::with_entries(&[(28, "Action")], &[]);
        let item = json!({
            "id": 603,
            "title": "The Matrix",
            "genre_ids": [28, 999],
            "release_date": "1999-03-31",
            "vote_average": 8.2,
        });
        let light = format_media_light(&item, MediaType::Movie, &genres);
        assert_eq!(light["genres"], "Action");
        assert_eq!(light["year"], "1999");
        assert!(light.get("origin_country").is_none());
    }

    #[test]
    fn light_tv_payload_has_origin_country() {
        let genres = GenreCache::empty();
        let item = json!({"id": 1, "name": "Show", "origin_country": ["US", "GB"]});
        let light = format_media_light(&item, MediaType::Tv, &genres);
        assert_eq!(light["origin_country"], "US, GB");
        assert_eq!(light["genres"], "N/A");
    }

    #[test]
    fn combined_credit_roles() {
        let cast_item = json!({
            "media_type": "movie", "id": 603, "title": "The Matrix",
            "character": "Neo", "popularity": 80.0,
        });
        let credit = format_combined_credit(&cast_item, "cast").expect("movie credit");
        assert_eq!(credit["character"], "Neo");
        assert!(credit.get("job").is_none());

        let crew_item = json!({
            "media_type": "tv", "id": 1396, "name": "Breaking Bad", "job": "Producer",
        });
        let credit = format_combined_credit(&crew_item, "crew").expect("tv credit");
        assert_eq!(credit["job"], "Producer");

        let person_item = json!({"media_type": "person", "id": 1});
        assert!(format_combined_credit(&person_item, "cast").is_none());
    }

    #[test]
    fn totals_are_clamped() {
        let body = json!({"total_results": 250_000, "total_pages": 12_500});
        assert_eq!(clamp_totals(&body), (10_000, 500));

        let body = json!({"total_results": 40, "total_pages": 2});
        assert_eq!(clamp_totals(&body), (40, 2));
    }

    #[test]
    fn page_envelope_shape() {
        let envelope = page_envelope(vec![json!({"t": 1})], 2, 10, 200);
        assert_eq!(envelope["page"], "2 of 10");
        assert_eq!(envelope["total_pages"], 10);

        let empty = empty_page(1);
        assert_eq!(empty["page"], "1 of 1");
        assert_eq!(empty["results"].as_array().map(Vec::len), Some(0));
    }
}
