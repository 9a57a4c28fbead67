/// Search suggestions
///
/// Starts from TMDB's multi search, tops it up with movie and TV searches
/// when it comes back thin, then re-ranks everything with the fuzzy matcher
/// so typos still surface the intended title.
use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::MediaType,
    services::{fuzzy::rank_candidates, proxy::MetadataProxy},
};

/// Below this many multi-search hits, movie and TV searches are merged in
const MIN_MULTI_RESULTS: usize = 10;
/// Number of suggestions returned
const SUGGESTION_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct SuggestParams {
    pub query: String,
    pub page: String,
    pub include_adult: String,
}

fn search_query(query: &str, page: &str, include_adult: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("query".to_string(), query.to_string()),
        ("page".to_string(), page.to_string()),
        ("include_adult".to_string(), include_adult.to_string()),
    ])
}

/// The `results` array of a TMDB list response
fn results_of(data: Value) -> Vec<Value> {
    match data {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(results)) => results,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn tag_media_type(mut item: Value, media_type: MediaType) -> Value {
    if let Value::Object(map) = &mut item {
        map.insert("media_type".to_string(), json!(media_type.as_str()));
    }
    item
}

/// Identity of a result across endpoints, e.g. `movie-550`
fn identity(item: &Value) -> String {
    format!(
        "{}-{}",
        item.get("media_type").and_then(Value::as_str).unwrap_or_default(),
        item.get("id").map(Value::to_string).unwrap_or_default()
    )
}

fn title_or_name(item: &Value) -> Option<&str> {
    ["title", "name"]
        .into_iter()
        .filter_map(|field| item.get(field).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// Appends `extra` items whose identity is not already present
fn merge_unique(results: &mut Vec<Value>, extra: Vec<Value>) {
    let mut seen: HashSet<String> = results.iter().map(identity).collect();
    for item in extra {
        if seen.insert(identity(&item)) {
            results.push(item);
        }
    }
}

/// Ranked suggestions for `params.query`; empty for a blank query
pub async fn suggest(proxy: &MetadataProxy, params: &SuggestParams) -> AppResult<Vec<Value>> {
    let query = params.query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let multi = proxy
        .fetch_resource(
            "search/multi",
            &search_query(query, &params.page, &params.include_adult),
        )
        .await?;
    let mut results = results_of(multi.data);

    if results.len() < MIN_MULTI_RESULTS {
        let first_page = search_query(query, "1", &params.include_adult);
        let (movies, tv) = tokio::join!(
            proxy.fetch_resource("search/movie", &first_page),
            proxy.fetch_resource("search/tv", &first_page),
        );

        let extra: Vec<Value> = results_of(movies?.data)
            .into_iter()
            .map(|item| tag_media_type(item, MediaType::Movie))
            .chain(
                results_of(tv?.data)
                    .into_iter()
                    .map(|item| tag_media_type(item, MediaType::Tv)),
            )
            .collect();
        merge_unique(&mut results, extra);
    }

    let ranked = rank_candidates(query, results, &[title_or_name]);

    tracing::info!(
        query = %query,
        results = ranked.len().min(SUGGESTION_LIMIT),
        "Search suggestions ranked"
    );

    Ok(ranked
        .into_iter()
        .take(SUGGESTION_LIMIT)
        .map(|ranked| ranked.item)
        .collect())
}
