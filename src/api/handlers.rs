//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::PriorityCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CapacityRequest, CapacityResponse, DeleteResponse, GetResponse, HealthResponse, KeysResponse,
    SetRequest, SetResponse, StatsResponse,
};

/// Cache shared between handlers and background tasks.
///
/// The engine has no internal synchronization, so every operation holds the
/// write lock for its whole duration.
pub type SharedCache = Arc<RwLock<PriorityCache<String>>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache
    pub cache: SharedCache,
    /// Priority applied when a request omits one
    pub default_priority: i64,
    /// TTL in seconds applied when a request omits one
    pub default_ttl: u64,
}

impl AppState {
    /// Creates a new AppState around `cache` with the given request defaults.
    pub fn new(cache: PriorityCache<String>, default_priority: i64, default_ttl: u64) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            default_priority,
            default_ttl,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = PriorityCache::new(config.max_items);
        Self::new(cache, config.default_priority, config.default_ttl)
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair with optional priority and TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let priority = req.priority.unwrap_or(state.default_priority);
    let ttl = Duration::from_secs(req.ttl.unwrap_or(state.default_ttl));

    let mut cache = state.cache.write().await;
    cache.set(req.key.clone(), req.value, priority, ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: a hit refreshes the access time
    let mut cache = state.cache.write().await;
    match cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    if cache.remove(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for PUT /capacity
///
/// Changes the capacity bound, evicting entries if the cache no longer fits.
/// A negative bound empties the cache.
pub async fn capacity_handler(
    State(state): State<AppState>,
    Json(req): Json<CapacityRequest>,
) -> Json<CapacityResponse> {
    let max_items = req.capacity();
    let mut cache = state.cache.write().await;
    let before = cache.len();
    cache.set_max_items(max_items);

    if cache.len() < before {
        info!(
            "Capacity set to {}: evicted {} entries",
            max_items,
            before - cache.len()
        );
    }

    Json(CapacityResponse {
        max_items: cache.max_items(),
        total_entries: cache.len(),
    })
}

/// Handler for GET /keys
///
/// Lists the keys currently held, sorted.
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let cache = state.cache.read().await;
    Json(KeysResponse { keys: cache.keys() })
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::new(&cache.stats(), cache.max_items()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state(max_items: usize) -> AppState {
        AppState::new(PriorityCache::new(max_items), 0, 300)
    }

    fn set_request(key: &str, value: &str, priority: Option<i64>) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value: value.to_string(),
            priority,
            ttl: None,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state(100);

        let req = set_request("test_key", "test_value", None);
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let result = get_handler(State(state.clone()), Path("test_key".to_string())).await;
        let response = result.unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state(100);

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state(100);

        let req = set_request("to_delete", "value", None);
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = get_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_err());

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_capacity_handler_evicts_lowest_priority() {
        let state = test_state(100);

        for (key, priority) in [("a", 5), ("b", 1), ("c", 9)] {
            let req = set_request(key, "v", Some(priority));
            set_handler(State(state.clone()), Json(req)).await.unwrap();
        }

        let response = capacity_handler(
            State(state.clone()),
            Json(CapacityRequest { max_items: 2 }),
        )
        .await;
        assert_eq!(response.max_items, 2);
        assert_eq!(response.total_entries, 2);

        let keys = keys_handler(State(state)).await;
        assert_eq!(keys.keys, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_capacity_handler_negative_empties_cache() {
        let state = test_state(100);

        let req = set_request("a", "v", Some(5));
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let response = capacity_handler(
            State(state.clone()),
            Json(CapacityRequest { max_items: -3 }),
        )
        .await;
        assert_eq!(response.max_items, 0);
        assert_eq!(response.total_entries, 0);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state(100);

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.max_items, 100);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state(100);

        let req = set_request("", "value", None);
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
