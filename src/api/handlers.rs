//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use tokio::sync::Mutex;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{Clock, EntryStore};
use crate::config::Config;
use crate::engine::{Backend, EngineError, EngineResult};
use crate::error::{CacheError, Result};
use crate::models::{
    AllResponse, ClearResponse, DeleteResponse, EntryResponse, GetResponse, HealthResponse,
    KeysResponse, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
///
/// Every store operation may write to the engine (reads evict expired
/// entries), so the store sits behind a single mutex.
#[derive(Clone)]
pub struct AppState {
    /// Serialized access to the store
    pub store: Arc<Mutex<EntryStore<Backend>>>,
}

impl AppState {
    /// Creates a new AppState with the given store.
    pub fn new(store: EntryStore<Backend>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the configured engine; fails if a file engine directory cannot
    /// be created.
    pub fn from_config(config: &Config) -> EngineResult<Self> {
        let backend = config.open_backend()?;
        Ok(Self::new(EntryStore::new(backend)))
    }
}

/// Runs `op` against the locked store on the blocking thread pool.
///
/// The file engine does synchronous filesystem I/O, so store calls stay off
/// the async workers. The lock is held until `op` returns.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&mut EntryStore<Backend>) -> T + Send + 'static,
    T: Send + 'static,
{
    let mut store = state.store.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || op(&mut store))
        .await
        .map_err(|err| {
            tracing::error!("Store task failed: {}", err);
            CacheError::Engine(EngineError::Unavailable(format!("store task failed: {}", err)))
        })
}

/// Handler for PUT /set
///
/// Stores a value under a key with optional expiration and write protection.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let SetRequest {
        key,
        value,
        options,
    } = req;
    let key = with_store(&state, move |store| {
        store.try_set(&key, &value, options).map(|()| key)
    })
    .await??;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a live value by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let lookup = key.clone();
    let value = with_store(&state, move |store| store.get(&lookup))
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /entry/:key
///
/// Returns the value together with its metadata.
pub async fn entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    let lookup = key.clone();
    let (entry, now) = with_store(&state, move |store| {
        let now = store.clock().now();
        (store.read_raw(&lookup), now)
    })
    .await?;
    let entry = entry.ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(EntryResponse::new(key, entry, now)))
}

/// Handler for DELETE /del/:key
///
/// Deletes a key unless it is read-only. Deleting a missing key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let key = with_store(&state, move |store| store.try_remove(&key).map(|()| key)).await??;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /clear
///
/// Removes every entry, read-only ones included.
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    with_store(&state, |store| store.try_clear()).await??;

    Ok(Json(ClearResponse::new()))
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Result<Json<KeysResponse>> {
    let keys = with_store(&state, |store| store.keys()).await?;
    Ok(Json(KeysResponse { keys }))
}

/// Handler for GET /all
///
/// Returns every live value; expired entries found are evicted.
pub async fn all_handler(State(state): State<AppState>) -> Result<Json<AllResponse>> {
    let entries = with_store(&state, |store| store.get_all()).await?;
    Ok(Json(AllResponse { entries }))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store.lock().await;
    Json(HealthResponse::healthy(store.engine().name()))
}
