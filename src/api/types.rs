//! Shared state and extractors for the API layer.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};
use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::config::AppConfig;
use crate::db::{DatabaseError, Store};

/// Shared context for all API routes, provided via `with_state`.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Store,
    pub config: Arc<AppConfig>,
}

impl ApiContext {
    pub fn new(store: Store, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Run `f` against the locked connection on the blocking pool.
    pub async fn with_conn<T, E, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        E: Into<ApiError> + From<DatabaseError> + Send + 'static,
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store.lock().map_err(E::from)?;
            f(&conn)
        })
        .await?
        .map_err(Into::into)
    }

    /// Run `f` with the store and config on the blocking pool; used where
    /// the work takes and releases the lock itself.
    pub async fn blocking<T, E, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        E: Into<ApiError> + Send + 'static,
        F: FnOnce(&Store, &AppConfig) -> Result<T, E> + Send + 'static,
    {
        let store = self.store.clone();
        let config = Arc::clone(&self.config);
        tokio::task::spawn_blocking(move || f(&store, &config))
            .await?
            .map_err(Into::into)
    }
}

/// `Json` whose rejections come back as `{"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections come back as `{"error": ...}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` whose rejections come back as `{"error": ...}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
