// Coffer: HTTP handlers
//
// Store calls block on SQLite, so they run on the blocking pool. Each
// handler logs with an `op` field and the request's `x-request-id`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde_json::{json, Value};

use super::dto::{CreateTokenRequest, CreateVaultRequest};
use super::response::ApiError;
use super::AppState;
use crate::auth::{AuthError, AuthScope, ScopeKind};
use crate::store::{StoreError, Vault, VaultStore};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn create_vault(
    State(state): State<AppState>,
    Extension(scope): Extension<AuthScope>,
    headers: HeaderMap,
    payload: Result<Json<CreateVaultRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    const OP: &str = "root.create_vault";
    let request_id = request_id(&headers);
    ensure_root(scope, OP)?;

    let Json(model) = payload.map_err(|e| {
        tracing::error!(op = OP, request_id, error = %e, "failed to decode model");
        ApiError::Decode
    })?;
    model.validate().map_err(|e| {
        tracing::error!(op = OP, request_id, error = %e, "validate error");
        e
    })?;

    let vault = model.into_new_vault();
    let id = blocking(&state, move |store| store.create_vault(&vault)).await?;

    tracing::info!(op = OP, request_id, vault_id = id, "new vault successfully created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "new vault successfully created",
            "id": id,
        })),
    ))
}

pub async fn get_vault(
    State(state): State<AppState>,
    Extension(scope): Extension<AuthScope>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<Json<Vault>, ApiError> {
    const OP: &str = "root.get_vault";
    let request_id = request_id(&headers);
    ensure_root(scope, OP)?;

    let id: i64 = raw_id.parse().map_err(|_| {
        tracing::error!(op = OP, request_id, raw_id = %raw_id, "failed to convert id to integer");
        ApiError::InvalidId
    })?;

    let vault = blocking(&state, move |store| store.get_vault(id)).await?;

    tracing::info!(op = OP, request_id, vault_id = id, "vault read");

    Ok(Json(vault))
}

pub async fn create_token(
    State(state): State<AppState>,
    Extension(scope): Extension<AuthScope>,
    headers: HeaderMap,
    payload: Result<Json<CreateTokenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    const OP: &str = "root.create_token";
    let request_id = request_id(&headers);
    ensure_root(scope, OP)?;

    let Json(model) = payload.map_err(|e| {
        tracing::error!(op = OP, request_id, error = %e, "failed to decode model");
        ApiError::Decode
    })?;
    let now = chrono::Utc::now().timestamp();
    model.validate_at(now).map_err(|e| {
        tracing::error!(op = OP, request_id, error = %e, "validate error");
        e
    })?;

    let vault_id = model.vault_id;
    blocking(&state, move |store| store.check_vault(vault_id)).await?;

    let token = state.codec.issue_at(vault_id, model.expires, now).map_err(|e| {
        tracing::error!(op = OP, request_id, error = %e, "failed to create new token");
        ApiError::from(e)
    })?;

    tracing::info!(op = OP, request_id, vault_id, ttl_secs = model.expires, "vault token successfully created");

    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}

/// The vault id comes only from the admitted token.
pub async fn user_get_vault(
    State(state): State<AppState>,
    Extension(scope): Extension<AuthScope>,
    headers: HeaderMap,
) -> Result<Json<Vault>, ApiError> {
    const OP: &str = "user.get_vault";
    let request_id = request_id(&headers);

    let id = scope.vault_id().ok_or_else(|| {
        tracing::error!(op = OP, request_id, "request scope carries no vault id");
        ApiError::Internal
    })?;

    let vault = blocking(&state, move |store| store.get_vault(id)).await?;

    tracing::info!(op = OP, request_id, vault_id = id, "vault read");

    Ok(Json(vault))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn ensure_root(scope: AuthScope, op: &'static str) -> Result<(), ApiError> {
    if scope.kind() == ScopeKind::Root {
        Ok(())
    } else {
        tracing::error!(op, "non-root scope reached a root route");
        Err(AuthError::Unauthorized.into())
    }
}

/// Run a store operation on the blocking pool.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&(dyn VaultStore + Send + Sync)) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    let result = tokio::task::spawn_blocking(move || f(&*store))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "store task failed");
            ApiError::Internal
        })?;
    Ok(result?)
}
