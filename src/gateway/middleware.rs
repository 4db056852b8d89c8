// Coffer: gate middleware
//
// Runs the route group's gate once per request and, on success, stores the
// resulting `AuthScope` as a typed request extension for the handler.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use super::response::ApiError;
use super::AppState;
use crate::auth::Gate;

pub async fn require_root(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    admit(&*state.root_gate, request, next).await
}

pub async fn require_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    admit(&*state.user_gate, request, next).await
}

async fn admit(gate: &dyn Gate, mut request: Request, next: Next) -> Result<Response, ApiError> {
    // A header that is not valid UTF-8 is treated as absent.
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let scope = gate.authorize(header)?;
    request.extensions_mut().insert(scope);

    Ok(next.run(request).await)
}
