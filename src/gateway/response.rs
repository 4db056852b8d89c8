// Coffer: HTTP error envelope
//
// Every failure leaves the gateway as `{"status":"error","detail":"..."}`
// with a status code chosen by error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Json};
use serde::Serialize;
use thiserror::Error;

use super::dto::ValidationError;
use crate::auth::AuthError;
use crate::store::StoreError;
use crate::token::TokenError;

pub const STATUS_ERROR: &str = "error";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to decode model")]
    Decode,

    #[error("query parameter must be int")]
    InvalidId,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to create new token")]
    Token(#[from] TokenError),

    #[error("request timed out")]
    Timeout,

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Decode | ApiError::InvalidId => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Token(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: STATUS_ERROR,
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Turn an error raised by a tower middleware layer into the envelope.
pub async fn handle_layer_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("request timed out");
        ApiError::Timeout
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        ApiError::Internal
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Decode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(AuthError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(StoreError::NotFound(3)).status(),
            StatusCode::NOT_FOUND
        );
        for e in [StoreError::Transaction, StoreError::Read, StoreError::Write] {
            assert_eq!(ApiError::from(e).status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        assert_eq!(
            ApiError::from(TokenError::Signing("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let (status, json) = body_json(ApiError::from(StoreError::NotFound(3))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "detail": "vault not found"})
        );
    }

    #[tokio::test]
    async fn test_signing_detail_is_not_leaked() {
        let err = ApiError::from(TokenError::Signing("signing secret is empty".into()));
        let (_, json) = body_json(err).await;
        assert_eq!(json["detail"], "failed to create new token");
    }

    #[tokio::test]
    async fn test_unauthorized_detail() {
        let (status, json) = body_json(ApiError::from(AuthError::Unauthorized)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["detail"], "unauthorized");
    }

    #[tokio::test]
    async fn test_layer_errors_use_the_envelope() {
        let elapsed: BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let (status, json) = body_json(handle_layer_error(elapsed).await).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "detail": "request timed out"})
        );

        let other: BoxError = "layer exploded".into();
        let (status, json) = body_json(handle_layer_error(other).await).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["detail"], "internal server error");
    }
}
