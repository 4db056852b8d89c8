// Coffer: HTTP gateway
//
// axum router over the vault store. `/root/*` routes pass the root gate,
// `/user/*` routes pass the user gate. Handlers receive the admitted
// `AuthScope` as a typed extension.

mod dto;
mod handlers;
mod middleware;
mod response;
mod server;

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::routing::{get, post};
use axum::Router;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{RootGate, UserGate};
use crate::store::VaultStore;
use crate::token::TokenCodec;

pub use dto::{CreateTokenRequest, CreateVaultRequest, ValidationError};
pub use response::{ApiError, ErrorBody};
pub use server::HttpServer;

/// Shared state threaded through the middleware and handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VaultStore + Send + Sync>,
    pub codec: Arc<TokenCodec>,
    pub root_gate: Arc<RootGate>,
    pub user_gate: Arc<UserGate>,
}

impl AppState {
    pub fn new(store: Arc<dyn VaultStore + Send + Sync>, root_token: &str, secret: &[u8]) -> Self {
        let codec = Arc::new(TokenCodec::new(secret));
        Self {
            store,
            root_gate: Arc::new(RootGate::new(root_token)),
            user_gate: Arc::new(UserGate::new(Arc::clone(&codec))),
            codec,
        }
    }
}

/// Build the complete router.
///
/// ```text
/// POST /root/create        root  create a vault
/// GET  /root/get/:id       root  read any vault
/// POST /root/create-token  root  issue a vault token
/// GET  /user/get           user  read the token's vault
/// ```
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let root = Router::new()
        .route("/create", post(handlers::create_vault))
        .route("/get/:id", get(handlers::get_vault))
        .route("/create-token", post(handlers::create_token))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_root,
        ));

    let user = Router::new()
        .route("/get", get(handlers::user_get_vault))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_user,
        ));

    let app = Router::new().nest("/root", root).nest("/user", user);

    // Layers run outermost-last: the request id is assigned before anything
    // else sees the request.
    with_request_timeout(app, request_timeout)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Bound each request by `timeout`. An elapsed request gets a 408 in the
/// error envelope.
fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(response::handle_layer_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::store::{Database, SqlVaultStore};

    const ROOT_TOKEN: &str = "root-token";
    const SECRET: &[u8] = b"http-test-secret";

    fn app() -> (Router, AppState) {
        let store = SqlVaultStore::new(Database::open_in_memory().unwrap());
        let state = AppState::new(Arc::new(store), ROOT_TOKEN, SECRET);
        (router(state.clone(), Duration::from_secs(5)), state)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn root() -> Option<&'static str> {
        Some("Bearer root-token")
    }

    #[tokio::test]
    async fn test_end_to_end_flow() {
        let (app, state) = app();

        let (status, body) = send(
            &app,
            "POST",
            "/root/create",
            root(),
            Some(r#"{"name":"db","data":{"user":"alice"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"message": "new vault successfully created", "id": 1}));

        let (status, body) = send(&app, "GET", "/root/get/1", root(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": 1, "name": "db", "data": {"user": "alice"}}));

        let (status, body) = send(
            &app,
            "POST",
            "/root/create-token",
            root(),
            Some(r#"{"vault_id":1,"expires":60}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = body["token"].as_str().unwrap().to_string();

        let now = chrono::Utc::now().timestamp();
        assert_eq!(state.codec.validate_at(&token, now + 30).unwrap(), 1);
        assert!(state.codec.validate_at(&token, now + 61).is_err());

        let bearer = format!("Bearer {}", token);
        let (status, body) = send(&app, "GET", "/user/get", Some(bearer.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": 1, "name": "db", "data": {"user": "alice"}}));
    }

    #[tokio::test]
    async fn test_root_routes_require_root_token() {
        let (app, _) = app();
        for auth in [None, Some("Bearer wrong"), Some("Bearer ")] {
            let (status, body) = send(&app, "GET", "/root/get/1", auth, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({"status": "error", "detail": "unauthorized"}));
        }

        let (status, _) = send(
            &app,
            "POST",
            "/root/create",
            Some("Bearer wrong"),
            Some(r#"{"name":"db","data":{"user":"alice"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_vault_token_cannot_use_root_routes() {
        let (app, state) = app();
        send(&app, "POST", "/root/create", root(), Some(r#"{"name":"db","data":{"k":"v"}}"#)).await;

        let token = state.codec.issue(1, 60).unwrap();
        let bearer = format!("Bearer {}", token);
        let (status, _) = send(&app, "GET", "/root/get/1", Some(bearer.as_str()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_root_token_cannot_use_user_routes() {
        let (app, _) = app();
        let (status, _) = send(&app, "GET", "/user/get", root(), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_route_is_bound_to_token_vault() {
        let (app, state) = app();
        send(&app, "POST", "/root/create", root(), Some(r#"{"name":"a","data":{"k":"from-a"}}"#)).await;
        send(&app, "POST", "/root/create", root(), Some(r#"{"name":"b","data":{"k":"from-b"}}"#)).await;

        let token = state.codec.issue(2, 60).unwrap();
        let bearer = format!("Bearer {}", token);
        let (status, body) = send(&app, "GET", "/user/get?id=1", Some(bearer.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 2);
        assert_eq!(body["data"]["k"], "from-b");
    }

    #[tokio::test]
    async fn test_not_found() {
        let (app, state) = app();
        let (status, body) = send(&app, "GET", "/root/get/42", root(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"status": "error", "detail": "vault not found"}));

        let (status, _) = send(
            &app,
            "POST",
            "/root/create-token",
            root(),
            Some(r#"{"vault_id":42,"expires":60}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // A valid token for a vault that does not exist.
        let token = state.codec.issue(42, 60).unwrap();
        let bearer = format!("Bearer {}", token);
        let (status, _) = send(&app, "GET", "/user/get", Some(bearer.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_input() {
        let (app, _) = app();

        let (status, body) = send(&app, "GET", "/root/get/abc", root(), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "query parameter must be int");

        let (status, body) =
            send(&app, "POST", "/root/create", root(), Some(r#"{"name":"test","data":""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "failed to decode model");

        let (status, body) = send(&app, "POST", "/root/create-token", root(), Some("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "failed to decode model");
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let (app, _) = app();

        let (status, body) =
            send(&app, "POST", "/root/create", root(), Some(r#"{"data":{"some":"data"}}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({"status": "error", "detail": "validation error: field name is a required"})
        );

        let (status, body) =
            send(&app, "POST", "/root/create", root(), Some(r#"{"name":"test","data":{"":""}}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "key or value length can't be 0");

        let (status, body) =
            send(&app, "POST", "/root/create-token", root(), Some(r#"{"vault_id":1}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "validation error: field expires is a required");
    }

    #[tokio::test]
    async fn test_overflowing_expiry_is_unprocessable() {
        let (app, _) = app();
        send(&app, "POST", "/root/create", root(), Some(r#"{"name":"db","data":{"k":"v"}}"#)).await;

        let body = format!(r#"{{"vault_id":1,"expires":{}}}"#, i64::MAX);
        let (status, body) =
            send(&app, "POST", "/root/create-token", root(), Some(body.as_str())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({"status": "error", "detail": "validation error: field expires is not valid"})
        );
    }

    #[tokio::test]
    async fn test_request_id_is_assigned_and_propagated() {
        let (app, _) = app();

        let request = Request::builder()
            .uri("/root/get/1")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));

        let request = Request::builder()
            .uri("/root/get/1")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-123");
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_envelope() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let app = with_request_timeout(slow, Duration::from_millis(10));

        let (status, body) = send(&app, "GET", "/slow", None, None).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body, json!({"status": "error", "detail": "request timed out"}));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (app, _) = app();
        let (status, _) = send(&app, "GET", "/root/delete/1", root(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
