//! HTTP API
//! Mission: Expose the authorizer to a gateway over HTTP
//!
//! POST /authorize takes the gateway's authorizer event and answers with the
//! policy document, 401 on denial, 503 when the secret store is unreachable.

use crate::auth::{AuthorizerRequest, AuthorizerResponse};
use crate::authorizer::{Authorizer, AuthorizerError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(authorizer: Arc<Authorizer>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/authorize", post(authorize))
        .layer(TraceLayer::new_for_http())
        .with_state(authorizer)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn authorize(
    State(authorizer): State<Arc<Authorizer>>,
    Json(request): Json<AuthorizerRequest>,
) -> Result<Json<AuthorizerResponse>, AuthorizerError> {
    authorizer.authorize(&request).await.map(Json)
}

impl IntoResponse for AuthorizerError {
    fn into_response(self) -> Response {
        // reasons were already logged; the body never carries them
        match self {
            AuthorizerError::Denied(_) => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            AuthorizerError::SecretUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
            }
        }
    }
}
