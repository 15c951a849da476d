//! HTTP routing.
//!
//! ```text
//! POST <path>   Basic auth + {"operation", "args"}  ──► Envelope
//! GET  <path>   no auth                              ──► operation catalog
//! ```
//!
//! Every response carries `x-request-id`, taken from the request or
//! generated.

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info_span;
use uuid::Uuid;

use ferreteria_core::operation::OperationInfo;
use ferreteria_core::Operation;

use crate::auth::{challenge, parse_basic};
use crate::error::ErrorKind;
use crate::facade::RequestContext;
use crate::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id assigned by [`request_id_middleware`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Builds the router for the configured endpoint path.
pub fn build_router(state: AppState) -> Router {
    let path = state.config.server.path.clone();

    Router::new()
        .route(&path, post(invoke).get(catalog))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            let request_id = req
                .extensions()
                .get::<RequestId>()
                .map(|id| id.0.clone())
                .unwrap_or_default();
            info_span!(
                "http_request",
                request_id = %request_id,
                method = %req.method(),
                uri = %req.uri(),
            )
        }))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn invoke(
    State(state): State<AppState>,
    request_id: Option<axum::Extension<RequestId>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext {
        request_id: request_id
            .map(|axum::Extension(id)| id.0)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        credentials: headers.get(header::AUTHORIZATION).and_then(parse_basic),
    };

    let envelope = state.facade.handle(ctx, &body).await;
    let status = envelope.http_status();
    let is_auth_failure = envelope.error_kind == Some(ErrorKind::Auth);

    let mut response = (status, Json(envelope)).into_response();
    if is_auth_failure {
        if let Ok(value) = HeaderValue::from_str(&challenge(&state.config.auth.realm)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
    }
    response
}

#[derive(Debug, Serialize)]
struct Catalog {
    service: String,
    operations: Vec<OperationInfo>,
}

async fn catalog(State(state): State<AppState>) -> Json<Catalog> {
    Json(Catalog {
        service: state.config.auth.realm.clone(),
        operations: Operation::ALL.iter().map(|op| op.describe()).collect(),
    })
}
