//! Streamable HTTP Transport
//!
//! - POST / - Send JSON-RPC request, receive the response directly
//! - Session ID via Mcp-Session-Id header

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::McpState;
use crate::protocol::{handle_value, Outcome};
use crate::Handler;

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Handle Streamable HTTP requests.
///
/// 1. Get or create session from Mcp-Session-Id header
/// 2. Dispatch the JSON-RPC message
/// 3. Return the reply with the session header (202 for notifications)
#[tracing::instrument(skip(state, body), fields(session_id = tracing::field::Empty))]
pub async fn streamable_handler<H: Handler>(
    State(state): State<Arc<McpState<H>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let session_hint = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let session_id = state.sessions.get_or_create(session_hint.as_deref());
    tracing::Span::current().record("session_id", session_id.as_str());
    state.sessions.touch(&session_id);

    match handle_value(&state, &session_id, body).await {
        Outcome::Reply(reply) => build_response(StatusCode::OK, &session_id, Json(reply)),
        Outcome::Rejected(reply) => build_response(StatusCode::BAD_REQUEST, &session_id, Json(reply)),
        Outcome::Notification => build_response(StatusCode::ACCEPTED, &session_id, ()),
    }
}

/// Build response with session ID header.
fn build_response<T: IntoResponse>(status: StatusCode, session_id: &str, body: T) -> Response {
    let mut response = body.into_response();
    *response.status_mut() = status;

    if let Ok(header_value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, header_value);
    }

    response
}

/// Handle DELETE requests (session termination).
#[tracing::instrument(skip(state), fields(session_id = tracing::field::Empty))]
pub async fn delete_handler<H: Handler>(
    State(state): State<Arc<McpState<H>>>,
    headers: HeaderMap,
) -> Response {
    let Some(session_id) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, "Missing Mcp-Session-Id header").into_response();
    };

    tracing::Span::current().record("session_id", session_id);

    if state.sessions.remove(session_id) {
        tracing::info!(session_id = %session_id, "Session terminated");
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::tests::state;
    use crate::transport::streamable_router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn post(body: Value, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/").header("content-type", "application/json");
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_request_gets_session_header() {
        let app = streamable_router(state());

        let response = app
            .oneshot(post(json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SESSION_HEADER).is_some());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["result"], json!({}));
    }

    #[tokio::test]
    async fn test_notification_is_accepted() {
        let app = streamable_router(state());
        let response = app
            .oneshot(post(
                json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
                Some("sess"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[SESSION_HEADER], "sess");
    }

    #[tokio::test]
    async fn test_invalid_envelope_is_bad_request() {
        let app = streamable_router(state());
        let response = app.oneshot(post(json!({ "id": 9 }), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = state();
        state.sessions.get_or_create(Some("gone"));

        let delete = |id: Option<&str>| {
            let mut builder = Request::delete("/");
            if let Some(id) = id {
                builder = builder.header(SESSION_HEADER, id);
            }
            builder.body(Body::empty()).unwrap()
        };

        let app = streamable_router(state.clone());
        let response = app.clone().oneshot(delete(Some("gone"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.sessions.get("gone").is_none());

        let response = app.clone().oneshot(delete(Some("gone"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(delete(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
