//! HTTP surface: MCP over /mcp, health and OAuth discovery.

mod common;

use std::time::Instant;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::Fixture;
use serde_json::{json, Value};
use tower::ServiceExt;
use wick::transport::SESSION_HEADER;

fn router(fixture: &Fixture) -> Router {
    lantern::server::app_router(fixture.state(), Instant::now())
}

fn rpc(body: Value, session: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::post("/mcp").header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn initialize_then_list_and_call() -> Result<()> {
    let fixture = Fixture::new();
    let app = router(&fixture);

    let response = app
        .clone()
        .oneshot(rpc(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-06-18",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "0.1.0"}
                }
            }),
            None,
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let session = response
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("session header");
    let init = json_body(response).await?;
    assert_eq!(init["result"]["protocolVersion"], json!("2025-06-18"));
    assert_eq!(init["result"]["serverInfo"]["name"], json!("lantern"));
    assert!(init["result"]["capabilities"]["tools"].is_object());

    let response = app
        .clone()
        .oneshot(rpc(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}), Some(&session))?)
        .await?;
    let list = json_body(response).await?;
    let tools = list["result"]["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 9);
    assert_eq!(tools[1]["name"], json!("get_setting"));
    assert_eq!(tools[1]["inputSchema"]["required"], json!(["path"]));
    assert_eq!(tools[1]["annotations"]["readOnlyHint"], json!(true));

    let response = app
        .oneshot(rpc(
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "get_setting", "arguments": {"path": "DATABASES.default.ENGINE"}}
            }),
            Some(&session),
        )?)
        .await?;
    let call = json_body(response).await?;
    assert!(call["result"].get("isError").is_none());
    assert_eq!(
        call["result"]["structuredContent"],
        json!({"status": "ok", "result": {"path": "DATABASES.default.ENGINE", "value": "django.db.backends.sqlite3"}})
    );
    Ok(())
}

#[tokio::test]
async fn tool_failures_are_results_not_rpc_errors() -> Result<()> {
    let fixture = Fixture::new();
    let response = router(&fixture)
        .oneshot(rpc(
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {"name": "nonexistent_tool", "arguments": {}}
            }),
            None,
        )?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert!(body.get("error").is_none());
    assert_eq!(body["result"]["isError"], json!(true));
    assert_eq!(body["result"]["structuredContent"]["kind"], json!("unknown_tool"));
    Ok(())
}

#[tokio::test]
async fn unknown_method_is_rpc_error() -> Result<()> {
    let fixture = Fixture::new();
    let response = router(&fixture)
        .oneshot(rpc(json!({"jsonrpc": "2.0", "id": 8, "method": "resources/list"}), None)?)
        .await?;

    let body = json_body(response).await?;
    assert_eq!(body["error"]["code"], json!(-32601));
    assert_eq!(body["id"], json!(8));
    Ok(())
}

#[tokio::test]
async fn health_reports_tools_and_sessions() -> Result<()> {
    let fixture = Fixture::new();
    let response = router(&fixture)
        .oneshot(Request::get("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["tools"], json!(9));
    assert_eq!(body["sessions"], json!({"total": 0, "initialized": 0}));
    Ok(())
}

#[tokio::test]
async fn oauth_discovery_is_not_found() -> Result<()> {
    let fixture = Fixture::new();
    let response = router(&fixture)
        .oneshot(Request::get("/.well-known/oauth-authorization-server").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await?;
    assert_eq!(body["error"], json!("not_found"));
    Ok(())
}
