use super::*;
use std::{collections::HashMap, time::Duration};

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use shared::FailureKind;
use tokio::net::TcpListener;

async fn echo(
    method: axum::http::Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Json<Value> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    Json(json!({
        "method": method.as_str(),
        "trace": headers.get("x-trace").and_then(|v| v.to_str().ok()),
        "query": query,
        "body": body,
    }))
}

async fn spawn_test_server() -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/items", get(|| async { Json(json!(["x", "y"])) }))
        .route("/echo", any(echo))
        .route(
            "/fail",
            get(|| async { (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"error": "bad"}))) }),
        )
        .route("/empty", any(|| async { StatusCode::NO_CONTENT }))
        .route("/text", get(|| async { "plain text" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(json!("late"))
            }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn fetches_json_payload_from_absolute_endpoint() {
    let server_url = spawn_test_server().await.expect("spawn server");
    let transport = ReqwestTransport::new();

    let response = transport
        .request(RequestConfig::new().with_endpoint(format!("{server_url}/items")))
        .await
        .expect("request");

    assert_eq!(response.status, 200);
    assert_eq!(response.data, json!(["x", "y"]));
    assert_eq!(
        response.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
}

#[tokio::test]
async fn forwards_method_headers_params_and_body() {
    let server_url = spawn_test_server().await.expect("spawn server");
    let transport = ReqwestTransport::new();
    let config = RequestConfig::new()
        .with_base_url(format!("{server_url}/"))
        .with_endpoint("/echo")
        .with_method(Method::Patch)
        .with_header("x-trace", "abc")
        .with_param("page", 2)
        .with_body(json!({"name": "next"}));

    let response = transport.request(config).await.expect("request");

    assert_eq!(
        response.data,
        json!({
            "method": "PATCH",
            "trace": "abc",
            "query": {"page": "2"},
            "body": {"name": "next"},
        })
    );
}

#[tokio::test]
async fn non_success_status_is_a_failure_with_decoded_body() {
    let server_url = spawn_test_server().await.expect("spawn server");
    let err = ReqwestTransport::new()
        .request(RequestConfig::new().with_endpoint(format!("{server_url}/fail")))
        .await
        .expect_err("422 must fail");

    assert_eq!(
        err,
        TransportError::Status {
            status: 422,
            body: json!({"error": "bad"}),
        }
    );
}

#[tokio::test]
async fn empty_and_plain_text_bodies_are_kept() {
    let server_url = spawn_test_server().await.expect("spawn server");
    let transport = ReqwestTransport::new();

    let empty = transport
        .request(
            RequestConfig::new()
                .with_endpoint(format!("{server_url}/empty"))
                .with_method(Method::Delete),
        )
        .await
        .expect("empty");
    assert_eq!(empty.status, 204);
    assert_eq!(empty.data, Value::Null);

    let text = transport
        .request(RequestConfig::new().with_endpoint(format!("{server_url}/text")))
        .await
        .expect("text");
    assert_eq!(text.data, json!("plain text"));
}

#[tokio::test]
async fn elapsed_timeout_maps_to_timeout_failure() {
    let server_url = spawn_test_server().await.expect("spawn server");
    let err = ReqwestTransport::new()
        .request(
            RequestConfig::new()
                .with_endpoint(format!("{server_url}/slow"))
                .with_timeout(Duration::from_millis(50)),
        )
        .await
        .expect_err("must time out");
    assert_eq!(err.kind(), FailureKind::Timeout);
}

#[tokio::test]
async fn relative_endpoint_without_base_url_is_invalid() {
    let err = ReqwestTransport::new()
        .request(RequestConfig::new().with_endpoint("/items"))
        .await
        .expect_err("relative endpoint");
    assert_eq!(err.kind(), FailureKind::InvalidConfig);

    let err = ReqwestTransport::new()
        .request(RequestConfig::new())
        .await
        .expect_err("missing endpoint");
    assert_eq!(err, TransportError::InvalidConfig("missing endpoint".into()));
}

#[tokio::test]
async fn missing_transport_rejects_everything() {
    let err = MissingTransport
        .request(RequestConfig::new().with_endpoint("http://127.0.0.1/items"))
        .await
        .expect_err("missing transport");
    assert_eq!(err.kind(), FailureKind::Network);
}

#[test]
fn resolve_url_joins_base_and_relative_endpoint() {
    let config = RequestConfig::new()
        .with_base_url("http://example.test/api/")
        .with_endpoint("/users");
    assert_eq!(
        resolve_url(&config).expect("url").as_str(),
        "http://example.test/api/users"
    );

    let config = RequestConfig::new()
        .with_base_url("http://example.test/api")
        .with_endpoint("https://other.test/x");
    assert_eq!(
        resolve_url(&config).expect("url").as_str(),
        "https://other.test/x"
    );
}
