// Common request helpers for integration tests.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

/// Response as seen by a test: status, headers and the body parsed as JSON
/// (or a JSON string holding the raw text when it is not JSON).
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Sends one request straight into a router without opening a socket.
pub async fn oneshot(router: Router, method: &str, path: &str, body: Option<&str>) -> Reply {
    oneshot_with(router, method, path, body, &[]).await
}

pub async fn oneshot_with(
    router: Router,
    method: &str,
    path: &str,
    body: Option<&str>,
    headers: &[(&str, &str)],
) -> Reply {
    let mut builder = Request::builder().method(method).uri(path);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("valid request");

    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");

    Reply {
        status,
        headers,
        body: parse_body(&bytes),
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("http client")
}

/// Makes a live HTTP request and parses the JSON response.
pub async fn do_json(method: &str, url: &str, body: Option<Value>) -> (u16, Value) {
    let client = client();
    let mut request = match method {
        "GET" => client.get(url),
        "POST" => client.post(url),
        _ => panic!("unsupported method: {}", method),
    };
    if let Some(body) = body {
        request = request.json(&body);
    }

    let resp = request.send().await.expect("request sent");
    let status = resp.status().as_u16();
    let bytes = resp.bytes().await.expect("readable body");
    (status, parse_body(&bytes))
}

/// Polls `check` every 10ms until it holds or `within` elapses.
pub async fn eventually<F>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
