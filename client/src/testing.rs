//! Loopback axum servers shared by the client and chain tests.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// What the server saw for one request.
#[derive(Debug)]
pub(crate) struct CapturedRequest {
    pub method: Method,
    /// Path plus query, as sent on the request line.
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}")
}

/// Answer every request with `status` and `body`; the receiver yields the
/// first request.
pub(crate) async fn one_shot_server(
    status: StatusCode,
    body: &'static str,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));

    let router = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, request_body: String| {
            let tx = tx.clone();
            async move {
                let sender = tx.lock().unwrap().take();
                if let Some(sender) = sender {
                    let path = uri
                        .path_and_query()
                        .map(|pq| pq.as_str().to_string())
                        .unwrap_or_default();
                    sender
                        .send(CapturedRequest {
                            method,
                            path,
                            headers,
                            body: request_body,
                        })
                        .ok();
                }
                (status, [(CONTENT_TYPE, "application/json")], body)
            }
        },
    );

    (serve(router).await, rx)
}

/// Accepts requests and never answers them.
pub(crate) async fn silent_server() -> String {
    let router = Router::new().fallback(|| async { std::future::pending::<()>().await });
    serve(router).await
}

/// Address that refuses connections.
pub(crate) async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub(crate) type RpcHandler = fn(&str, &Value) -> Result<Value, (i64, &'static str)>;

/// Minimal JSON-RPC node: `handler` maps a method name to its result, or
/// `Err((code, message))` for an error response.
pub(crate) async fn json_rpc_server(handler: RpcHandler) -> String {
    let router = Router::new().route(
        "/",
        post(move |Json(req): Json<Value>| async move {
            let method = req["method"].as_str().unwrap_or_default();
            let reply = match handler(method, &req["params"]) {
                Ok(result) => json!({"jsonrpc": "2.0", "id": req["id"], "result": result}),
                Err((code, message)) => json!({
                    "jsonrpc": "2.0",
                    "id": req["id"],
                    "error": {"code": code, "message": message},
                }),
            };
            Json(reply)
        }),
    );
    serve(router).await
}
