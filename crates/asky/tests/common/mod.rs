//! Shared helpers for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use tokio::net::TcpListener;

use asky::api::{AppState, create_router};
use asky::client::FrameStream;
use asky::ws::Frame;

/// Spawn the relay server on an ephemeral port.
pub async fn spawn_relay() -> SocketAddr {
    let app = create_router(AppState::new());
    serve(app).await
}

/// Spawn a stub completion endpoint answering every request with `status`
/// and `body`; the last request body is captured for assertions.
pub async fn spawn_completion_stub(
    status: StatusCode,
    body: serde_json::Value,
) -> (SocketAddr, Arc<Mutex<Option<serde_json::Value>>>) {
    let captured = Arc::new(Mutex::new(None));
    let seen = captured.clone();

    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(request): Json<serde_json::Value>| {
            *seen.lock().unwrap() = Some(request);
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );

    (serve(app).await, captured)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{addr}/api/ws")
}

/// Receive the next chat payload, failing the test on timeout.
pub async fn recv_payload(stream: &mut FrameStream) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection closed");
    let Frame::ChatMessage { payload } = frame;
    payload
}
