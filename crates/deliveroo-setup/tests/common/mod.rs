//! Fake order-history upstream for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use deliveroo_setup::ValidationLog;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const ORDERS_PATH: &str = "/consumer/order-history/v1/orders";

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub accept_language: Option<String>,
    pub query: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct UpstreamState {
    responses: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Serves queued responses in order, then `200 {}` once the queue is empty.
pub struct MockUpstream {
    pub endpoint: String,
    state: UpstreamState,
    server: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start(responses: &[(u16, &str)]) -> Self {
        let state = UpstreamState::default();
        {
            let mut queue = state.responses.lock().unwrap();
            for (status, body) in responses {
                queue.push_back((StatusCode::from_u16(*status).unwrap(), body.to_string()));
            }
        }

        let app = Router::new()
            .route(ORDERS_PATH, get(orders))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .await
                .expect("serve");
        });

        Self {
            endpoint: format!("http://{addr}{ORDERS_PATH}"),
            state,
            server,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.captured.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn orders(
    State(state): State<UpstreamState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.captured.lock().unwrap().push(CapturedRequest {
        authorization: header_value(header::AUTHORIZATION),
        accept_language: header_value(header::ACCEPT_LANGUAGE),
        query,
    });

    state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| (StatusCode::OK, "{}".to_string()))
}

/// Upstream returning 401 for an empty bearer token and an order list otherwise.
pub async fn start_token_checking_upstream() -> (String, JoinHandle<()>) {
    async fn handler(headers: HeaderMap) -> (StatusCode, &'static str) {
        match headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        {
            Some(value) if value.trim_end() != "Bearer" => (StatusCode::OK, r#"{"orders":[]}"#),
            _ => (StatusCode::UNAUTHORIZED, r#"{"error":"unauthorized"}"#),
        }
    }

    let app = Router::new().route(ORDERS_PATH, get(handler));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("serve");
    });
    (format!("http://{addr}{ORDERS_PATH}"), server)
}

/// Accepts connections and drops them before answering.
pub async fn start_resetting_listener() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });
    (format!("http://{addr}{ORDERS_PATH}"), server)
}

/// Drops the first connection, then answers every later request with `200 {}`.
pub async fn start_flaky_upstream() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        let mut first = true;
        while let Ok((mut socket, _)) = listener.accept().await {
            if std::mem::take(&mut first) {
                drop(socket);
                continue;
            }
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
                )
                .await;
        }
    });
    (format!("http://{addr}{ORDERS_PATH}"), server)
}

/// An endpoint nothing is listening on.
pub async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}{ORDERS_PATH}")
}

#[derive(Debug, Default)]
pub struct RecordingLog {
    pub debug: Mutex<Vec<String>>,
    pub error: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn debug_lines(&self) -> Vec<String> {
        self.debug.lock().unwrap().clone()
    }

    pub fn error_lines(&self) -> Vec<String> {
        self.error.lock().unwrap().clone()
    }
}

impl ValidationLog for RecordingLog {
    fn debug(&self, message: &str) {
        self.debug.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.error.lock().unwrap().push(message.to_string());
    }
}
