//! In-process chat-completion endpoint for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: Value,
}

impl MockReply {
    pub fn content(text: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": text},
                    "finish_reason": "stop"
                }]
            }),
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({"error": {"message": message}}),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockState {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    pub seen_bodies: Arc<Mutex<Vec<Value>>>,
    pub seen_auth_headers: Arc<Mutex<Vec<String>>>,
}

impl MockState {
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            seen_bodies: Arc::new(Mutex::new(Vec::new())),
            seen_auth_headers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn bodies(&self) -> Vec<Value> {
        self.seen_bodies.lock().await.clone()
    }
}

pub struct MockServer {
    pub url: String,
    shutdown_tx: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub async fn stop(self) {
        self.shutdown_tx.send(()).expect("shutdown signal should send");
        self.task.await.expect("server task should join");
    }
}

pub async fn spawn_completion_server(state: MockState) -> MockServer {
    let app = Router::new()
        .route("/chat/completions", post(chat_completions_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let local_addr = listener
        .local_addr()
        .expect("listener address should resolve");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        server.await.expect("test server should run");
    });

    MockServer {
        url: format!("http://{local_addr}/chat/completions"),
        shutdown_tx,
        task,
    }
}

async fn chat_completions_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        state.seen_auth_headers.lock().await.push(auth.to_string());
    }
    state.seen_bodies.lock().await.push(body);

    let reply = state
        .replies
        .lock()
        .await
        .pop_front()
        .unwrap_or_else(|| MockReply::error(StatusCode::INTERNAL_SERVER_ERROR, "no reply queued"));
    (reply.status, Json(reply.body))
}
