#![allow(dead_code)]

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A canned reply from the mock assistant.
#[derive(Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn completion(content: &str) -> Self {
        Self::ok(
            serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })
            .to_string(),
        )
    }

    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct MockState {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn chat_completions(
    State(state): State<MockState>,
    Json(payload): Json<Value>,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(payload);
    let reply = state.replies.lock().unwrap().pop_front();
    match reply {
        Some(reply) => {
            tokio::time::sleep(reply.delay).await;
            (reply.status, reply.body)
        }
        None => (StatusCode::SERVICE_UNAVAILABLE, "no reply configured".into()),
    }
}

/// OpenAI-compatible chat endpoint on an ephemeral local port.
pub struct MockAssistant {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockAssistant {
    pub async fn start(replies: Vec<MockReply>) -> Self {
        let state = MockState {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::default(),
        };
        let requests = state.requests.clone();

        let app = Router::new()
            .route("/chat/completions", post(chat_completions))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| eprintln!("mock assistant error: {}", e));
        });

        Self {
            addr,
            shutdown_tx,
            requests,
        }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}
