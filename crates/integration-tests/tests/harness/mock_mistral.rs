//! Mock Mistral API for integration tests
//!
//! Records every chat-completion body it receives and answers with canned
//! JSON or SSE responses

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Mock Mistral backend
pub struct MockMistral {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    /// Bodies of received chat-completion requests
    bodies: Mutex<Vec<Value>>,
    /// Authorization header of the last request
    authorization: Mutex<Option<String>>,
    /// Fail every request with this status and body
    failure: Option<(StatusCode, Value)>,
}

impl MockMistral {
    /// Start a mock that answers successfully
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(MockState::default()).await
    }

    /// Start a mock that rejects every request
    pub async fn start_failing(status: StatusCode, body: Value) -> anyhow::Result<Self> {
        Self::start_inner(MockState {
            failure: Some((status, body)),
            ..MockState::default()
        })
        .await
    }

    async fn start_inner(state: MockState) -> anyhow::Result<Self> {
        let state = Arc::new(state);

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/models", routing::get(handle_models))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including the `/v1` prefix
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Chat-completion bodies received so far
    pub fn bodies(&self) -> Vec<Value> {
        self.state.bodies.lock().unwrap().clone()
    }

    /// Body of the most recent chat-completion request
    pub fn last_body(&self) -> Value {
        self.bodies().pop().expect("no request received")
    }

    /// Authorization header of the most recent request
    pub fn authorization(&self) -> Option<String> {
        self.state.authorization.lock().unwrap().clone()
    }
}

impl Drop for MockMistral {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn record_auth(state: &MockState, headers: &HeaderMap) {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *state.authorization.lock().unwrap() = value;
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers);
    state.bodies.lock().unwrap().push(body.clone());

    if let Some((status, ref error)) = state.failure {
        return (status, Json(error.clone())).into_response();
    }

    let model = body["model"].as_str().unwrap_or("mistral-small-latest").to_owned();
    let completions = body["n"].as_u64().unwrap_or(1);

    if body["stream"].as_bool().unwrap_or(false) {
        return streaming_response(&model, completions);
    }

    let choices: Vec<Value> = (0..completions)
        .map(|index| {
            json!({
                "index": index,
                "message": { "role": "assistant", "content": format!("Bonjour {index}") },
                "finish_reason": "stop"
            })
        })
        .collect();

    Json(json!({
        "id": "cmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": choices,
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    }))
    .into_response()
}

/// Every choice streams "Bon" then "jour", interleaved by index, then each
/// finishes in turn; usage rides on the last finish chunk
fn streaming_response(model: &str, completions: u64) -> Response {
    let chunk = |index: u64, delta: Value, finish_reason: Value, usage: Option<Value>| {
        let mut chunk = json!({
            "id": "cmpl-mock-stream",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": model,
            "choices": [{ "index": index, "delta": delta, "finish_reason": finish_reason }]
        });
        if let Some(usage) = usage {
            chunk["usage"] = usage;
        }
        format!("data: {chunk}\n\n")
    };

    let mut body = String::new();
    for index in 0..completions {
        body.push_str(&chunk(index, json!({ "role": "assistant", "content": "" }), Value::Null, None));
    }
    for part in ["Bon", "jour"] {
        for index in 0..completions {
            body.push_str(&chunk(index, json!({ "content": part }), Value::Null, None));
        }
    }
    for index in 0..completions {
        let usage = (index + 1 == completions).then(|| {
            json!({
                "prompt_tokens": 10,
                "completion_tokens": 2 * completions,
                "total_tokens": 10 + 2 * completions
            })
        });
        body.push_str(&chunk(index, json!({ "content": "" }), json!("stop"), usage));
    }
    body.push_str("data: [DONE]\n\n");

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn handle_models(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    record_auth(&state, &headers);

    if let Some((status, ref error)) = state.failure {
        return (status, Json(error.clone())).into_response();
    }

    Json(json!({
        "object": "list",
        "data": [
            { "id": "mistral-large-latest", "object": "model", "created": 1_700_000_000, "owned_by": "mistralai" },
            { "id": "mistral-small-latest", "object": "model", "created": 1_700_000_000, "owned_by": "mistralai" }
        ]
    }))
    .into_response()
}
