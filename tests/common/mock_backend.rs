//! In-process stand-in for the embedding and rerank HTTP APIs.
//!
//! One server answers all three protocols, routed by path:
//! - `.../embeddings` (OpenAI, bearer `sk-*` required)
//! - `.../models/{model}:embedContent` (Gemini, `x-goog-api-key` required)
//! - `.../rerank` (Cohere/Jina)

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// How the backend answers.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Well-formed success responses.
    Ok,
    /// Every request fails with this status and body.
    Status { code: u16, body: &'static str },
    /// Succeeds after sleeping.
    Delay(Duration),
    /// 500 for inputs containing the marker, success otherwise.
    FailOn(&'static str),
    /// Embedding vectors one element too long.
    WrongDimension,
    /// Rerank responses that omit the last document.
    DropLastRerankResult,
}

struct MockState {
    behavior: Behavior,
    dimension: usize,
    requests: AtomicUsize,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Base URL for embedding providers.
    pub fn url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Full URL for rerank backends.
    pub fn rerank_url(&self) -> String {
        format!("http://{}/v1/rerank", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Vector the backend returns for `text`: one-hot at `chars(text) % dimension`.
///
/// Texts of equal length get identical vectors, which makes live rankings predictable.
pub fn live_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0; dimension];
    if dimension > 0 {
        vector[text.chars().count() % dimension] = 1.0;
    }
    vector
}

pub async fn spawn_mock_backend(behavior: Behavior, dimension: usize) -> std::io::Result<MockBackend> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let state = Arc::new(MockState {
        behavior,
        dimension,
        requests: AtomicUsize::new(0),
    });

    let app = Router::new()
        .fallback(handle)
        .with_state(Arc::clone(&state));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    Ok(MockBackend {
        addr,
        state,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
    })
}

async fn handle(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let path = uri.path().to_string();

    match &state.behavior {
        Behavior::Status { code, body } => {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, body.to_string()).into_response();
        }
        Behavior::Delay(delay) => tokio::time::sleep(*delay).await,
        _ => {}
    }

    if path.ends_with("/rerank") {
        return rerank(&state, &body);
    }

    let text = if path.ends_with("/embeddings") {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Bearer sk-"));
        if !authorized {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        body["input"].as_str().unwrap_or_default().to_string()
    } else if path.ends_with(":embedContent") {
        if !headers.contains_key("x-goog-api-key") {
            return StatusCode::FORBIDDEN.into_response();
        }
        body["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    } else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Behavior::FailOn(marker) = &state.behavior
        && text.contains(marker)
    {
        return (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded").into_response();
    }

    let mut vector = live_vector(&text, state.dimension);
    if matches!(state.behavior, Behavior::WrongDimension) {
        vector.push(0.0);
    }

    if path.ends_with("/embeddings") {
        Json(json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": vector}],
            "model": body["model"],
        }))
        .into_response()
    } else {
        Json(json!({"embedding": {"values": vector}})).into_response()
    }
}

/// Scores 0.9 for documents containing the query, 0.1 otherwise; best first.
fn rerank(state: &MockState, body: &Value) -> Response {
    let query = body["query"].as_str().unwrap_or_default();
    let documents: Vec<&str> = body["documents"]
        .as_array()
        .map(|docs| docs.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut results: Vec<(usize, f64)> = documents
        .iter()
        .enumerate()
        .map(|(index, doc)| (index, if doc.contains(query) { 0.9 } else { 0.1 }))
        .collect();
    results.sort_by(|a, b| b.1.total_cmp(&a.1));

    if matches!(state.behavior, Behavior::DropLastRerankResult) {
        let last = documents.len().saturating_sub(1);
        results.retain(|(index, _)| *index != last);
    }

    let results: Vec<Value> = results
        .into_iter()
        .map(|(index, score)| json!({"index": index, "relevance_score": score}))
        .collect();
    Json(json!({"results": results})).into_response()
}
