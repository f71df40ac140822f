//! Scripted recording server.
//!
//! Every request, whatever its method or path, is recorded and answered with
//! the next enqueued [`MockResponse`]. When the queue is empty the default
//! response is used, or `500` if none was configured.

use std::{collections::VecDeque, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

/// A canned answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Wait this long before answering.
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One request as the server saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string, exactly as sent.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The path without its query string.
    pub fn path_only(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(path, _)| path)
    }

    /// Decoded query pairs in the order they appear.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self.path.split_once('?') {
            Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<MockResponse>,
    fallback: Option<MockResponse>,
    recorded: Vec<RecordedRequest>,
}

type SharedScript = Arc<Mutex<Script>>;

/// Recording server bound to an ephemeral port on `127.0.0.1`.
///
/// Shuts down when dropped.
pub struct MockServer {
    addr: SocketAddr,
    script: SharedScript,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockServer {
    /// Bind and start serving on the current tokio runtime.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let script = SharedScript::default();
        let (shutdown, signal) = oneshot::channel::<()>();

        let router = Router::new().fallback(record).with_state(Arc::clone(&script));
        tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    signal.await.ok();
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "mock server stopped");
            }
        });

        Ok(Self {
            addr,
            script,
            shutdown: Some(shutdown),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn enqueue(&self, response: MockResponse) {
        self.script.lock().await.queue.push_back(response);
    }

    /// Answer used once the queue is exhausted.
    pub async fn set_default(&self, response: MockResponse) {
        self.script.lock().await.fallback = Some(response);
    }

    /// Drain the recorded requests, oldest first.
    pub async fn take_requests(&self) -> Vec<RecordedRequest> {
        std::mem::take(&mut self.script.lock().await.recorded)
    }

    pub async fn request_count(&self) -> usize {
        self.script.lock().await.recorded.len()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn record(State(script): State<SharedScript>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string()),
        headers: parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body,
    };
    tracing::debug!(method = %recorded.method, path = %recorded.path, "recorded request");

    let response = {
        let mut script = script.lock().await;
        script.recorded.push(recorded);
        script
            .queue
            .pop_front()
            .or_else(|| script.fallback.clone())
            .unwrap_or_else(|| MockResponse::new(500, r#"{"error":"no response scripted"}"#))
    };

    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(response.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
