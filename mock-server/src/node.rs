//! In-memory simulation of a DKG node's HTTP API.
//!
//! Operations complete immediately: the initiating call stores its outcome
//! under a fresh handler id, and `/{operation}/result/{handler_id}` returns
//! it. A node built with [`SimulatedNode::with_pending_polls`] answers
//! `PENDING` that many times per handler before returning the outcome.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const NODE_VERSION: &str = "6.0.0-mock";
const ISSUER: &str = "0x0000000000000000000000000000000000000001";

#[derive(Debug, Clone)]
struct Assertion {
    id: String,
    ual: String,
    assets: Vec<String>,
    keywords: Vec<String>,
    visibility: String,
    data: Value,
}

impl Assertion {
    fn metadata(&self) -> Value {
        json!({
            "issuer": ISSUER,
            "UALs": [self.ual],
            "keywords": self.keywords,
            "type": "default",
            "visibility": self.visibility,
        })
    }

    fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.keywords.iter().any(|k| k.to_lowercase().contains(&term))
            || self.data.to_string().to_lowercase().contains(&term)
    }

    /// One N-Quad per scalar top-level property, in the assertion's graph.
    fn nquads(&self) -> Vec<String> {
        let Some(object) = self.data.as_object() else {
            return Vec::new();
        };
        let subject = object
            .get("@id")
            .and_then(Value::as_str)
            .unwrap_or(self.ual.as_str());
        object
            .iter()
            .filter(|(key, _)| !key.starts_with('@'))
            .filter_map(|(key, value)| {
                let literal = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                let predicate = if key.contains(':') {
                    key.clone()
                } else {
                    format!("http://schema.org/{key}")
                };
                Some(format!(
                    "<{subject}> <{predicate}> \"{}\" <{}> .",
                    escape_literal(&literal),
                    self.ual
                ))
            })
            .collect()
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug)]
struct Handler {
    operation: String,
    outcome: Value,
    polls_left: u32,
}

#[derive(Debug, Default)]
pub struct NodeDb {
    assertions: Vec<Assertion>,
    handlers: HashMap<Uuid, Handler>,
    published: u64,
}

impl NodeDb {
    fn find(&self, id: &str) -> Option<&Assertion> {
        self.assertions.iter().find(|a| a.id == id || a.ual == id)
    }
}

pub type Db = Arc<RwLock<NodeDb>>;

/// Shared state of one simulated node.
#[derive(Debug, Clone, Default)]
pub struct SimulatedNode {
    db: Db,
    pending_polls: u32,
}

impl SimulatedNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/info", get(info))
            .route("/publish", post(publish))
            .route("/provision", post(provision))
            .route("/update", post(update))
            .route("/resolve", get(resolve))
            .route("/entities:search", get(entities_search))
            .route("/assertions:search", get(assertions_search))
            .route("/query", post(query))
            .route("/proofs:get", post(proofs))
            .route("/{operation}/result/{handler_id}", get(operation_result))
            .with_state(self)
    }

    async fn register(&self, operation: &str, outcome: Value) -> Json<Value> {
        let handler_id = Uuid::new_v4();
        self.db.write().await.handlers.insert(
            handler_id,
            Handler {
                operation: operation.to_string(),
                outcome,
                polls_left: self.pending_polls,
            },
        );
        tracing::debug!(operation, %handler_id, "registered handler");
        Json(json!({ "handler_id": handler_id.to_string() }))
    }
}

/// Error answered as `{"error": message}`.
#[derive(Debug)]
pub enum NodeError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            NodeError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            NodeError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Query pairs in order, repeated keys kept.
fn query_pairs(raw: Option<String>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn values(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.clone())
        .collect()
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

async fn info() -> Json<Value> {
    Json(json!({
        "version": NODE_VERSION,
        "auto_update": false,
        "telemetry": false,
    }))
}

// --- publish / provision / update ---

#[derive(Debug, Default)]
struct PublishForm {
    data: Option<Value>,
    assets: Vec<String>,
    keywords: Vec<String>,
    visibility: Option<String>,
    ual: Option<String>,
}

impl PublishForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, NodeError> {
        let bad = |e: axum::extract::multipart::MultipartError| NodeError::BadRequest(e.body_text());
        let mut form = PublishForm::default();
        while let Some(field) = multipart.next_field().await.map_err(bad)? {
            let name = field.name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(bad)?;
            match name.as_str() {
                "file" => {
                    let data = serde_json::from_slice(&bytes)
                        .map_err(|e| NodeError::BadRequest(format!("file is not valid JSON: {e}")))?;
                    form.data = Some(data);
                }
                "assets" => form.assets = string_array(&name, &bytes)?,
                "keywords" => form.keywords = string_array(&name, &bytes)?,
                "visibility" => form.visibility = Some(String::from_utf8_lossy(&bytes).into_owned()),
                "ual" => form.ual = Some(String::from_utf8_lossy(&bytes).into_owned()),
                _ => {}
            }
        }
        Ok(form)
    }
}

fn string_array(name: &str, bytes: &[u8]) -> Result<Vec<String>, NodeError> {
    serde_json::from_slice(bytes)
        .map_err(|e| NodeError::BadRequest(format!("{name} must be a JSON array of strings: {e}")))
}

async fn publish(State(node): State<SimulatedNode>, multipart: Multipart) -> Result<Json<Value>, NodeError> {
    store(node, "publish", multipart).await
}

async fn provision(State(node): State<SimulatedNode>, multipart: Multipart) -> Result<Json<Value>, NodeError> {
    store(node, "provision", multipart).await
}

async fn update(State(node): State<SimulatedNode>, multipart: Multipart) -> Result<Json<Value>, NodeError> {
    store(node, "update", multipart).await
}

async fn store(node: SimulatedNode, operation: &str, mut multipart: Multipart) -> Result<Json<Value>, NodeError> {
    let form = PublishForm::read(&mut multipart).await?;
    let data = form
        .data
        .ok_or_else(|| NodeError::BadRequest("missing file part".to_string()))?;
    let visibility = form.visibility.unwrap_or_else(|| "public".to_string());

    let assertion = {
        let mut db = node.db.write().await;
        if operation == "update" {
            let ual = form
                .ual
                .ok_or_else(|| NodeError::BadRequest("update requires a ual".to_string()))?;
            let existing = db
                .assertions
                .iter_mut()
                .find(|a| a.ual == ual)
                .ok_or_else(|| NodeError::NotFound(format!("unknown ual: {ual}")))?;
            existing.data = data;
            existing.assets = form.assets;
            existing.keywords = form.keywords;
            existing.visibility = visibility;
            existing.clone()
        } else {
            db.published += 1;
            let n = db.published;
            let assertion = Assertion {
                id: format!("0x{n:064x}"),
                ual: format!("did:dkg:mock/{n}"),
                assets: form.assets,
                keywords: form.keywords,
                visibility,
                data,
            };
            db.assertions.push(assertion.clone());
            assertion
        }
    };

    let outcome = json!({
        "status": "COMPLETED",
        "data": {
            "id": assertion.id,
            "metadata": assertion.metadata(),
        },
    });
    Ok(node.register(operation, outcome).await)
}

// --- resolve / search ---

async fn resolve(State(node): State<SimulatedNode>, RawQuery(raw): RawQuery) -> Result<Json<Value>, NodeError> {
    let pairs = query_pairs(raw);
    let ids = values(&pairs, "ids");
    if ids.is_empty() {
        return Err(NodeError::BadRequest("ids query parameter is required".to_string()));
    }

    let data: Vec<Value> = {
        let db = node.db.read().await;
        ids.iter()
            .filter_map(|id| db.find(id))
            .map(|a| {
                json!({
                    "id": a.id,
                    "metadata": a.metadata(),
                    "assets": a.assets,
                    "keywords": a.keywords,
                    "data": a.data,
                })
            })
            .collect()
    };
    Ok(node
        .register("resolve", json!({ "status": "COMPLETED", "data": data }))
        .await)
}

async fn entities_search(
    State(node): State<SimulatedNode>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, NodeError> {
    let pairs = query_pairs(raw);
    let term = first(&pairs, "query");
    let ids = values(&pairs, "ids");
    if term.is_none() && ids.is_empty() {
        return Err(NodeError::BadRequest("query or ids is required".to_string()));
    }
    let limit = match first(&pairs, "limit") {
        Some(limit) => limit
            .parse::<usize>()
            .map_err(|e| NodeError::BadRequest(format!("limit: {e}")))?,
        None => usize::MAX,
    };

    let data: Vec<Value> = {
        let db = node.db.read().await;
        db.assertions
            .iter()
            .filter(|a| ids.is_empty() || ids.contains(&a.ual) || ids.contains(&a.id))
            .filter(|a| term.map_or(true, |t| a.matches(t)))
            .take(limit)
            .map(|a| json!({ "id": a.ual, "assets": a.assets, "keywords": a.keywords }))
            .collect()
    };
    Ok(node
        .register("entities:search", json!({ "status": "COMPLETED", "data": data }))
        .await)
}

async fn assertions_search(
    State(node): State<SimulatedNode>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, NodeError> {
    let pairs = query_pairs(raw);
    let term = first(&pairs, "query")
        .ok_or_else(|| NodeError::BadRequest("query is required".to_string()))?;

    let data: Vec<Value> = {
        let db = node.db.read().await;
        db.assertions
            .iter()
            .filter(|a| a.matches(term))
            .map(|a| json!({ "assertionId": a.id, "keywords": a.keywords }))
            .collect()
    };
    Ok(node
        .register("assertions:search", json!({ "status": "COMPLETED", "data": data }))
        .await)
}

// --- query / proofs ---

#[derive(Debug, Deserialize)]
struct QueryBody {
    query: String,
}

async fn query(
    State(node): State<SimulatedNode>,
    RawQuery(raw): RawQuery,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> Result<Json<Value>, NodeError> {
    let pairs = query_pairs(raw);
    if first(&pairs, "type") != Some("construct") {
        return Err(NodeError::BadRequest("only construct queries are supported".to_string()));
    }
    let Json(body) = body.map_err(|e| NodeError::BadRequest(e.body_text()))?;
    if body.query.trim().is_empty() {
        return Err(NodeError::BadRequest("query must not be empty".to_string()));
    }

    let data: Vec<String> = {
        let db = node.db.read().await;
        db.assertions
            .iter()
            .filter(|a| a.visibility == "public")
            .flat_map(Assertion::nquads)
            .collect()
    };
    Ok(node
        .register("query", json!({ "status": "COMPLETED", "data": data }))
        .await)
}

#[derive(Debug, Deserialize)]
struct ProofsBody {
    nquads: Vec<String>,
}

async fn proofs(
    State(node): State<SimulatedNode>,
    RawQuery(raw): RawQuery,
    body: Result<Json<ProofsBody>, JsonRejection>,
) -> Result<Json<Value>, NodeError> {
    let pairs = query_pairs(raw);
    let Json(body) = body.map_err(|e| NodeError::BadRequest(e.body_text()))?;

    let data: Vec<Value> = {
        let db = node.db.read().await;
        values(&pairs, "assertions")
            .iter()
            .filter_map(|id| db.find(id))
            .map(|a| {
                let stored = a.nquads();
                let proofs: Vec<Value> = body
                    .nquads
                    .iter()
                    .filter(|nq| stored.contains(nq))
                    .map(|nq| json!({ "triple": nq, "proof": [] }))
                    .collect();
                json!({ "assertionId": a.id, "proofs": proofs })
            })
            .collect()
    };
    Ok(node
        .register("proofs:get", json!({ "status": "COMPLETED", "data": data }))
        .await)
}

// --- results ---

async fn operation_result(
    State(node): State<SimulatedNode>,
    Path((operation, handler_id)): Path<(String, String)>,
) -> Result<Json<Value>, NodeError> {
    let not_found = || NodeError::NotFound(format!("Handler with id {handler_id} does not exist"));
    let id = Uuid::parse_str(&handler_id).map_err(|_| not_found())?;

    let mut db = node.db.write().await;
    let handler = db
        .handlers
        .get_mut(&id)
        .filter(|h| h.operation == operation)
        .ok_or_else(not_found)?;
    if handler.polls_left > 0 {
        handler.polls_left -= 1;
        return Ok(Json(json!({ "status": "PENDING" })));
    }
    Ok(Json(handler.outcome.clone()))
}
