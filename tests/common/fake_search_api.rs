//! Fake RCSB search API server for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1, on a runtime owned by the handle. Serves:
//! - `GET /rcsbsearch/v2/query?json=…` — scripted replies, requests recorded
//! - `GET /schema/structure`, `GET /schema/chemical` — configured schemas
//! - `POST /upload` — records the body, answers `{"key": "upload-N.bcif"}`
//!
//! The transport under test is blocking, so harness tests stay plain
//! `#[test]` functions and never run inside the server's runtime.
//!
//! # Example
//!
//! ```rust,no_run
//! let api = FakeSearchApi::start();
//! api.reply(200, serde_json::json!({"total_count": 1, "result_set": ["4HHB"]}));
//! let transport = HttpTransport::new(&api.config()).unwrap();
//! ```

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pdbsearch::ClientConfig;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;

#[derive(Default)]
struct ApiState {
    replies: VecDeque<(u16, String)>,
    requests: Vec<Value>,
    structure_schema: Option<Value>,
    chemical_schema: Option<Value>,
    uploads: Vec<Vec<u8>>,
}

type Shared = Arc<Mutex<ApiState>>;

/// Handle to the running fake search API. Dropping it stops the server.
pub struct FakeSearchApi {
    addr: SocketAddr,
    state: Shared,
    _runtime: Runtime,
}

impl FakeSearchApi {
    pub fn start() -> Self {
        let runtime = Runtime::new().unwrap();
        let state = Shared::default();

        let app = Router::new()
            .route("/rcsbsearch/v2/query", get(search))
            .route("/schema/structure", get(structure_schema))
            .route("/schema/chemical", get(chemical_schema))
            .route("/upload", post(upload))
            .with_state(state.clone());

        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        runtime.spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _runtime: runtime,
        }
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing every endpoint at this server, with
    /// throttling off.
    pub fn config(&self) -> ClientConfig {
        let base = self.base_url();
        let mut config = ClientConfig::defaults();
        config.service.base_url = base.clone();
        config.service.structure_schema_url = format!("{base}/schema/structure");
        config.service.chemical_schema_url = format!("{base}/schema/chemical");
        config.service.upload_url = format!("{base}/upload");
        config.service.download_url = format!("{base}/download/");
        config.http.requests_per_second = 0;
        config.http.timeout_secs = 5;
        config
    }

    /// Queue a JSON reply for the next search request.
    pub fn reply(&self, status: u16, body: Value) {
        self.reply_raw(status, body.to_string());
    }

    /// Queue a reply with an arbitrary body.
    pub fn reply_raw(&self, status: u16, body: impl Into<String>) {
        self.state.lock().unwrap().replies.push_back((status, body.into()));
    }

    pub fn no_content(&self) {
        self.reply_raw(204, "");
    }

    pub fn set_structure_schema(&self, schema: Value) {
        self.state.lock().unwrap().structure_schema = Some(schema);
    }

    pub fn set_chemical_schema(&self, schema: Value) {
        self.state.lock().unwrap().chemical_schema = Some(schema);
    }

    /// Decoded `json` parameters of the search requests received so far.
    pub fn requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn uploads(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().uploads.clone()
    }
}

async fn search(State(state): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Response {
    let mut st = state.lock().unwrap();
    let request = params
        .get("json")
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null);
    st.requests.push(request);

    match st.replies.pop_front() {
        None | Some((204, _)) => StatusCode::NO_CONTENT.into_response(),
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap(),
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
    }
}

async fn structure_schema(State(state): State<Shared>) -> Response {
    schema_response(state.lock().unwrap().structure_schema.clone())
}

async fn chemical_schema(State(state): State<Shared>) -> Response {
    schema_response(state.lock().unwrap().chemical_schema.clone())
}

fn schema_response(schema: Option<Value>) -> Response {
    match schema {
        Some(schema) => Json(schema).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "schema unavailable").into_response(),
    }
}

async fn upload(State(state): State<Shared>, body: Bytes) -> Json<Value> {
    let mut st = state.lock().unwrap();
    st.uploads.push(body.to_vec());
    Json(json!({"key": format!("upload-{}.bcif", st.uploads.len())}))
}
