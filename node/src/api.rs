//! # REST + WebSocket API
//!
//! Builds the axum router for the ledger node. All endpoints share
//! application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                     | Description                     |
//! |--------|--------------------------|---------------------------------|
//! | GET    | `/health`                | Liveness probe                  |
//! | GET    | `/status`                | Ledger summary                  |
//! | POST   | `/rpc`                   | JSON-RPC 2.0 gateway            |
//! | GET    | `/ws`                    | WebSocket stream of ledger events |
//! | GET    | `/balances/:account/:id` | Balance of one account and token |
//! | GET    | `/tokens/:id/uri`        | Rendered metadata locator       |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use assent_contracts::{LedgerEvent, MultiToken};
use assent_protocol::types::parse_u256;

use crate::metrics::SharedMetrics;
use crate::rpc::{self, JsonRpcRequest, RpcFailure};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// The ledger behind one lock. Every request takes it for the full
/// duration of its ledger call, which gives entry points the serial,
/// non-interleaved execution they assume.
pub type SharedToken = Arc<Mutex<MultiToken>>;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    pub token: SharedToken,
    /// Committed ledger events, fanned out to WebSocket subscribers.
    pub event_tx: broadcast::Sender<NodeEvent>,
    pub metrics: SharedMetrics,
}

/// A ledger event as pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEvent {
    /// When the node published the event.
    pub timestamp: DateTime<Utc>,
    pub event: LedgerEvent,
}

impl NodeEvent {
    pub fn new(event: LedgerEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc", post(rpc_handler))
        .route("/ws", get(ws_handler))
        .route("/balances/:account/:id", get(balance_handler))
        .route("/tokens/:id/uri", get(token_uri_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub ledger_address: String,
    pub base_uri: String,
    /// Number of registered programmable accounts.
    pub receivers: usize,
    /// Number of non-zero `(account, token)` balances.
    pub balance_entries: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /balances/:account/:id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account: String,
    /// Decimal token id.
    pub token_id: String,
    /// Decimal balance.
    pub balance: String,
}

/// Response payload for `GET /tokens/:id/uri`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenUriResponse {
    pub token_id: String,
    pub uri: String,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(error: String) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — 200 while the process is serving.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — ledger summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let token = state.token.lock();
    let resp = StatusResponse {
        version: state.version.clone(),
        ledger_address: token.address().to_hex(),
        base_uri: token.base_uri().to_string(),
        receivers: token.receiver_addresses().len(),
        balance_entries: token.balances().len(),
        timestamp: Utc::now().to_rfc3339(),
    };
    drop(token);
    Json(resp)
}

/// `POST /rpc` — JSON-RPC 2.0 gateway.
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    Json(rpc::handle(&state, req))
}

/// `GET /balances/:account/:id` — balance lookup. 400 on malformed input.
async fn balance_handler(
    Path((account, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> axum::response::Response {
    let account = match rpc::parse_address(&account, "account") {
        Ok(a) => a,
        Err(RpcFailure::InvalidParams(e)) => return bad_request(e),
        Err(other) => return bad_request(format!("{:?}", other)),
    };
    let token_id = match parse_u256(&id) {
        Ok(id) => id,
        Err(e) => return bad_request(format!("id: {}", e)),
    };

    let balance = state.token.lock().balance_of(&account, &token_id);
    Json(BalanceResponse {
        account: account.to_hex(),
        token_id: token_id.to_string(),
        balance: balance.to_string(),
    })
    .into_response()
}

/// `GET /tokens/:id/uri` — rendered metadata locator for a token id.
async fn token_uri_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> axum::response::Response {
    let token_id = match parse_u256(&id) {
        Ok(id) => id,
        Err(e) => return bad_request(format!("id: {}", e)),
    };
    let uri = state.token.lock().uri(&token_id);
    Json(TokenUriResponse {
        token_id: token_id.to_string(),
        uri,
    })
    .into_response()
}

/// `GET /ws` — WebSocket upgrade for live ledger events.
///
/// Clients receive one JSON [`NodeEvent`] per committed ledger event.
/// Client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Forwards broadcast events to one connection until either side closes.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();
    state.metrics.ws_subscribers.inc();
    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
    state.metrics.ws_subscribers.dec();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
