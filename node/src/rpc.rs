//! # JSON-RPC Methods
//!
//! Parameter decoding and dispatch for `POST /rpc`. Parameters are named
//! JSON objects. 256-bit numbers may be JSON integers, decimal strings or
//! `0x` hex strings; addresses and signatures are hex strings.
//!
//! | Method | Params |
//! |---|---|
//! | `assent_balanceOf` | `account`, `id` |
//! | `assent_balanceOfBatch` | `accounts[]`, `ids[]` |
//! | `assent_mintToEOA` | `caller`, `recipient`, `id`, `amount`, `signature`, `data?` |
//! | `assent_mintToContract` | `caller`, `recipient`, `id`, `amount`, `data?` |
//! | `assent_mintBatchToEOA` | `caller`, `recipient`, `ids[]`, `amounts[]`, `signature`, `data?` |
//! | `assent_mintBatchToContract` | `caller`, `recipient`, `ids[]`, `amounts[]`, `data?` |
//! | `assent_burn` | `caller`, `account`, `id`, `amount` |
//! | `assent_burnBatch` | `caller`, `account`, `ids[]`, `amounts[]` |
//! | `assent_baseUri` | none |
//! | `assent_setBaseUri` | `caller`, `uri` |
//! | `assent_uri` | `id` |
//! | `assent_ledgerAddress` | none |
//! | `assent_version` | none |
//!
//! Ledger failures come back as code `-32000` with `data.kind` naming the
//! error variant, so clients can branch without parsing messages.

use std::time::Instant;

use assent_contracts::{ContractError, LedgerEvent, MultiToken};
use assent_protocol::config::MAX_RPC_BATCH_LEN;
use assent_protocol::crypto::RecoverableSignature;
use assent_protocol::types::{parse_u256, Address, U256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{AppState, NodeEvent};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    pub method: String,
    /// Named parameters.
    pub params: Option<Value>,
    /// Echoed back in the response.
    pub id: Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const LEDGER_ERROR: i32 = -32000;

/// Why a method call failed.
#[derive(Debug)]
pub enum RpcFailure {
    MethodNotFound(String),
    InvalidParams(String),
    Ledger(ContractError),
}

impl From<ContractError> for RpcFailure {
    fn from(e: ContractError) -> Self {
        RpcFailure::Ledger(e)
    }
}

impl RpcFailure {
    pub fn into_error(self) -> JsonRpcError {
        match self {
            RpcFailure::MethodNotFound(method) => JsonRpcError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {}", method),
                data: None,
            },
            RpcFailure::InvalidParams(reason) => JsonRpcError {
                code: INVALID_PARAMS,
                message: format!("Invalid params: {}", reason),
                data: None,
            },
            RpcFailure::Ledger(e) => JsonRpcError {
                code: LEDGER_ERROR,
                message: e.to_string(),
                data: Some(json!({ "kind": e.kind() })),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter decoding
// ---------------------------------------------------------------------------

/// A 256-bit number as a JSON integer or string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Text(String),
}

impl Number {
    fn parse(&self, field: &str) -> Result<U256, RpcFailure> {
        match self {
            Number::Int(n) => Ok(U256::from(*n)),
            Number::Text(s) => parse_u256(s)
                .map_err(|e| RpcFailure::InvalidParams(format!("{}: {}", field, e))),
        }
    }
}

fn ensure_batch_len(len: usize, field: &str) -> Result<(), RpcFailure> {
    if len > MAX_RPC_BATCH_LEN {
        return Err(RpcFailure::InvalidParams(format!(
            "{}: {} entries, at most {} allowed",
            field, len, MAX_RPC_BATCH_LEN
        )));
    }
    Ok(())
}

fn parse_numbers(values: &[Number], field: &str) -> Result<Vec<U256>, RpcFailure> {
    ensure_batch_len(values.len(), field)?;
    values.iter().map(|v| v.parse(field)).collect()
}

pub(crate) fn parse_address(s: &str, field: &str) -> Result<Address, RpcFailure> {
    s.parse()
        .map_err(|e| RpcFailure::InvalidParams(format!("{}: {}", field, e)))
}

fn parse_signature(s: &str) -> Result<RecoverableSignature, RpcFailure> {
    s.parse()
        .map_err(|e| RpcFailure::InvalidParams(format!("signature: {}", e)))
}

fn parse_data(data: &Option<String>) -> Result<Vec<u8>, RpcFailure> {
    match data {
        None => Ok(Vec::new()),
        Some(s) => hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| RpcFailure::InvalidParams(format!("data: {}", e))),
    }
}

fn params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RpcFailure> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| RpcFailure::InvalidParams(e.to_string()))
}

#[derive(Deserialize)]
struct BalanceOfParams {
    account: String,
    id: Number,
}

#[derive(Deserialize)]
struct BalanceOfBatchParams {
    accounts: Vec<String>,
    ids: Vec<Number>,
}

#[derive(Deserialize)]
struct MintParams {
    caller: String,
    recipient: String,
    id: Number,
    amount: Number,
    signature: Option<String>,
    data: Option<String>,
}

#[derive(Deserialize)]
struct MintBatchParams {
    caller: String,
    recipient: String,
    ids: Vec<Number>,
    amounts: Vec<Number>,
    signature: Option<String>,
    data: Option<String>,
}

#[derive(Deserialize)]
struct BurnParams {
    caller: String,
    account: String,
    id: Number,
    amount: Number,
}

#[derive(Deserialize)]
struct BurnBatchParams {
    caller: String,
    account: String,
    ids: Vec<Number>,
    amounts: Vec<Number>,
}

#[derive(Deserialize)]
struct SetBaseUriParams {
    caller: String,
    uri: String,
}

#[derive(Deserialize)]
struct UriParams {
    id: Number,
}

fn required_signature(signature: &Option<String>) -> Result<RecoverableSignature, RpcFailure> {
    match signature {
        Some(s) => parse_signature(s),
        None => Err(RpcFailure::InvalidParams("missing field `signature`".into())),
    }
}

fn numbers_to_json(values: &[U256]) -> Value {
    Value::Array(values.iter().map(|v| json!(v.to_string())).collect())
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Handles one request envelope, recording metrics and publishing the
/// events of successful ledger writes.
pub fn handle(state: &AppState, req: JsonRpcRequest) -> JsonRpcResponse {
    if req.jsonrpc != "2.0" {
        return JsonRpcResponse::failure(
            req.id,
            JsonRpcError {
                code: INVALID_REQUEST,
                message: "Invalid Request: jsonrpc must be \"2.0\"".into(),
                data: None,
            },
        );
    }

    let started = Instant::now();
    let outcome = dispatch(state, &req.method, req.params);
    state
        .metrics
        .rpc_latency_seconds
        .observe(started.elapsed().as_secs_f64());

    match outcome {
        Ok(result) => {
            state
                .metrics
                .rpc_requests_total
                .with_label_values(&[req.method.as_str()])
                .inc();
            JsonRpcResponse::success(req.id, result)
        }
        Err(failure) => {
            let label = match &failure {
                RpcFailure::MethodNotFound(_) => "unknown",
                _ => req.method.as_str(),
            };
            state.metrics.rpc_requests_total.with_label_values(&[label]).inc();
            if let RpcFailure::Ledger(e) = &failure {
                state
                    .metrics
                    .rejected_requests_total
                    .with_label_values(&[e.kind()])
                    .inc();
            }
            JsonRpcResponse::failure(req.id, failure.into_error())
        }
    }
}

fn dispatch(state: &AppState, method: &str, raw: Option<Value>) -> Result<Value, RpcFailure> {
    match method {
        "assent_version" => Ok(json!(state.version)),
        "assent_ledgerAddress" => Ok(json!(state.token.lock().address())),
        "assent_baseUri" => Ok(json!(state.token.lock().base_uri())),

        "assent_uri" => {
            let p: UriParams = params(raw)?;
            let id = p.id.parse("id")?;
            Ok(json!(state.token.lock().uri(&id)))
        }

        "assent_balanceOf" => {
            let p: BalanceOfParams = params(raw)?;
            let account = parse_address(&p.account, "account")?;
            let id = p.id.parse("id")?;
            let balance = state.token.lock().balance_of(&account, &id);
            Ok(json!(balance.to_string()))
        }

        "assent_balanceOfBatch" => {
            let p: BalanceOfBatchParams = params(raw)?;
            ensure_batch_len(p.accounts.len(), "accounts")?;
            let accounts = p
                .accounts
                .iter()
                .map(|a| parse_address(a, "accounts"))
                .collect::<Result<Vec<_>, _>>()?;
            let ids = parse_numbers(&p.ids, "ids")?;
            let balances = state.token.lock().balance_of_batch(&accounts, &ids)?;
            Ok(numbers_to_json(&balances))
        }

        "assent_mintToEOA" | "assent_mintToContract" => {
            let p: MintParams = params(raw)?;
            let caller = parse_address(&p.caller, "caller")?;
            let recipient = parse_address(&p.recipient, "recipient")?;
            let id = p.id.parse("id")?;
            let amount = p.amount.parse("amount")?;
            let data = parse_data(&p.data)?;

            let path = if method == "assent_mintToEOA" {
                let signature = required_signature(&p.signature)?;
                write(state, |token| {
                    token.mint_to_eoa(caller, recipient, id, amount, &signature, &data)
                })?;
                "eoa"
            } else {
                write(state, |token| {
                    token.mint_to_contract(caller, recipient, id, amount, &data)
                })?;
                "contract"
            };
            state.metrics.mints_total.with_label_values(&[path]).inc();
            Ok(json!(true))
        }

        "assent_mintBatchToEOA" | "assent_mintBatchToContract" => {
            let p: MintBatchParams = params(raw)?;
            let caller = parse_address(&p.caller, "caller")?;
            let recipient = parse_address(&p.recipient, "recipient")?;
            let ids = parse_numbers(&p.ids, "ids")?;
            let amounts = parse_numbers(&p.amounts, "amounts")?;
            let data = parse_data(&p.data)?;

            let path = if method == "assent_mintBatchToEOA" {
                let signature = required_signature(&p.signature)?;
                write(state, |token| {
                    token.mint_batch_to_eoa(caller, recipient, &ids, &amounts, &signature, &data)
                })?;
                "eoa"
            } else {
                write(state, |token| {
                    token.mint_batch_to_contract(caller, recipient, &ids, &amounts, &data)
                })?;
                "contract"
            };
            state.metrics.mints_total.with_label_values(&[path]).inc();
            Ok(json!(true))
        }

        "assent_burn" => {
            let p: BurnParams = params(raw)?;
            let caller = parse_address(&p.caller, "caller")?;
            let account = parse_address(&p.account, "account")?;
            let id = p.id.parse("id")?;
            let amount = p.amount.parse("amount")?;
            write(state, |token| token.burn(caller, account, id, amount))?;
            state.metrics.burns_total.inc();
            Ok(json!(true))
        }

        "assent_burnBatch" => {
            let p: BurnBatchParams = params(raw)?;
            let caller = parse_address(&p.caller, "caller")?;
            let account = parse_address(&p.account, "account")?;
            let ids = parse_numbers(&p.ids, "ids")?;
            let amounts = parse_numbers(&p.amounts, "amounts")?;
            write(state, |token| token.burn_batch(caller, account, &ids, &amounts))?;
            state.metrics.burns_total.inc();
            Ok(json!(true))
        }

        "assent_setBaseUri" => {
            let p: SetBaseUriParams = params(raw)?;
            let caller = parse_address(&p.caller, "caller")?;
            write(state, |token| token.set_base_uri(caller, p.uri))?;
            Ok(json!(true))
        }

        other => Err(RpcFailure::MethodNotFound(other.to_string())),
    }
}

/// Runs a ledger write under the lock, then publishes whatever events it
/// committed. The lock is released before anything is broadcast.
fn write<F>(state: &AppState, op: F) -> Result<(), ContractError>
where
    F: FnOnce(&mut MultiToken) -> Result<(), ContractError>,
{
    let events: Vec<LedgerEvent> = {
        let mut token = state.token.lock();
        op(&mut *token)?;
        token.drain_events()
    };
    for event in events {
        // No subscribers is not an error.
        let _ = state.event_tx.send(NodeEvent::new(event));
    }
    Ok(())
}
