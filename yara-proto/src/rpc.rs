//! JSON-RPC envelope handling
//!
//! Every message on the wire is a JSON-RPC 2.0 object. Requests carry an
//! integer `id` and a `method`; responses echo the `id` with either a
//! `result` or an `error`; notifications carry `method` and `params` only.

use serde::Deserialize;
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// The registry of JSON-RPC error codes the server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerErrorStart,
    ServerErrorEnd,
    ServerNotInitialized,
    UnknownErrorCode,
    RequestCancelled,
}

impl ErrorCode {
    pub fn code(self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerErrorStart => -32099,
            ErrorCode::ServerErrorEnd => -32000,
            ErrorCode::ServerNotInitialized => -32002,
            ErrorCode::UnknownErrorCode => -32001,
            ErrorCode::RequestCancelled => -32800,
        }
    }
}

/// An incoming JSON-RPC message, request or notification.
///
/// Clients are not trusted to be well-formed: an object with an `id` but no
/// `method` still decodes cleanly and is classified by the dispatcher
/// instead of crashing the reader.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
}

impl Message {
    /// Decode a framed JSON value into a message, or `None` when the value
    /// is not a JSON-RPC object at all.
    pub fn from_value(value: Value) -> Option<Self> {
        if value.get("jsonrpc").is_none() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Requests carry an id and produce exactly one response.
    pub fn is_request(&self) -> bool {
        self.id.is_some()
    }
}

/// Build a successful response for the given request id.
pub fn response(id: i64, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

/// Build an error response for the given request id.
pub fn error_response(id: i64, code: ErrorCode, message: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": {
            "code": code.code(),
            "message": message,
        },
    })
}

/// Build a server-initiated notification.
pub fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params,
    })
}
