//! Minimal JSON-RPC 2.0 envelope used over the raw mTLS connections in
//! `internal_rpc.rs`. jsonrpsee's own client types assume an HTTP
//! transport, which the leader-facing and follower-facing surfaces don't
//! use, so requests on those surfaces are built and parsed by hand.

use chess_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

pub fn build_request(id: u64, method: &str, params: impl Serialize) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
    .to_string()
}

pub fn parse_response<T: DeserializeOwned>(line: &str) -> Result<T> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| Error::Internal(format!("malformed rpc response: {e}")))?;

    if let Some(error) = value.get("error") {
        return Err(Error::Unavailable(format!("peer returned an error: {error}")));
    }

    let result = value
        .get("result")
        .ok_or_else(|| Error::Internal("rpc response carried neither result nor error".into()))?;
    serde_json::from_value(result.clone())
        .map_err(|e| Error::Internal(format!("failed to decode rpc result: {e}")))
}
