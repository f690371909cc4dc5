//! JSON-RPC 2.0 envelope types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProxyError;

/// Reserved code for request bodies that are not valid JSON.
pub const PARSE_ERROR: i32 = -32700;
/// Reserved code for failures while encoding an outgoing envelope.
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: u64,
}

impl RpcRequest {
    /// Replaces absent or null params with an empty positional list so
    /// local handlers and the upstream always observe the same shape.
    pub fn normalize(&mut self) {
        if self.params.is_null() {
            self.params = Value::Array(Vec::new());
        }
    }

    pub fn params_as_array(&self) -> Result<&[Value], ProxyError> {
        const EMPTY: &[Value] = &[];
        match &self.params {
            Value::Array(arr) => Ok(arr),
            Value::Null => Ok(EMPTY),
            _ => Err(ProxyError::InvalidRequest("params must be an array".into())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn parse_error() -> Self {
        Self {
            code: PARSE_ERROR,
            message: "parse error".into(),
            data: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: message.into(),
            data: None,
        }
    }
}

impl RpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: u64, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn from_error(id: u64, err: ProxyError) -> Self {
        Self::error(
            id,
            RpcError {
                code: err.code(),
                message: err.to_string(),
                data: err.data(),
            },
        )
    }
}
