//! Error types for the proxy server

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// A local handler supplied its own JSON-RPC code, message and data.
    #[error("{message}")]
    Handler {
        code: i32,
        message: String,
        data: Option<Value>,
    },
}

impl ProxyError {
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidRequest(_) => -32600,
            Self::Upstream(_) => -32002,
            Self::Internal(_) => -32603,
            Self::Handler { code, .. } => *code,
        }
    }

    pub fn data(&self) -> Option<Value> {
        match self {
            Self::Handler { data, .. } => data.clone(),
            _ => None,
        }
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;
