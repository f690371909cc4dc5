//! Request dispatch and upstream forwarding
//!
//! Routes each JSON-RPC call to either a local handler or the upstream
//! node. Exactly one HTTP response is produced for every inbound request:
//! a fast parse-error envelope, a handler-produced envelope, or the
//! upstream's own response relayed verbatim.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::jsonrpc::{RpcError, RpcRequest, RpcResponse};
use crate::registry::Registry;

pub struct RpcProxy {
    registry: Registry,
    upstream_url: String,
    http_client: reqwest::Client,
}

impl RpcProxy {
    pub fn new(registry: Registry, upstream_url: String) -> Self {
        Self {
            registry,
            upstream_url,
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn handle(&self, headers: HeaderMap, body: Bytes) -> Response {
        let mut request: RpcRequest = match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("request decode failed: {e}");
                // The request id is unrecoverable here.
                return encode(RpcResponse::error(0, RpcError::parse_error()));
            }
        };
        request.normalize();

        match self.registry.get(&request.method) {
            Some(handler) => {
                let id = request.id;
                let response = match request.params_as_array().and_then(|params| handler(params))
                {
                    Ok(result) => RpcResponse::success(id, result),
                    Err(e) => RpcResponse::from_error(id, e),
                };
                encode(response)
            }
            None => self.forward(&request, &headers).await,
        }
    }

    /// Relays a normalized request to the upstream and mirrors its
    /// response back untouched. The forwarded body is a fresh
    /// serialization of the normalized request, never the original bytes.
    async fn forward(&self, request: &RpcRequest, headers: &HeaderMap) -> Response {
        let body = match serde_json::to_vec(request) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("marshal request error: {e}");
                return encode(RpcResponse::error(
                    request.id,
                    RpcError::internal(e.to_string()),
                ));
            }
        };

        // Host is rewritten by the client; length and content type are
        // recomputed for the fresh body.
        let mut outbound = headers.clone();
        outbound.remove(header::HOST);
        outbound.remove(header::CONTENT_LENGTH);
        outbound.remove(header::CONTENT_TYPE);

        let upstream = match self
            .http_client
            .post(&self.upstream_url)
            .headers(outbound)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("upstream request failed: {e}");
                return (StatusCode::BAD_GATEWAY, "bad gateway").into_response();
            }
        };

        let status = upstream.status();
        let mut builder = Response::builder().status(status);
        for (name, value) in upstream.headers() {
            // Framing headers are recomputed for the relayed body.
            if name == header::TRANSFER_ENCODING || name == header::CONTENT_LENGTH {
                continue;
            }
            builder = builder.header(name, value);
        }

        match builder.body(Body::from_stream(upstream.bytes_stream())) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("relay response error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "server internal error").into_response()
            }
        }
    }
}

/// Writes the envelope, falling back to a plain 500 if encoding fails.
fn encode(response: RpcResponse) -> Response {
    match serde_json::to_vec(&response) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("marshal response error: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "server internal error").into_response()
        }
    }
}
