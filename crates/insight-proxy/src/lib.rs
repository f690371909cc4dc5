//! Insight RPC Proxy
//!
//! A JSON-RPC 2.0 facade placed in front of an Ethereum node. A small,
//! fixed set of methods is answered locally (currently `blockPerSecond`,
//! a computed block production rate); every other call is forwarded to
//! the upstream node and its response is returned untouched.
//!
//! # Architecture
//!
//! ```text
//! Client (wallet, indexer, curl)
//!    |
//!    | JSON-RPC / HTTP POST /
//!    v
//! +----------------------+
//! | Insight Proxy        |
//! |----------------------|
//! | - Dispatch           |  <-- registry lookup per method name
//! | - blockPerSecond     |  <-- lock-free read of the rate snapshot
//! | - Pass-through       |  <-- normalized body, verbatim response
//! +----------------------+
//!    |                 ^
//!    | everything      | eth_blockNumber every 10s
//!    | else            | (BlockTimeEstimator)
//!    v                 |
//! +----------------------+
//! | Upstream node        |  <-- geth, Infura, Alchemy, etc.
//! +----------------------+
//! ```
//!
//! The estimator runs as a single background task and publishes its
//! estimate through an atomic snapshot, so request handlers never block
//! on it and never observe a torn value.

pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod proxy;
pub mod rate;
pub mod registry;
pub mod server;

pub use config::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use jsonrpc::{RpcError, RpcRequest, RpcResponse};
pub use proxy::RpcProxy;
pub use rate::{shared_rate, BlockTimeEstimator, RateReader, RateWriter};
pub use server::Server;
