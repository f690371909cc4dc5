//! Insight RPC Proxy
//!
//! Usage:
//!   insight-proxy --upstream <RPC_URL> [--listen <ADDR>] [--interval <SECONDS>]
//!
//! Example:
//!   insight-proxy --upstream http://localhost:8545 --listen 0.0.0.0:18545

use std::env;
use std::time::Duration;

use insight_proxy::{ProxyConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info,insight_proxy=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config = ProxyConfig::default();
    let mut upstream_url = String::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--upstream" | "-u" => {
                i += 1;
                upstream_url = args.get(i).cloned().unwrap_or_default();
            }
            "--listen" | "-l" => {
                i += 1;
                if let Some(addr) = args.get(i) {
                    config.listen_addr = addr.clone();
                }
            }
            "--interval" | "-i" => {
                i += 1;
                if let Some(secs) = args.get(i).and_then(|s| s.parse().ok()) {
                    config.sample_interval = Duration::from_secs(secs);
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    if !upstream_url.is_empty() {
        config.upstream_url = upstream_url;
    } else if let Ok(url) = env::var("UPSTREAM_RPC_URL").or_else(|_| env::var("ETH_RPC_URL")) {
        config.upstream_url = url;
    }

    tracing::info!("Starting Insight RPC Proxy");
    tracing::info!("  Upstream: {}", config.upstream_url);
    tracing::info!("  Listen:   {}", config.listen_addr);
    tracing::info!("  Interval: {:?}", config.sample_interval);

    let listen_addr = config.listen_addr.clone();
    let server = Server::new(config);
    server.run(&listen_addr).await?;

    Ok(())
}

fn print_help() {
    println!(
        r#"Insight RPC Proxy

JSON-RPC 2.0 facade in front of an Ethereum node. Answers a small set of
methods locally and forwards everything else to the upstream unchanged.

USAGE:
    insight-proxy [OPTIONS]

OPTIONS:
    -u, --upstream <URL>      Upstream node JSON-RPC URL
                              Default: $UPSTREAM_RPC_URL, $ETH_RPC_URL or
                              http://localhost:8545
    -l, --listen <ADDR>       Address to listen on
                              Default: 0.0.0.0:8545
    -i, --interval <SECONDS>  Block height sampling period
                              Default: 10
    -h, --help                Print help

ENVIRONMENT VARIABLES:
    UPSTREAM_RPC_URL, ETH_RPC_URL
        Upstream RPC URL (if --upstream not specified)
    RUST_LOG
        Logging level (default: info,insight_proxy=debug)

LOCAL METHODS:
    blockPerSecond    Estimated blocks produced per second upstream
"#
    );
}
