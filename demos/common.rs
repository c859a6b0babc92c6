//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - A local echo peer, so demos run without a real chat backend

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug { "chatline=debug" } else { "chatline=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Echo Peer
// ============================================================================

/// Spawns a single-connection echo peer.
///
/// Accepts one WebSocket connection at a time and answers every text
/// frame with `echo: <text>`. Pass `Some(addr)` to rebind a previous
/// address after an aborted instance, which is how the reconnect demo
/// simulates an outage ending.
///
/// Abort the returned handle to kill the peer, live connection included.
pub async fn spawn_echo_server(addr: Option<SocketAddr>) -> (SocketAddr, JoinHandle<()>) {
    let listener = match addr {
        Some(addr) => TcpListener::bind(addr).await.expect("rebind echo server"),
        None => TcpListener::bind("127.0.0.1:0").await.expect("bind echo server"),
    };
    let addr = listener.local_addr().expect("echo server address");

    let handle = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            let Ok(mut ws) = accept_async(stream).await else {
                continue;
            };

            while let Some(Ok(frame)) = ws.next().await {
                match frame {
                    Message::Text(text) => {
                        let reply = format!("echo: {}", text.as_str());
                        if ws.send(Message::Text(reply.into())).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    (addr, handle)
}

/// Formats an echo peer address as a client endpoint.
pub fn endpoint_for(addr: SocketAddr) -> String {
    format!("ws://{addr}/ws")
}
