//! Automatic reconnection after an outage.
//!
//! Demonstrates:
//! - Connection state transitions during an outage
//! - The fixed reconnect delay
//! - The Enqueue send policy holding messages while offline
//! - Queued messages flushing once the connection is back
//!
//! Usage:
//!   cargo run --example 002_reconnect
//!   cargo run --example 002_reconnect -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use common::Args;

use chatline::{ChatClient, ConnectionState, SendPolicy};

// ============================================================================
// Constants
// ============================================================================

const RECONNECT_DELAY: Duration = Duration::from_millis(500);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== 002: Reconnect ===\n");

    // ========================================================================
    // Spawn Echo Peer
    // ========================================================================

    println!("[1] Spawning local echo peer...");

    let (addr, server) = common::spawn_echo_server(None).await;
    let endpoint = common::endpoint_for(addr);
    println!("    ✓ Listening at {endpoint}\n");

    // ========================================================================
    // Build Client
    // ========================================================================

    println!("[2] Building client (Enqueue policy, 500ms retry)...");

    let client = ChatClient::builder()
        .endpoint(&endpoint)
        .reconnect_delay(RECONNECT_DELAY)
        .send_policy(SendPolicy::Enqueue)
        .no_greeting()
        .build()?;

    // Narrate every state change in the background.
    let state_printer = {
        let mut states = client.state_changes();
        tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let state = *states.borrow_and_update();
                println!("    [state] {state}");
            }
        })
    };

    println!("    ✓ Client ready\n");

    // ========================================================================
    // Connect and Chat
    // ========================================================================

    println!("[3] Connecting and sending...");

    client.start()?;
    wait_for_state(&client, ConnectionState::Open).await;

    let reply_at = client.transcript().len() + 2;
    client.send("first message")?;
    wait_for_len(&client, reply_at).await;
    println!("    ← {}\n", last_content(&client));

    // ========================================================================
    // Outage
    // ========================================================================

    println!("[4] Killing the peer (simulated outage)...");

    server.abort();
    wait_for_state(&client, ConnectionState::Disconnected).await;
    println!("    ✓ Outage noticed\n");

    println!("[5] Sending while offline...");

    let flushed_at = client.transcript().len() + 2;
    client.send("written during the outage")?;
    println!("    ✓ Accepted and echoed locally");
    println!("    Pending: {}\n", client.pending_count());

    // ========================================================================
    // Recovery
    // ========================================================================

    println!("[6] Restarting the peer at the same address...");

    let (_, server) = common::spawn_echo_server(Some(addr)).await;
    wait_for_state(&client, ConnectionState::Open).await;

    // The queued message goes out on its own; wait for the echo.
    wait_for_len(&client, flushed_at).await;
    println!("    ← {}", last_content(&client));
    println!("    Pending: {}\n", client.pending_count());

    // ========================================================================
    // Cleanup
    // ========================================================================

    println!("[Cleanup] Stopping client...");
    client.stop().await;
    state_printer.abort();
    server.abort();
    println!("          ✓ Done");

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

async fn wait_for_state(client: &ChatClient, want: ConnectionState) {
    let mut states = client.state_changes();
    loop {
        if *states.borrow_and_update() == want {
            return;
        }
        if states.changed().await.is_err() {
            return;
        }
    }
}

/// Waits until the transcript reaches the given length.
async fn wait_for_len(client: &ChatClient, target: usize) {
    let mut revisions = client.transcript_revisions();
    while client.transcript().len() < target {
        if revisions.changed().await.is_err() {
            return;
        }
    }
}

fn last_content(client: &ChatClient) -> String {
    client
        .transcript()
        .last()
        .map(|m| m.content)
        .unwrap_or_default()
}
