//! Basic connect, send, and receive.
//!
//! Demonstrates:
//! - Building a ChatClient
//! - Starting the session and waiting for Open
//! - Sending messages and watching the transcript grow
//! - The transcript's JSON shape
//!
//! Usage:
//!   cargo run --example 001_echo_roundtrip
//!   cargo run --example 001_echo_roundtrip -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use anyhow::Result;
use common::Args;

use chatline::{ChatClient, ConnectionState};

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
    println!("=== 001: Echo Roundtrip ===\n");

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

    println!("[2] Building client...");

    let client = ChatClient::builder().endpoint(&endpoint).build()?;
    println!("    ✓ Client ready");
    println!("    Greeting: {:?}\n", client.transcript().last());

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[3] Connecting...");

    client.start()?;
    wait_for_open(&client).await;
    println!("    ✓ Connection open\n");

    // ========================================================================
    // Chat
    // ========================================================================

    println!("[4] Sending messages...");

    let mut revisions = client.transcript_revisions();
    for text in ["hello", "how are you?", "bye"] {
        // Two appends per round: the local echo and the peer's reply.
        let target = client.transcript().len() + 2;
        let id = client.send(text)?;
        println!("    → sent #{id}: {text}");

        while client.transcript().len() < target {
            revisions.changed().await.ok();
        }
        let reply = client.transcript().last();
        if let Some(reply) = reply {
            println!("    ← received #{}: {}", reply.id, reply.content);
        }
    }
    println!();

    // ========================================================================
    // Render Transcript
    // ========================================================================

    println!("[5] Final transcript as JSON:");

    let snapshot = client.transcript().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!();

    // ========================================================================
    // Cleanup
    // ========================================================================

    println!("[Cleanup] Stopping client...");
    client.stop().await;
    server.abort();
    println!("          ✓ Done");

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

async fn wait_for_open(client: &ChatClient) {
    let mut states = client.state_changes();
    loop {
        if *states.borrow_and_update() == ConnectionState::Open {
            return;
        }
        if states.changed().await.is_err() {
            return;
        }
    }
}
