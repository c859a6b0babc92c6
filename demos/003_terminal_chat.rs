//! Interactive terminal chat.
//!
//! Type lines to send them; the transcript renders as it grows. With no
//! endpoint given, a local echo peer is spawned so the demo works
//! standalone.
//!
//! Commands:
//!   /state      print connection state and pending count
//!   /reconnect  skip the current reconnect delay
//!   /quit       exit
//!
//! Usage:
//!   cargo run --example 003_terminal_chat
//!   cargo run --example 003_terminal_chat -- --endpoint ws://127.0.0.1:8080/ws
//!   cargo run --example 003_terminal_chat -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use common::Args;

use chatline::{ChatClient, Role};

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
    println!("=== 003: Terminal Chat ===\n");

    // ========================================================================
    // Pick Endpoint
    // ========================================================================

    let (endpoint, server) = match endpoint_from_args() {
        Some(endpoint) => {
            println!("[Setup] Using endpoint {endpoint}\n");
            (endpoint, None)
        }
        None => {
            let (addr, server) = common::spawn_echo_server(None).await;
            let endpoint = common::endpoint_for(addr);
            println!("[Setup] No endpoint given, spawned local echo peer at {endpoint}\n");
            (endpoint, Some(server))
        }
    };

    // ========================================================================
    // Build and Start
    // ========================================================================

    let client = ChatClient::builder().endpoint(&endpoint).build()?;
    client.start()?;

    // Render new transcript entries as they appear.
    let renderer = {
        let client = client.clone();
        tokio::spawn(async move {
            let mut revisions = client.transcript_revisions();
            let mut printed = 0;
            loop {
                let snapshot = client.transcript().snapshot();
                for message in &snapshot[printed..] {
                    match message.role {
                        Role::User => println!("you>  {}", message.content),
                        Role::System => println!("chat> {}", message.content),
                    }
                }
                printed = snapshot.len();
                if revisions.changed().await.is_err() {
                    return;
                }
            }
        })
    };

    // Narrate connection state in the background.
    let state_printer = {
        let mut states = client.state_changes();
        tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let state = *states.borrow_and_update();
                println!("      -- {state} --");
            }
        })
    };

    // ========================================================================
    // Input Loop
    // ========================================================================

    println!("Type a message and press Enter. /quit to exit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        match line {
            "" => {}
            "/quit" => break,
            "/state" => {
                println!(
                    "      state={} pending={} messages={}",
                    client.connection_state(),
                    client.pending_count(),
                    client.transcript().len()
                );
            }
            "/reconnect" => {
                if let Err(e) = client.reconnect() {
                    println!("[!] {e}");
                }
            }
            text => {
                if let Err(e) = client.send(text) {
                    println!("[!] {e}");
                }
            }
        }
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    println!("\n[Cleanup] Stopping client...");
    client.stop().await;
    renderer.abort();
    state_printer.abort();
    if let Some(server) = server {
        server.abort();
    }
    println!("          ✓ Done");

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads `--endpoint <url>` from the command line, or `CHATLINE_ENDPOINT`
/// from the environment.
fn endpoint_from_args() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    if let Some(index) = args.iter().position(|a| a == "--endpoint") {
        if let Some(url) = args.get(index + 1) {
            return Some(url.clone());
        }
    }
    std::env::var("CHATLINE_ENDPOINT").ok()
}
