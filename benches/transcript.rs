//! Transcript and roundtrip benchmark suite.
//!
//! Benchmarks the hot paths a rendering UI leans on:
//! - Append throughput at different transcript sizes
//! - Snapshot cost as the transcript grows
//! - Full send-to-echo roundtrip against a local peer
//!
//! Run with: cargo bench --bench transcript
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use chatline::{ChatClient, ConnectionState, Role, Transcript};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const MESSAGE_COUNTS: &[usize] = &[100, 1_000, 10_000];

// ============================================================================
// Benchmark: Append Throughput
// ============================================================================

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcript_append");

    for &count in MESSAGE_COUNTS {
        group.bench_with_input(BenchmarkId::new("append", count), &count, |b, &count| {
            b.iter(|| {
                let transcript = Transcript::new();
                for _ in 0..count {
                    transcript.append(Role::User, "benchmark line");
                }
                transcript.len()
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Snapshot Cost
// ============================================================================

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcript_snapshot");

    for &count in MESSAGE_COUNTS {
        let transcript = Transcript::new();
        for _ in 0..count {
            transcript.append(Role::System, "a rendered line of conversation");
        }

        group.bench_with_input(
            BenchmarkId::new("snapshot", count),
            &transcript,
            |b, transcript| {
                b.iter(|| black_box(transcript.snapshot()));
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Send Roundtrip
// ============================================================================

fn bench_send_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (client, server) = rt.block_on(connected_client());

    let mut group = c.benchmark_group("send_roundtrip");
    group.sample_size(50);

    group.bench_function("echo", |b| {
        b.to_async(&rt).iter(|| async {
            // One user echo plus one peer reply per iteration.
            let target = client.transcript().len() + 2;
            client.send("ping").unwrap();

            let mut revisions = client.transcript_revisions();
            while client.transcript().len() < target {
                revisions.changed().await.unwrap();
            }
        });
    });

    group.finish();

    rt.block_on(client.stop());
    server.abort();
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Spawns an echo peer and returns a client already in the Open state.
async fn connected_client() -> (ChatClient, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            let Ok(mut ws) = accept_async(stream).await else {
                continue;
            };
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                if ws.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    let client = ChatClient::builder()
        .endpoint(format!("ws://{addr}/ws"))
        .no_greeting()
        .build()
        .unwrap();
    client.start().unwrap();

    let mut states = client.state_changes();
    loop {
        if *states.borrow_and_update() == ConnectionState::Open {
            break;
        }
        states.changed().await.unwrap();
    }

    (client, server)
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_append, bench_snapshot, bench_send_roundtrip);
criterion_main!(benches);
