//! Several clients feeding one pair of queues.
//!
//! Demonstrates:
//! - Building a registry with a custom retry policy
//! - Clients that reconnect after the server hangs up
//! - A client that never connects and runs out of retries
//! - Demultiplexing messages and events by client
//!
//! Usage:
//!   cargo run --example fan_in
//!   cargo run --example fan_in -- --no-wait
//!   cargo run --example fan_in -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use common::Args;
use ws_client_pool::{EventKind, Registry, RetryLimit, Target};

// ============================================================================
// Constants
// ============================================================================

const CLIENTS: usize = 3;
const FRAMES_PER_SESSION: usize = 4;
const UNREACHABLE: &str = "ws://127.0.0.1:1/unreachable";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Fan-in ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    let addr = common::spawn_burst_server(FRAMES_PER_SESSION)
        .await
        .context("starting local server")?;
    println!("[Setup] Server listening on {addr}");

    let registry = Registry::builder()
        .queue_capacity(1024)
        .max_retry(2)
        .retry_interval(Duration::from_millis(500))
        .build()?;

    for n in 0..CLIENTS {
        let id = registry.add_client(format!("ws://{addr}/feed/{n}"))?;
        println!("        ✓ Client {id} added");
    }
    let unreachable = registry.add_client(UNREACHABLE)?;
    println!("        ✓ Client {unreachable} added (unreachable)\n");

    // Healthy clients should keep reconnecting forever.
    for id in registry.client_ids() {
        if id != unreachable {
            registry.set_max_retry(Target::Client(id), RetryLimit::Unlimited)?;
        }
    }

    // ========================================================================
    // Drain
    // ========================================================================

    let messages = registry.messages();
    let events = registry.events();

    let message_task = tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            println!(
                "[Message] client {} -> {}",
                message.client_id,
                message.text().unwrap_or("<binary>")
            );
        }
    });

    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("[Event]   client {} -> {}", event.client_id, event.kind);
            if event.kind == EventKind::RetriesExhausted {
                println!("          client {} gave up", event.client_id);
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(3)).await;

    println!(
        "\n[Status] {} clients, {} online, {} offline",
        registry.client_count(),
        registry.online_count(),
        registry.offline_count()
    );

    common::wait_for_exit(args.no_wait).await;

    // ========================================================================
    // Teardown
    // ========================================================================

    registry.shutdown().await;
    message_task.await.ok();
    event_task.await.ok();

    println!("\n=== Done ===");
    Ok(())
}
